mod pool;
mod types;

pub use pool::DownloadPool;
pub use types::{DownloadJob, DownloadSummary};
