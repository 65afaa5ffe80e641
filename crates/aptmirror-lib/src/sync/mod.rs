mod error;
mod repository_sync;

pub use error::SyncError;
pub use repository_sync::RepositorySync;
