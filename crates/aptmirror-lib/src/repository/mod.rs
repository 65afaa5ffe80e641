mod types;

pub use types::{DIST_INDEX_FILES, RepositorySpec};
