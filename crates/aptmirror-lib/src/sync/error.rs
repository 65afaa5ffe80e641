use crate::fetch::FetchError;
use crate::index::IndexError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the synchronization of a repository.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to process {}: {source}", path.display())]
    Index {
        path: PathBuf,
        #[source]
        source: IndexError,
    },

    #[error("Failed to check {location}: no compressed copy was downloaded")]
    MissingCompressedFallback { location: String },

    #[error("Cannot find a Packages file for {index}")]
    MissingPackageIndex { index: String },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
