use crate::fetch::FetchError;
use crate::sync::SyncError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AptMirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {details}")]
    ConfigValidation { details: String },

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory creation failed at {path}: {reason}")]
    DirectoryCreation { path: PathBuf, reason: String },

    #[error("HTTP client error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Synchronization of {repository} failed: {source}")]
    Sync {
        repository: String,
        #[source]
        source: SyncError,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
