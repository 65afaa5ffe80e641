mod http;

pub use http::{HttpFetcher, HttpFetcherOptions};

use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_SCHEME: &str = "http";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid remote URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Refusing unsafe repository path {0:?}")]
    UnsafePath(String),

    #[error("Failed to create directory for {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: {status}")]
    Status { url: String, status: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Retrieves a single remote file into local storage.
pub trait RemoteFetch: Send + Sync + 'static {
    /// Downloads `remote_url` into `local_path`, creating or truncating it and
    /// any missing parent directories. Returns the number of bytes written.
    fn fetch(
        &self,
        remote_url: &Url,
        local_path: &Path,
    ) -> impl Future<Output = Result<u64, FetchError>> + Send;
}

/// Builds the URL of `location` (`host/path/...`), defaulting to plain HTTP.
///
/// Locations that already name `http://` or `https://` are used unchanged.
pub fn remote_url(scheme: &str, location: &str) -> Result<Url, FetchError> {
    let raw = if location.starts_with("http://") || location.starts_with("https://") {
        location.to_string()
    } else {
        let scheme = if scheme.is_empty() {
            DEFAULT_SCHEME
        } else {
            scheme
        };
        format!("{}://{}", scheme, location)
    };

    Url::parse(&raw).map_err(|source| FetchError::InvalidUrl { url: raw, source })
}

/// Joins a repository-relative location onto the local root.
///
/// Absolute locations and `..` components are rejected so metadata cannot
/// place files outside `root`.
pub fn local_path(root: &Path, location: &str) -> Result<PathBuf, FetchError> {
    let relative = Path::new(location);
    let mut path = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(FetchError::UnsafePath(location.to_string()));
            }
        }
    }
    if path == root {
        return Err(FetchError::UnsafePath(location.to_string()));
    }
    Ok(path)
}
