use super::{FetchError, RemoteFetch};
use crate::utils::ensure_parent_dir;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

#[derive(Clone, Copy, Debug)]
pub struct HttpFetcherOptions {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    /// Deadline for a whole request, body included. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for HttpFetcherOptions {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            idle_timeout: Duration::from_secs(30),
            request_timeout: None,
        }
    }
}

/// [`RemoteFetch`] over a shared HTTP client. Cloning shares the connection pool.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(options: HttpFetcherOptions) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(options.max_idle_connections)
            .pool_idle_timeout(options.idle_timeout);
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl RemoteFetch for HttpFetcher {
    async fn fetch(&self, remote_url: &Url, local_path: &Path) -> Result<u64, FetchError> {
        ensure_parent_dir(local_path)
            .await
            .map_err(|source| FetchError::Directory {
                path: local_path.to_path_buf(),
                source,
            })?;

        tracing::debug!(url = %remote_url, "Downloading");

        let response = self
            .client
            .get(remote_url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: remote_url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(FetchError::Status {
                url: remote_url.to_string(),
                status: status.to_string(),
            });
        }

        let write_error = |source| FetchError::Write {
            path: local_path.to_path_buf(),
            source,
        };

        let file = tokio::fs::File::create(local_path)
            .await
            .map_err(write_error)?;
        let mut writer = BufWriter::new(file);

        let mut body = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|source| FetchError::Request {
                url: remote_url.to_string(),
                source,
            })?;
            writer.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }
        writer.flush().await.map_err(write_error)?;

        tracing::debug!(url = %remote_url, "Downloaded {} bytes", written);
        Ok(written)
    }
}
