use super::error::SyncError;
use crate::download::{DownloadJob, DownloadPool, DownloadSummary};
use crate::fetch::{FetchError, RemoteFetch, local_path};
use crate::index::{FileTable, merge_file_tables, parse_packages_file, parse_release_file};
use crate::repository::{DIST_INDEX_FILES, RepositorySpec};
use crate::utils::format_file_size;
use crate::verification::{Compression, verify_stored_file};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const PACKAGES: &str = "Packages";
const BINARY_INDEX_FILES: [&str; 4] = ["Packages", "Packages.gz", "Packages.xz", "Release"];

/// Mirrors one repository distribution into a local root.
///
/// Every stage before the package downloads is fatal on error. Package
/// downloads are best effort, see [`DownloadPool`].
pub struct RepositorySync<F> {
    spec: RepositorySpec,
    fetcher: Arc<F>,
    root: PathBuf,
    download_workers: usize,
}

impl<F: RemoteFetch> RepositorySync<F> {
    pub fn new(
        spec: RepositorySpec,
        fetcher: Arc<F>,
        root: impl Into<PathBuf>,
        download_workers: usize,
    ) -> Self {
        Self {
            spec,
            fetcher,
            root: root.into(),
            download_workers,
        }
    }

    pub async fn run(&self) -> Result<DownloadSummary, SyncError> {
        info!("Downloading distribution index");
        self.fetch_dist_index().await?;
        self.verify_release_signature();

        info!("Processing distribution index");
        let dist_files = self.read_dist_index().await?;

        info!("Downloading component files");
        let fetched_plain = self.fetch_binary_indices(dist_files).await?;

        info!("Processing component files");
        let packages = self.read_package_indices(&fetched_plain).await?;

        let total_size: u64 = packages.values().map(|file| file.size).sum();
        info!(
            "Total packages to download: {} ({})",
            packages.len(),
            format_file_size(total_size)
        );

        info!("Downloading packages");
        let start = Instant::now();
        let summary = self.download_packages(packages).await;
        info!(
            downloaded = summary.downloaded,
            failed = summary.fetch_failures,
            size_mismatches = summary.size_mismatches,
            hash_mismatches = summary.hash_mismatches,
            "Download took {:.2?}",
            start.elapsed()
        );

        Ok(summary)
    }

    fn local(&self, location: &str) -> Result<PathBuf, SyncError> {
        local_path(&self.root, location).map_err(|source| SyncError::Fetch {
            location: location.to_string(),
            source,
        })
    }

    async fn fetch_location(&self, location: &str) -> Result<(PathBuf, u64), FetchError> {
        let remote = self.spec.remote_url(location)?;
        let path = local_path(&self.root, location)?;
        let size = self.fetcher.fetch(&remote, &path).await?;
        Ok((path, size))
    }

    async fn fetch_dist_index(&self) -> Result<(), SyncError> {
        for name in DIST_INDEX_FILES {
            let location = self.spec.dist_location(name);
            self.fetch_location(&location)
                .await
                .map_err(|source| SyncError::Fetch { location, source })?;
        }
        Ok(())
    }

    // TODO: check InRelease/Release.gpg against signature_key_file once a
    // verification backend is chosen.
    fn verify_release_signature(&self) {
        if self.spec.verify_signature {
            warn!(
                key_file = ?self.spec.signature_key_file,
                "Release signature verification is not supported, continuing unverified"
            );
        } else {
            debug!("Release signature verification disabled");
        }
    }

    async fn read_dist_index(&self) -> Result<FileTable, SyncError> {
        let path = self.local(&self.spec.dist_location("Release"))?;
        let requirements = self.spec.release_requirements();

        let files = tokio::task::spawn_blocking(move || {
            parse_release_file(&path, &requirements).map_err(|source| SyncError::Index { path, source })
        })
        .await??;

        debug!("Distribution index lists {} files", files.len());
        Ok(files)
    }

    /// Downloads the per-architecture indices listed in the distribution index.
    ///
    /// Returns the plain `Packages` indices that were downloaded. A plain index
    /// that could not be fetched must have a gzip sibling on disk, which is
    /// checked against the plain index's hash instead.
    async fn fetch_binary_indices(&self, mut dist_files: FileTable) -> Result<BTreeSet<String>, SyncError> {
        let mut wanted = FileTable::new();
        for dir in self.spec.binary_index_dirs() {
            for name in BINARY_INDEX_FILES {
                let key = format!("{}/{}", dir, name);
                if let Some(file) = dist_files.remove(&key) {
                    wanted.insert(key, file);
                }
            }
        }
        drop(dist_files);

        let mut fetched_plain = BTreeSet::new();
        let mut unchecked = Vec::new();
        for (name, file) in wanted {
            let location = self.spec.dist_location(&name);
            match self.fetch_location(&location).await {
                Ok((path, size)) => {
                    if size != file.size {
                        warn!(file = %name, "Index file not correct size: {} != {}", file.size, size);
                    }
                    if !verify_stored_file(path, file.sha256.clone(), Compression::None).await {
                        warn!(file = %name, "SHA256 mismatch");
                    }
                    if name.ends_with(PACKAGES) {
                        fetched_plain.insert(name);
                    }
                }
                Err(err) if name.ends_with(PACKAGES) => {
                    debug!(file = %name, "Plain index unavailable, will check compressed copy: {:#}", err);
                    unchecked.push((location, file));
                }
                Err(err) if name.ends_with(".gz") || name.ends_with(".xz") => {
                    warn!(file = %name, "Failed to download compressed index: {:#}", err);
                }
                Err(source) => return Err(SyncError::Fetch { location, source }),
            }
        }

        for (location, file) in unchecked {
            info!("Processing special file {}", location);
            let compressed = self.local(&format!("{}.gz", location))?;
            if !exists(&compressed).await {
                return Err(SyncError::MissingCompressedFallback { location });
            }
            if !verify_stored_file(compressed, file.sha256.clone(), Compression::Gzip).await {
                warn!(file = %location, "SHA256 mismatch");
            }
        }

        Ok(fetched_plain)
    }

    async fn read_package_indices(&self, fetched_plain: &BTreeSet<String>) -> Result<FileTable, SyncError> {
        let mut packages = FileTable::new();

        for dir in self.spec.binary_index_dirs() {
            let name = format!("{}/{}", dir, PACKAGES);
            let plain = self.local(&self.spec.dist_location(&name))?;
            let compressed = self.local(&self.spec.dist_location(&format!("{}.gz", name)))?;

            let (path, compression) = if fetched_plain.contains(&name) {
                (plain, Compression::None)
            } else if exists(&compressed).await {
                (compressed, Compression::Gzip)
            } else {
                return Err(SyncError::MissingPackageIndex { index: name });
            };
            debug!(index = %path.display(), ?compression, "Reading package index");

            let files = tokio::task::spawn_blocking(move || {
                parse_packages_file(&path, compression).map_err(|source| SyncError::Index { path, source })
            })
            .await??;

            info!("{}: {} package files", dir, files.len());
            merge_file_tables(&mut packages, files);
        }

        Ok(packages)
    }

    async fn download_packages(&self, packages: FileTable) -> DownloadSummary {
        let jobs = packages.into_iter().filter_map(|(filename, file)| {
            if filename.is_empty() {
                warn!("Skipping package record without a Filename field");
                return None;
            }
            let location = self.spec.pool_location(&filename);
            let job = self.spec.remote_url(&location).and_then(|remote_url| {
                Ok(DownloadJob {
                    file,
                    remote_url,
                    local_path: local_path(&self.root, &location)?,
                })
            });
            match job {
                Ok(job) => Some(job),
                Err(err) => {
                    warn!(file = %filename, "Skipping package: {:#}", err);
                    None
                }
            }
        });

        DownloadPool::new(self.fetcher.clone(), self.download_workers)
            .run(jobs)
            .await
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
