use crate::index::FileDescriptor;
use std::ops::AddAssign;
use std::path::PathBuf;
use url::Url;

/// A file to download, bound to where it comes from and where it goes.
#[derive(Clone, Debug)]
pub struct DownloadJob {
    pub file: FileDescriptor,
    pub remote_url: Url,
    pub local_path: PathBuf,
}

/// Tally of a pool run. Informational only: failures are logged as they happen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub jobs: usize,
    pub downloaded: usize,
    pub bytes: u64,
    pub fetch_failures: usize,
    pub size_mismatches: usize,
    pub hash_mismatches: usize,
}

impl AddAssign for DownloadSummary {
    fn add_assign(&mut self, other: Self) {
        self.jobs += other.jobs;
        self.downloaded += other.downloaded;
        self.bytes += other.bytes;
        self.fetch_failures += other.fetch_failures;
        self.size_mismatches += other.size_mismatches;
        self.hash_mismatches += other.hash_mismatches;
    }
}
