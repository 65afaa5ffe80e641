use super::types::{DownloadJob, DownloadSummary};
use crate::fetch::RemoteFetch;
use crate::verification::{Compression, verify_stored_file};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

type JobQueue = Arc<Mutex<mpsc::Receiver<DownloadJob>>>;

/// Fixed set of workers draining a bounded job queue.
///
/// A failed or mismatching download never stops the batch: problems are
/// logged where they are detected and `run` always completes.
pub struct DownloadPool<F> {
    fetcher: Arc<F>,
    concurrency: usize,
}

impl<F: RemoteFetch> DownloadPool<F> {
    pub fn new(fetcher: Arc<F>, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// Downloads and checks every job, then waits for all workers to exit.
    pub async fn run(&self, jobs: impl IntoIterator<Item = DownloadJob>) -> DownloadSummary {
        let (sender, receiver) = mpsc::channel(self.concurrency * 2);
        let queue: JobQueue = Arc::new(Mutex::new(receiver));

        let mut workers = JoinSet::new();
        for worker in 0..self.concurrency {
            let fetcher = self.fetcher.clone();
            let queue = queue.clone();
            workers.spawn(download_worker(worker, fetcher, queue));
        }

        for job in jobs {
            if sender.send(job).await.is_err() {
                warn!("All download workers exited, dropping remaining jobs");
                break;
            }
        }
        // Closing the queue lets workers exit once it is drained.
        drop(sender);

        let mut summary = DownloadSummary::default();
        while let Some(result) = workers.join_next().await {
            match result {
                Ok(worker_summary) => summary += worker_summary,
                Err(err) => warn!("Download worker failed: {}", err),
            }
        }
        summary
    }
}

async fn download_worker<F: RemoteFetch>(
    worker: usize,
    fetcher: Arc<F>,
    queue: JobQueue,
) -> DownloadSummary {
    let mut summary = DownloadSummary::default();
    loop {
        let job = queue.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };
        download_and_check(fetcher.as_ref(), job, &mut summary).await;
    }
    debug!(worker, jobs = summary.jobs, "Download worker finished");
    summary
}

async fn download_and_check<F: RemoteFetch>(
    fetcher: &F,
    job: DownloadJob,
    summary: &mut DownloadSummary,
) {
    summary.jobs += 1;
    let DownloadJob {
        file,
        remote_url,
        local_path,
    } = job;

    let size = match fetcher.fetch(&remote_url, &local_path).await {
        Ok(size) => size,
        Err(err) => {
            warn!(path = %file.path, "Download failed: {:#}", err);
            summary.fetch_failures += 1;
            return;
        }
    };
    summary.downloaded += 1;
    summary.bytes += size;

    if size != file.size {
        warn!(path = %file.path, expected = file.size, actual = size, "Incorrect size");
        summary.size_mismatches += 1;
    }

    if !verify_stored_file(local_path, file.sha256.clone(), Compression::None).await {
        warn!(path = %file.path, expected = %file.sha256, "Incorrect hash");
        summary.hash_mismatches += 1;
    }
}
