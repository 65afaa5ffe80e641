use crate::cli::SyncParams;
use crate::download::DownloadSummary;
use crate::error::AptMirrorError;
use crate::fetch::{HttpFetcher, HttpFetcherOptions};
use crate::repository::RepositorySpec;
use crate::sync::RepositorySync;
use crate::utils::ensure_dir;
use std::sync::Arc;
use std::time::Duration;

/// Mirrors every enabled repository in configuration order.
///
/// Stops at the first repository that fails before its package downloads.
/// Returns the download summary of each synchronized repository.
pub async fn run_sync(params: SyncParams) -> Result<Vec<DownloadSummary>, AptMirrorError> {
    let SyncParams { app_config } = params;
    tracing::debug!("Configuration: {:#?}", app_config);

    for path in [&app_config.skel_path, &app_config.dest_path] {
        ensure_dir(path)
            .await
            .map_err(|e| AptMirrorError::DirectoryCreation {
                path: path.clone(),
                reason: e.to_string(),
            })?;
    }

    let fetcher = Arc::new(HttpFetcher::new(HttpFetcherOptions {
        request_timeout: app_config.request_timeout_secs.map(Duration::from_secs),
        ..HttpFetcherOptions::default()
    })?);

    tracing::info!("Downloading repos");
    let mut summaries = Vec::new();
    for repository in app_config.repositories.iter() {
        if repository.disabled {
            tracing::info!("Skipping {}, repo disabled", repository.url);
            continue;
        }

        let spec = RepositorySpec::from(repository);
        tracing::info!(
            "Synchronizing {} {} ({})",
            spec.base,
            spec.distribution,
            spec.architectures.join(", ")
        );

        let summary = RepositorySync::new(
            spec,
            fetcher.clone(),
            &app_config.skel_path,
            app_config.download_workers,
        )
        .run()
        .await
        .map_err(|source| AptMirrorError::Sync {
            repository: repository.url.clone(),
            source,
        })?;
        summaries.push(summary);
    }

    tracing::info!("Finished downloading");
    Ok(summaries)
}
