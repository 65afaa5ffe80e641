use crate::cli::args::Command;
use crate::cli::params::SyncParams;
use crate::config::load_config;
use crate::error::AptMirrorError;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Sync(SyncParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, AptMirrorError> {
    match command {
        Command::Sync {
            config_path,
            download_workers,
            request_timeout_secs,
        } => {
            for (name, value) in [
                ("download-workers", download_workers.map(|v| v as u64)),
                ("request-timeout", request_timeout_secs),
            ] {
                if value == Some(0) {
                    return Err(AptMirrorError::CliArgumentValidation {
                        details: format!("{name} must be greater than 0."),
                    });
                }
            }

            let mut app_config = load_config(&config_path)?;
            if let Some(download_workers) = download_workers {
                app_config.download_workers = download_workers;
            }
            if request_timeout_secs.is_some() {
                app_config.request_timeout_secs = request_timeout_secs;
            }
            app_config.validate()?;

            Ok(ResolvedCommand::Sync(SyncParams { app_config }))
        }
    }
}
