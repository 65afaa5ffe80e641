use crate::error::AptMirrorError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_download_workers() -> usize {
    8
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root that downloads are mirrored into.
    pub skel_path: PathBuf,
    /// Root that a completed mirror is published to.
    pub dest_path: PathBuf,
    #[serde(default = "default_download_workers")]
    pub download_workers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Repository base, e.g. `archive.ubuntu.com/ubuntu`.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    pub distribution: String,
    pub architectures: Vec<String>,
    pub components: Vec<String>,
    #[serde(default)]
    pub disable_signature_check: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_key_file: Option<PathBuf>,
    #[serde(default)]
    pub disabled: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), AptMirrorError> {
        if self.download_workers == 0 {
            return Err(AptMirrorError::ConfigValidation {
                details: "download_workers must be greater than 0".to_string(),
            });
        }
        if self.repositories.is_empty() {
            return Err(AptMirrorError::ConfigValidation {
                details: "No repositories defined in config".to_string(),
            });
        }
        for (index, repository) in self.repositories.iter().enumerate() {
            repository
                .validate()
                .map_err(|details| AptMirrorError::ConfigValidation {
                    details: format!("repositories[{}]: {}", index, details),
                })?;
        }
        Ok(())
    }
}

impl RepositoryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.url.trim_end_matches('/').trim().is_empty() {
            return Err("url must not be empty".to_string());
        }
        if self.distribution.trim().is_empty() {
            return Err(format!("{}: distribution must not be empty", self.url));
        }
        if self.architectures.is_empty() {
            return Err(format!("{}: no architectures configured", self.url));
        }
        if self.components.is_empty() {
            return Err(format!("{}: no components configured", self.url));
        }
        Ok(())
    }
}
