use crate::config::RepositoryConfig;
use crate::fetch::{DEFAULT_SCHEME, FetchError, remote_url};
use crate::index::ReleaseRequirements;
use itertools::Itertools;
use std::path::PathBuf;
use url::Url;

/// The distribution files fetched before anything else, in fetch order.
pub const DIST_INDEX_FILES: [&str; 3] = ["InRelease", "Release", "Release.gpg"];

/// One repository/distribution to mirror, normalized from its configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositorySpec {
    pub scheme: String,
    /// Host and path without scheme or trailing `/`, e.g. `archive.ubuntu.com/ubuntu`.
    pub base: String,
    pub distribution: String,
    pub architectures: Vec<String>,
    pub components: Vec<String>,
    pub verify_signature: bool,
    pub signature_key_file: Option<PathBuf>,
}

impl From<&RepositoryConfig> for RepositorySpec {
    fn from(config: &RepositoryConfig) -> Self {
        let configured_scheme = config
            .scheme
            .as_deref()
            .filter(|scheme| !scheme.is_empty())
            .unwrap_or(DEFAULT_SCHEME);

        let url = config.url.trim();
        let (scheme, base) = match url.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => (configured_scheme, url),
        };

        Self {
            scheme: scheme.to_string(),
            base: base.trim_end_matches('/').to_string(),
            distribution: config.distribution.trim_matches('/').to_string(),
            architectures: config.architectures.clone(),
            components: config.components.clone(),
            verify_signature: !config.disable_signature_check,
            signature_key_file: config.signature_key_file.clone(),
        }
    }
}

impl RepositorySpec {
    /// `<base>/dists/<dist>/<name>`
    pub fn dist_location(&self, name: &str) -> String {
        format!("{}/dists/{}/{}", self.base, self.distribution, name)
    }

    /// `<base>/<filename>` for a `Filename` field of a package index.
    pub fn pool_location(&self, filename: &str) -> String {
        let filename = filename.strip_prefix("./").unwrap_or(filename);
        format!("{}/{}", self.base, filename.trim_start_matches('/'))
    }

    pub fn remote_url(&self, location: &str) -> Result<Url, FetchError> {
        remote_url(&self.scheme, location)
    }

    pub fn release_requirements(&self) -> ReleaseRequirements {
        ReleaseRequirements {
            architectures: self.architectures.clone(),
            components: self.components.clone(),
        }
    }

    /// `<component>/binary-<arch>` for every requested pair, component-major.
    pub fn binary_index_dirs(&self) -> Vec<String> {
        self.components
            .iter()
            .cartesian_product(self.architectures.iter())
            .map(|(component, arch)| format!("{}/binary-{}", component, arch))
            .collect()
    }
}
