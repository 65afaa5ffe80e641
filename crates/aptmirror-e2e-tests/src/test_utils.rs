use aptmirror_lib::config::{Config, RepositoryConfig};
use eyre::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DISTRIBUTION: &str = "stable";

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// A package served by a [`FakeRepository`].
#[derive(Clone, Debug)]
pub struct FakePackage {
    pub component: String,
    pub architecture: String,
    pub filename: String,
    pub contents: Vec<u8>,
    /// Serve the package, or answer 404 for it.
    pub served: bool,
}

impl FakePackage {
    pub fn new(component: &str, architecture: &str, name: &str) -> Self {
        let prefix = name.chars().next().unwrap_or('_');
        Self {
            component: component.to_string(),
            architecture: architecture.to_string(),
            filename: format!("pool/{}/{}/{}_1.0_{}.deb", component, prefix, name, architecture),
            contents: format!("contents of {} for {}", name, architecture).into_bytes(),
            served: true,
        }
    }

    pub fn missing(mut self) -> Self {
        self.served = false;
        self
    }
}

/// An APT repository served over HTTP by a mock server.
///
/// The distribution index lists a plain and a gzip `Packages` index for every
/// component/architecture, but only the gzip one is served, like most
/// public mirrors.
pub struct FakeRepository {
    pub server: MockServer,
    pub architectures: Vec<String>,
    pub components: Vec<String>,
    pub packages: Vec<FakePackage>,
}

impl FakeRepository {
    pub async fn start(architectures: &[&str], components: &[&str], packages: Vec<FakePackage>) -> Result<Self> {
        let repository = Self {
            server: MockServer::start().await,
            architectures: architectures.iter().map(|s| s.to_string()).collect(),
            components: components.iter().map(|s| s.to_string()).collect(),
            packages,
        };
        repository.mount().await?;
        Ok(repository)
    }

    /// Repository base as it appears in configuration, without scheme.
    pub fn base(&self) -> String {
        format!("{}/debian", self.server.address())
    }

    fn packages_index(&self, component: &str, architecture: &str) -> String {
        self.packages
            .iter()
            .filter(|p| p.component == component && p.architecture == architecture)
            .map(|p| {
                format!(
                    "Package: {}\nArchitecture: {}\nFilename: {}\nSize: {}\nSHA256: {}\nDescription: test package\n long description\n .\n more\n\n",
                    p.filename.rsplit('/').next().unwrap_or_default(),
                    p.architecture,
                    p.filename,
                    p.contents.len(),
                    sha256_hex(&p.contents),
                )
            })
            .collect()
    }

    async fn serve(&self, at: &str, body: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(format!("/debian/{}", at)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&self.server)
            .await;
    }

    async fn mount(&self) -> Result<()> {
        let mut hashes = String::new();

        for component in &self.components {
            for architecture in &self.architectures {
                let dir = format!("{}/binary-{}", component, architecture);
                let plain = self.packages_index(component, architecture).into_bytes();
                let compressed = gzip(&plain)?;
                let release = format!(
                    "Archive: {}\nComponent: {}\nArchitecture: {}\n",
                    DISTRIBUTION, component, architecture
                )
                .into_bytes();

                for (name, data) in [
                    ("Packages", &plain),
                    ("Packages.gz", &compressed),
                    ("Release", &release),
                ] {
                    hashes.push_str(&format!(" {} {:>8} {}/{}\n", sha256_hex(data), data.len(), dir, name));
                }

                self.serve(&format!("dists/{}/{}/Packages.gz", DISTRIBUTION, dir), compressed)
                    .await;
                self.serve(&format!("dists/{}/{}/Release", DISTRIBUTION, dir), release)
                    .await;
            }
        }

        let release = format!(
            "Origin: Test\nSuite: {}\nArchitectures: {}\nComponents: {}\nDate: Thu, 01 Jan 2026 00:00:00 UTC\nSHA256:\n{}",
            DISTRIBUTION,
            self.architectures.join(" "),
            self.components.join(" "),
            hashes,
        );
        let in_release = format!(
            "-----BEGIN PGP SIGNED MESSAGE-----\nHash: SHA512\n\n{}-----BEGIN PGP SIGNATURE-----\n\n-----END PGP SIGNATURE-----\n",
            release
        );

        self.serve(&format!("dists/{}/Release", DISTRIBUTION), release.into_bytes())
            .await;
        self.serve(&format!("dists/{}/InRelease", DISTRIBUTION), in_release.into_bytes())
            .await;
        self.serve(&format!("dists/{}/Release.gpg", DISTRIBUTION), b"signature".to_vec())
            .await;

        for package in self.packages.iter().filter(|p| p.served) {
            self.serve(&package.filename, package.contents.clone()).await;
        }

        Ok(())
    }

    pub fn repository_config(&self, architectures: &[&str], components: &[&str]) -> RepositoryConfig {
        RepositoryConfig {
            url: self.base(),
            scheme: Some("http".to_string()),
            distribution: DISTRIBUTION.to_string(),
            architectures: architectures.iter().map(|s| s.to_string()).collect(),
            components: components.iter().map(|s| s.to_string()).collect(),
            disable_signature_check: true,
            signature_key_file: None,
            disabled: false,
        }
    }

    /// Where `relative` ends up under a mirror rooted at `skel_path`.
    pub fn mirrored_path(&self, skel_path: &Path, relative: &str) -> PathBuf {
        skel_path
            .join(self.server.address().to_string())
            .join("debian")
            .join(relative)
    }
}

pub fn create_test_config(temp_dir: &Path, repositories: Vec<RepositoryConfig>) -> Config {
    Config {
        skel_path: temp_dir.join("skel"),
        dest_path: temp_dir.join("dest"),
        download_workers: 3,
        request_timeout_secs: Some(30),
        repositories,
    }
}

/// Writes a config for `repositories` as JSON into a fresh temporary directory.
pub fn setup_test_environment(repositories: Vec<RepositoryConfig>) -> Result<(TempDir, PathBuf)> {
    let temp_dir = tempfile::tempdir()?;

    let config = create_test_config(temp_dir.path(), repositories);
    let config_path = temp_dir.path().join("config.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    Ok((temp_dir, config_path))
}
