use super::Config;
use crate::error::AptMirrorError;
use config::Config as ConfigBuilder;

pub fn load_config(config_path: &str) -> Result<Config, AptMirrorError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::with_name(config_path))
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"
skel_path = "mirror/skel"
dest_path = "mirror/dest"
download_workers = 4

[[repositories]]
url = "archive.ubuntu.com/ubuntu/"
distribution = "noble"
architectures = ["amd64", "arm64"]
components = ["main"]

[[repositories]]
url = "deb.debian.org/debian"
scheme = "https"
distribution = "bookworm"
architectures = ["amd64"]
components = ["main", "contrib"]
disable_signature_check = true
disabled = true
"#;

    fn write_config(contents: &str, name: &str) -> (tempfile::TempDir, String) {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        let path = path.to_str().unwrap().to_string();
        (temp_dir, path)
    }

    #[test]
    fn test_load_toml_config() {
        let (_temp_dir, path) = write_config(SAMPLE, "config.toml");
        let config = load_config(&path).unwrap();

        assert_eq!(config.skel_path, PathBuf::from("mirror/skel"));
        assert_eq!(config.download_workers, 4);
        assert_eq!(config.request_timeout_secs, None);
        assert_eq!(config.repositories.len(), 2);

        let ubuntu = &config.repositories[0];
        assert_eq!(ubuntu.scheme, None);
        assert!(!ubuntu.disable_signature_check);
        assert!(!ubuntu.disabled);
        assert_eq!(ubuntu.architectures, vec!["amd64", "arm64"]);

        let debian = &config.repositories[1];
        assert_eq!(debian.scheme.as_deref(), Some("https"));
        assert!(debian.disable_signature_check);
        assert!(debian.disabled);

        config.validate().unwrap();
    }

    #[test]
    fn test_download_workers_default() {
        let contents = SAMPLE.replace("download_workers = 4\n", "");
        let (_temp_dir, path) = write_config(&contents, "config.toml");
        assert_eq!(load_config(&path).unwrap().download_workers, 8);
    }

    #[test]
    fn test_load_json_config() {
        let json = serde_json::json!({
            "skel_path": "skel",
            "dest_path": "dest",
            "repositories": [{
                "url": "archive.ubuntu.com/ubuntu",
                "distribution": "noble",
                "architectures": ["amd64"],
                "components": ["main"]
            }]
        });
        let (_temp_dir, path) = write_config(&json.to_string(), "config.json");
        let config = load_config(&path).unwrap();
        assert_eq!(config.repositories[0].distribution, "noble");
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let contents = format!("{}\n[extra]\nvalue = 1\n", SAMPLE);
        let (_temp_dir, path) = write_config(&contents, "config.toml");
        assert!(matches!(load_config(&path), Err(AptMirrorError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        assert!(matches!(
            load_config("/nonexistent/aptmirror.toml"),
            Err(AptMirrorError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let contents = SAMPLE.replace("download_workers = 4", "download_workers = 0");
        let (_temp_dir, path) = write_config(&contents, "config.toml");
        let err = load_config(&path).unwrap().validate().unwrap_err();
        assert!(matches!(err, AptMirrorError::ConfigValidation { .. }));
    }

    #[test]
    fn test_validate_rejects_repository_without_components() {
        let contents = SAMPLE.replace("components = [\"main\"]\n", "components = []\n");
        let (_temp_dir, path) = write_config(&contents, "config.toml");
        let err = load_config(&path).unwrap().validate().unwrap_err();
        match err {
            AptMirrorError::ConfigValidation { details } => {
                assert!(details.starts_with("repositories[0]"), "{}", details)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
