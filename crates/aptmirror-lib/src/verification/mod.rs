pub mod sha256_verifier;

pub use sha256_verifier::{Sha256Verifier, VerificationError, sha256_hex};

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// How a stored artifact is encoded on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

/// Returns true iff the SHA-256 of everything `reader` yields matches `expected_hex`.
///
/// Read failures are logged and reported as a mismatch.
pub fn verify_reader(reader: impl Read, expected_hex: &str) -> bool {
    let mut verifier = Sha256Verifier::new(expected_hex);
    if let Err(err) = verifier.consume(reader) {
        tracing::warn!("Failed to read content for verification: {:#}", err);
        return false;
    }
    match verifier.verify() {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!("{}", err);
            false
        }
    }
}

/// Like [`verify_reader`], but hashes the decompressed content of a gzip stream.
pub fn verify_gzip_reader(reader: impl Read, expected_hex: &str) -> bool {
    verify_reader(GzDecoder::new(reader), expected_hex)
}

pub fn verify_file(path: impl AsRef<Path>, expected_hex: &str) -> bool {
    verify_stored(path.as_ref(), expected_hex, Compression::None)
}

pub fn verify_gzip_file(path: impl AsRef<Path>, expected_hex: &str) -> bool {
    verify_stored(path.as_ref(), expected_hex, Compression::Gzip)
}

fn verify_stored(path: &Path, expected_hex: &str, compression: Compression) -> bool {
    let file = match File::open(path) {
        Ok(file) => BufReader::new(file),
        Err(err) => {
            tracing::warn!(path = %path.display(), "Failed to open file for verification: {}", err);
            return false;
        }
    };

    match compression {
        Compression::None => verify_reader(file, expected_hex),
        Compression::Gzip => verify_gzip_reader(file, expected_hex),
    }
}

/// Verifies a stored file on the blocking thread pool.
pub async fn verify_stored_file(path: PathBuf, expected_hex: String, compression: Compression) -> bool {
    tokio::task::spawn_blocking(move || match compression {
        Compression::None => verify_file(&path, &expected_hex),
        Compression::Gzip => verify_gzip_file(&path, &expected_hex),
    })
    .await
    .unwrap_or_else(|err| {
        tracing::warn!("Verification task failed: {}", err);
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression as GzLevel;
    use flate2::write::GzEncoder;
    use std::io::{self, Write};

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("connection reset"))
        }
    }

    #[test]
    fn test_verify_reader_matches_only_exact_digest() {
        assert!(verify_reader(&b"hello"[..], HELLO_SHA256));
        assert!(verify_reader(&b"hello"[..], &HELLO_SHA256.to_uppercase()));
        assert!(!verify_reader(&b"hello!"[..], HELLO_SHA256));
        assert!(!verify_reader(&b"hello"[..], "deadbeef"));
    }

    #[test]
    fn test_verify_reader_empty_stream() {
        let empty = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert!(verify_reader(io::empty(), empty));
    }

    #[test]
    fn test_read_failure_is_a_mismatch() {
        assert!(!verify_reader(FailingReader, HELLO_SHA256));
    }

    #[test]
    fn test_verify_gzip_reader_hashes_decompressed_content() {
        let compressed = gzip(b"hello");
        assert!(verify_gzip_reader(compressed.as_slice(), HELLO_SHA256));
        // The compressed bytes themselves do not hash to the plain digest.
        assert!(!verify_reader(compressed.as_slice(), HELLO_SHA256));
    }

    #[test]
    fn test_verify_gzip_reader_rejects_non_gzip_input() {
        assert!(!verify_gzip_reader(&b"hello"[..], HELLO_SHA256));
    }

    #[test]
    fn test_verify_files_from_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plain = temp_dir.path().join("Packages");
        let compressed = temp_dir.path().join("Packages.gz");
        std::fs::write(&plain, b"hello").unwrap();
        std::fs::write(&compressed, gzip(b"hello")).unwrap();

        assert!(verify_file(&plain, HELLO_SHA256));
        assert!(verify_gzip_file(&compressed, HELLO_SHA256));
        assert!(!verify_file(&compressed, HELLO_SHA256));
        assert!(!verify_file(temp_dir.path().join("missing"), HELLO_SHA256));
    }

    #[tokio::test]
    async fn test_verify_stored_file_on_blocking_pool() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("pkg.deb");
        std::fs::write(&path, b"hello").unwrap();

        assert!(verify_stored_file(path.clone(), HELLO_SHA256.to_string(), Compression::None).await);
        assert!(!verify_stored_file(path, HELLO_SHA256.to_string(), Compression::Gzip).await);
    }
}
