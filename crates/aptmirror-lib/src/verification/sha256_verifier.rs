use digest::Digest;
use sha2::Sha256;
use std::io::{self, Read};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Verification failed: expected {expected}, got {actual}")]
    VerificationFailed { expected: String, actual: String },

    #[error("Failed to read content: {0}")]
    Read(#[from] io::Error),
}

/// Incremental SHA-256 check against a hex digest taken from repository metadata.
pub struct Sha256Verifier {
    hasher: Sha256,
    expected_digest: String,
}

impl Sha256Verifier {
    #[inline]
    pub fn new(expected_hex_digest: &str) -> Self {
        Self {
            hasher: Sha256::new(),
            expected_digest: expected_hex_digest.trim().to_ascii_lowercase(),
        }
    }

    /// Feeds the reader to the hasher until it is exhausted.
    pub fn consume(&mut self, mut reader: impl Read) -> Result<u64, VerificationError> {
        Ok(io::copy(&mut reader, &mut self.hasher)?)
    }

    pub fn verify(self) -> Result<(), VerificationError> {
        let actual_digest = hex::encode(self.hasher.finalize());

        if actual_digest == self.expected_digest {
            Ok(())
        } else {
            Err(VerificationError::VerificationFailed {
                expected: self.expected_digest,
                actual: actual_digest,
            })
        }
    }
}

/// Lowercase hex SHA-256 of everything `reader` yields.
pub fn sha256_hex(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
