use crate::error::{HttpError, Result};
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256, Sha512};

/// Incremental verification of a downloaded body against the digests and
/// size the caller expects. Bytes are hashed as they stream past.
pub(crate) struct ChecksumVerifier {
    sha512: Option<(Sha512, String)>,
    sha256: Option<(Sha256, String)>,
    expected_size: Option<u64>,
    received: u64,
}

impl ChecksumVerifier {
    /// `sha512` is base64 encoded, `sha256` hex encoded.
    pub(crate) fn new(
        sha512: Option<&str>,
        sha256: Option<&str>,
        expected_size: Option<u64>,
    ) -> Self {
        Self {
            sha512: sha512.map(|expected| (Sha512::new(), expected.to_string())),
            sha256: sha256.map(|expected| (Sha256::new(), expected.to_ascii_lowercase())),
            expected_size,
            received: 0,
        }
    }

    pub(crate) fn update(&mut self, chunk: &[u8]) {
        self.received += chunk.len() as u64;
        if let Some((hasher, _)) = &mut self.sha512 {
            hasher.update(chunk);
        }
        if let Some((hasher, _)) = &mut self.sha256 {
            hasher.update(chunk);
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        if let Some(expected) = self.expected_size {
            if expected != self.received {
                return Err(HttpError::SizeMismatch {
                    expected,
                    actual: self.received,
                });
            }
        }

        if let Some((hasher, expected)) = self.sha512 {
            let actual = general_purpose::STANDARD.encode(hasher.finalize());
            if actual != expected {
                return Err(HttpError::ChecksumMismatch {
                    algorithm: "sha512",
                    expected,
                    actual,
                });
            }
        }

        if let Some((hasher, expected)) = self.sha256 {
            let actual = hex::encode(hasher.finalize());
            if actual != expected {
                return Err(HttpError::ChecksumMismatch {
                    algorithm: "sha256",
                    expected,
                    actual,
                });
            }
        }

        Ok(())
    }
}
