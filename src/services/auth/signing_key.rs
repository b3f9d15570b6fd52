use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

/// Shorter HMAC secrets still work but weaken HS256.
const RECOMMENDED_MIN_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum SigningKeyError {
    #[error("signing key material is empty")]
    Empty,

    #[error("failed to generate signing key: {0}")]
    Random(String),
}

/// Process-wide HMAC secret used to sign and verify access tokens.
///
/// - Loaded (or generated) once at startup and shared read-only.
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct SigningKey {
    secret: Arc<[u8]>,
}

impl SigningKey {
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self, SigningKeyError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SigningKeyError::Empty);
        }
        if secret.len() < RECOMMENDED_MIN_LEN {
            warn!(
                len = secret.len(),
                "signing key is shorter than recommended ({} bytes)", RECOMMENDED_MIN_LEN
            );
        }

        Ok(Self {
            secret: Arc::from(secret),
        })
    }

    /// Fresh random key. Tokens signed with it do not survive a restart.
    pub fn generate() -> Result<Self, SigningKeyError> {
        let mut bytes = [0u8; RECOMMENDED_MIN_LEN];
        getrandom::fill(&mut bytes).map_err(|e| SigningKeyError::Random(e.to_string()))?;

        Ok(Self {
            secret: Arc::from(&bytes[..]),
        })
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("SigningKey")
            .field("len", &self.secret.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            SigningKey::from_secret(""),
            Err(SigningKeyError::Empty)
        ));
    }

    #[test]
    fn generated_keys_differ() {
        let a = SigningKey::generate().unwrap();
        let b = SigningKey::generate().unwrap();
        assert_eq!(a.as_bytes().len(), 32);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key = SigningKey::from_secret("super-secret-value-that-is-long-enough").unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("len"));
    }
}
