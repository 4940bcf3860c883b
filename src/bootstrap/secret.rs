use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};

use super::BootstrapError;

/// Length of the raw bootstrap secret.
pub const SECRET_LEN: usize = 32;

/// One-time secret shared by the container and the bootstrap exchange.
///
/// Stored base64-encoded, which is the form the server reads from its
/// environment.
pub struct BootstrapSecret(SecretString);

impl BootstrapSecret {
    /// Fresh random secret.
    pub fn generate() -> Self {
        let mut raw = [0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut raw);
        Self::from_bytes(&raw)
    }

    pub fn from_bytes(raw: &[u8]) -> Self {
        Self(SecretString::from(STANDARD.encode(raw)))
    }

    /// Wrap an already-encoded secret.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(SecretString::from(encoded.into()))
    }

    /// Encoded form, as placed in the container environment.
    pub fn encoded(&self) -> &str {
        self.0.expose_secret()
    }

    /// Raw bytes, as used to key the bootstrap token.
    pub fn decode(&self) -> Result<Vec<u8>, BootstrapError> {
        STANDARD
            .decode(self.0.expose_secret())
            .map_err(BootstrapError::InvalidSecret)
    }
}

impl std::fmt::Debug for BootstrapSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BootstrapSecret([REDACTED])")
    }
}
