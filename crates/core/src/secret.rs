//! The installation secret mixed into every cache hash

use secrecy::{ExposeSecret, SecretString};

/// Name under which the secret is injected into the relevant parameters.
pub const ENCRYPTION_KEY_PARAMETER: &str = "encryptionKey";

/// Secret key injected into every fingerprint computation.
///
/// Wraps `secrecy::SecretString` so that:
/// - the value is zeroed from memory when dropped
/// - `Debug` and `Display` print `[REDACTED]`
/// - reading it requires an explicit [`SecretKey::expose`]
///
/// An empty key still hashes deterministically but gives no protection;
/// loaders should reject it as a configuration error.
#[derive(Clone)]
pub struct SecretKey {
    inner: SecretString,
}

impl SecretKey {
    /// Wrap a key value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: SecretString::from(value.into()),
        }
    }

    /// Expose the key for hashing.
    ///
    /// The exposed value must not be logged or persisted.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Check if the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}
