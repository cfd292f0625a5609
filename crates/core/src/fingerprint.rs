//! Cache hash generation

use sha2::{Digest, Sha256};

use crate::canonical::canonicalize;
use crate::filter::filter;
use crate::params::{ParameterMap, ParameterValue, decompose};
use crate::policy::Policy;
use crate::secret::{ENCRYPTION_KEY_PARAMETER, SecretKey};

/// Length of a cache hash in hex characters
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Hash an already filtered parameter map under `secret`.
///
/// Any `encryptionKey` entry in `relevant` is replaced by `secret`, so the
/// map may come straight from [`filter`] or from the caller's own
/// transformation. Returns the empty string when no other entry is left;
/// otherwise the SHA-256 of the canonical form as lowercase hex.
#[must_use]
pub fn fingerprint(relevant: &ParameterMap, secret: &SecretKey) -> String {
    let mut keyed = relevant.clone();
    keyed.shift_remove(ENCRYPTION_KEY_PARAMETER);
    if keyed.is_empty() {
        return String::new();
    }
    keyed.insert(
        ENCRYPTION_KEY_PARAMETER.to_string(),
        ParameterValue::Text(secret.expose().to_string()),
    );
    hex::encode(Sha256::digest(canonicalize(&keyed)))
}

/// Decompose, filter and hash a raw query string in one go.
#[must_use]
pub fn generate_for_parameters(raw: &str, policy: &Policy, secret: &SecretKey) -> String {
    fingerprint(&relevant_parameters(raw, policy, secret), secret)
}

/// Decompose and filter a raw query string without hashing.
#[must_use]
pub fn relevant_parameters(raw: &str, policy: &Policy, secret: &SecretKey) -> ParameterMap {
    filter(&decompose(raw), policy, secret)
}
