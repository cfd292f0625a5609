//! Presence validation
//!
//! Independent of relevance filtering: only the policy's
//! `requirePresenceParameters` decide whether a cache hash is demanded.

use crate::params::{ParameterMap, decompose};
use crate::policy::Policy;

/// Whether any top-level parameter of `raw` demands a cache hash.
#[must_use]
pub fn requires_fingerprint(raw: &str, policy: &Policy) -> bool {
    map_requires_fingerprint(&decompose(raw), policy)
}

/// Same as [`requires_fingerprint`] for an already decomposed map.
#[must_use]
pub fn map_requires_fingerprint(map: &ParameterMap, policy: &Policy) -> bool {
    map.keys().any(|name| policy.requires_presence(name))
}
