//! Relevance filtering
//!
//! Reduces a decomposed parameter map to the entries that take part in the
//! cache hash. Decisions are made per top-level name; nested values travel
//! as one opaque value.

use crate::params::{ParameterMap, ParameterValue};
use crate::policy::{Policy, is_reserved};
use crate::secret::{ENCRYPTION_KEY_PARAMETER, SecretKey};

/// Why a parameter was left out of the relevant set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Built-in system parameter
    Reserved,
    /// Whitelist mode and not on the whitelist
    NotWhitelisted,
    /// Listed in the configured exclusions
    Excluded,
    /// Empty value not allowed for this name
    EmptyValue,
}

impl Exclusion {
    /// Short label for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::NotWhitelisted => "not_whitelisted",
            Self::Excluded => "excluded",
            Self::EmptyValue => "empty_value",
        }
    }
}

/// Decide whether a single top-level parameter is dropped.
///
/// Returns `None` when the parameter is relevant.
#[must_use]
pub fn exclusion(name: &str, value: &ParameterValue, policy: &Policy) -> Option<Exclusion> {
    if is_reserved(name, value) {
        return Some(Exclusion::Reserved);
    }

    if policy.is_whitelist_mode() {
        if !policy.is_whitelisted(name) {
            return Some(Exclusion::NotWhitelisted);
        }
    } else if policy.is_excluded(name) {
        return Some(Exclusion::Excluded);
    }

    if value.is_empty() && !policy.is_allowed_with_empty_value(name) {
        return Some(Exclusion::EmptyValue);
    }

    None
}

/// Filter a decomposed map down to its relevant parameters.
///
/// When at least one parameter survives, the secret is injected as the
/// first entry under [`ENCRYPTION_KEY_PARAMETER`]; otherwise the result is
/// empty. Surviving values keep their original order and are not sorted.
#[must_use]
pub fn filter(map: &ParameterMap, policy: &Policy, secret: &SecretKey) -> ParameterMap {
    let mut relevant = ParameterMap::with_capacity(map.len() + 1);
    relevant.insert(
        ENCRYPTION_KEY_PARAMETER.to_string(),
        ParameterValue::Text(secret.expose().to_string()),
    );

    for (name, value) in map {
        match exclusion(name, value, policy) {
            Some(reason) => {
                tracing::debug!(parameter = %name, reason = reason.as_str(), "Parameter not relevant");
            }
            None => {
                relevant.insert(name.clone(), value.clone());
            }
        }
    }

    if relevant.len() == 1 {
        relevant.clear();
    }
    relevant
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::decompose;

    fn keys(map: &ParameterMap) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    fn policy() -> Policy {
        Policy::builder()
            .excluded_parameters(["exclude1", "exclude2"])
            .require_presence_parameters(["req1", "req2"])
            .build()
            .unwrap()
    }

    fn secret() -> SecretKey {
        SecretKey::new("K")
    }

    #[test]
    fn test_empty_stays_empty() {
        assert!(filter(&decompose(""), &policy(), &secret()).is_empty());
    }

    #[test]
    fn test_secret_injected_first() {
        let relevant = filter(&decompose("key1=v&key2=v"), &policy(), &secret());
        assert_eq!(keys(&relevant), vec!["encryptionKey", "key1", "key2"]);
        assert_eq!(relevant["encryptionKey"].as_text(), Some("K"));
    }

    #[test]
    fn test_system_and_excluded_dropped() {
        let relevant = filter(
            &decompose("id=1&type=3&exclude1=x&no_cache=1"),
            &policy(),
            &secret(),
        );
        assert!(relevant.is_empty());

        let relevant = filter(&decompose("id=1&type=3&key=x&no_cache=1"), &policy(), &secret());
        assert_eq!(keys(&relevant), vec!["encryptionKey", "key"]);
    }

    #[test]
    fn test_supplied_encryption_key_cannot_override_secret() {
        let relevant = filter(&decompose("encryptionKey=evil&key=v"), &policy(), &secret());
        assert_eq!(relevant["encryptionKey"].as_text(), Some("K"));
        assert!(filter(&decompose("encryptionKey=evil"), &policy(), &secret()).is_empty());
    }

    #[test]
    fn test_admin_panel_dropped() {
        let relevant = filter(
            &decompose("TSFE_ADMIN_PANEL[display]=7&key=value"),
            &policy(),
            &secret(),
        );
        assert_eq!(keys(&relevant), vec!["encryptionKey", "key"]);
    }

    #[test]
    fn test_nested_values_kept_whole() {
        let relevant = filter(&decompose("tx_news[news]=4&tx_news[action]=show"), &policy(), &secret());
        let news = relevant["tx_news"].as_nested().unwrap();
        assert_eq!(news.len(), 2);
    }

    #[test]
    fn test_whitelist_ignores_exclusions() {
        let policy = Policy::builder()
            .excluded_parameters(["whitep1"])
            .whitelist(["whitep1", "whitep2"])
            .build()
            .unwrap();
        let relevant = filter(&decompose("whitep1=a&black=b&whitep2=c"), &policy, &secret());
        assert_eq!(keys(&relevant), vec!["encryptionKey", "whitep1", "whitep2"]);
    }

    #[test]
    fn test_whitelist_does_not_admit_reserved() {
        let policy = Policy::builder().whitelist(["id", "key"]).build().unwrap();
        let relevant = filter(&decompose("id=1&key=2"), &policy, &secret());
        assert_eq!(keys(&relevant), vec!["encryptionKey", "key"]);
    }

    #[test]
    fn test_empty_values_default_kept() {
        let relevant = filter(&decompose("key1=v&key2=&key3="), &policy(), &secret());
        assert_eq!(keys(&relevant), vec!["encryptionKey", "key1", "key2", "key3"]);
    }

    #[test]
    fn test_excluded_if_empty_with_and_without_equals() {
        let policy = Policy::builder().excluded_if_empty(["key2"]).build().unwrap();
        for raw in ["key1=v&key2=&key3=", "key1=v&key2&key3"] {
            let relevant = filter(&decompose(raw), &policy, &secret());
            assert_eq!(keys(&relevant), vec!["encryptionKey", "key1", "key3"], "{raw}");
        }
        let relevant = filter(&decompose("key2=filled"), &policy, &secret());
        assert_eq!(keys(&relevant), vec!["encryptionKey", "key2"]);
    }

    #[test]
    fn test_exclude_all_empty_overrides_whitelist() {
        let policy = Policy::builder()
            .whitelist(["key1", "key2"])
            .exclude_all_empty_parameters(true)
            .build()
            .unwrap();
        let relevant = filter(&decompose("key1=v&key2=&key3=x"), &policy, &secret());
        assert_eq!(keys(&relevant), vec!["encryptionKey", "key1"]);
    }

    #[test]
    fn test_exclusion_reasons() {
        let policy = policy();
        let leaf = ParameterValue::from("x");
        assert_eq!(exclusion("id", &leaf, &policy), Some(Exclusion::Reserved));
        assert_eq!(exclusion("exclude2", &leaf, &policy), Some(Exclusion::Excluded));
        assert_eq!(exclusion("key", &leaf, &policy), None);
    }
}
