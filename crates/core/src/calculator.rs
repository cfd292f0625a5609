//! Calculator facade binding a policy to a secret key

use crate::filter::filter;
use crate::fingerprint::fingerprint;
use crate::params::{ParameterMap, ParameterValue, decompose};
use crate::policy::Policy;
use crate::presence::map_requires_fingerprint;
use crate::secret::SecretKey;
use crate::verify::{CACHE_HASH_PARAMETER, Verification};

/// Computes and checks cache hashes for one policy and secret.
///
/// Holds only borrows, so it is cheap to create per request and safe to
/// share between threads.
///
/// ```
/// use chash_core::{CacheHashCalculator, Policy, SecretKey};
///
/// let policy = Policy::builder()
///     .excluded_parameters(["utm_source"])
///     .require_presence_parameters(["page"])
///     .build()?;
/// let secret = SecretKey::new("installation-secret");
/// let calculator = CacheHashCalculator::new(&policy, &secret);
///
/// let hash = calculator.generate_for_parameters("page=2&utm_source=mail");
/// assert_eq!(hash, calculator.generate_for_parameters("page=2"));
/// assert!(calculator.requires_fingerprint("page=2"));
/// # Ok::<(), chash_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CacheHashCalculator<'a> {
    policy: &'a Policy,
    secret: &'a SecretKey,
}

impl<'a> CacheHashCalculator<'a> {
    /// Bind a policy and secret.
    ///
    /// An empty secret is accepted but logged; hashes made with it can be
    /// forged by anyone.
    #[must_use]
    pub fn new(policy: &'a Policy, secret: &'a SecretKey) -> Self {
        if secret.is_empty() {
            tracing::warn!("Cache hash secret is empty; hashes offer no protection");
        }
        Self { policy, secret }
    }

    /// The bound policy
    #[must_use]
    pub fn policy(&self) -> &'a Policy {
        self.policy
    }

    /// Relevant parameters of `raw`, secret included, unsorted.
    #[must_use]
    pub fn relevant_parameters(&self, raw: &str) -> ParameterMap {
        filter(&decompose(raw), self.policy, self.secret)
    }

    /// Cache hash for a raw query string, or `""` if nothing is relevant.
    #[must_use]
    pub fn generate_for_parameters(&self, raw: &str) -> String {
        let hash = fingerprint(&self.relevant_parameters(raw), self.secret);
        tracing::debug!(hash = %hash, "Generated cache hash");
        hash
    }

    /// Cache hash for a map the caller filtered (or post-processed) itself.
    ///
    /// The bound secret replaces any `encryptionKey` entry, and is only
    /// added when the map has other entries.
    #[must_use]
    pub fn calculate_cache_hash(&self, parameters: &ParameterMap) -> String {
        fingerprint(parameters, self.secret)
    }

    /// Whether `raw` contains a parameter that demands a cache hash.
    #[must_use]
    pub fn requires_fingerprint(&self, raw: &str) -> bool {
        map_requires_fingerprint(&decompose(raw), self.policy)
    }

    /// Check a supplied cache hash against the parameters of `raw`.
    #[must_use]
    pub fn verify(&self, raw: &str, supplied: Option<&str>) -> Verification {
        self.verdict(&decompose(raw), supplied)
    }

    /// Like [`Self::verify`], reading the supplied hash from the `cHash`
    /// parameter of `raw` itself.
    #[must_use]
    pub fn verify_request(&self, raw: &str) -> Verification {
        let parameters = decompose(raw);
        let supplied = parameters
            .get(CACHE_HASH_PARAMETER)
            .and_then(ParameterValue::as_text);
        self.verdict(&parameters, supplied)
    }

    fn verdict(&self, parameters: &ParameterMap, supplied: Option<&str>) -> Verification {
        let computed = fingerprint(&filter(parameters, self.policy, self.secret), self.secret);
        let required = map_requires_fingerprint(parameters, self.policy);
        let verdict = Verification::evaluate(supplied, &computed, required);
        if !verdict.is_trusted() {
            tracing::info!(verdict = %verdict, "Request parameters could not be validated");
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> Policy {
        Policy::builder()
            .excluded_parameters(["exclude1", "exclude2"])
            .require_presence_parameters(["req1", "req2"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_calculate_matches_generate() {
        let policy = policy();
        let secret = SecretKey::new("K");
        let calculator = CacheHashCalculator::new(&policy, &secret);

        let relevant = calculator.relevant_parameters("b=v&a=v");
        assert_eq!(
            calculator.calculate_cache_hash(&relevant),
            calculator.generate_for_parameters("a=v&b=v")
        );
    }

    #[test]
    fn test_calculate_replaces_supplied_secret() {
        let policy = policy();
        let secret = SecretKey::new("K");
        let calculator = CacheHashCalculator::new(&policy, &secret);

        let mut forged = ParameterMap::new();
        forged.insert("encryptionKey".into(), ParameterValue::from("guess"));
        forged.insert("key".into(), ParameterValue::from("value"));
        assert_eq!(
            calculator.calculate_cache_hash(&forged),
            calculator.generate_for_parameters("key=value")
        );
    }

    #[test]
    fn test_calculate_empty() {
        let policy = policy();
        let secret = SecretKey::new("K");
        let calculator = CacheHashCalculator::new(&policy, &secret);
        assert_eq!(calculator.calculate_cache_hash(&ParameterMap::new()), "");

        let mut only_secret = ParameterMap::new();
        only_secret.insert("encryptionKey".into(), ParameterValue::from("K"));
        assert_eq!(calculator.calculate_cache_hash(&only_secret), "");
    }

    #[test]
    fn test_verify() {
        let policy = policy();
        let secret = SecretKey::new("K");
        let calculator = CacheHashCalculator::new(&policy, &secret);
        let hash = calculator.generate_for_parameters("req1=a&key=b");

        assert_eq!(calculator.verify("req1=a&key=b", Some(&hash)), Verification::Valid);
        assert_eq!(calculator.verify("req1=a&key=c", Some(&hash)), Verification::Mismatch);
        assert_eq!(calculator.verify("req1=a&key=b", None), Verification::Missing);
        assert_eq!(calculator.verify("key=b", None), Verification::NotRequired);
        assert_eq!(calculator.verify("exclude1=x", Some(&hash)), Verification::Mismatch);
    }

    #[test]
    fn test_verify_request_reads_chash() {
        let policy = policy();
        let secret = SecretKey::new("K");
        let calculator = CacheHashCalculator::new(&policy, &secret);
        let hash = calculator.generate_for_parameters("req1=a");

        assert_eq!(
            calculator.verify_request(&format!("req1=a&cHash={hash}")),
            Verification::Valid
        );
        assert_eq!(
            calculator.verify_request(&format!("cHash={hash}&req1=b")),
            Verification::Mismatch
        );
        assert_eq!(calculator.verify_request("req1=a&cHash="), Verification::Missing);
    }

    #[test]
    fn test_required_but_nothing_relevant() {
        let policy = Policy::builder()
            .excluded_parameters(["req1"])
            .require_presence_parameters(["req1"])
            .build()
            .unwrap();
        let secret = SecretKey::new("K");
        let calculator = CacheHashCalculator::new(&policy, &secret);

        assert!(calculator.requires_fingerprint("req1=x"));
        assert_eq!(calculator.generate_for_parameters("req1=x"), "");
        assert_eq!(calculator.verify("req1=x", None), Verification::Missing);
    }
}
