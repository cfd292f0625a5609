//! Relevance policy
//!
//! A [`Policy`] decides which request parameters take part in the cache
//! hash. It is immutable once built; construct it with [`PolicyBuilder`] or
//! load it from TOML with [`Policy::from_path`] / [`Policy::from_toml_str`].

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::params::ParameterValue;
use crate::pattern::PatternSet;
use crate::secret::ENCRYPTION_KEY_PARAMETER;

/// System parameters that never take part in the cache hash.
///
/// - `id`: page identifier
/// - `type`: content-type selector
/// - `no_cache`: cache bypass toggle
/// - `cHash`: the cache hash itself
/// - `MP`: mount point
/// - `ftu`: frontend user session toggle
/// - `encryptionKey`: reserved for the injected secret
pub const RESERVED_PARAMETERS: &[&str] = &[
    "id",
    "type",
    "no_cache",
    "cHash",
    "MP",
    "ftu",
    ENCRYPTION_KEY_PARAMETER,
];

/// Parameter family of the administrative overlay (`TSFE_ADMIN_PANEL[...]`).
pub const ADMIN_PANEL_PARAMETER: &str = "TSFE_ADMIN_PANEL";

/// Check the built-in exclusions for a top-level parameter.
///
/// The admin panel family is matched exactly and only when it carries
/// bracketed children.
#[must_use]
pub fn is_reserved(name: &str, value: &ParameterValue) -> bool {
    RESERVED_PARAMETERS.contains(&name)
        || (value.is_nested() && name == ADMIN_PANEL_PARAMETER)
}

/// Which parameters are relevant for the cache hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Policy {
    /// Always dropped, on top of [`RESERVED_PARAMETERS`]
    #[serde(default)]
    excluded_parameters: PatternSet,

    /// When non-empty, only these names are relevant
    #[serde(default, alias = "cachedParametersWhiteList")]
    whitelist: PatternSet,

    /// Presence of any of these demands a cache hash
    #[serde(default, alias = "requireCacheHashPresenceParameters")]
    require_presence_parameters: PatternSet,

    /// Dropped when their value is empty
    #[serde(default, alias = "excludedParametersIfEmpty")]
    excluded_if_empty: PatternSet,

    /// Drop every parameter whose value is empty
    #[serde(default)]
    exclude_all_empty_parameters: bool,
}

impl Policy {
    /// Start building a policy
    #[must_use]
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Configured exclusions (the built-in ones are not listed)
    #[must_use]
    pub fn excluded_parameters(&self) -> &PatternSet {
        &self.excluded_parameters
    }

    /// Whitelist; empty means blacklist mode
    #[must_use]
    pub fn whitelist(&self) -> &PatternSet {
        &self.whitelist
    }

    /// Names whose presence requires a cache hash
    #[must_use]
    pub fn require_presence_parameters(&self) -> &PatternSet {
        &self.require_presence_parameters
    }

    /// Names dropped when empty
    #[must_use]
    pub fn excluded_if_empty(&self) -> &PatternSet {
        &self.excluded_if_empty
    }

    /// Whether every empty parameter is dropped
    #[must_use]
    pub fn exclude_all_empty_parameters(&self) -> bool {
        self.exclude_all_empty_parameters
    }

    /// Whitelist mode is active when the whitelist has entries
    #[must_use]
    pub fn is_whitelist_mode(&self) -> bool {
        !self.whitelist.is_empty()
    }

    /// Whether `name` is configured as excluded
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_parameters.matches(name)
    }

    /// Whether `name` is on the whitelist
    #[must_use]
    pub fn is_whitelisted(&self, name: &str) -> bool {
        self.whitelist.matches(name)
    }

    /// Whether `name` demands a cache hash
    #[must_use]
    pub fn requires_presence(&self, name: &str) -> bool {
        self.require_presence_parameters.matches(name)
    }

    /// Whether `name` may stay in the relevant set with an empty value
    #[must_use]
    pub fn is_allowed_with_empty_value(&self, name: &str) -> bool {
        !(self.exclude_all_empty_parameters || self.excluded_if_empty.matches(name))
    }
}

/// Builder for [`Policy`]
///
/// Patterns are kept as text and parsed in [`PolicyBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    excluded_parameters: Vec<String>,
    whitelist: Vec<String>,
    require_presence_parameters: Vec<String>,
    excluded_if_empty: Vec<String>,
    exclude_all_empty_parameters: bool,
}

impl PolicyBuilder {
    /// Add names that are always excluded
    #[must_use]
    pub fn excluded_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_parameters
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Add whitelisted names (switches to whitelist mode)
    #[must_use]
    pub fn whitelist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add names whose presence requires a cache hash
    #[must_use]
    pub fn require_presence_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_presence_parameters
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Add names that are dropped when empty
    #[must_use]
    pub fn excluded_if_empty<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_if_empty
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Drop all empty parameters
    #[must_use]
    pub const fn exclude_all_empty_parameters(mut self, enabled: bool) -> Self {
        self.exclude_all_empty_parameters = enabled;
        self
    }

    /// Parse all patterns and build the policy
    pub fn build(self) -> Result<Policy> {
        Ok(Policy {
            excluded_parameters: PatternSet::parse(&self.excluded_parameters)?,
            whitelist: PatternSet::parse(&self.whitelist)?,
            require_presence_parameters: PatternSet::parse(&self.require_presence_parameters)?,
            excluded_if_empty: PatternSet::parse(&self.excluded_if_empty)?,
            exclude_all_empty_parameters: self.exclude_all_empty_parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names() {
        let leaf = ParameterValue::from("1");
        for name in ["id", "type", "no_cache", "cHash", "MP", "ftu", "encryptionKey"] {
            assert!(is_reserved(name, &leaf), "{name} should be reserved");
        }
        assert!(!is_reserved("key", &leaf));
        assert!(!is_reserved("ID", &leaf));
    }

    #[test]
    fn test_admin_panel_family_needs_children() {
        let nested = ParameterValue::Nested(crate::params::decompose("display=7"));
        assert!(is_reserved("TSFE_ADMIN_PANEL", &nested));
        assert!(!is_reserved("tsfe_admin_panel", &nested));
        assert!(!is_reserved("TSFE_ADMIN_PANEL", &ParameterValue::from("7")));
    }

    #[test]
    fn test_default_policy_is_blacklist_mode() {
        let policy = Policy::default();
        assert!(!policy.is_whitelist_mode());
        assert!(!policy.is_excluded("anything"));
        assert!(!policy.requires_presence("anything"));
        assert!(policy.is_allowed_with_empty_value("anything"));
    }

    #[test]
    fn test_builder() {
        let policy = Policy::builder()
            .excluded_parameters(["exclude1", "^utm_"])
            .require_presence_parameters(["req1"])
            .excluded_if_empty(["key2"])
            .build()
            .unwrap();

        assert!(policy.is_excluded("exclude1"));
        assert!(policy.is_excluded("utm_source"));
        assert!(policy.requires_presence("req1"));
        assert!(!policy.is_allowed_with_empty_value("key2"));
        assert!(policy.is_allowed_with_empty_value("key3"));
    }

    #[test]
    fn test_builder_rejects_bad_pattern() {
        assert!(Policy::builder().whitelist(["~"]).build().is_err());
    }

    #[test]
    fn test_exclude_all_empty_overrides_names() {
        let policy = Policy::builder()
            .exclude_all_empty_parameters(true)
            .build()
            .unwrap();
        assert!(!policy.is_allowed_with_empty_value("whatever"));
    }

    #[test]
    fn test_whitelist_mode() {
        let policy = Policy::builder().whitelist(["whitep1"]).build().unwrap();
        assert!(policy.is_whitelist_mode());
        assert!(policy.is_whitelisted("whitep1"));
        assert!(!policy.is_whitelisted("black"));
    }
}
