//! Parameter name patterns used by policy name sets
//!
//! Syntax:
//! - `name` or `=name`: exact match
//! - `^prefix`: name starts with `prefix`
//! - `~fragment`: name contains `fragment`
//!
//! Matching is case-sensitive.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A single name pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterPattern {
    /// Whole name must match
    Exact(String),
    /// Name starts with the given text
    Prefix(String),
    /// Name contains the given text
    Contains(String),
}

impl ParameterPattern {
    /// Parse a pattern from its textual form.
    ///
    /// A bare sigil (`^`, `~`, `=`) with nothing after it is rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let (pattern, body) = match input.chars().next() {
            Some('^') => (Self::Prefix(input[1..].to_string()), &input[1..]),
            Some('~') => (Self::Contains(input[1..].to_string()), &input[1..]),
            Some('=') => (Self::Exact(input[1..].to_string()), &input[1..]),
            _ => (Self::Exact(input.to_string()), input),
        };
        if body.is_empty() {
            return Err(Error::configuration(format!(
                "parameter pattern '{input}' has no name"
            )));
        }
        Ok(pattern)
    }

    /// Test a parameter name against the pattern
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => name == exact,
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Contains(fragment) => name.contains(fragment.as_str()),
        }
    }
}

impl FromStr for ParameterPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ParameterPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) if name.starts_with(['^', '~', '=']) => write!(f, "={name}"),
            Self::Exact(name) => f.write_str(name),
            Self::Prefix(prefix) => write!(f, "^{prefix}"),
            Self::Contains(fragment) => write!(f, "~{fragment}"),
        }
    }
}

impl Serialize for ParameterPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParameterPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A set of patterns; empty sets match nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSet(Vec<ParameterPattern>);

impl PatternSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every entry, failing on the first invalid one
    pub fn parse<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns
            .into_iter()
            .map(|p| ParameterPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(|parsed| parsed.into_iter().collect())
    }

    /// Add a pattern, ignoring duplicates
    pub fn insert(&mut self, pattern: ParameterPattern) {
        if !self.0.contains(&pattern) {
            self.0.push(pattern);
        }
    }

    /// Whether any pattern matches `name`
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.0.iter().any(|p| p.matches(name))
    }

    /// Number of patterns
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no pattern
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the patterns
    pub fn iter(&self) -> impl Iterator<Item = &ParameterPattern> {
        self.0.iter()
    }
}

impl FromIterator<ParameterPattern> for PatternSet {
    fn from_iter<T: IntoIterator<Item = ParameterPattern>>(iter: T) -> Self {
        let mut set = Self::new();
        for pattern in iter {
            set.insert(pattern);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            ParameterPattern::parse("utm_source").unwrap(),
            ParameterPattern::Exact("utm_source".into())
        );
        assert_eq!(
            ParameterPattern::parse("^utm_").unwrap(),
            ParameterPattern::Prefix("utm_".into())
        );
        assert_eq!(
            ParameterPattern::parse("~session").unwrap(),
            ParameterPattern::Contains("session".into())
        );
        assert_eq!(
            ParameterPattern::parse("=^odd").unwrap(),
            ParameterPattern::Exact("^odd".into())
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(ParameterPattern::parse("").is_err());
        assert!(ParameterPattern::parse("^").is_err());
        assert!(ParameterPattern::parse("~").is_err());
        assert!(ParameterPattern::parse("=").is_err());
    }

    #[test]
    fn test_matching() {
        let exact = ParameterPattern::parse("gclid").unwrap();
        assert!(exact.matches("gclid"));
        assert!(!exact.matches("gclid2"));
        assert!(!exact.matches("GCLID"));

        let prefix = ParameterPattern::parse("^utm_").unwrap();
        assert!(prefix.matches("utm_campaign"));
        assert!(!prefix.matches("x_utm_campaign"));

        let contains = ParameterPattern::parse("~track").unwrap();
        assert!(contains.matches("_trackid"));
        assert!(!contains.matches("trac"));
    }

    #[test]
    fn test_display_roundtrips_sigils() {
        for raw in ["plain", "^pre", "~mid", "=^literal"] {
            let pattern = ParameterPattern::parse(raw).unwrap();
            assert_eq!(pattern.to_string(), raw);
        }
    }

    #[test]
    fn test_set_deduplicates_and_matches() {
        let set = PatternSet::parse(["a", "a", "^b"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.matches("a"));
        assert!(set.matches("bee"));
        assert!(!set.matches("c"));
        assert!(!PatternSet::new().matches("a"));
    }

    #[test]
    fn test_set_deserializes_from_strings() {
        let set: PatternSet = serde_json::from_str(r#"["id_x", "^utm_"]"#).unwrap();
        assert!(set.matches("utm_medium"));
        let err = serde_json::from_str::<PatternSet>(r#"["^"]"#);
        assert!(err.is_err());
    }
}
