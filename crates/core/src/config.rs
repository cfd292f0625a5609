//! Loading a [`Policy`] from TOML
//!
//! ```toml
//! excludedParameters = ["^utm_", "gclid", "fbclid"]
//! requirePresenceParameters = ["tx_news"]
//! excludedIfEmpty = ["q"]
//! excludeAllEmptyParameters = false
//! # whitelist = ["page", "tx_news"]
//! ```
//!
//! The legacy names `cachedParametersWhiteList`,
//! `requireCacheHashPresenceParameters` and `excludedParametersIfEmpty` are
//! accepted as aliases. The secret key never lives in this file.

use std::path::Path;

use crate::policy::Policy;
use crate::{Error, Result};

impl Policy {
    /// Parse a policy from TOML text
    pub fn from_toml_str(source: &str) -> Result<Self> {
        parse(source, None)
    }

    /// Read and parse a policy file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))?;
        parse(&source, Some(path))
    }
}

fn parse(source: &str, path: Option<&Path>) -> Result<Policy> {
    let policy: Policy =
        toml::from_str(source).map_err(|e| Error::parse(e.to_string().trim_end(), path))?;

    if policy.is_whitelist_mode() && !policy.excluded_parameters().is_empty() {
        tracing::warn!(
            excluded = policy.excluded_parameters().len(),
            "Whitelist is set; excludedParameters are ignored"
        );
    }
    tracing::debug!(
        whitelist_mode = policy.is_whitelist_mode(),
        required = policy.require_presence_parameters().len(),
        "Loaded cache hash policy"
    );
    Ok(policy)
}
