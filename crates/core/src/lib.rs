//! Cache hash calculation for parameterised requests
//!
//! Decides which request parameters are relevant to cached output and
//! derives a secret-keyed hash over exactly that subset. The same hash
//! guards against cache poisoning: a request whose parameters do not match
//! its supplied hash must not be served from or stored into the cache.
//!
//! # Pipeline
//!
//! 1. [`decompose`] the raw query string into a nested [`ParameterMap`]
//! 2. [`filter`] it through a [`Policy`], injecting the [`SecretKey`]
//! 3. [`canonicalize`] the survivors into order-independent bytes
//! 4. [`fingerprint`] those bytes with SHA-256
//!
//! [`requires_fingerprint`] runs off step 1 alone and tells whether the
//! request must carry a hash at all. [`CacheHashCalculator`] bundles the
//! steps for a given policy and secret.
//!
//! All operations are pure and total; only loading a policy from
//! configuration can fail.

mod calculator;
pub mod canonical;
mod config;
mod error;
pub mod filter;
pub mod fingerprint;
pub mod params;
pub mod pattern;
pub mod policy;
pub mod presence;
mod secret;
pub mod verify;

pub use error::{Error, Result};

pub use calculator::CacheHashCalculator;
pub use canonical::canonicalize;
pub use filter::{Exclusion, filter};
pub use fingerprint::{fingerprint, generate_for_parameters, relevant_parameters};
pub use params::{ParameterMap, ParameterValue, decompose};
pub use pattern::{ParameterPattern, PatternSet};
pub use policy::{Policy, PolicyBuilder};
pub use presence::requires_fingerprint;
pub use secret::{ENCRYPTION_KEY_PARAMETER, SecretKey};
pub use verify::{CACHE_HASH_PARAMETER, Verification};
