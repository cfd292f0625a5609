//! Checking a request-supplied cache hash

use std::fmt;

use subtle::ConstantTimeEq;

/// Name of the parameter that carries the cache hash in a request
pub const CACHE_HASH_PARAMETER: &str = "cHash";

/// Outcome of comparing a supplied cache hash with the computed one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No hash supplied and none required
    NotRequired,
    /// Supplied hash matches
    Valid,
    /// Supplied hash differs from the computed one, or nothing was computable
    Mismatch,
    /// A parameter requires a hash but none was supplied
    Missing,
}

impl Verification {
    /// Combine the facts of a request into a verdict.
    ///
    /// An empty `supplied` counts as absent. A supplied hash never matches an
    /// empty computed hash.
    #[must_use]
    pub fn evaluate(supplied: Option<&str>, computed: &str, required: bool) -> Self {
        match supplied.filter(|s| !s.is_empty()) {
            Some(supplied) if !computed.is_empty() && constant_time_eq(supplied, computed) => {
                Self::Valid
            }
            Some(_) => Self::Mismatch,
            None if required => Self::Missing,
            None => Self::NotRequired,
        }
    }

    /// Whether cached output may be trusted for this request
    #[must_use]
    pub const fn is_trusted(self) -> bool {
        matches!(self, Self::NotRequired | Self::Valid)
    }

    /// Stable label for output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotRequired => "not_required",
            Self::Valid => "valid",
            Self::Mismatch => "mismatch",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare two strings in time independent of where they differ.
///
/// Both sides are padded to the longer length with different fill bytes so
/// that a length difference never compares equal.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let max_len = a.len().max(b.len());

    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}
