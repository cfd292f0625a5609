//! Error types for the cache hash core
//!
//! Hash calculation itself never fails. These errors come from loading a
//! [`Policy`](crate::Policy) out of external configuration.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for policy configuration
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error while reading a policy file
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(chash::core::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read")
        operation: String,
    },

    /// Policy file could not be parsed
    #[error("Failed to parse policy{}: {message}", path.as_ref().map_or(String::new(), |p| format!(" {}", p.display())))]
    #[diagnostic(
        code(chash::core::parse),
        help("Policy files are TOML with camelCase keys, e.g. excludedParameters = [\"utm_source\"]")
    )]
    Parse {
        /// Parser message
        message: String,
        /// File being parsed, if any
        path: Option<Box<Path>>,
    },

    /// Semantically invalid configuration
    #[error("Policy configuration error: {message}")]
    #[diagnostic(code(chash::core::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a parse error, optionally tied to a file
    #[must_use]
    pub fn parse(message: impl Into<String>, path: Option<&Path>) -> Self {
        Self::Parse {
            message: message.into(),
            path: path.map(Into::into),
        }
    }
}

/// Result type for policy configuration
pub type Result<T> = std::result::Result<T, Error>;
