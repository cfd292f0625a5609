use clap::{Parser, Subcommand};
use miette::{Diagnostic, Report};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::logging::{LogLevel, TracingFormat};

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Request parameters could not be validated
pub const EXIT_UNTRUSTED: i32 = 1;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Unexpected error exit code
pub const EXIT_OTHER: i32 = 3;

/// Environment variable holding the secret key unless overridden
pub const DEFAULT_KEY_ENV: &str = "CHASH_ENCRYPTION_KEY";

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(chash::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(chash::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

/// Policy loading problems are configuration errors; only I/O is unexpected.
impl From<chash_core::Error> for CliError {
    fn from(err: chash_core::Error) -> Self {
        match err {
            chash_core::Error::Configuration { message } => Self::config(message),
            chash_core::Error::Parse { .. } => Self::config_with_help(
                err.to_string(),
                "Policy keys are camelCase: excludedParameters, whitelist, requirePresenceParameters, excludedIfEmpty, excludeAllEmptyParameters",
            ),
            chash_core::Error::Io { .. } => Self::Other {
                message: err.to_string(),
                help: Some("Check file permissions and ensure the path exists".to_string()),
            },
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Other { .. } => EXIT_OTHER,
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Other { .. } => "other",
            },
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Compute and verify cache hashes for request parameters.
#[derive(Parser, Debug)]
#[command(name = "chash")]
#[command(about = "Compute and verify secret-keyed cache hashes for request parameters")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Policy file (TOML). Without it every non-system parameter is relevant.
    #[arg(long, short = 'p', global = true, env = "CHASH_POLICY", value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// Name of the environment variable that holds the secret key.
    #[arg(
        long = "encryption-key-env",
        global = true,
        default_value = DEFAULT_KEY_ENV,
        value_name = "VAR"
    )]
    pub key_env: String,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(long, global = true, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,

    /// Emit JSON envelope instead of plain text.
    #[arg(long, global = true, help = "Emit JSON envelope instead of plain text")]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the cache hash of a query string (empty if nothing is relevant).
    Hash {
        /// Query string or URL
        query: String,
    },
    /// List the parameters that take part in the cache hash.
    Relevant {
        /// Query string or URL
        query: String,
    },
    /// Tell whether the query contains a parameter that requires a cache hash.
    Requires {
        /// Query string or URL
        query: String,
    },
    /// Check a supplied cache hash (defaults to the query's own cHash).
    Verify {
        /// Query string or URL
        query: String,
        /// Cache hash to check instead of the cHash parameter
        #[arg(long = "hash", value_name = "HEX")]
        hash: Option<String>,
    },
}

/// Parse command line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_verify_with_hash() {
        let cli = Cli::try_parse_from(["chash", "verify", "a=1", "--hash", "abc", "--json"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.key_env, DEFAULT_KEY_ENV);
        match cli.command {
            Commands::Verify { query, hash } => {
                assert_eq!(query, "a=1");
                assert_eq!(hash.as_deref(), Some("abc"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&CliError::config("x")), EXIT_CLI);
        assert_eq!(exit_code_for(&CliError::other("x")), EXIT_OTHER);
    }

    #[test]
    fn test_core_parse_error_is_config() {
        let err: CliError = chash_core::Error::parse("bad", None).into();
        assert!(matches!(err, CliError::Config { help: Some(_), .. }));
    }
}
