//! Command execution
//!
//! Each command produces an [`Outcome`]; rendering and exit codes are
//! decided from the outcome alone.

use chash_core::{
    CacheHashCalculator, ENCRYPTION_KEY_PARAMETER, Policy, SecretKey, Verification, params,
};
use serde::Serialize;
use std::path::Path;

use crate::cli::{CliError, Commands, EXIT_OK, EXIT_UNTRUSTED, OkEnvelope};

/// Policy and secret shared by all commands of one invocation
#[derive(Debug)]
pub struct Context {
    policy: Policy,
    secret: SecretKey,
}

impl Context {
    /// Load the policy file (if any) and read the secret from `key_env`.
    pub fn load(policy_path: Option<&Path>, key_env: &str) -> Result<Self, CliError> {
        let policy = match policy_path {
            Some(path) => Policy::from_path(path)?,
            None => {
                tracing::debug!("No policy file given, using the empty policy");
                Policy::default()
            }
        };

        let secret = match std::env::var(key_env) {
            Ok(value) if !value.is_empty() => SecretKey::new(value),
            Ok(_) => {
                return Err(CliError::config_with_help(
                    format!("{key_env} is empty"),
                    "An empty secret makes cache hashes forgeable; set it to the installation secret",
                ));
            }
            Err(_) => {
                return Err(CliError::config_with_help(
                    format!("{key_env} is not set"),
                    format!("Export the installation secret, e.g. `export {key_env}=...`"),
                ));
            }
        };

        Ok(Self { policy, secret })
    }

    fn calculator(&self) -> CacheHashCalculator<'_> {
        CacheHashCalculator::new(&self.policy, &self.secret)
    }
}

/// Parameter as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterLine {
    /// Name in bracket notation
    pub name: String,
    /// Decoded value, redacted for the secret
    pub value: String,
}

/// Result of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Outcome {
    /// `chash hash`
    Hash {
        /// Computed hash, empty if nothing is relevant
        hash: String,
    },
    /// `chash relevant`
    Relevant {
        /// Relevant parameters in canonical order
        parameters: Vec<ParameterLine>,
    },
    /// `chash requires`
    Requires {
        /// Whether a cache hash is required
        required: bool,
    },
    /// `chash verify`
    Verify {
        /// Verdict label
        verdict: String,
        /// Whether cached output may be trusted
        trusted: bool,
    },
}

impl Outcome {
    /// Process exit code for this outcome
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Verify { trusted: false, .. } => EXIT_UNTRUSTED,
            _ => EXIT_OK,
        }
    }

    /// Plain text rendering
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Hash { hash } => hash.clone(),
            Self::Relevant { parameters } => parameters
                .iter()
                .map(|p| format!("{}={}", p.name, p.value))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Requires { required } => required.to_string(),
            Self::Verify { verdict, .. } => verdict.clone(),
        }
    }

    /// JSON rendering inside an ok envelope
    pub fn to_json(&self) -> Result<String, CliError> {
        serde_json::to_string(&OkEnvelope::new(self))
            .map_err(|e| CliError::other(format!("Failed to serialize output: {e}")))
    }
}

/// Accept either a bare query string or a URL/path carrying one.
///
/// A `#fragment` is never part of the query.
#[must_use]
pub fn query_part(input: &str) -> &str {
    let input = input.split_once('#').map_or(input, |(head, _)| head);
    match input.split_once('?') {
        Some((head, query)) if !head.contains(['=', '&']) => query,
        _ => input,
    }
}

/// Run a command against a loaded context
#[must_use]
pub fn execute(command: &Commands, context: &Context) -> Outcome {
    let calculator = context.calculator();

    match command {
        Commands::Hash { query } => Outcome::Hash {
            hash: calculator.generate_for_parameters(query_part(query)),
        },
        Commands::Relevant { query } => {
            let relevant = calculator.relevant_parameters(query_part(query));
            let mut parameters: Vec<ParameterLine> = params::flatten(&relevant)
                .into_iter()
                .map(|(name, value)| {
                    let value = if name == ENCRYPTION_KEY_PARAMETER {
                        "[REDACTED]".to_string()
                    } else {
                        value
                    };
                    ParameterLine { name, value }
                })
                .collect();
            parameters.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
            Outcome::Relevant { parameters }
        }
        Commands::Requires { query } => Outcome::Requires {
            required: calculator.requires_fingerprint(query_part(query)),
        },
        Commands::Verify { query, hash } => {
            let query = query_part(query);
            let verdict: Verification = match hash {
                Some(hash) => calculator.verify(query, Some(hash)),
                None => calculator.verify_request(query),
            };
            Outcome::Verify {
                verdict: verdict.to_string(),
                trusted: verdict.is_trusted(),
            }
        }
    }
}
