//! chash CLI Application
//!
//! Computes the cache hash of request parameters under a policy, lists the
//! parameters that take part in it, and checks request-supplied hashes.
//!
//! The secret key is read from the environment (`CHASH_ENCRYPTION_KEY` by
//! default) and never printed.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;
mod logging;

use crate::cli::{CliError, EXIT_CLI, exit_code_for, render_error};
use crate::commands::Context;
use crate::logging::TracingConfig;

fn main() {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic, so we use the most reliable output method.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
    };
    if let Err(e) = logging::init_tracing(&tracing_config) {
        eprintln!("{e:?}");
        std::process::exit(EXIT_CLI);
    }

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            render_error(&err, cli.json);
            std::process::exit(exit_code_for(&err));
        }
    }
}

fn run(cli: &cli::Cli) -> Result<i32, CliError> {
    let context = Context::load(cli.policy.as_deref(), &cli.key_env)?;

    let span = tracing::info_span!("command", command = ?cli.command);
    let _guard = span.enter();

    let outcome = commands::execute(&cli.command, &context);
    if cli.json {
        println!("{}", outcome.to_json()?);
    } else {
        println!("{}", outcome.to_text());
    }
    Ok(outcome.exit_code())
}
