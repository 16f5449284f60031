//! CLI for easy-retry: re-run a program under a retry policy.

mod commands;
mod failure;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use easy_retry::config::{self, RetryConfig};
use easy_retry::RetryMode;
use std::path::PathBuf;

use commands::{run_command, run_show_config};
pub use failure::{CommandFailure, FailureClass};

/// Top-level CLI for easy-retry.
#[derive(Debug, Parser)]
#[command(name = "easy-retry")]
#[command(about = "Re-run a program until it succeeds, with a fixed backoff", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Policy overrides shared by every subcommand. Unset flags fall back to the
/// config file.
#[derive(Debug, Default, Args)]
pub struct PolicyArgs {
    /// Maximum number of runs, including the first (default: unbounded).
    #[arg(long, value_name = "N")]
    pub attempts: Option<u32>,

    /// Seconds to wait between runs (fractions allowed).
    #[arg(long, value_name = "SECS")]
    pub backoff: Option<f64>,

    /// How --on classes are read: "handle" retries only them, "ignore" retries all but them.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Failure class the mode applies to: spawn, signal, or an exit code. Repeatable.
    #[arg(long = "on", value_name = "CLASS")]
    pub on: Vec<FailureClass>,

    /// Read the policy from this file instead of the default config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl PolicyArgs {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply(&self, mut cfg: RetryConfig<FailureClass>) -> RetryConfig<FailureClass> {
        if self.attempts.is_some() {
            cfg.attempts = self.attempts;
        }
        if let Some(backoff) = self.backoff {
            cfg.backoff_secs = backoff;
        }
        if let Some(mode) = &self.mode {
            cfg.mode = RetryMode::from(mode.as_str());
        }
        if !self.on.is_empty() {
            cfg.exceptions = Some(self.on.clone());
        }
        cfg
    }

    pub fn resolve(&self) -> Result<RetryConfig<FailureClass>> {
        let base = match &self.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", base);
        Ok(self.apply(base))
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run a program, retrying it according to the policy.
    Run {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Use the blocking loop (thread sleep) instead of the async one.
        #[arg(long)]
        blocking: bool,

        /// Program and its arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "PROGRAM")]
        command: Vec<String>,
    },

    /// Print the effective policy (config file plus overrides) as TOML.
    Config {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

impl CliCommand {
    /// Returns the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                policy,
                blocking,
                command,
            } => {
                let cfg = policy.resolve()?;
                run_command(&cfg, &command, blocking).await
            }
            CliCommand::Config { policy } => {
                let cfg = policy.resolve()?;
                run_show_config(&cfg)?;
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests;
