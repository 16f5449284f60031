//! `easy-retry run` – run a program until it exits 0 or the policy gives up.

use anyhow::{bail, Result};
use easy_retry::config::RetryConfig;
use easy_retry::{RetryError, RetryPolicy};

use crate::cli::{CommandFailure, FailureClass};

fn build_policy(cfg: &RetryConfig<FailureClass>) -> Result<RetryPolicy<CommandFailure>> {
    let policy = cfg
        .builder()
        .handler(|failure: &CommandFailure, attempt| {
            tracing::warn!(attempt, "{}", failure);
            eprintln!("easy-retry: attempt {attempt} failed: {failure}");
        })
        .build()?;
    Ok(policy)
}

fn run_once_blocking(program: &str, args: &[String]) -> Result<(), CommandFailure> {
    let status = std::process::Command::new(program)
        .args(args)
        .status()
        .map_err(|e| CommandFailure::spawn(program, e))?;
    CommandFailure::check(program, status)
}

async fn run_once(program: &str, args: &[String]) -> Result<(), CommandFailure> {
    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| CommandFailure::spawn(program, e))?;
    CommandFailure::check(program, status)
}

/// Returns the exit code to leave with: 0 on success, otherwise the final
/// run's code.
pub async fn run_command(
    cfg: &RetryConfig<FailureClass>,
    command: &[String],
    blocking: bool,
) -> Result<i32> {
    let Some((program, args)) = command.split_first() else {
        bail!("no program given");
    };
    let policy = build_policy(cfg)?;

    let outcome = if blocking {
        let program = program.clone();
        let args = args.to_vec();
        tokio::task::spawn_blocking(move || policy.run(|| run_once_blocking(&program, &args)))
            .await?
    } else {
        policy.run_async(|| run_once(program, args)).await
    };

    match outcome {
        Ok(()) => Ok(0),
        Err(RetryError::Operation(failure)) => {
            eprintln!("easy-retry: giving up: {failure}");
            Ok(failure.exit_code())
        }
        Err(err @ RetryError::Configuration(_)) => Err(err.into()),
    }
}
