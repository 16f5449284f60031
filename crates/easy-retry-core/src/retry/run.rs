//! Blocking retry loop: run an operation until success or the policy says stop.

use std::time::Duration;

use super::classify::Classify;
use super::error::RetryError;
use super::policy::{RetryDecision, RetryPolicy};

/// One side of the executor seam: how an attempt is made and how the loop
/// waits between attempts when the calling thread may block.
pub trait AttemptExecutor {
    type Output;
    type Error: Classify;

    fn invoke(&mut self) -> Result<Self::Output, Self::Error>;

    fn delay(&mut self, backoff: Duration) {
        std::thread::sleep(backoff);
    }
}

/// Executor over a plain closure.
pub struct FnExecutor<F>(pub F);

impl<F, T, E> AttemptExecutor for FnExecutor<F>
where
    F: FnMut() -> Result<T, E>,
    E: Classify,
{
    type Output = T;
    type Error = E;

    fn invoke(&mut self) -> Result<T, E> {
        (self.0)()
    }
}

/// Runs the executor until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
pub fn run_with_retry<X>(
    policy: &RetryPolicy<X::Error>,
    executor: &mut X,
) -> Result<X::Output, RetryError<X::Error>>
where
    X: AttemptExecutor,
{
    let mut attempt = 1u32;
    loop {
        match executor.invoke() {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, &e)? {
                RetryDecision::NoRetry => return Err(RetryError::Operation(e)),
                RetryDecision::RetryAfter(d) => {
                    executor.delay(d);
                    attempt = attempt.saturating_add(1);
                }
            },
        }
    }
}

impl<E: Classify> RetryPolicy<E> {
    /// Blocking: call `op` under this policy on the current thread.
    pub fn run<T, F>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        run_with_retry(self, &mut FnExecutor(op))
    }
}
