//! Suspendable retry loop: same decisions as [`run_with_retry`](super::run_with_retry),
//! with the attempt and the backoff both awaited.

use std::future::Future;
use std::time::Duration;

use super::classify::Classify;
use super::error::RetryError;
use super::policy::{RetryDecision, RetryPolicy};

/// Async counterpart of [`AttemptExecutor`](super::AttemptExecutor).
///
/// The default delay is `tokio::time::sleep`, so a runtime with the time
/// driver enabled must be current when the loop awaits it.
pub trait AsyncAttemptExecutor {
    type Output;
    type Error: Classify;

    fn invoke(&mut self) -> impl Future<Output = Result<Self::Output, Self::Error>>;

    fn delay(&mut self, backoff: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(backoff)
    }
}

/// Executor over a closure returning a future.
pub struct AsyncFnExecutor<F>(pub F);

impl<F, Fut, T, E> AsyncAttemptExecutor for AsyncFnExecutor<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    type Output = T;
    type Error = E;

    fn invoke(&mut self) -> impl Future<Output = Result<T, E>> {
        (self.0)()
    }
}

/// Awaits the executor until it succeeds or the retry policy says to stop.
///
/// Dropping the returned future cancels the sequence at whichever await point
/// it is parked on.
pub async fn run_with_retry_async<X>(
    policy: &RetryPolicy<X::Error>,
    executor: &mut X,
) -> Result<X::Output, RetryError<X::Error>>
where
    X: AsyncAttemptExecutor,
{
    let mut attempt = 1u32;
    loop {
        match executor.invoke().await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, &e)? {
                RetryDecision::NoRetry => return Err(RetryError::Operation(e)),
                RetryDecision::RetryAfter(d) => {
                    executor.delay(d).await;
                    attempt = attempt.saturating_add(1);
                }
            },
        }
    }
}

impl<E: Classify> RetryPolicy<E> {
    /// Suspendable: await `op()` under this policy.
    pub async fn run_async<T, F, Fut>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        run_with_retry_async(self, &mut AsyncFnExecutor(op)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;

    #[tokio::test(start_paused = true)]
    async fn backoff_uses_tokio_clock() {
        let p = RetryPolicy::<io::Error>::builder()
            .attempts(3)
            .backoff(Duration::from_secs(2))
            .build()
            .unwrap();
        let start = tokio::time::Instant::now();
        let stamps = std::cell::RefCell::new(Vec::new());
        let err = p
            .run_async(|| {
                stamps.borrow_mut().push(start.elapsed());
                async { Err::<(), _>(io::Error::from(io::ErrorKind::TimedOut)) }
            })
            .await
            .unwrap_err();
        assert_eq!(err.operation().unwrap().kind(), io::ErrorKind::TimedOut);

        let stamps = stamps.into_inner();
        assert_eq!(stamps.len(), 3);
        assert_eq!(stamps[0], Duration::ZERO);
        for gap in stamps.windows(2).map(|w| w[1] - w[0]) {
            assert!(gap >= Duration::from_secs(2), "gap {:?}", gap);
            assert!(gap < Duration::from_millis(2_005), "gap {:?}", gap);
        }
        // Nothing slept after the final attempt.
        assert!(start.elapsed() - stamps[2] < Duration::from_millis(1));
    }

    #[tokio::test]
    async fn yields_inside_attempts() {
        let p: RetryPolicy<io::Error> = RetryPolicy::default();
        let calls = Cell::new(0);
        let v = p
            .run_async(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    tokio::task::yield_now().await;
                    if n < 3 {
                        Err(io::Error::from(io::ErrorKind::WouldBlock))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(v, 3);
    }
}
