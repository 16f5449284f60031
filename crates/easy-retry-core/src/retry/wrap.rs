//! Attach a policy to an operation once and call it like the operation itself.
//!
//! `wrap` and `wrap_async` are the two attach points; which loop an operation
//! gets is fixed by which one is used, and the bounds on each reject an
//! operation of the other shape at compile time.

use std::future::Future;

use super::classify::Classify;
use super::error::RetryError;
use super::policy::RetryPolicy;
use super::run::{run_with_retry, FnExecutor};
use super::suspend::{run_with_retry_async, AsyncFnExecutor};

/// Blocking operation wrapped with a retry policy.
pub struct Retrying<E: Classify, F> {
    policy: RetryPolicy<E>,
    op: F,
}

/// Async operation wrapped with a retry policy.
pub struct RetryingAsync<E: Classify, F> {
    policy: RetryPolicy<E>,
    op: F,
}

impl<E: Classify> RetryPolicy<E> {
    pub fn wrap<A, T, F>(self, op: F) -> Retrying<E, F>
    where
        F: Fn(A) -> Result<T, E>,
    {
        Retrying { policy: self, op }
    }

    pub fn wrap_async<A, T, F, Fut>(self, op: F) -> RetryingAsync<E, F>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        RetryingAsync { policy: self, op }
    }
}

impl<E: Classify, F> Retrying<E, F> {
    /// Call the operation with `args`, cloned for each attempt.
    pub fn call<A, T>(&self, args: A) -> Result<T, RetryError<E>>
    where
        F: Fn(A) -> Result<T, E>,
        A: Clone,
    {
        run_with_retry(&self.policy, &mut FnExecutor(|| (self.op)(args.clone())))
    }
}

impl<E: Classify, F> RetryingAsync<E, F> {
    /// Await the operation with `args`, cloned for each attempt.
    pub async fn call<A, T, Fut>(&self, args: A) -> Result<T, RetryError<E>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        A: Clone,
    {
        // The closure owns `args`, so the tail future only borrows `self`.
        let op = &self.op;
        run_with_retry_async(&self.policy, &mut AsyncFnExecutor(move || op(args.clone()))).await
    }
}
