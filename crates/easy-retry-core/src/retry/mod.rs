//! Retry policy and execution loops.
//!
//! This module holds the decision engine (attempt bound, failure-kind
//! filtering, failure handler) and the two loops that apply it: a blocking one
//! that sleeps the calling thread and an async one that awaits the backoff.
//! Both make identical decisions for identical failure sequences.

mod classify;
mod error;
mod policy;
mod run;
mod suspend;
mod wrap;

pub use classify::{classify, is_member, Classify, Verdict};
pub use error::{ConfigError, RetryError};
pub use policy::{FailureHandler, RetryDecision, RetryMode, RetryPolicy, RetryPolicyBuilder};
pub use run::{run_with_retry, AttemptExecutor, FnExecutor};
pub use suspend::{run_with_retry_async, AsyncAttemptExecutor, AsyncFnExecutor};
pub use wrap::{Retrying, RetryingAsync};
