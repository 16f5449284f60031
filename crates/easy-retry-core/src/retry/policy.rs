use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::classify::{self, Classify, Verdict};
use super::error::ConfigError;

/// How the `exceptions` set is read.
///
/// Any label is accepted so a mode can come straight from a config file; a
/// label other than `handle`/`ignore` lands in `Unrecognized` and is reported
/// as [`ConfigError::UnknownMode`] the first time classification needs it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RetryMode {
    /// Retry only failures whose kind is in the set.
    #[default]
    Handle,
    /// Retry only failures whose kind is not in the set.
    Ignore,
    Unrecognized(String),
}

impl From<&str> for RetryMode {
    fn from(label: &str) -> Self {
        match label {
            "handle" => RetryMode::Handle,
            "ignore" => RetryMode::Ignore,
            other => RetryMode::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for RetryMode {
    fn from(label: String) -> Self {
        RetryMode::from(label.as_str())
    }
}

impl From<RetryMode> for String {
    fn from(mode: RetryMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for RetryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryMode::Handle => write!(f, "handle"),
            RetryMode::Ignore => write!(f, "ignore"),
            RetryMode::Unrecognized(label) => write!(f, "{}", label),
        }
    }
}

/// Observer called with every failure and its 1-based attempt number.
pub type FailureHandler<E> = Arc<dyn Fn(&E, u32) + Send + Sync>;

/// Decision returned by the retry policy for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop and hand the failure back to the caller.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Immutable retry configuration for one wrapped operation.
///
/// Holds no per-call state; every `run`/`call` keeps its own attempt counter,
/// so one policy can drive any number of concurrent invocations.
pub struct RetryPolicy<E: Classify> {
    max_attempts: Option<NonZeroU32>,
    mode: RetryMode,
    exceptions: Option<HashSet<E::Kind>>,
    handler: Option<FailureHandler<E>>,
    backoff: Duration,
}

impl<E: Classify> RetryPolicy<E> {
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::default()
    }

    /// Maximum number of invocations (including the first); `None` is unbounded.
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts.map(NonZeroU32::get)
    }

    pub fn mode(&self) -> &RetryMode {
        &self.mode
    }

    pub fn exceptions(&self) -> Option<&HashSet<E::Kind>> {
        self.exceptions.as_ref()
    }

    pub fn handler(&self) -> Option<&FailureHandler<E>> {
        self.handler.as_ref()
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Decide what to do after `attempt` (1-based) failed with `error`.
    ///
    /// Runs the handler and the kind filter first, then the attempt bound, so
    /// the handler sees the final failure too. No delay is returned for the
    /// attempt that ends the loop.
    pub fn decide(&self, attempt: u32, error: &E) -> Result<RetryDecision, ConfigError> {
        if classify::classify(self, error, attempt)? == Verdict::Abort {
            tracing::debug!(attempt, "failure kind not retryable, giving up");
            return Ok(RetryDecision::NoRetry);
        }

        if let Some(max) = self.max_attempts {
            if attempt >= max.get() {
                tracing::warn!(attempt, max_attempts = max.get(), "retry attempts exhausted");
                return Ok(RetryDecision::NoRetry);
            }
        }

        tracing::debug!(attempt, backoff = ?self.backoff, "attempt failed, retrying");
        Ok(RetryDecision::RetryAfter(self.backoff))
    }
}

impl<E: Classify> Default for RetryPolicy<E> {
    /// Unbounded attempts, no delay, every failure retried.
    fn default() -> Self {
        Self {
            max_attempts: None,
            mode: RetryMode::Handle,
            exceptions: None,
            handler: None,
            backoff: Duration::ZERO,
        }
    }
}

impl<E: Classify> Clone for RetryPolicy<E>
where
    E::Kind: Clone,
{
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            mode: self.mode.clone(),
            exceptions: self.exceptions.clone(),
            handler: self.handler.clone(),
            backoff: self.backoff,
        }
    }
}

impl<E: Classify> fmt::Debug for RetryPolicy<E>
where
    E::Kind: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("mode", &self.mode)
            .field("exceptions", &self.exceptions)
            .field("handler", &self.handler.as_ref().map(|_| "<fn>"))
            .field("backoff", &self.backoff)
            .finish()
    }
}

/// Builder for [`RetryPolicy`]. Every field is optional; see the defaults on
/// [`RetryPolicy::default`].
pub struct RetryPolicyBuilder<E: Classify> {
    attempts: Option<u32>,
    mode: RetryMode,
    exceptions: Option<HashSet<E::Kind>>,
    handler: Option<FailureHandler<E>>,
    backoff: Duration,
    backoff_secs: Option<f64>,
}

impl<E: Classify> Default for RetryPolicyBuilder<E> {
    fn default() -> Self {
        Self {
            attempts: None,
            mode: RetryMode::Handle,
            exceptions: None,
            handler: None,
            backoff: Duration::ZERO,
            backoff_secs: None,
        }
    }
}

impl<E: Classify> RetryPolicyBuilder<E> {
    /// Cap total invocations at `n` (one initial call plus `n - 1` retries).
    pub fn attempts(mut self, n: u32) -> Self {
        self.attempts = Some(n);
        self
    }

    pub fn max_attempts(mut self, n: Option<u32>) -> Self {
        self.attempts = n;
        self
    }

    pub fn mode(mut self, mode: impl Into<RetryMode>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn exceptions<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = E::Kind>,
    {
        self.exceptions = Some(kinds.into_iter().collect());
        self
    }

    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(&E, u32) + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn backoff(mut self, delay: Duration) -> Self {
        self.backoff = delay;
        self.backoff_secs = None;
        self
    }

    /// Backoff in (fractional) seconds; validated by [`build`](Self::build).
    pub fn backoff_secs(mut self, secs: f64) -> Self {
        self.backoff_secs = Some(secs);
        self
    }

    /// Mode is not checked here; see [`RetryMode`].
    pub fn build(self) -> Result<RetryPolicy<E>, ConfigError> {
        let max_attempts = match self.attempts {
            None => None,
            Some(n) => Some(NonZeroU32::new(n).ok_or(ConfigError::ZeroAttempts)?),
        };
        let backoff = match self.backoff_secs {
            None => self.backoff,
            Some(secs) => {
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidBackoff(secs))?
            }
        };
        Ok(RetryPolicy {
            max_attempts,
            mode: self.mode,
            exceptions: self.exceptions,
            handler: self.handler,
            backoff,
        })
    }
}
