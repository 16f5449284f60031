//! Errors surfaced by the retry loop.

use thiserror::Error;

/// Invalid policy configuration, detected when the offending field is first read.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Mode label other than `handle` / `ignore`. Only reported once a failure
    /// has to be classified against a kind set.
    #[error("unrecognized retry mode {0:?} (expected \"handle\" or \"ignore\")")]
    UnknownMode(String),
    /// `attempts = 0` would never run the operation.
    #[error("attempts must be at least 1")]
    ZeroAttempts,
    /// Backoff given in seconds was negative, NaN or infinite.
    #[error("backoff must be a finite, non-negative number of seconds (got {0})")]
    InvalidBackoff(f64),
}

/// Terminal outcome of a retry loop that did not succeed.
///
/// `Operation` carries the operation's own error value untouched: either the
/// failure classification rejected (abort) or the last one observed before the
/// attempt bound was reached (exhaustion). The two are not distinguished
/// here; the handler's attempt argument is the only side channel.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error(transparent)]
    Operation(E),
    #[error("retry policy misconfigured: {0}")]
    Configuration(#[from] ConfigError),
}

impl<E> RetryError<E> {
    /// The operation's failure, if this is not a configuration error.
    pub fn operation(&self) -> Option<&E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::Configuration(_) => None,
        }
    }

    pub fn into_operation(self) -> Option<E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::Configuration(_) => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, RetryError::Configuration(_))
    }
}
