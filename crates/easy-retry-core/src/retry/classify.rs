//! Failure-kind classification: map a failure to a comparable kind and decide
//! whether the policy allows another attempt.

use std::collections::HashSet;
use std::hash::Hash;

use super::error::ConfigError;
use super::policy::{RetryMode, RetryPolicy};

/// A failure that can report which kind it is.
///
/// The kind is what `exceptions` sets are made of: typically a fieldless enum
/// mirroring the error's variants, an error code, or `std::io::ErrorKind`.
pub trait Classify {
    type Kind: Eq + Hash;

    fn kind(&self) -> Self::Kind;
}

impl Classify for std::io::Error {
    type Kind = std::io::ErrorKind;

    fn kind(&self) -> std::io::ErrorKind {
        std::io::Error::kind(self)
    }
}

/// Verdict on a single failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Eligible for another attempt (the attempt bound is checked separately).
    Retry,
    /// Rejected by the kind filter: give up now and return the failure.
    Abort,
}

pub fn is_member<K: Eq + Hash>(kind: &K, set: &HashSet<K>) -> bool {
    set.contains(kind)
}

/// Run the handler, then apply the kind filter.
///
/// The handler runs first and unguarded: if it panics, nothing below executes.
pub fn classify<E: Classify>(
    policy: &RetryPolicy<E>,
    error: &E,
    attempt: u32,
) -> Result<Verdict, ConfigError> {
    if let Some(handler) = policy.handler() {
        handler(error, attempt);
    }

    let Some(kinds) = policy.exceptions() else {
        return Ok(Verdict::Retry);
    };

    let kind = error.kind();
    let eligible = match policy.mode() {
        RetryMode::Handle => is_member(&kind, kinds),
        RetryMode::Ignore => !is_member(&kind, kinds),
        RetryMode::Unrecognized(label) => return Err(ConfigError::UnknownMode(label.clone())),
    };

    Ok(if eligible { Verdict::Retry } else { Verdict::Abort })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn io_err(kind: io::ErrorKind) -> io::Error {
        io::Error::new(kind, "boom")
    }

    #[test]
    fn no_kinds_always_retries() {
        let p: RetryPolicy<io::Error> = RetryPolicy::builder().mode("bogus").build().unwrap();
        // Mode is never consulted without a kind set.
        assert_eq!(
            classify(&p, &io_err(io::ErrorKind::Other), 1),
            Ok(Verdict::Retry)
        );
    }

    #[test]
    fn handle_mode_retries_members_only() {
        let p: RetryPolicy<io::Error> = RetryPolicy::builder()
            .exceptions([io::ErrorKind::TimedOut])
            .build()
            .unwrap();
        assert_eq!(
            classify(&p, &io_err(io::ErrorKind::TimedOut), 1),
            Ok(Verdict::Retry)
        );
        assert_eq!(
            classify(&p, &io_err(io::ErrorKind::NotFound), 1),
            Ok(Verdict::Abort)
        );
    }

    #[test]
    fn ignore_mode_inverts_membership() {
        let p: RetryPolicy<io::Error> = RetryPolicy::builder()
            .exceptions([io::ErrorKind::TimedOut])
            .mode(RetryMode::Ignore)
            .build()
            .unwrap();
        assert_eq!(
            classify(&p, &io_err(io::ErrorKind::TimedOut), 1),
            Ok(Verdict::Abort)
        );
        assert_eq!(
            classify(&p, &io_err(io::ErrorKind::NotFound), 1),
            Ok(Verdict::Retry)
        );
    }

    #[test]
    fn unknown_mode_fails_when_consulted() {
        let p: RetryPolicy<io::Error> = RetryPolicy::builder()
            .exceptions([io::ErrorKind::TimedOut])
            .mode("sometimes")
            .build()
            .unwrap();
        assert_eq!(
            classify(&p, &io_err(io::ErrorKind::TimedOut), 1),
            Err(ConfigError::UnknownMode("sometimes".into()))
        );
    }

    #[test]
    fn handler_sees_attempt_before_decision() {
        let seen = Arc::new(AtomicU32::new(0));
        let s = Arc::clone(&seen);
        let p: RetryPolicy<io::Error> = RetryPolicy::builder()
            .exceptions([io::ErrorKind::TimedOut])
            .handler(move |_e: &io::Error, attempt| s.store(attempt, Ordering::SeqCst))
            .build()
            .unwrap();
        // Rejected failures still reach the handler.
        assert_eq!(
            classify(&p, &io_err(io::ErrorKind::NotFound), 3),
            Ok(Verdict::Abort)
        );
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
