//! Scripted operations: fail with a fixed sequence of kinds, then succeed.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use easy_retry::Classify;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    ZeroDivision,
    Lookup,
    Value,
}

/// Failure raised by a scripted operation; `call` is the 1-based invocation
/// that produced it, so tests can tell which instance came back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?} on call {call}")]
pub struct Failure {
    pub kind: Kind,
    pub call: u32,
}

impl Classify for Failure {
    type Kind = Kind;

    fn kind(&self) -> Kind {
        self.kind
    }
}

/// Fails with `script[i]` on call `i + 1`; once the script runs out, either
/// keeps failing with the last kind (`success = None`) or returns `success`.
pub struct Script {
    script: Vec<Kind>,
    success: Option<u32>,
    calls: AtomicU32,
}

impl Script {
    pub fn always(kind: Kind) -> Self {
        Self {
            script: vec![kind],
            success: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Runs through `script`, then keeps failing with its last kind.
    pub fn failing(script: Vec<Kind>) -> Self {
        Self {
            script,
            success: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn then_ok(script: Vec<Kind>, value: u32) -> Self {
        Self {
            script,
            success: Some(value),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn step(&self) -> Result<u32, Failure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let idx = (call - 1) as usize;
        match (self.script.get(idx), self.success) {
            (Some(&kind), _) => Err(Failure { kind, call }),
            (None, Some(value)) => Ok(value),
            (None, None) => Err(Failure {
                kind: *self.script.last().unwrap_or(&Kind::Value),
                call,
            }),
        }
    }
}

/// Collects every `(attempt, failure)` the handler is given.
#[derive(Clone, Default)]
pub struct Seen(Arc<Mutex<Vec<(u32, Failure)>>>);

impl Seen {
    pub fn record(&self) -> impl Fn(&Failure, u32) + Send + Sync + 'static {
        let inner = Arc::clone(&self.0);
        move |failure: &Failure, attempt: u32| {
            inner.lock().unwrap().push((attempt, failure.clone()));
        }
    }

    pub fn attempts(&self) -> Vec<u32> {
        self.0.lock().unwrap().iter().map(|(a, _)| *a).collect()
    }

    pub fn all(&self) -> Vec<(u32, Failure)> {
        self.0.lock().unwrap().clone()
    }
}
