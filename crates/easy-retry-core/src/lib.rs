pub mod config;
pub mod logging;
pub mod retry;

pub use retry::{
    AsyncAttemptExecutor, AttemptExecutor, Classify, ConfigError, RetryError, RetryMode,
    RetryPolicy, Retrying, RetryingAsync,
};
