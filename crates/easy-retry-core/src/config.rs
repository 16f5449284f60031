use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::{Classify, ConfigError, RetryMode, RetryPolicy, RetryPolicyBuilder};

/// Retry policy parameters as written in `config.toml`.
///
/// `K` is the failure-kind identifier listed under `exceptions`; it only has to
/// be (de)serializable. The handler cannot be expressed here and is attached
/// on the builder returned by [`RetryConfig::builder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig<K = String> {
    /// Maximum number of attempts (including the first); absent = unbounded.
    #[serde(default)]
    pub attempts: Option<u32>,
    /// Fixed delay in seconds between attempts (e.g. 0.25 = 250ms).
    #[serde(default)]
    pub backoff_secs: f64,
    /// "handle" (retry only the listed kinds) or "ignore" (retry all but them).
    #[serde(default)]
    pub mode: RetryMode,
    /// Failure kinds the mode applies to; absent = retry every failure.
    pub exceptions: Option<Vec<K>>,
}

impl<K> Default for RetryConfig<K> {
    fn default() -> Self {
        Self {
            attempts: None,
            backoff_secs: 0.0,
            mode: RetryMode::Handle,
            exceptions: None,
        }
    }
}

impl<K: Clone> RetryConfig<K> {
    /// Builder pre-filled from this config; validation happens on `build()`.
    pub fn builder<E>(&self) -> RetryPolicyBuilder<E>
    where
        E: Classify<Kind = K>,
    {
        let mut builder = RetryPolicy::builder()
            .max_attempts(self.attempts)
            .backoff_secs(self.backoff_secs)
            .mode(self.mode.clone());
        if let Some(kinds) = &self.exceptions {
            builder = builder.exceptions(kinds.iter().cloned());
        }
        builder
    }

    pub fn to_policy<E>(&self) -> Result<RetryPolicy<E>, ConfigError>
    where
        E: Classify<Kind = K>,
    {
        self.builder().build()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("easy-retry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from an explicit file.
pub fn load_from<K: DeserializeOwned>(path: &Path) -> Result<RetryConfig<K>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: RetryConfig<K> =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init<K>() -> Result<RetryConfig<K>>
where
    K: Serialize + DeserializeOwned,
{
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RetryConfig::<K>::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}
