//! `easy-retry config` – print the effective policy.

use anyhow::Result;
use easy_retry::config::RetryConfig;

use crate::cli::FailureClass;

pub fn run_show_config(cfg: &RetryConfig<FailureClass>) -> Result<()> {
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
