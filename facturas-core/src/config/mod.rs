use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerSettings,
}

/// Tuning knobs for the payment ledger's transactional read-modify-write.
#[derive(Debug, Deserialize, Clone)]
pub struct LedgerSettings {
    /// Retries after a conflicting concurrent write (not counting the
    /// initial attempt).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Upper bound on each store round-trip.
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_op_timeout_ms() -> u64 {
    5_000
}

fn default_backoff_initial_ms() -> u64 {
    50
}

fn default_backoff_max_ms() -> u64 {
    500
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            op_timeout_ms: default_op_timeout_ms(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl LedgerSettings {
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_settings_defaults() {
        let settings = LedgerSettings::default();
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.op_timeout(), Duration::from_secs(5));
    }
}
