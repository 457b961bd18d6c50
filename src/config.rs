//! Resolution context configuration
//!
//! Defaults: 5 ticks of 50ms (250ms TTL), no cache sweeping.
//!
//! ```yaml
//! ttl_ticks: 5
//! tick_millis: 50
//! sweep_after: 20   # evict entries idle for 20 x TTL
//! ```
//!
//! Env overrides: `REPLACE_TTL_TICKS`, `REPLACE_TICK_MILLIS`, `REPLACE_SWEEP_AFTER`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReplaceError;

pub const DEFAULT_TTL_TICKS: u32 = 5;
pub const DEFAULT_TICK_MILLIS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Ticks a cached value stays fresh
    pub ttl_ticks: u32,
    /// Length of one tick
    pub tick_millis: u64,
    /// Evict non-const entries not read within `sweep_after` TTL windows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_after: Option<u32>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ttl_ticks: DEFAULT_TTL_TICKS,
            tick_millis: DEFAULT_TICK_MILLIS,
            sweep_after: None,
        }
    }
}

impl ContextConfig {
    pub fn with_ttl_ticks(ttl_ticks: u32) -> Self {
        Self {
            ttl_ticks,
            ..Self::default()
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.tick_millis.saturating_mul(u64::from(self.ttl_ticks)))
    }

    /// Idle time after which a cache entry may be swept
    pub fn sweep_window(&self) -> Option<Duration> {
        self.sweep_after
            .map(|n| self.ttl().saturating_mul(n.max(1)))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ReplaceError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Defaults with env overrides applied
    pub fn from_env() -> Result<Self, ReplaceError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, ReplaceError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ReplaceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("REPLACE_TTL_TICKS") {
            self.ttl_ticks = parse_env("REPLACE_TTL_TICKS", &v)?;
        }
        if let Some(v) = lookup("REPLACE_TICK_MILLIS") {
            self.tick_millis = parse_env("REPLACE_TICK_MILLIS", &v)?;
        }
        if let Some(v) = lookup("REPLACE_SWEEP_AFTER") {
            self.sweep_after = Some(parse_env("REPLACE_SWEEP_AFTER", &v)?);
        }
        Ok(self)
    }
}

fn parse_env<N: std::str::FromStr>(key: &str, value: &str) -> Result<N, ReplaceError> {
    value.trim().parse().map_err(|_| ReplaceError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}
