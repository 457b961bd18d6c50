//! Value sheet - a YAML-backed binding for the `replace` binary
//!
//! ```yaml
//! config:
//!   ttl_ticks: 2
//! values:
//!   name: Steve
//!   coins: [10, 20, 30]   # cycles one entry per tick
//! ```
//!
//! Every key becomes a placeholder. Supported arguments: `%name_upper%`,
//! `%name_lower%`, `%coins_len%`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::warn;

use crate::config::ContextConfig;
use crate::error::ReplaceError;
use crate::placeholder::Placeholder;
use crate::registry::PlaceholderRegistry;
use crate::token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetValue {
    Fixed(String),
    Cycle(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct SheetFile {
    #[serde(default)]
    config: ContextConfig,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct ValueSheet {
    values: BTreeMap<String, SheetValue>,
    tick: u64,
}

impl ValueSheet {
    /// Parse a sheet file into its config and the sheet itself
    pub fn from_yaml_str(yaml: &str) -> Result<(ContextConfig, Self), ReplaceError> {
        let file: SheetFile = serde_yaml::from_str(yaml)?;
        let values = file
            .values
            .into_iter()
            .map(|(key, value)| (key, sheet_value(value)))
            .collect();
        Ok((file.config, Self { values, tick: 0 }))
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Current value of `key` (cycles advance with the tick)
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            SheetValue::Fixed(value) => Some(value),
            SheetValue::Cycle(values) if values.is_empty() => Some(""),
            SheetValue::Cycle(values) => {
                let index = (self.tick % values.len() as u64) as usize;
                Some(&values[index])
            }
        }
    }

    fn render(&self, token: &str) -> Result<String, String> {
        let key = token::identifier(token);
        let Some(value) = self.get(key) else {
            return Err(format!("no value for '{}'", key));
        };
        match token::arguments(token) {
            None => Ok(value.to_string()),
            Some("upper") => Ok(value.to_uppercase()),
            Some("lower") => Ok(value.to_lowercase()),
            Some("len") => Ok(match self.values.get(key) {
                Some(SheetValue::Cycle(values)) => values.len().to_string(),
                _ => value.chars().count().to_string(),
            }),
            Some(other) => Err(format!("unsupported argument '{}'", other)),
        }
    }

    /// Register one placeholder per key onto `registry`
    pub fn register(&self, registry: &PlaceholderRegistry) {
        let placeholders: Vec<_> = self
            .keys()
            .filter(|key| {
                let usable = !key.is_empty() && !key.contains('_') && !key.contains('%');
                if !usable {
                    warn!(key = %key, "sheet key cannot be used as a placeholder identifier");
                }
                usable
            })
            .map(|key| Placeholder::fallible(key.to_string(), |sheet: &ValueSheet, token: &str| sheet.render(token)))
            .collect();
        registry.register(placeholders);
    }
}

fn sheet_value(value: Value) -> SheetValue {
    match value {
        Value::Sequence(items) => SheetValue::Cycle(items.into_iter().map(scalar).collect()),
        other => SheetValue::Fixed(scalar(other)),
    }
}

fn scalar(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
