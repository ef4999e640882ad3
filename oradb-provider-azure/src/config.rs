//! Provider configuration
//!
//! Read either from the provider block attributes or from a JSON file. Only
//! the subscription is required; polling and deadlines have defaults.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use oradb_core::provider::Operation;
use oradb_core::resource::Value;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::poller::{DEFAULT_POLL_INTERVAL, PollSettings};

/// Environment variable consulted when no subscription is configured
pub const SUBSCRIPTION_ENV: &str = "ARM_SUBSCRIPTION_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required attribute: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {attribute}: expected {expected}, got {actual}")]
    InvalidType {
        attribute: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Invalid subscription ID '{0}': expected a UUID")]
    InvalidSubscription(String),

    #[error("{0} must be greater than zero")]
    NotPositive(String),

    #[error("{0} is too large")]
    OutOfRange(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Per-operation deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: minutes(120),
            read: minutes(5),
            update: minutes(30),
            delete: minutes(30),
        }
    }
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

/// Largest accepted timeout, one year
const MAX_TIMEOUT_MINUTES: u64 = 366 * 24 * 60;

/// Checked conversion of a configured timeout
fn timeout_minutes(name: &str, n: u64) -> ConfigResult<Duration> {
    if n == 0 {
        return Err(ConfigError::NotPositive(name.to_string()));
    }
    if n > MAX_TIMEOUT_MINUTES {
        return Err(ConfigError::OutOfRange(name.to_string()));
    }
    Ok(minutes(n))
}

/// Checked conversion of a configured poll interval
fn poll_interval(n: u64) -> ConfigResult<Duration> {
    if n == 0 {
        return Err(ConfigError::NotPositive("poll_interval_secs".to_string()));
    }
    Ok(Duration::from_secs(n))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub poll_interval: Duration,
    pub timeouts: Timeouts,
}

/// On-disk layout of a config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    subscription_id: Option<String>,
    poll_interval_secs: Option<u64>,
    #[serde(default)]
    timeouts: TimeoutsFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimeoutsFile {
    create_minutes: Option<u64>,
    read_minutes: Option<u64>,
    update_minutes: Option<u64>,
    delete_minutes: Option<u64>,
}

fn positive(name: &str, value: i64) -> ConfigResult<u64> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ConfigError::NotPositive(name.to_string()))
}

fn get_u64(attrs: &HashMap<String, Value>, name: &str) -> ConfigResult<Option<u64>> {
    match attrs.get(name) {
        None => Ok(None),
        Some(Value::Int(n)) => positive(name, *n).map(Some),
        Some(other) => Err(ConfigError::InvalidType {
            attribute: name.to_string(),
            expected: "Int",
            actual: other.type_name(),
        }),
    }
}

impl ProviderConfig {
    /// Config with default polling and deadlines
    pub fn new(subscription_id: impl Into<String>) -> ConfigResult<Self> {
        let subscription_id = subscription_id.into();
        Uuid::parse_str(&subscription_id)
            .map_err(|_| ConfigError::InvalidSubscription(subscription_id.clone()))?;
        Ok(Self {
            subscription_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeouts: Timeouts::default(),
        })
    }

    /// Read the provider block attributes, falling back to the process
    /// environment for the subscription
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> ConfigResult<Self> {
        Self::from_attributes_with_env(attrs, |key| std::env::var(key).ok())
    }

    fn from_attributes_with_env(
        attrs: &HashMap<String, Value>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        let subscription_id = match attrs.get("subscription_id") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(ConfigError::InvalidType {
                    attribute: "subscription_id".to_string(),
                    expected: "String",
                    actual: other.type_name(),
                });
            }
            None => env(SUBSCRIPTION_ENV).ok_or(ConfigError::Missing("subscription_id"))?,
        };

        let mut config = Self::new(subscription_id)?;
        if let Some(secs) = get_u64(attrs, "poll_interval_secs")? {
            config.poll_interval = poll_interval(secs)?;
        }

        match attrs.get("timeouts") {
            None => {}
            Some(Value::Map(timeouts)) => {
                let t = &mut config.timeouts;
                for (name, slot) in [
                    ("create_minutes", &mut t.create),
                    ("read_minutes", &mut t.read),
                    ("update_minutes", &mut t.update),
                    ("delete_minutes", &mut t.delete),
                ] {
                    if let Some(n) = get_u64(timeouts, name)? {
                        *slot = timeout_minutes(name, n)?;
                    }
                }
            }
            Some(other) => {
                return Err(ConfigError::InvalidType {
                    attribute: "timeouts".to_string(),
                    expected: "Map",
                    actual: other.type_name(),
                });
            }
        }

        Ok(config)
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let subscription_id = file
            .subscription_id
            .ok_or(ConfigError::Missing("subscription_id"))?;

        let mut config = Self::new(subscription_id)?;
        if let Some(secs) = file.poll_interval_secs {
            config.poll_interval = poll_interval(secs)?;
        }
        let t = &mut config.timeouts;
        for (name, value, slot) in [
            ("create_minutes", file.timeouts.create_minutes, &mut t.create),
            ("read_minutes", file.timeouts.read_minutes, &mut t.read),
            ("update_minutes", file.timeouts.update_minutes, &mut t.update),
            ("delete_minutes", file.timeouts.delete_minutes, &mut t.delete),
        ] {
            if let Some(n) = value {
                *slot = timeout_minutes(name, n)?;
            }
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// How long `operation` may run before giving up
    pub fn timeout_for(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.timeouts.create,
            Operation::Read => self.timeouts.read,
            Operation::Update => self.timeouts.update,
            Operation::Delete => self.timeouts.delete,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.poll_interval,
        }
    }
}
