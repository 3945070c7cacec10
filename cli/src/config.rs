//! Environment-driven configuration.
//!
//! Every setting is read from a `CHAINWATCH_*` variable. A `.env` file in the
//! working directory is loaded first, if present. Durations are integer
//! milliseconds.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use chainwatch_api::ServerConfig;
use chainwatch_core::types::parse_quantity;
use chainwatch_core::WorkerConfig;
use chainwatch_evm::HttpClientConfig;

use crate::telemetry::LogConfig;

pub const ETH_HTTP_CLIENT_HOST: &str = "CHAINWATCH_ETH_HTTP_CLIENT_HOST";
pub const ETH_HTTP_CLIENT_TIMEOUT_MS: &str = "CHAINWATCH_ETH_HTTP_CLIENT_TIMEOUT_MS";
pub const WORKER_COUNT: &str = "CHAINWATCH_WORKER_COUNT";
pub const WORKER_INTERVAL_MS: &str = "CHAINWATCH_WORKER_INTERVAL_MS";
pub const WORKER_START_BLOCK_NUMBER: &str = "CHAINWATCH_WORKER_START_BLOCK_NUMBER";
pub const WORKER_STALENESS_WINDOW_MS: &str = "CHAINWATCH_WORKER_STALENESS_WINDOW_MS";
pub const PREDEFINED_ADDRESSES: &str = "CHAINWATCH_PREDEFINED_ADDRESSES";
pub const SERVER_HOST: &str = "CHAINWATCH_SERVER_HOST";
pub const SERVER_PORT: &str = "CHAINWATCH_SERVER_PORT";
pub const LOG_LEVEL: &str = "CHAINWATCH_LOG_LEVEL";
pub const LOG_JSON: &str = "CHAINWATCH_LOG_JSON";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Full daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub client: HttpClientConfig,
    pub worker: WorkerConfig,
    pub server: ServerConfig,
    pub log: LogConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Config::default();

        config.client.url = get(ETH_HTTP_CLIENT_HOST).ok_or(ConfigError::Missing(ETH_HTTP_CLIENT_HOST))?;
        if let Some(ms) = positive(ETH_HTTP_CLIENT_TIMEOUT_MS, get(ETH_HTTP_CLIENT_TIMEOUT_MS))? {
            config.client.timeout_ms = ms;
        }

        if let Some(count) = positive(WORKER_COUNT, get(WORKER_COUNT))? {
            config.worker.count = count;
        }
        if let Some(ms) = positive(WORKER_INTERVAL_MS, get(WORKER_INTERVAL_MS))? {
            config.worker.interval_ms = ms;
        }
        if let Some(raw) = get(WORKER_START_BLOCK_NUMBER) {
            let number = parse_quantity(&raw).ok_or_else(|| ConfigError::Invalid {
                key: WORKER_START_BLOCK_NUMBER,
                value: raw.clone(),
                reason: "expected a decimal or 0x-prefixed block number".into(),
            })?;
            config.worker.start_block = Some(number);
        }
        if let Some(ms) = parsed(WORKER_STALENESS_WINDOW_MS, get(WORKER_STALENESS_WINDOW_MS))? {
            config.worker.staleness_window_ms = ms;
        }
        if let Some(raw) = get(PREDEFINED_ADDRESSES) {
            config.worker.predefined_addresses = raw
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(host) = get(SERVER_HOST) {
            config.server.host = host;
        }
        if let Some(port) = parsed(SERVER_PORT, get(SERVER_PORT))? {
            config.server.port = port;
        }

        if let Some(level) = get(LOG_LEVEL) {
            config.log.level = level;
        }
        if let Some(raw) = get(LOG_JSON) {
            config.log.json = flag(LOG_JSON, raw)?;
        }

        Ok(config)
    }
}

fn parsed<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(|value| {
        value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        })
    })
    .transpose()
}

fn positive<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: Display,
{
    match parsed::<T>(key, raw.clone())? {
        Some(v) if v == T::default() => Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
            reason: "must be greater than zero".into(),
        }),
        other => Ok(other),
    }
}

fn flag(key: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected true or false".into(),
        }),
    }
}
