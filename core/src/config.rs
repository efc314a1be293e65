//! Client configuration.
//!
//! The only externally configurable value is the backend base URL, taken from
//! `HR_API_BASE_URL`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the backend base URL.
pub const BASE_URL_VAR: &str = "HR_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable {var} is not set")]
    Missing { var: &'static str },

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    /// Validate and normalize a base URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid {
                var: BASE_URL_VAR,
                value: base_url.to_string(),
                reason: "must not be empty",
            });
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: BASE_URL_VAR,
                value: base_url.to_string(),
                reason: "must start with http:// or https://",
            });
        }
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = lookup(BASE_URL_VAR).ok_or(ConfigError::Missing { var: BASE_URL_VAR })?;
        Self::new(&value)
    }
}
