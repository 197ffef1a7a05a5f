//! Protocol configuration
//!
//! Loaded from the environment (`OPS_*` variables) or a YAML file:
//!
//! ```yaml
//! default_trust_mode: training_wheels
//! fallback_messages: true
//! recent_limit: 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::context::MAX_RECENT_IDS;
use crate::error::ConfigError;
use crate::ops::TrustMode;

pub const ENV_TRUST_MODE: &str = "OPS_TRUST_MODE";
pub const ENV_FALLBACK_MESSAGES: &str = "OPS_FALLBACK_MESSAGES";
pub const ENV_RECENT_LIMIT: &str = "OPS_RECENT_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsConfig {
    /// Trust mode used when a request does not carry one
    pub default_trust_mode: TrustMode,
    /// Explain failed operations to the user with a chat message
    pub fallback_messages: bool,
    /// Length of the recent task/project lists in thread context (1..=10)
    pub recent_limit: usize,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            default_trust_mode: TrustMode::default(),
            fallback_messages: true,
            recent_limit: MAX_RECENT_IDS,
        }
    }
}

impl OpsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_TRUST_MODE) {
            config.default_trust_mode =
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_TRUST_MODE,
                        value: value.clone(),
                    })?;
        }
        if let Some(value) = lookup(ENV_FALLBACK_MESSAGES) {
            config.fallback_messages = match value.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_FALLBACK_MESSAGES,
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup(ENV_RECENT_LIMIT) {
            config.recent_limit = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_RECENT_LIMIT,
                value: value.clone(),
            })?;
        }

        config.validate()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: OpsConfig = serde_yaml::from_str(yaml)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.recent_limit == 0 || self.recent_limit > MAX_RECENT_IDS {
            return Err(ConfigError::InvalidValue {
                key: "recent_limit",
                value: self.recent_limit.to_string(),
            });
        }
        Ok(self)
    }
}
