//! ==============================================================================
//! config.rs - persisted client settings
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `client.toml` and carries the two values the
//!     app keeps across restarts: the configured API url and the auth token.
//!     loads from file or falls back to defaults, and writes back after the
//!     settings screen / login flow changes either value.
//!
//! relationships:
//!     - feeds: client.rs (SessionClientBuilder base_url/token at startup)
//!     - the client itself never reads or writes persistent storage
//!
//! ==============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::DEFAULT_BASE_URL;

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: ClientConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// Load with default fallback
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match Self::load(path) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded client config");
                    return config;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load config");
                }
            }
        }

        info!("no config file found, using defaults");
        Self::default()
    }

    /// Write the current settings back to disk.
    pub fn store<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| anyhow::anyhow!("Failed to write config file: {}", e))?;
        Ok(())
    }
}
