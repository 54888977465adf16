//! Main application configuration
//!
//! This module defines the configuration structures for the rendezvous
//! service, including environment variable and TOML file loading and
//! validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub matchmaking: MatchmakingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Largest `maximum_participants` a template may ask for
    pub max_participants_limit: u16,
    /// Notify the gathering owner when someone joins
    pub notify_owner_on_join: bool,
    /// Per-connection notification queue depth
    pub notification_queue_depth: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "rendezvous-room".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            max_participants_limit: 32,
            notify_owner_on_join: true,
            notification_queue_depth: 64,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing keys take defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| anyhow!("Invalid configuration file: {}", e))
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(limit) = env::var("MAX_PARTICIPANTS_LIMIT") {
            self.matchmaking.max_participants_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_PARTICIPANTS_LIMIT value: {}", limit))?;
        }
        if let Ok(notify) = env::var("NOTIFY_OWNER_ON_JOIN") {
            self.matchmaking.notify_owner_on_join = notify
                .parse()
                .map_err(|_| anyhow!("Invalid NOTIFY_OWNER_ON_JOIN value: {}", notify))?;
        }
        if let Ok(depth) = env::var("NOTIFICATION_QUEUE_DEPTH") {
            self.matchmaking.notification_queue_depth = depth
                .parse()
                .map_err(|_| anyhow!("Invalid NOTIFICATION_QUEUE_DEPTH value: {}", depth))?;
        }
        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    if config.matchmaking.max_participants_limit == 0 {
        return Err(anyhow!("Max participants limit must be greater than 0"));
    }
    if config.matchmaking.notification_queue_depth == 0 {
        return Err(anyhow!("Notification queue depth must be greater than 0"));
    }

    Ok(())
}
