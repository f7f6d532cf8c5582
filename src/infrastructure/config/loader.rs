use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::services::AssignmentEngine;

/// Project-local directory holding config, database and logs.
pub const CONFIG_DIR: &str = ".claw";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid heartbeat_timeout_secs: {0}. Must be at least 1")]
    InvalidHeartbeatTimeout(u64),

    #[error("Invalid assignment rules: {0}")]
    InvalidAssignment(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project in the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .claw/config.yaml (project config, created by init)
    /// 3. .claw/local.yaml (project local overrides, optional)
    /// 4. Environment variables (CLAW_* prefix, `__` between sections)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as `load`, rooted at `project_dir` instead of the current directory.
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Config> {
        let claw_dir = project_dir.as_ref().join(CONFIG_DIR);

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(claw_dir.join("config.yaml")))
            .merge(Yaml::file(claw_dir.join("local.yaml")))
            .merge(Env::prefixed("CLAW_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.agents.heartbeat_timeout_secs == 0 {
            return Err(ConfigError::InvalidHeartbeatTimeout(
                config.agents.heartbeat_timeout_secs,
            ));
        }

        if config.assignment.fallback_roles.iter().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed(
                "assignment.fallback_roles cannot contain empty roles".to_string(),
            ));
        }

        // Compiling the table catches empty roles, empty keyword lists and
        // a blank default role.
        AssignmentEngine::new(&config.assignment)
            .map_err(|e| ConfigError::InvalidAssignment(e.to_string()))?;

        Ok(())
    }
}
