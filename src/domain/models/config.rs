use serde::{Deserialize, Serialize};

use super::role::{default_role_rules, RoleRule, DEVELOPER_ROLES, FULLSTACK_DEV};

/// Main configuration structure for the control center
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Auto-assignment configuration
    #[serde(default)]
    pub assignment: AssignmentConfig,

    /// Agent registry configuration
    #[serde(default)]
    pub agents: AgentsConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".claw/claw.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// `sqlx` connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            retention_days: default_retention_days(),
        }
    }
}

/// Auto-assignment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AssignmentConfig {
    /// Run auto-assignment when a task is created without an owner
    #[serde(default = "default_true")]
    pub auto_assign_on_create: bool,

    /// Role inferred when no keyword matches
    #[serde(default = "default_role")]
    pub default_role: String,

    /// Roles tried when no agent matches a developer task
    #[serde(default = "default_fallback_roles")]
    pub fallback_roles: Vec<String>,

    /// Keyword table, in match order
    #[serde(default = "default_role_rules")]
    pub rules: Vec<RoleRule>,
}

const fn default_true() -> bool {
    true
}

fn default_role() -> String {
    FULLSTACK_DEV.to_string()
}

fn default_fallback_roles() -> Vec<String> {
    DEVELOPER_ROLES.iter().map(|r| (*r).to_string()).collect()
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            auto_assign_on_create: default_true(),
            default_role: default_role(),
            fallback_roles: default_fallback_roles(),
            rules: default_role_rules(),
        }
    }
}

/// Agent registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentsConfig {
    /// Seconds without a heartbeat before a sweep marks an agent offline
    #[serde(default = "default_heartbeat_timeout_secs")]
    pub heartbeat_timeout_secs: u64,
}

const fn default_heartbeat_timeout_secs() -> u64 {
    300
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout_secs: default_heartbeat_timeout_secs(),
        }
    }
}
