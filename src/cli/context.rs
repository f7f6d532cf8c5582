//! Wiring shared by the CLI commands: database, event bus, control center.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::adapters::sqlite::{
    initialize_from_config, SqliteActivityRepository, SqliteAgentRepository, SqliteBoardStore,
    SqliteTaskRepository,
};
use crate::application::ControlCenter;
use crate::cli::id_resolver::{resolve_task_id, resolve_task_ids};
use crate::domain::models::Config;
use crate::domain::ports::ActivityRepository;
use crate::services::{EventBus, EventBusConfig};

/// The control center as the CLI runs it: everything backed by SQLite.
pub type SqliteControlCenter = ControlCenter<SqliteTaskRepository, SqliteAgentRepository>;

/// Create an EventBus that persists activity to SQLite.
pub fn create_persistent_event_bus(pool: SqlitePool) -> Arc<EventBus> {
    let store = Arc::new(SqliteActivityRepository::new(pool));
    Arc::new(
        EventBus::new(EventBusConfig {
            persist_events: true,
            ..Default::default()
        })
        .with_store(store as Arc<dyn ActivityRepository>),
    )
}

pub struct CliContext {
    pub center: SqliteControlCenter,
    pub pool: SqlitePool,
}

impl CliContext {
    /// Open (and migrate) the configured database and wire the control center.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = initialize_from_config(&config.database)
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;

        let center = ControlCenter::new(
            Arc::new(SqliteTaskRepository::new(pool.clone())),
            Arc::new(SqliteAgentRepository::new(pool.clone())),
            Arc::new(SqliteBoardStore::new(pool.clone())),
            create_persistent_event_bus(pool.clone()),
            config,
        )
        .context("Failed to build control center from configuration")?;

        Ok(Self { center, pool })
    }

    pub async fn resolve_task(&self, prefix: &str) -> Result<Uuid> {
        resolve_task_id(&self.pool, prefix).await
    }

    pub async fn resolve_tasks(&self, prefixes: &[String]) -> Result<Vec<Uuid>> {
        resolve_task_ids(&self.pool, prefixes).await
    }
}
