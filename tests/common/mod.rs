//! Common test utilities for integration tests
//!
//! Builds a control center over an in-memory migrated SQLite pool, with
//! activity persisted so feeds can be asserted on.

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::broadcast;

use claw_control::adapters::sqlite::{
    create_migrated_test_pool, SqliteActivityRepository, SqliteAgentRepository,
    SqliteBoardStore, SqliteTaskRepository,
};
use claw_control::services::{BusEvent, BusPayload, EventBus};
use claw_control::{Config, ControlCenter, Notification};

pub type TestCenter = ControlCenter<SqliteTaskRepository, SqliteAgentRepository>;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Control center with the default configuration.
pub async fn setup_center() -> TestCenter {
    setup_center_with(Config::default()).await
}

pub async fn setup_center_with(config: Config) -> TestCenter {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create test pool");
    let store = Arc::new(SqliteActivityRepository::new(pool.clone()));
    let events = Arc::new(EventBus::default().with_store(store));

    ControlCenter::new(
        Arc::new(SqliteTaskRepository::new(pool.clone())),
        Arc::new(SqliteAgentRepository::new(pool.clone())),
        Arc::new(SqliteBoardStore::new(pool)),
        events,
        &config,
    )
    .expect("Default config should build a control center")
}

/// Register an online agent with the given roles.
pub async fn register(center: &TestCenter, id: &str, roles: &[&str]) {
    center
        .register_agent(id, id, roles.iter().map(|r| (*r).to_string()).collect())
        .await
        .expect("Failed to register agent");
}

/// Drain every notification currently buffered on the receiver.
pub fn drain_notifications(rx: &mut broadcast::Receiver<BusEvent>) -> Vec<(String, Notification)> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let BusPayload::Notification {
            agent_id,
            notification,
        } = event.payload
        {
            out.push((agent_id, notification));
        }
    }
    out
}

/// Setup test logging
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
