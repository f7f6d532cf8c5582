//! Claw - task board and assignment control center for agent teams
//!
//! Tasks move across a board of lanes (`proposed`, `queued`,
//! `development`, `review`, `blocked`, `done`) with an append-only status
//! history. Completing a task unblocks the tasks that depended on it.
//! Unowned tasks are auto-assigned: roles are inferred from the task text
//! with a keyword table, and the least-loaded online agent carrying one of
//! those roles gets the work.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): task store logic, assignment engine,
//!   agent registry, dependency checks, event bus
//! - **Application Layer** (`application`): the single-writer `ControlCenter`
//! - **Adapters** (`adapters`): SQLite implementations of the ports
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): the `claw` command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use claw_control::adapters::sqlite::*;
//! use claw_control::{Config, ControlCenter, EventBus, NewTask};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pool = initialize_database("sqlite::memory:").await?;
//! let center = ControlCenter::new(
//!     Arc::new(SqliteTaskRepository::new(pool.clone())),
//!     Arc::new(SqliteAgentRepository::new(pool.clone())),
//!     Arc::new(SqliteBoardStore::new(pool)),
//!     Arc::new(EventBus::default()),
//!     &Config::default(),
//! )?;
//! center.register_agent("forge", "Forge", vec!["backend-dev".into()]).await?;
//! let created = center.create_task(NewTask::titled("Build login API")).await?;
//! assert_eq!(created.task.owner.as_deref(), Some("forge"));
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{AssignmentResult, ControlCenter, CreatedTask};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    ActivityEvent, ActivityKind, Agent, AgentStatus, ArtifactKind, Config, Lane, NewTask,
    Priority, RoleRule, StatusEntry, Task, TaskPatch, WorkArtifact,
};
pub use domain::ports::{
    ActivityFilter, ActivityRepository, AgentFilter, AgentRepository, BoardChanges, BoardStore,
    Notification, Notifier, TaskFilter, TaskRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{AssignmentEngine, AssignmentOutcome, DependencyResolver, EventBus};
