//! Port trait definitions (Hexagonal Architecture)
//!
//! Async interfaces the infrastructure adapters implement:
//! - TaskRepository: task reads and single-task writes
//! - AgentRepository: the agent registry
//! - BoardStore: atomic multi-row commits of tasks and agents
//! - ActivityRepository: the activity feed
//! - Notifier: agent notifications

pub mod activity_repository;
pub mod agent_repository;
pub mod board_store;
pub mod notifier;
pub mod task_repository;

pub use activity_repository::{ActivityFilter, ActivityRepository};
pub use agent_repository::{AgentFilter, AgentRepository};
pub use board_store::{BoardChanges, BoardStore};
pub use notifier::{Notification, Notifier};
pub use task_repository::{TaskFilter, TaskRepository};
