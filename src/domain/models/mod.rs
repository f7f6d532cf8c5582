pub mod activity;
pub mod agent;
pub mod config;
pub mod role;
pub mod task;

pub use activity::{ActivityEvent, ActivityKind};
pub use agent::{Agent, AgentStatus};
pub use config::{AgentsConfig, AssignmentConfig, Config, DatabaseConfig, LoggingConfig};
pub use role::{default_role_rules, RoleRule, DEVELOPER_ROLES};
pub use task::{
    ArtifactKind, Lane, NewTask, Priority, StatusEntry, Task, TaskPatch, WorkArtifact,
};
