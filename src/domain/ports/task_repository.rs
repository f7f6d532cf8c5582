use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Lane, Priority, Task};

/// Filter criteria for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub lane: Option<Lane>,
    pub owner: Option<String>,
    pub priority: Option<Priority>,
    /// Only tasks without an owner.
    pub unassigned: bool,
    pub limit: Option<usize>,
}

impl TaskFilter {
    pub fn lane(lane: Lane) -> Self {
        Self {
            lane: Some(lane),
            ..Default::default()
        }
    }

    pub fn owner(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..Default::default()
        }
    }
}

/// Repository interface for Task persistence.
///
/// Inserts and multi-row writes go through `BoardStore`, so they commit
/// together with the agent bookkeeping they imply.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Get a task by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Task>>;

    /// Overwrite a stored task. Fails with `TaskNotFound` if absent.
    async fn update(&self, task: &Task) -> DomainResult<()>;

    /// List tasks matching the filter, oldest first.
    async fn list(&self, filter: TaskFilter) -> DomainResult<Vec<Task>>;

    /// Tasks whose `depends_on` contains `task_id` (the derived `blocks` set).
    async fn get_dependents(&self, task_id: Uuid) -> DomainResult<Vec<Task>>;
}
