//! Unit-of-work port for board mutations.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Agent, Task};

/// Rows written together by one board mutation.
#[derive(Debug, Clone, Default)]
pub struct BoardChanges {
    /// Tasks to insert.
    pub created: Vec<Task>,
    /// Tasks to overwrite.
    pub updated: Vec<Task>,
    /// Agents to overwrite.
    pub agents: Vec<Agent>,
}

impl BoardChanges {
    pub fn create(task: Task) -> Self {
        Self {
            created: vec![task],
            ..Default::default()
        }
    }

    pub fn update(tasks: Vec<Task>) -> Self {
        Self {
            updated: tasks,
            ..Default::default()
        }
    }

    pub fn with_agents(mut self, agents: Vec<Agent>) -> Self {
        self.agents = agents;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.agents.is_empty()
    }
}

/// Commits task and agent rows atomically.
///
/// Either every row in `BoardChanges` is written or none is. A missing
/// task or agent on overwrite fails the whole commit with `TaskNotFound`
/// or `AgentNotFound`.
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn commit(&self, changes: &BoardChanges) -> DomainResult<()>;
}
