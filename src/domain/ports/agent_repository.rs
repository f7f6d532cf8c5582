//! Agent repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Agent, AgentStatus};

/// Filter criteria for listing agents.
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub status: Option<AgentStatus>,
    pub role: Option<String>,
}

/// Repository interface for the agent registry.
///
/// `list` must return agents in registration order: assignment tie-breaks
/// depend on it.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Register a new agent. Fails with `ValidationFailed` on a duplicate id.
    async fn create(&self, agent: &Agent) -> DomainResult<()>;

    /// Get an agent by ID.
    async fn get(&self, id: &str) -> DomainResult<Option<Agent>>;

    /// Overwrite a stored agent. Fails with `AgentNotFound` if absent.
    async fn update(&self, agent: &Agent) -> DomainResult<()>;

    /// Overwrite several agents in one transaction.
    async fn update_many(&self, agents: &[Agent]) -> DomainResult<()>;

    /// Remove an agent.
    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// List agents in registration order.
    async fn list(&self, filter: AgentFilter) -> DomainResult<Vec<Agent>>;

    /// Point the agent at the task it is working on, or mark it idle.
    async fn set_current_task(&self, id: &str, task_id: Option<Uuid>) -> DomainResult<()>;
}
