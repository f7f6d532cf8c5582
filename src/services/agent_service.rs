//! Agent registry service.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Agent, AgentStatus};
use crate::domain::ports::{AgentFilter, AgentRepository};

/// Snapshot of one agent's load, for assignment UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentWorkload {
    pub agent_id: String,
    pub name: String,
    pub status: AgentStatus,
    pub workload: usize,
    pub current_task: Option<Uuid>,
}

impl From<&Agent> for AgentWorkload {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.id.clone(),
            name: agent.name.clone(),
            status: agent.status,
            workload: agent.workload(),
            current_task: agent.current_task,
        }
    }
}

pub struct AgentService<A: AgentRepository> {
    agent_repo: Arc<A>,
}

impl<A: AgentRepository> AgentService<A> {
    pub fn new(agent_repo: Arc<A>) -> Self {
        Self { agent_repo }
    }

    /// Register a new online agent.
    pub async fn register<I, S>(&self, id: &str, name: &str, roles: I) -> DomainResult<Agent>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.trim();
        if id.is_empty() {
            return Err(DomainError::ValidationFailed("Agent id cannot be empty".to_string()));
        }
        let name = if name.trim().is_empty() { id } else { name };

        let roles: Vec<String> = roles
            .into_iter()
            .map(|r| {
                let role: String = r.into();
                role.trim().to_lowercase()
            })
            .filter(|r| !r.is_empty())
            .collect();
        let agent = Agent::new(id, name).with_roles(roles);

        self.agent_repo.create(&agent).await?;
        tracing::info!(agent_id = %agent.id, roles = ?agent.roles, "agent registered");
        Ok(agent)
    }

    pub async fn get(&self, id: &str) -> DomainResult<Option<Agent>> {
        self.agent_repo.get(id).await
    }

    /// Like `get`, but a missing agent is an error.
    pub async fn require(&self, id: &str) -> DomainResult<Agent> {
        self.agent_repo
            .get(id)
            .await?
            .ok_or_else(|| DomainError::AgentNotFound(id.to_string()))
    }

    /// Agents in registration order.
    pub async fn list(&self, filter: AgentFilter) -> DomainResult<Vec<Agent>> {
        self.agent_repo.list(filter).await
    }

    /// Refresh the heartbeat and set the status (`online` when omitted).
    pub async fn heartbeat(&self, id: &str, status: Option<AgentStatus>) -> DomainResult<Agent> {
        let mut agent = self.require(id).await?;
        agent.update_heartbeat();
        agent.status = status.unwrap_or(AgentStatus::Online);
        self.agent_repo.update(&agent).await?;
        Ok(agent)
    }

    pub async fn set_current_task(&self, id: &str, task_id: Option<Uuid>) -> DomainResult<()> {
        self.agent_repo.set_current_task(id, task_id).await
    }

    /// Agents whose active lists change when `task_id` moves from one
    /// owner to another. Nothing is written; owners that are not
    /// registered are skipped.
    pub async fn plan_workload_move(
        &self,
        task_id: Uuid,
        from: Option<&str>,
        to: Option<&str>,
    ) -> DomainResult<Vec<Agent>> {
        let mut changed: Vec<Agent> = Vec::new();

        if let Some(from) = from {
            if let Some(mut agent) = self.agent_repo.get(from).await? {
                if agent.release_task(task_id) {
                    changed.push(agent);
                }
            }
        }
        if let Some(to) = to {
            let existing = changed.iter_mut().find(|a| a.id == to);
            match existing {
                Some(agent) => agent.take_task(task_id),
                None => match self.agent_repo.get(to).await? {
                    Some(mut agent) => {
                        agent.take_task(task_id);
                        changed.push(agent);
                    }
                    None => {
                        tracing::debug!(task_id = %task_id, owner = %to, "owner is not a registered agent");
                    }
                },
            }
        }

        Ok(changed)
    }

    /// Remove an agent. Refused while it still owns open tasks.
    pub async fn deregister(&self, id: &str) -> DomainResult<()> {
        let agent = self.require(id).await?;
        if agent.workload() > 0 {
            return Err(DomainError::ValidationFailed(format!(
                "Agent {id} still owns {} active task(s)",
                agent.workload()
            )));
        }
        self.agent_repo.delete(id).await?;
        tracing::info!(agent_id = %id, "agent deregistered");
        Ok(())
    }

    /// Mark every non-offline agent whose heartbeat is older than
    /// `threshold` as offline. Returns the agents that changed.
    pub async fn mark_stale_offline(&self, threshold: chrono::Duration) -> DomainResult<Vec<Agent>> {
        let stale: Vec<Agent> = self
            .agent_repo
            .list(AgentFilter::default())
            .await?
            .into_iter()
            .filter(|a| a.status != AgentStatus::Offline && a.is_stale(threshold))
            .map(|a| a.with_status(AgentStatus::Offline))
            .collect();

        if !stale.is_empty() {
            self.agent_repo.update_many(&stale).await?;
        }
        for agent in &stale {
            tracing::warn!(agent_id = %agent.id, last_heartbeat = %agent.last_heartbeat, "agent marked offline");
        }
        Ok(stale)
    }

    /// Current load of every agent, in registration order.
    pub async fn workloads(&self) -> DomainResult<Vec<AgentWorkload>> {
        let agents = self.agent_repo.list(AgentFilter::default()).await?;
        Ok(agents.iter().map(AgentWorkload::from).collect())
    }
}
