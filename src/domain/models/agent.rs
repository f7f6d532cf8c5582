use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Agent availability. Only `Offline` removes an agent from assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Online,
    Offline,
    Busy,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Busy => "busy",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" | "idle" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "busy" => Ok(Self::Busy),
            _ => Err(anyhow::anyhow!("Invalid agent status: {s}")),
        }
    }
}

/// A registered agent that can own tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Operator-chosen identifier, e.g. `forge`
    pub id: String,

    /// Display name
    pub name: String,

    /// Role tags this agent can be matched against
    pub roles: BTreeSet<String>,

    pub status: AgentStatus,

    /// Owned tasks that are not yet done, in assignment order
    pub active_tasks: Vec<Uuid>,

    /// Task the agent is working on right now (if any)
    pub current_task: Option<Uuid>,

    pub last_heartbeat: DateTime<Utc>,

    pub registered_at: DateTime<Utc>,
}

impl Agent {
    /// Create a new online agent with no work.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            roles: BTreeSet::new(),
            status: AgentStatus::Online,
            active_tasks: Vec::new(),
            current_task: None,
            last_heartbeat: now,
            registered_at: now,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    /// Number of open tasks owned by this agent.
    pub fn workload(&self) -> usize {
        self.active_tasks.len()
    }

    pub fn is_available(&self) -> bool {
        self.status != AgentStatus::Offline
    }

    pub fn is_working(&self) -> bool {
        self.current_task.is_some()
    }

    pub fn has_any_role(&self, roles: &BTreeSet<String>) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }

    /// Record a newly owned task. Already-tracked ids are not duplicated.
    pub fn take_task(&mut self, task_id: Uuid) {
        if !self.active_tasks.contains(&task_id) {
            self.active_tasks.push(task_id);
        }
        if self.current_task.is_none() {
            self.current_task = Some(task_id);
        }
    }

    /// Forget a task that finished or changed hands. If it was the current
    /// task, the next active task (if any) becomes current.
    pub fn release_task(&mut self, task_id: Uuid) -> bool {
        let before = self.active_tasks.len();
        self.active_tasks.retain(|id| *id != task_id);
        if self.current_task == Some(task_id) {
            self.current_task = self.active_tasks.first().copied();
        }
        before != self.active_tasks.len()
    }

    /// Check if agent is stale based on heartbeat threshold
    pub fn is_stale(&self, threshold: chrono::Duration) -> bool {
        let elapsed = Utc::now() - self.last_heartbeat;
        elapsed > threshold
    }

    pub fn update_heartbeat(&mut self) {
        self.last_heartbeat = Utc::now();
    }
}
