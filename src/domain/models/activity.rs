//! Activity feed entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    TaskCreated,
    TaskUpdated,
    LaneChanged,
    TaskAssigned,
    TaskUnblocked,
    ArtifactRecorded,
    AgentRegistered,
    AgentStatusChanged,
    DependencyCycle,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::TaskUpdated => "task_updated",
            Self::LaneChanged => "lane_changed",
            Self::TaskAssigned => "task_assigned",
            Self::TaskUnblocked => "task_unblocked",
            Self::ArtifactRecorded => "artifact_recorded",
            Self::AgentRegistered => "agent_registered",
            Self::AgentStatusChanged => "agent_status_changed",
            Self::DependencyCycle => "dependency_cycle",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "task_created" => Some(Self::TaskCreated),
            "task_updated" => Some(Self::TaskUpdated),
            "lane_changed" => Some(Self::LaneChanged),
            "task_assigned" => Some(Self::TaskAssigned),
            "task_unblocked" => Some(Self::TaskUnblocked),
            "artifact_recorded" => Some(Self::ArtifactRecorded),
            "agent_registered" => Some(Self::AgentRegistered),
            "agent_status_changed" => Some(Self::AgentStatusChanged),
            "dependency_cycle" => Some(Self::DependencyCycle),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub kind: ActivityKind,
    pub task_id: Option<Uuid>,
    pub agent_id: Option<String>,
    pub message: String,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            kind,
            task_id: None,
            agent_id: None,
            message: message.into(),
        }
    }

    pub fn for_task(mut self, task_id: Uuid) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn for_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}
