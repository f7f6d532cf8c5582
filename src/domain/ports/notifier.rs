//! Notification port.
//!
//! Delivery and retry belong to the implementation; callers fire and
//! forget.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Notification {
    TaskAssigned { task_id: Uuid },
    TaskUnblocked { task_id: Uuid },
}

impl Notification {
    pub fn task_id(&self) -> Uuid {
        match self {
            Self::TaskAssigned { task_id } | Self::TaskUnblocked { task_id } => *task_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TaskAssigned { .. } => "task-assigned",
            Self::TaskUnblocked { .. } => "task-unblocked",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, agent_id: &str, notification: Notification);
}
