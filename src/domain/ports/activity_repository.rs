use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::ActivityEvent;

/// Filter criteria for reading the activity feed.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub task_id: Option<Uuid>,
    pub agent_id: Option<String>,
    pub limit: Option<usize>,
}

/// Append-only store behind the activity feed.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn append(&self, event: &ActivityEvent) -> DomainResult<()>;

    /// Newest first.
    async fn recent(&self, filter: ActivityFilter) -> DomainResult<Vec<ActivityEvent>>;
}
