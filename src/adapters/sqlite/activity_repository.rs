//! SQLite implementation of the activity feed.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ActivityEvent, ActivityKind};
use crate::domain::ports::{ActivityFilter, ActivityRepository};

use super::{parse_datetime, parse_optional_uuid, parse_uuid};

/// Feed reads are capped so an unbounded request stays cheap.
const DEFAULT_FEED_LIMIT: usize = 100;

#[derive(Clone)]
pub struct SqliteActivityRepository {
    pool: SqlitePool,
}

impl SqliteActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for SqliteActivityRepository {
    async fn append(&self, event: &ActivityEvent) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO activity (id, at, kind, task_id, agent_id, message) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(event.id.to_string())
        .bind(event.at.to_rfc3339())
        .bind(event.kind.as_str())
        .bind(event.task_id.map(|id| id.to_string()))
        .bind(&event.agent_id)
        .bind(&event.message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, filter: ActivityFilter) -> DomainResult<Vec<ActivityEvent>> {
        let mut query = String::from("SELECT id, at, kind, task_id, agent_id, message FROM activity WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(task_id) = &filter.task_id {
            query.push_str(" AND task_id = ?");
            bindings.push(task_id.to_string());
        }
        if let Some(agent_id) = &filter.agent_id {
            query.push_str(" AND agent_id = ?");
            bindings.push(agent_id.clone());
        }
        let limit = filter.limit.unwrap_or(DEFAULT_FEED_LIMIT);
        query.push_str(&format!(" ORDER BY seq DESC LIMIT {limit}"));

        let mut q = sqlx::query_as::<_, ActivityRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<ActivityRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(ActivityEvent::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: String,
    at: String,
    kind: String,
    task_id: Option<String>,
    agent_id: Option<String>,
    message: String,
}

impl TryFrom<ActivityRow> for ActivityEvent {
    type Error = DomainError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let kind = ActivityKind::parse_str(&row.kind)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid activity kind: {}", row.kind)))?;

        Ok(ActivityEvent {
            id: parse_uuid(&row.id)?,
            at: parse_datetime(&row.at)?,
            kind,
            task_id: parse_optional_uuid(row.task_id)?,
            agent_id: row.agent_id,
            message: row.message,
        })
    }
}
