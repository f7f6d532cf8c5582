//! SQLite implementation of the AgentRepository.

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Agent, AgentStatus};
use crate::domain::ports::{AgentFilter, AgentRepository};

use super::{parse_datetime, parse_json_or_default, parse_optional_uuid};

#[derive(Clone)]
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, agent: &Agent) -> DomainResult<()> {
        let roles_json = serde_json::to_string(&agent.roles)?;
        let active_json = serde_json::to_string(&agent.active_tasks)?;

        let result = sqlx::query(
            r#"INSERT INTO agents (id, name, roles, status, active_tasks, current_task_id,
               last_heartbeat, registered_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(&agent.id)
        .bind(&agent.name)
        .bind(&roles_json)
        .bind(agent.status.as_str())
        .bind(&active_json)
        .bind(agent.current_task.map(|id| id.to_string()))
        .bind(agent.last_heartbeat.to_rfc3339())
        .bind(agent.registered_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                DomainError::ValidationFailed(format!("Agent already registered: {}", agent.id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Agent>> {
        let row: Option<AgentRow> = sqlx::query_as("SELECT * FROM agents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Agent::try_from).transpose()
    }

    async fn update(&self, agent: &Agent) -> DomainResult<()> {
        self.update_many(std::slice::from_ref(agent)).await
    }

    async fn update_many(&self, agents: &[Agent]) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;
        for agent in agents {
            overwrite_agent(&mut tx, agent).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AgentNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list(&self, filter: AgentFilter) -> DomainResult<Vec<Agent>> {
        let mut query = String::from("SELECT * FROM agents WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(status) = &filter.status {
            query.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }
        if let Some(role) = &filter.role {
            query.push_str(" AND EXISTS (SELECT 1 FROM json_each(agents.roles) WHERE json_each.value = ?)");
            bindings.push(role.clone());
        }

        query.push_str(" ORDER BY seq ASC");

        let mut q = sqlx::query_as::<_, AgentRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<AgentRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(Agent::try_from).collect()
    }

    async fn set_current_task(&self, id: &str, task_id: Option<Uuid>) -> DomainResult<()> {
        let result = sqlx::query("UPDATE agents SET current_task_id = ? WHERE id = ?")
            .bind(task_id.map(|t| t.to_string()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AgentNotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Overwrite an agent row. Fails with `AgentNotFound` if absent.
pub(super) async fn overwrite_agent(conn: &mut SqliteConnection, agent: &Agent) -> DomainResult<()> {
    let roles_json = serde_json::to_string(&agent.roles)?;
    let active_json = serde_json::to_string(&agent.active_tasks)?;

    let result = sqlx::query(
        r#"UPDATE agents SET name = ?, roles = ?, status = ?, active_tasks = ?,
           current_task_id = ?, last_heartbeat = ?
           WHERE id = ?"#
    )
    .bind(&agent.name)
    .bind(&roles_json)
    .bind(agent.status.as_str())
    .bind(&active_json)
    .bind(agent.current_task.map(|id| id.to_string()))
    .bind(agent.last_heartbeat.to_rfc3339())
    .bind(&agent.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DomainError::AgentNotFound(agent.id.clone()));
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: String,
    name: String,
    roles: Option<String>,
    status: String,
    active_tasks: Option<String>,
    current_task_id: Option<String>,
    last_heartbeat: String,
    registered_at: String,
}

impl TryFrom<AgentRow> for Agent {
    type Error = DomainError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        let status: AgentStatus = row
            .status
            .parse()
            .map_err(|e: anyhow::Error| DomainError::SerializationError(e.to_string()))?;
        let roles: BTreeSet<String> = parse_json_or_default(row.roles)?;
        let active_tasks: Vec<Uuid> = parse_json_or_default(row.active_tasks)?;

        Ok(Agent {
            id: row.id,
            name: row.name,
            roles,
            status,
            active_tasks,
            current_task: parse_optional_uuid(row.current_task_id)?,
            last_heartbeat: parse_datetime(&row.last_heartbeat)?,
            registered_at: parse_datetime(&row.registered_at)?,
        })
    }
}
