//! SQLite implementation of the TaskRepository.

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Lane, Priority, StatusEntry, Task, WorkArtifact};
use crate::domain::ports::{TaskFilter, TaskRepository};

use super::{parse_datetime, parse_json_or_default, parse_uuid};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn get(&self, id: Uuid) -> DomainResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let mut task = r.try_into()?;
                self.load_dependencies(&mut task).await?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, task: &Task) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;
        overwrite_task(&mut tx, task).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list(&self, filter: TaskFilter) -> DomainResult<Vec<Task>> {
        let mut query = String::from("SELECT * FROM tasks WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(lane) = &filter.lane {
            query.push_str(" AND lane = ?");
            bindings.push(lane.as_str().to_string());
        }
        if let Some(owner) = &filter.owner {
            query.push_str(" AND owner = ?");
            bindings.push(owner.clone());
        }
        if let Some(priority) = &filter.priority {
            query.push_str(" AND priority = ?");
            bindings.push(priority.as_str().to_string());
        }
        if filter.unassigned {
            query.push_str(" AND owner IS NULL");
        }

        query.push_str(" ORDER BY created_at ASC, rowid ASC");
        if let Some(limit) = filter.limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        let mut q = sqlx::query_as::<_, TaskRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<TaskRow> = q.fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    async fn get_dependents(&self, task_id: Uuid) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"SELECT t.* FROM tasks t
               INNER JOIN task_dependencies d ON t.id = d.task_id
               WHERE d.depends_on_id = ?
               ORDER BY t.created_at ASC, t.rowid ASC"#
        )
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }
}

impl SqliteTaskRepository {
    async fn hydrate(&self, rows: Vec<TaskRow>) -> DomainResult<Vec<Task>> {
        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            let mut task: Task = row.try_into()?;
            self.load_dependencies(&mut task).await?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    async fn load_dependencies(&self, task: &mut Task) -> DomainResult<()> {
        let deps: Vec<(String,)> = sqlx::query_as(
            "SELECT depends_on_id FROM task_dependencies WHERE task_id = ? ORDER BY position"
        )
        .bind(task.id.to_string())
        .fetch_all(&self.pool)
        .await?;

        task.depends_on = deps
            .iter()
            .map(|(id,)| parse_uuid(id))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(())
    }
}

/// Insert a task row and its dependency edges.
pub(super) async fn insert_task(conn: &mut SqliteConnection, task: &Task) -> DomainResult<()> {
    let criteria_json = serde_json::to_string(&task.acceptance_criteria)?;
    let history_json = serde_json::to_string(&task.status_history)?;
    let artifacts_json = serde_json::to_string(&task.artifacts)?;

    sqlx::query(
        r#"INSERT INTO tasks (id, title, description, lane, priority, owner,
           acceptance_criteria, status_history, artifacts, estimated_hours, actual_hours,
           created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
    )
    .bind(task.id.to_string())
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.lane.as_str())
    .bind(task.priority.as_str())
    .bind(&task.owner)
    .bind(&criteria_json)
    .bind(&history_json)
    .bind(&artifacts_json)
    .bind(task.estimated_hours)
    .bind(task.actual_hours)
    .bind(task.created_at.to_rfc3339())
    .bind(task.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    write_dependencies(conn, task).await
}

/// Overwrite a task row and replace its dependency edges.
pub(super) async fn overwrite_task(conn: &mut SqliteConnection, task: &Task) -> DomainResult<()> {
    let criteria_json = serde_json::to_string(&task.acceptance_criteria)?;
    let history_json = serde_json::to_string(&task.status_history)?;
    let artifacts_json = serde_json::to_string(&task.artifacts)?;

    let result = sqlx::query(
        r#"UPDATE tasks SET title = ?, description = ?, lane = ?, priority = ?,
           owner = ?, acceptance_criteria = ?, status_history = ?, artifacts = ?,
           estimated_hours = ?, actual_hours = ?, updated_at = ?
           WHERE id = ?"#
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.lane.as_str())
    .bind(task.priority.as_str())
    .bind(&task.owner)
    .bind(&criteria_json)
    .bind(&history_json)
    .bind(&artifacts_json)
    .bind(task.estimated_hours)
    .bind(task.actual_hours)
    .bind(task.updated_at.to_rfc3339())
    .bind(task.id.to_string())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DomainError::TaskNotFound(task.id));
    }

    sqlx::query("DELETE FROM task_dependencies WHERE task_id = ?")
        .bind(task.id.to_string())
        .execute(&mut *conn)
        .await?;
    write_dependencies(conn, task).await
}

async fn write_dependencies(conn: &mut SqliteConnection, task: &Task) -> DomainResult<()> {
    for (position, dep_id) in task.depends_on.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO task_dependencies (task_id, depends_on_id, position) VALUES (?, ?, ?)"
        )
        .bind(task.id.to_string())
        .bind(dep_id.to_string())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: String,
    lane: String,
    priority: String,
    owner: Option<String>,
    acceptance_criteria: Option<String>,
    status_history: Option<String>,
    artifacts: Option<String>,
    estimated_hours: Option<f64>,
    actual_hours: Option<f64>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let lane = Lane::parse_str(&row.lane)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid lane: {}", row.lane)))?;

        let priority = Priority::parse_str(&row.priority)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid priority: {}", row.priority)))?;

        let acceptance_criteria: Vec<String> = parse_json_or_default(row.acceptance_criteria)?;
        let status_history: Vec<StatusEntry> = parse_json_or_default(row.status_history)?;
        let artifacts: Vec<WorkArtifact> = parse_json_or_default(row.artifacts)?;

        Ok(Task {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            lane,
            priority,
            owner: row.owner,
            depends_on: Vec::new(), // Loaded separately
            acceptance_criteria,
            status_history,
            estimated_hours: row.estimated_hours,
            actual_hours: row.actual_hours,
            artifacts,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
