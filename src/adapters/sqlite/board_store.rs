//! SQLite implementation of the BoardStore.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{BoardChanges, BoardStore};

use super::agent_repository::overwrite_agent;
use super::task_repository::{insert_task, overwrite_task};

#[derive(Clone)]
pub struct SqliteBoardStore {
    pool: SqlitePool,
}

impl SqliteBoardStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BoardStore for SqliteBoardStore {
    async fn commit(&self, changes: &BoardChanges) -> DomainResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for task in &changes.created {
            insert_task(&mut tx, task).await?;
        }
        for task in &changes.updated {
            overwrite_task(&mut tx, task).await?;
        }
        for agent in &changes.agents {
            overwrite_agent(&mut tx, agent).await?;
        }

        // Any early return above drops `tx` and rolls everything back.
        tx.commit().await?;
        Ok(())
    }
}
