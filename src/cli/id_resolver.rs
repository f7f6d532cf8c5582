//! Short ID prefix resolution for CLI task commands.
//!
//! Any unique prefix of a task UUID is accepted in place of the full id,
//! similar to git short hashes.

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

const TASK_QUERY: &str = "SELECT id FROM tasks WHERE id LIKE ? ORDER BY id";

/// Resolve a task ID prefix to a full UUID.
pub async fn resolve_task_id(pool: &SqlitePool, prefix: &str) -> Result<Uuid> {
    let prefix = prefix.trim();

    // Fast path: a full UUID is returned as is, even if unknown
    if let Ok(uuid) = Uuid::parse_str(prefix) {
        return Ok(uuid);
    }

    validate_prefix(prefix)?;

    let pattern = format!("{}%", prefix.to_lowercase());
    let rows: Vec<(String,)> = sqlx::query_as(TASK_QUERY)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;

    match rows.len() {
        0 => bail!("No task found matching '{}'", prefix),
        1 => Ok(Uuid::parse_str(&rows[0].0)?),
        n => {
            let mut msg = format!("Ambiguous prefix '{}': matches {} tasks:", prefix, n);
            for row in &rows {
                msg.push_str(&format!("\n  {}", row.0));
            }
            bail!("{}", msg)
        }
    }
}

/// Resolve several prefixes, failing on the first that does not resolve.
pub async fn resolve_task_ids(pool: &SqlitePool, prefixes: &[String]) -> Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(prefixes.len());
    for prefix in prefixes {
        ids.push(resolve_task_id(pool, prefix).await?);
    }
    Ok(ids)
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        bail!("ID prefix must not be empty");
    }
    if !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        bail!(
            "Invalid ID prefix '{}': must contain only hex characters and dashes",
            prefix
        );
    }
    Ok(())
}
