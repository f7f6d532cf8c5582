//! Activity feed CLI command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::CliContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{ActivityEvent, Config};
use crate::domain::ports::ActivityFilter;

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Maximum number of events, newest first
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Only events about this task (ID or prefix)
    #[arg(short, long)]
    pub task: Option<String>,

    /// Only events about this agent
    #[arg(short, long)]
    pub agent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivityOutput {
    pub events: Vec<ActivityEvent>,
    pub total: usize,
}

impl CommandOutput for ActivityOutput {
    fn to_human(&self) -> String {
        if self.events.is_empty() {
            return "No activity yet.".to_string();
        }
        TableFormatter::new().format_activity(&self.events)
    }
}

pub async fn execute(args: ActivityArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = CliContext::open(config).await?;

    let task_id = match args.task {
        Some(prefix) => Some(ctx.resolve_task(&prefix).await?),
        None => None,
    };
    let filter = ActivityFilter {
        task_id,
        agent_id: args.agent,
        limit: Some(args.limit),
    };

    let events = ctx.center.activity(filter).await?;
    let out = ActivityOutput {
        total: events.len(),
        events,
    };
    output(&out, json_mode);

    Ok(())
}
