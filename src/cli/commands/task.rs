//! Task CLI commands.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{describe_outcome, parse_artifact_kind, parse_lane, parse_priority};
use crate::application::CreatedTask;
use crate::cli::context::CliContext;
use crate::cli::output::{output, short_id, CommandOutput, TableFormatter};
use crate::domain::models::{
    ArtifactKind, Config, Lane, NewTask, Priority, Task, TaskPatch, WorkArtifact,
};
use crate::domain::ports::TaskFilter;
use crate::services::AssignmentOutcome;

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task (or a batch of tasks from a JSON/YAML file)
    Create {
        /// Task title
        #[arg(required_unless_present = "file")]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Initial lane
        #[arg(short, long, value_parser = parse_lane)]
        lane: Option<Lane>,
        /// Priority (P0-P3)
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Explicit owner; skips auto-assignment
        #[arg(short, long)]
        owner: Option<String>,
        /// Tasks this one depends on (comma-separated ids or prefixes)
        #[arg(short = 'D', long, value_delimiter = ',')]
        depends_on: Vec<String>,
        /// Acceptance criterion (repeatable)
        #[arg(short, long = "criterion")]
        criteria: Vec<String>,
        /// Estimated effort in hours
        #[arg(short, long)]
        estimate: Option<f64>,
        /// Read a list of tasks from this file instead
        #[arg(short, long, conflicts_with = "title")]
        file: Option<PathBuf>,
    },
    /// Update fields of a task; moving it to `done` unblocks its dependents
    Update {
        /// Task ID or unique prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_parser = parse_lane)]
        lane: Option<Lane>,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(short, long, conflicts_with = "unassign")]
        owner: Option<String>,
        /// Clear the owner
        #[arg(long)]
        unassign: bool,
        /// Replace the dependency list (comma-separated ids or prefixes)
        #[arg(short = 'D', long, value_delimiter = ',', conflicts_with = "clear_deps")]
        depends_on: Option<Vec<String>>,
        /// Remove every dependency
        #[arg(long)]
        clear_deps: bool,
        /// Replace the acceptance criteria (repeatable)
        #[arg(short, long = "criterion")]
        criteria: Option<Vec<String>>,
        #[arg(short, long)]
        estimate: Option<f64>,
        /// Hours actually spent
        #[arg(short, long)]
        actual: Option<f64>,
        /// Note recorded with the lane change
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Show task details, history and artifacts
    Show {
        /// Task ID or unique prefix
        id: String,
    },
    /// List tasks
    List {
        #[arg(short, long, value_parser = parse_lane)]
        lane: Option<Lane>,
        #[arg(short, long)]
        owner: Option<String>,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Only tasks without an owner
        #[arg(short, long, conflicts_with = "owner")]
        unassigned: bool,
        /// Maximum number of tasks to display
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Auto-assign an unowned task
    Assign {
        /// Task ID or unique prefix
        id: String,
    },
    /// Record a work artifact (commit, file, test result)
    Artifact {
        /// Task ID or unique prefix
        id: String,
        /// commit, file, test_result or other
        #[arg(value_parser = parse_artifact_kind)]
        kind: ArtifactKind,
        /// Commit sha, file path, test suite, ...
        reference: String,
        #[arg(short, long)]
        summary: Option<String>,
        /// Agent reporting the artifact
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// List tasks that depend on a task
    Dependents {
        /// Task ID or unique prefix
        id: String,
    },
}

#[derive(Debug, Serialize)]
pub struct TaskActionOutput {
    pub success: bool,
    pub message: String,
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<AssignmentOutcome>,
}

impl CommandOutput for TaskActionOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if let Some(outcome) = &self.assignment {
            lines.push(format!("Assignment: {}", describe_outcome(outcome)));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct TaskBatchOutput {
    pub created: Vec<CreatedTask>,
    pub total: usize,
}

impl CommandOutput for TaskBatchOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Created {} task(s):", self.total)];
        for created in &self.created {
            let assignment = created
                .assignment
                .as_ref()
                .map(|o| format!(" ({})", describe_outcome(o)))
                .unwrap_or_default();
            lines.push(format!(
                "  {} {}{}",
                short_id(&created.task.id),
                created.task.title,
                assignment
            ));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListOutput {
    pub tasks: Vec<Task>,
    pub total: usize,
}

impl CommandOutput for TaskListOutput {
    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks found.".to_string();
        }
        format!(
            "Found {} task(s):\n{}",
            self.total,
            TableFormatter::new().format_tasks(&self.tasks)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct TaskDetailOutput {
    pub task: Task,
    /// Tasks that still list this one in `depends_on`
    pub blocks: Vec<uuid::Uuid>,
}

impl CommandOutput for TaskDetailOutput {
    fn to_human(&self) -> String {
        let task = &self.task;
        let mut lines = vec![
            format!("Task: {}", task.title),
            format!("ID: {}", task.id),
            format!("Lane: {}", task.lane),
            format!("Priority: {}", task.priority),
            format!("Owner: {}", task.owner.as_deref().unwrap_or("-")),
        ];

        if !task.description.is_empty() {
            lines.push(format!("Description: {}", task.description));
        }
        if let Some(hours) = task.estimated_hours {
            lines.push(format!("Estimate: {hours}h"));
        }
        if let Some(hours) = task.actual_hours {
            lines.push(format!("Actual: {hours}h"));
        }

        if !task.depends_on.is_empty() {
            lines.push("\nDepends on:".to_string());
            lines.extend(task.depends_on.iter().map(|id| format!("  - {id}")));
        }
        if !self.blocks.is_empty() {
            lines.push("\nBlocks:".to_string());
            lines.extend(self.blocks.iter().map(|id| format!("  - {id}")));
        }
        if !task.acceptance_criteria.is_empty() {
            lines.push("\nAcceptance criteria:".to_string());
            lines.extend(task.acceptance_criteria.iter().map(|c| format!("  - {c}")));
        }

        lines.push("\nHistory:".to_string());
        for entry in &task.status_history {
            let from = entry.from.map_or_else(|| "(new)".to_string(), |l| l.to_string());
            let note = entry.note.as_deref().map(|n| format!(" ({n})")).unwrap_or_default();
            lines.push(format!(
                "  {} {} -> {}{}",
                entry.at.format("%Y-%m-%d %H:%M:%S"),
                from,
                entry.to,
                note
            ));
        }

        if !task.artifacts.is_empty() {
            lines.push("\nArtifacts:".to_string());
            for artifact in &task.artifacts {
                let by = artifact.agent_id.as_deref().map(|a| format!(" by {a}")).unwrap_or_default();
                let summary = artifact.summary.as_deref().map(|s| format!(": {s}")).unwrap_or_default();
                lines.push(format!(
                    "  [{}] {}{}{}",
                    artifact.kind.as_str(),
                    artifact.reference,
                    by,
                    summary
                ));
            }
        }

        lines.join("\n")
    }
}

pub async fn execute(args: TaskArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = CliContext::open(config).await?;

    match args.command {
        TaskCommands::Create {
            title,
            description,
            lane,
            priority,
            owner,
            depends_on,
            criteria,
            estimate,
            file,
        } => {
            if let Some(path) = file {
                let new_tasks = read_task_file(&path)?;
                let created = ctx.center.create_tasks(new_tasks).await?;
                let out = TaskBatchOutput {
                    total: created.len(),
                    created,
                };
                output(&out, json_mode);
                return Ok(());
            }

            let new_task = NewTask {
                title: title.unwrap_or_default(),
                description: description.unwrap_or_default(),
                lane,
                priority,
                owner,
                depends_on: ctx.resolve_tasks(&depends_on).await?,
                acceptance_criteria: criteria,
                estimated_hours: estimate,
            };

            let created = ctx.center.create_task(new_task).await?;
            let out = TaskActionOutput {
                success: true,
                message: format!("Task created: {}", created.task.id),
                task: created.task,
                assignment: created.assignment,
            };
            output(&out, json_mode);
        }

        TaskCommands::Update {
            id,
            title,
            description,
            lane,
            priority,
            owner,
            unassign,
            depends_on,
            clear_deps,
            criteria,
            estimate,
            actual,
            note,
        } => {
            let uuid = ctx.resolve_task(&id).await?;

            let depends_on = match depends_on {
                Some(prefixes) => Some(ctx.resolve_tasks(&prefixes).await?),
                None if clear_deps => Some(Vec::new()),
                None => None,
            };
            let owner = match owner {
                Some(owner) => Some(Some(owner)),
                None if unassign => Some(None),
                None => None,
            };

            let patch = TaskPatch {
                title,
                description,
                lane,
                priority,
                owner,
                depends_on,
                acceptance_criteria: criteria,
                estimated_hours: estimate,
                actual_hours: actual,
                note,
            };
            if patch.is_empty() {
                bail!("Nothing to update. Pass at least one field to change.");
            }

            let task = ctx.center.update_task(uuid, patch).await?;
            let out = TaskActionOutput {
                success: true,
                message: format!("Task updated: {} [{}]", task.id, task.lane),
                task,
                assignment: None,
            };
            output(&out, json_mode);
        }

        TaskCommands::Show { id } => {
            let uuid = ctx.resolve_task(&id).await?;
            let task = ctx
                .center
                .get_task(uuid)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;
            let blocks = ctx.center.dependents(uuid).await?.iter().map(|t| t.id).collect();

            output(&TaskDetailOutput { task, blocks }, json_mode);
        }

        TaskCommands::List {
            lane,
            owner,
            priority,
            unassigned,
            limit,
        } => {
            let filter = TaskFilter {
                lane,
                owner,
                priority,
                unassigned,
                limit: Some(limit),
            };
            let tasks = ctx.center.list_tasks(filter).await?;
            let out = TaskListOutput {
                total: tasks.len(),
                tasks,
            };
            output(&out, json_mode);
        }

        TaskCommands::Assign { id } => {
            let uuid = ctx.resolve_task(&id).await?;
            let result = ctx.center.auto_assign_task(uuid).await?;
            let out = TaskActionOutput {
                success: result.outcome.is_assigned(),
                message: format!("Task {}: {}", short_id(&result.task.id), describe_outcome(&result.outcome)),
                task: result.task,
                assignment: Some(result.outcome),
            };
            output(&out, json_mode);
        }

        TaskCommands::Artifact {
            id,
            kind,
            reference,
            summary,
            agent,
        } => {
            let uuid = ctx.resolve_task(&id).await?;
            let mut artifact = WorkArtifact::new(kind, reference);
            if let Some(summary) = summary {
                artifact = artifact.with_summary(summary);
            }
            if let Some(agent) = agent {
                artifact = artifact.reported_by(agent);
            }

            let task = ctx.center.record_artifact(uuid, artifact).await?;
            let out = TaskActionOutput {
                success: true,
                message: format!(
                    "Recorded {} artifact on {} ({} total)",
                    kind.as_str(),
                    short_id(&task.id),
                    task.artifacts.len()
                ),
                task,
                assignment: None,
            };
            output(&out, json_mode);
        }

        TaskCommands::Dependents { id } => {
            let uuid = ctx.resolve_task(&id).await?;
            let tasks = ctx.center.dependents(uuid).await?;
            let out = TaskListOutput {
                total: tasks.len(),
                tasks,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}

/// Parse a batch of tasks: YAML for `.yaml`/`.yml`, JSON otherwise.
fn read_task_file(path: &Path) -> Result<Vec<NewTask>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read task file {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let tasks = if is_yaml {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid YAML task list in {}", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid JSON task list in {}", path.display()))?
    };
    Ok(tasks)
}
