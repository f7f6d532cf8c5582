//! Agent registry CLI commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::collections::BTreeSet;

use super::parse_agent_status;
use crate::cli::context::CliContext;
use crate::cli::output::{output, short_id, CommandOutput, TableFormatter};
use crate::domain::models::{Agent, AgentStatus, Config};
use crate::domain::ports::AgentFilter;

#[derive(Args, Debug)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommands,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// Register a new agent
    Register {
        /// Agent identifier, e.g. forge
        id: String,
        /// Display name (defaults to the id)
        #[arg(short, long, default_value = "")]
        name: String,
        /// Roles the agent can take (comma-separated or repeated)
        #[arg(short, long = "role", value_delimiter = ',')]
        roles: Vec<String>,
    },
    /// List registered agents with their workload
    List {
        #[arg(short, long, value_parser = parse_agent_status)]
        status: Option<AgentStatus>,
        /// Only agents carrying this role
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Show agent details
    Show {
        id: String,
    },
    /// Report that an agent is alive
    Heartbeat {
        id: String,
        /// New status (online, busy, offline); defaults to online
        #[arg(short, long, value_parser = parse_agent_status)]
        status: Option<AgentStatus>,
        /// Task the agent is working on (ID or prefix)
        #[arg(short, long, conflicts_with = "idle")]
        working_on: Option<String>,
        /// Clear the current task
        #[arg(long)]
        idle: bool,
    },
    /// Deregister an agent that owns no open tasks
    Remove {
        id: String,
    },
    /// Show which agent would get work with these roles
    Best {
        /// Roles to match (comma-separated or repeated)
        #[arg(short, long = "role", value_delimiter = ',', required_unless_present = "title")]
        roles: Vec<String>,
        /// Infer roles from a task title instead
        #[arg(short, long, conflicts_with = "roles")]
        title: Option<String>,
        #[arg(short, long, requires = "title")]
        description: Option<String>,
    },
    /// Mark agents with stale heartbeats as offline
    Sweep,
}

#[derive(Debug, Serialize)]
pub struct AgentActionOutput {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
}

impl CommandOutput for AgentActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct AgentListOutput {
    pub agents: Vec<Agent>,
    pub total: usize,
}

impl CommandOutput for AgentListOutput {
    fn to_human(&self) -> String {
        if self.agents.is_empty() {
            return "No agents found.".to_string();
        }
        format!(
            "Found {} agent(s):\n{}",
            self.total,
            TableFormatter::new().format_agents(&self.agents)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct AgentDetailOutput {
    pub agent: Agent,
    pub workload: usize,
}

impl CommandOutput for AgentDetailOutput {
    fn to_human(&self) -> String {
        let agent = &self.agent;
        let roles = agent.roles.iter().cloned().collect::<Vec<_>>().join(", ");
        let mut lines = vec![
            format!("Agent: {}", agent.name),
            format!("ID: {}", agent.id),
            format!("Status: {}", agent.status),
            format!("Roles: {}", if roles.is_empty() { "-" } else { &roles }),
            format!("Workload: {}", self.workload),
            format!(
                "Current task: {}",
                agent.current_task.map_or_else(|| "-".to_string(), |id| id.to_string())
            ),
            format!("Last heartbeat: {}", agent.last_heartbeat.format("%Y-%m-%d %H:%M:%S")),
            format!("Registered: {}", agent.registered_at.format("%Y-%m-%d %H:%M:%S")),
        ];

        if !agent.active_tasks.is_empty() {
            lines.push("\nActive tasks:".to_string());
            lines.extend(agent.active_tasks.iter().map(|id| format!("  - {id}")));
        }

        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct BestAgentOutput {
    pub roles: BTreeSet<String>,
    pub agent: Option<Agent>,
}

impl CommandOutput for BestAgentOutput {
    fn to_human(&self) -> String {
        let roles = self.roles.iter().cloned().collect::<Vec<_>>().join(", ");
        match &self.agent {
            Some(agent) => format!(
                "Best agent for [{}]: {} (workload {})",
                roles,
                agent.id,
                agent.workload()
            ),
            None => format!("No online agent for [{roles}]"),
        }
    }
}

pub async fn execute(args: AgentArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = CliContext::open(config).await?;

    match args.command {
        AgentCommands::Register { id, name, roles } => {
            let agent = ctx.center.register_agent(&id, &name, roles).await?;
            let out = AgentActionOutput {
                success: true,
                message: format!("Agent registered: {}", agent.id),
                agent: Some(agent),
            };
            output(&out, json_mode);
        }

        AgentCommands::List { status, role } => {
            let agents = ctx.center.list_agents(AgentFilter { status, role }).await?;
            let out = AgentListOutput {
                total: agents.len(),
                agents,
            };
            output(&out, json_mode);
        }

        AgentCommands::Show { id } => {
            let agent = ctx
                .center
                .get_agent(&id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Agent not found: {}", id))?;
            let out = AgentDetailOutput {
                workload: agent.workload(),
                agent,
            };
            output(&out, json_mode);
        }

        AgentCommands::Heartbeat {
            id,
            status,
            working_on,
            idle,
        } => {
            let current = match working_on {
                Some(prefix) => Some(Some(ctx.resolve_task(&prefix).await?)),
                None if idle => Some(None),
                None => None,
            };

            let mut agent = ctx.center.heartbeat(&id, status).await?;
            if let Some(task_id) = current {
                ctx.center.set_agent_current_task(&id, task_id).await?;
                agent.current_task = task_id;
            }

            let working = agent
                .current_task
                .as_ref()
                .map(|t| format!(", working on {}", short_id(t)))
                .unwrap_or_default();
            let out = AgentActionOutput {
                success: true,
                message: format!("Heartbeat recorded: {} is {}{}", agent.id, agent.status, working),
                agent: Some(agent),
            };
            output(&out, json_mode);
        }

        AgentCommands::Remove { id } => {
            ctx.center.deregister_agent(&id).await?;
            let out = AgentActionOutput {
                success: true,
                message: format!("Agent removed: {id}"),
                agent: None,
            };
            output(&out, json_mode);
        }

        AgentCommands::Best {
            roles,
            title,
            description,
        } => {
            let roles: BTreeSet<String> = match title {
                Some(title) => ctx
                    .center
                    .infer_roles(&title, description.as_deref().unwrap_or_default()),
                None => roles
                    .iter()
                    .map(|r| r.trim().to_lowercase())
                    .filter(|r| !r.is_empty())
                    .collect(),
            };
            if roles.is_empty() {
                bail!("At least one non-empty role is required");
            }

            let agent = ctx.center.best_agent_for_roles(&roles).await?;
            output(&BestAgentOutput { roles, agent }, json_mode);
        }

        AgentCommands::Sweep => {
            let swept = ctx.center.sweep_stale_agents().await?;
            let out = AgentListOutput {
                total: swept.len(),
                agents: swept,
            };
            if !json_mode && out.agents.is_empty() {
                println!("No stale agents.");
            } else {
                output(&out, json_mode);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_agent_output() {
        let roles: BTreeSet<String> = ["qa".to_string()].into();
        let none = BestAgentOutput {
            roles: roles.clone(),
            agent: None,
        };
        assert_eq!(none.to_human(), "No online agent for [qa]");

        let some = BestAgentOutput {
            roles,
            agent: Some(Agent::new("forge", "Forge").with_role("qa")),
        };
        assert_eq!(some.to_human(), "Best agent for [qa]: forge (workload 0)");
        assert_eq!(some.to_json()["agent"]["id"], "forge");
    }
}
