//! Table output formatting for CLI commands
//!
//! Renders tasks, agents and the activity feed with comfy-table.
//! Colors are dropped when NO_COLOR is set or the terminal is dumb, and
//! an icon is shown next to the lane/status instead.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::{short_id, truncate};
use crate::domain::models::{ActivityEvent, Agent, AgentStatus, Lane, Priority, Task};

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    pub fn format_tasks(&self, tasks: &[Task]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Title", "Lane", "Priority", "Owner", "Deps"]));

        for task in tasks {
            let deps = if task.depends_on.is_empty() {
                "-".to_string()
            } else {
                task.depends_on.len().to_string()
            };

            table.add_row(vec![
                Cell::new(short_id(&task.id)),
                Cell::new(truncate(&task.title, 40)),
                self.lane_cell(task.lane),
                self.priority_cell(task.priority),
                Cell::new(task.owner.as_deref().unwrap_or("-")),
                Cell::new(deps),
            ]);
        }

        table.to_string()
    }

    pub fn format_agents(&self, agents: &[Agent]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Name", "Roles", "Status", "Load", "Current Task", "Last Seen"]));

        for agent in agents {
            let roles = agent.roles.iter().cloned().collect::<Vec<_>>().join(", ");
            let status_cell = if self.use_colors {
                Cell::new(agent.status.to_string()).fg(agent_status_color(agent.status))
            } else {
                Cell::new(format!("{} {}", agent_status_icon(agent.status), agent.status))
            };

            table.add_row(vec![
                Cell::new(&agent.id),
                Cell::new(truncate(&agent.name, 20)),
                Cell::new(if roles.is_empty() { "-".to_string() } else { roles }),
                status_cell,
                Cell::new(agent.workload().to_string()),
                Cell::new(agent.current_task.as_ref().map_or_else(|| "-".to_string(), short_id)),
                Cell::new(format_relative_time(&agent.last_heartbeat)),
            ]);
        }

        table.to_string()
    }

    pub fn format_activity(&self, events: &[ActivityEvent]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["When", "Kind", "Task", "Agent", "Message"]));

        for event in events {
            table.add_row(vec![
                Cell::new(event.at.format("%Y-%m-%d %H:%M:%S").to_string()),
                Cell::new(event.kind.to_string()),
                Cell::new(event.task_id.as_ref().map_or_else(|| "-".to_string(), short_id)),
                Cell::new(event.agent_id.as_deref().unwrap_or("-")),
                Cell::new(truncate(&event.message, 60)),
            ]);
        }

        table.to_string()
    }

    fn lane_cell(&self, lane: Lane) -> Cell {
        if self.use_colors {
            Cell::new(lane.to_string()).fg(lane_color(lane))
        } else {
            Cell::new(format!("{} {}", lane_icon(lane), lane))
        }
    }

    fn priority_cell(&self, priority: Priority) -> Cell {
        let cell = Cell::new(priority.to_string());
        match priority {
            Priority::P0 if self.use_colors => cell.fg(Color::Red).add_attribute(Attribute::Bold),
            Priority::P1 if self.use_colors => cell.fg(Color::Yellow),
            _ => cell,
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn lane_color(lane: Lane) -> Color {
    match lane {
        Lane::Proposed => Color::White,
        Lane::Queued => Color::Yellow,
        Lane::Development => Color::Cyan,
        Lane::Review => Color::Blue,
        Lane::Blocked => Color::Magenta,
        Lane::Done => Color::Green,
    }
}

fn lane_icon(lane: Lane) -> &'static str {
    match lane {
        Lane::Proposed => "○",
        Lane::Queued => "●",
        Lane::Development => "⟳",
        Lane::Review => "⧗",
        Lane::Blocked => "⊗",
        Lane::Done => "✓",
    }
}

fn agent_status_color(status: AgentStatus) -> Color {
    match status {
        AgentStatus::Online => Color::Green,
        AgentStatus::Busy => Color::Cyan,
        AgentStatus::Offline => Color::DarkGrey,
    }
}

fn agent_status_icon(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Online => "○",
        AgentStatus::Busy => "●",
        AgentStatus::Offline => "✗",
    }
}

/// Format relative time (e.g., "2 hours ago")
fn format_relative_time(datetime: &chrono::DateTime<chrono::Utc>) -> String {
    let duration = chrono::Utc::now().signed_duration_since(*datetime);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        let days = duration.num_days();
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    }
}
