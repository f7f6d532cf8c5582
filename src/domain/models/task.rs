//! Task domain model.
//!
//! Tasks move between lanes on the board. Every lane change is recorded in
//! an append-only status history, and `depends_on` is the only stored
//! direction of the dependency graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Board column a task currently occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    #[default]
    Proposed,
    Queued,
    Development,
    Review,
    Blocked,
    Done,
}

impl Lane {
    pub const ALL: [Lane; 6] = [
        Self::Proposed,
        Self::Queued,
        Self::Development,
        Self::Review,
        Self::Blocked,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Queued => "queued",
            Self::Development => "development",
            Self::Review => "review",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "proposed" => Some(Self::Proposed),
            "queued" => Some(Self::Queued),
            "development" | "dev" | "in_progress" => Some(Self::Development),
            "review" => Some(Self::Review),
            "blocked" => Some(Self::Blocked),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority level, `P0` being the most urgent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    #[default]
    P2,
    P3,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "P0" => Some(Self::P0),
            "P1" => Some(Self::P1),
            "P2" => Some(Self::P2),
            "P3" => Some(Self::P3),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lane transition in a task's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub at: DateTime<Utc>,
    /// Absent only on the creation entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Lane>,
    pub to: Lane,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Kind of work artifact an agent reports against a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Commit,
    File,
    TestResult,
    Other,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::File => "file",
            Self::TestResult => "test_result",
            Self::Other => "other",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "commit" => Some(Self::Commit),
            "file" => Some(Self::File),
            "test_result" | "test" => Some(Self::TestResult),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Evidence of work: a commit sha, a touched file, a test run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkArtifact {
    pub kind: ArtifactKind,
    /// Commit sha, file path, test suite name, ...
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl WorkArtifact {
    pub fn new(kind: ArtifactKind, reference: impl Into<String>) -> Self {
        Self {
            kind,
            reference: reference.into(),
            summary: None,
            agent_id: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn reported_by(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

/// A unit of work on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub lane: Lane,
    pub priority: Priority,
    /// Agent id; `None` means unassigned.
    pub owner: Option<String>,
    pub depends_on: Vec<Uuid>,
    pub acceptance_criteria: Vec<String>,
    pub status_history: Vec<StatusEntry>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub artifacts: Vec<WorkArtifact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build a task in `lane` with its creation history entry.
    pub fn new(title: impl Into<String>, lane: Lane) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            lane,
            priority: Priority::default(),
            owner: None,
            depends_on: Vec::new(),
            acceptance_criteria: Vec::new(),
            status_history: vec![StatusEntry {
                at: now,
                from: None,
                to: lane,
                note: Some("created".to_string()),
            }],
            estimated_hours: None,
            actual_hours: None,
            artifacts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Add a dependency. Duplicates and self-references are ignored.
    pub fn with_dependency(mut self, task_id: Uuid) -> Self {
        if !self.depends_on.contains(&task_id) && task_id != self.id {
            self.depends_on.push(task_id);
        }
        self
    }

    /// Move to `to`, recording history. Returns `false` (and records
    /// nothing) when the task is already in that lane.
    pub fn move_to_lane(&mut self, to: Lane, note: Option<String>) -> bool {
        if self.lane == to {
            return false;
        }
        let now = Utc::now();
        self.status_history.push(StatusEntry {
            at: now,
            from: Some(self.lane),
            to,
            note,
        });
        self.lane = to;
        self.updated_at = now;
        true
    }

    /// Drop `task_id` from `depends_on`. Returns whether it was present.
    pub fn resolve_dependency(&mut self, task_id: Uuid) -> bool {
        let before = self.depends_on.len();
        self.depends_on.retain(|id| *id != task_id);
        before != self.depends_on.len()
    }

    /// No outstanding dependencies.
    pub fn is_unblocked(&self) -> bool {
        self.depends_on.is_empty()
    }

    pub fn is_done(&self) -> bool {
        self.lane.is_done()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// `lane` equals the target of the last history entry.
    pub fn history_is_consistent(&self) -> bool {
        self.status_history.last().map(|entry| entry.to) == Some(self.lane)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        if !self.history_is_consistent() {
            return Err(format!(
                "Task lane {} does not match its status history",
                self.lane
            ));
        }
        Ok(())
    }
}

/// Input for creating a task. Only `title` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub lane: Option<Lane>,
    pub priority: Option<Priority>,
    pub owner: Option<String>,
    pub depends_on: Vec<Uuid>,
    pub acceptance_criteria: Vec<String>,
    pub estimated_hours: Option<f64>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn lane(mut self, lane: Lane) -> Self {
        self.lane = Some(lane);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn depends_on(mut self, task_id: Uuid) -> Self {
        self.depends_on.push(task_id);
        self
    }

    /// Materialize the task with defaults applied.
    pub fn into_task(self) -> Task {
        let mut task = Task::new(self.title, self.lane.unwrap_or_default())
            .with_description(self.description)
            .with_priority(self.priority.unwrap_or_default());
        task.owner = self.owner.filter(|o| !o.trim().is_empty());
        for dep in self.depends_on {
            task = task.with_dependency(dep);
        }
        task.acceptance_criteria = self.acceptance_criteria;
        task.estimated_hours = self.estimated_hours;
        task
    }
}

/// Partial update. Absent fields are left untouched; present fields
/// overwrite (arrays are replaced, never merged).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub lane: Option<Lane>,
    pub priority: Option<Priority>,
    /// `Some(None)` unassigns.
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub owner: Option<Option<String>>,
    pub depends_on: Option<Vec<Uuid>>,
    pub acceptance_criteria: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    /// Consumed by the history entry of a lane change; never stored.
    pub note: Option<String>,
}

impl TaskPatch {
    pub fn lane(lane: Lane) -> Self {
        Self {
            lane: Some(lane),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn owner(owner: Option<String>) -> Self {
        Self {
            owner: Some(owner),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Distinguish an explicit `null` from a missing field.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
