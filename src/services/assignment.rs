//! Auto-assignment: keyword role inference and least-loaded agent selection.
//!
//! The role table is compiled once into case-insensitive regexes anchored at
//! word starts, so `tests`, `docs` and `deployment` hit `test`, `doc` and
//! `deploy`. Everything here is pure; persistence and notifications are the
//! caller's job.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Agent, AssignmentConfig, RoleRule, Task};

/// Result of trying to auto-assign a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    /// Owner chosen by the engine.
    Assigned {
        agent_id: String,
        roles: BTreeSet<String>,
    },
    /// The task already had an owner; nothing changed.
    AlreadyAssigned { owner: String },
    /// No online agent carries a matching role.
    NoCandidate { roles: BTreeSet<String> },
}

impl AssignmentOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }

    /// Agent that owns the task after this outcome, if any.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Self::Assigned { agent_id, .. } => Some(agent_id),
            Self::AlreadyAssigned { owner } => Some(owner),
            Self::NoCandidate { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct RoleMatcher {
    role: String,
    pattern: Regex,
}

impl RoleMatcher {
    fn compile(rule: &RoleRule) -> DomainResult<Self> {
        let keywords: Vec<String> = rule
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if rule.role.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Role rule has an empty role name".to_string(),
            ));
        }
        if keywords.is_empty() {
            return Err(DomainError::ValidationFailed(format!(
                "Role rule '{}' has no keywords",
                rule.role
            )));
        }

        let pattern = Regex::new(&format!(r"(?i)\b(?:{})", keywords.join("|"))).map_err(|e| {
            DomainError::ValidationFailed(format!("Role rule '{}': {e}", rule.role))
        })?;

        Ok(Self {
            role: rule.role.clone(),
            pattern,
        })
    }
}

/// Compiled role table plus the selection policy.
#[derive(Debug, Clone)]
pub struct AssignmentEngine {
    matchers: Vec<RoleMatcher>,
    default_role: String,
    fallback_roles: BTreeSet<String>,
}

impl AssignmentEngine {
    pub fn new(config: &AssignmentConfig) -> DomainResult<Self> {
        let matchers = config
            .rules
            .iter()
            .map(RoleMatcher::compile)
            .collect::<DomainResult<Vec<_>>>()?;

        if config.default_role.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "assignment.default_role cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            matchers,
            default_role: config.default_role.clone(),
            fallback_roles: config.fallback_roles.iter().cloned().collect(),
        })
    }

    /// Every role whose keywords appear in `title` or `description`.
    /// Falls back to the default role when nothing matches.
    pub fn analyze_task_roles(&self, title: &str, description: &str) -> BTreeSet<String> {
        let text = format!("{title} {description}");
        let mut roles: BTreeSet<String> = self
            .matchers
            .iter()
            .filter(|m| m.pattern.is_match(&text))
            .map(|m| m.role.clone())
            .collect();

        if roles.is_empty() {
            roles.insert(self.default_role.clone());
        }
        roles
    }

    /// Least-loaded online agent carrying one of `roles`.
    ///
    /// Developer tasks nobody matches widen to the fallback set. Ties go to
    /// the agent that appears first in `agents`, so callers must pass them
    /// in registration order.
    pub fn find_best_agent<'a>(&self, roles: &BTreeSet<String>, agents: &'a [Agent]) -> Option<&'a Agent> {
        self.select(roles, agents).map(|idx| &agents[idx])
    }

    /// Assign an unowned task to the best candidate, recording the task on
    /// the chosen agent.
    pub fn auto_assign(&self, task: &mut Task, agents: &mut [Agent]) -> AssignmentOutcome {
        if let Some(owner) = &task.owner {
            return AssignmentOutcome::AlreadyAssigned {
                owner: owner.clone(),
            };
        }

        let roles = self.analyze_task_roles(&task.title, &task.description);
        let Some(idx) = self.select(&roles, agents) else {
            return AssignmentOutcome::NoCandidate { roles };
        };

        let agent = &mut agents[idx];
        agent.take_task(task.id);
        task.owner = Some(agent.id.clone());
        task.touch();

        AssignmentOutcome::Assigned {
            agent_id: agent.id.clone(),
            roles,
        }
    }

    fn select(&self, roles: &BTreeSet<String>, agents: &[Agent]) -> Option<usize> {
        if let Some(idx) = least_loaded(roles, agents) {
            return Some(idx);
        }
        if roles.is_disjoint(&self.fallback_roles) {
            return None;
        }
        least_loaded(&self.fallback_roles, agents)
    }
}

fn least_loaded(roles: &BTreeSet<String>, agents: &[Agent]) -> Option<usize> {
    let mut candidates: Vec<usize> = agents
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_available() && a.has_any_role(roles))
        .map(|(idx, _)| idx)
        .collect();

    // stable: equal workloads keep registration order
    candidates.sort_by_key(|&idx| agents[idx].workload());
    candidates.first().copied()
}
