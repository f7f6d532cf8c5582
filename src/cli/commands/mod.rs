//! CLI command implementations

pub mod activity;
pub mod agent;
pub mod init;
pub mod task;

use crate::domain::models::{AgentStatus, ArtifactKind, Lane, Priority};
use crate::services::AssignmentOutcome;

pub(crate) fn parse_lane(s: &str) -> Result<Lane, String> {
    Lane::parse_str(s).ok_or_else(|| {
        let lanes: Vec<&str> = Lane::ALL.iter().map(Lane::as_str).collect();
        format!("unknown lane '{s}' (expected one of: {})", lanes.join(", "))
    })
}

pub(crate) fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::parse_str(s).ok_or_else(|| format!("unknown priority '{s}' (expected P0-P3)"))
}

pub(crate) fn parse_artifact_kind(s: &str) -> Result<ArtifactKind, String> {
    ArtifactKind::parse_str(s)
        .ok_or_else(|| format!("unknown artifact kind '{s}' (expected commit, file, test_result or other)"))
}

pub(crate) fn parse_agent_status(s: &str) -> Result<AgentStatus, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

/// One-line human description of an assignment outcome.
pub(crate) fn describe_outcome(outcome: &AssignmentOutcome) -> String {
    match outcome {
        AssignmentOutcome::Assigned { agent_id, roles } => {
            format!("assigned to {agent_id} (roles: {})", join(roles))
        }
        AssignmentOutcome::AlreadyAssigned { owner } => format!("already owned by {owner}"),
        AssignmentOutcome::NoCandidate { roles } => {
            format!("no online agent for roles: {}", join(roles))
        }
    }
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_value_parsers() {
        assert_eq!(parse_lane("Review"), Ok(Lane::Review));
        assert!(parse_lane("limbo").unwrap_err().contains("proposed"));
        assert_eq!(parse_priority("p1"), Ok(Priority::P1));
        assert!(parse_priority("P9").is_err());
        assert_eq!(parse_agent_status("busy"), Ok(AgentStatus::Busy));
        assert!(parse_agent_status("asleep").is_err());
    }

    #[test]
    fn test_describe_outcome() {
        let roles: BTreeSet<String> = ["backend-dev".to_string(), "qa".to_string()].into();
        let assigned = AssignmentOutcome::Assigned {
            agent_id: "forge".into(),
            roles: roles.clone(),
        };
        assert_eq!(describe_outcome(&assigned), "assigned to forge (roles: backend-dev, qa)");
        assert_eq!(
            describe_outcome(&AssignmentOutcome::NoCandidate { roles }),
            "no online agent for roles: backend-dev, qa"
        );
    }
}
