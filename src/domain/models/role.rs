//! Role tags and the keyword table used to infer them.

use serde::{Deserialize, Serialize};

pub const DESIGNER: &str = "designer";
pub const BACKEND_DEV: &str = "backend-dev";
pub const FRONTEND_DEV: &str = "frontend-dev";
pub const FULLSTACK_DEV: &str = "fullstack-dev";
pub const QA: &str = "qa";
pub const DEVOPS: &str = "devops";
pub const CONTENT: &str = "content";
pub const ARCHITECT: &str = "architect";
pub const PM: &str = "pm";

/// Roles any generic development task may fall back to.
pub const DEVELOPER_ROLES: [&str; 3] = [FRONTEND_DEV, BACKEND_DEV, FULLSTACK_DEV];

/// One row of the role table: any keyword hit infers `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRule {
    pub role: String,
    pub keywords: Vec<String>,
}

impl RoleRule {
    pub fn new(role: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            role: role.into(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }
}

/// Built-in keyword table, in match order.
///
/// Keywords match literally at word starts, so short ones also hit longer
/// words (`ci` in "city", `plan` in "planet"). Override `assignment.rules`
/// with longer keywords to tighten them.
pub fn default_role_rules() -> Vec<RoleRule> {
    vec![
        RoleRule::new(DESIGNER, &["design", "ui", "mockup"]),
        RoleRule::new(BACKEND_DEV, &["backend", "api", "database"]),
        RoleRule::new(FRONTEND_DEV, &["frontend", "react", "ui"]),
        RoleRule::new(QA, &["test", "qa", "e2e"]),
        RoleRule::new(DEVOPS, &["deploy", "ci", "docker", "infra"]),
        RoleRule::new(CONTENT, &["doc", "readme", "content"]),
        RoleRule::new(ARCHITECT, &["architecture", "design-system"]),
        RoleRule::new(PM, &["plan", "coordinate", "prioritize"]),
    ]
}
