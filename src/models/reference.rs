use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    pub id: Uuid,
    pub name: String,
}

/// Statuses seeded on first migration. The lifecycle actions target three of them.
pub const DEFAULT_STATUSES: &[&str] = &[
    "Submitted",
    "Reviewing",
    "Approved",
    "Rejected",
    "In Process",
    "Forwarded",
    "Completed",
];

/// Validate a department or status name: trimmed, non-empty, at most 100 chars.
pub fn validate_name(name: &str, label: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Some(format!("{label} name is required"));
    }
    if trimmed.chars().count() > 100 {
        return Some(format!("{label} name must be at most 100 characters"));
    }
    None
}
