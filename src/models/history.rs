use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Labels written into `document_history.action`.
///
/// A `NULL` action in the table means the row came from the documents
/// trigger and has not been reconciled yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryAction {
    Created,
    Updated,
    Received,
    Released,
    Completed,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "Created",
            HistoryAction::Updated => "Updated",
            HistoryAction::Received => "Received",
            HistoryAction::Released => "Released",
            HistoryAction::Completed => "Completed",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(HistoryAction::Created),
            "Updated" => Ok(HistoryAction::Updated),
            "Received" => Ok(HistoryAction::Received),
            "Released" => Ok(HistoryAction::Released),
            "Completed" => Ok(HistoryAction::Completed),
            other => Err(format!("unknown history action '{other}'")),
        }
    }
}

/// One row of `document_history`. Department and status are name
/// snapshots, not references, so later renames never rewrite the past.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub document_id: Uuid,
    pub action: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub received_by: Option<String>,
    pub remarks: Option<String>,
}

impl HistoryEntry {
    /// Trigger-generated rows carry no action until reconciled.
    pub fn is_reconciled(&self) -> bool {
        self.action.is_some()
    }

    pub fn parsed_action(&self) -> Option<HistoryAction> {
        self.action.as_deref().and_then(|a| a.parse().ok())
    }
}

/// Client-inserted history row (the reconciler's fallback path).
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub document_id: Uuid,
    pub action: HistoryAction,
    pub received_by: Option<String>,
    pub department: String,
    pub status: String,
    pub remarks: Option<String>,
}
