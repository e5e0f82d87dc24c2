//! Row-change notifications.
//!
//! Notifications carry only the table and the kind of change. Consumers are
//! expected to refetch; there is no row payload and no incremental merge.

pub mod listener;
pub mod ws;

use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast;

/// Channel name used by the `doctrack_notify` trigger.
pub const NOTIFY_CHANNEL: &str = "doctrack_changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Documents,
    Departments,
    Statuses,
    SiteConfigs,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Documents => "documents",
            Table::Departments => "departments",
            Table::Statuses => "statuses",
            Table::SiteConfigs => "site_configs",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "documents" => Some(Table::Documents),
            "departments" => Some(Table::Departments),
            "statuses" => Some(Table::Statuses),
            "site_configs" => Some(Table::SiteConfigs),
            _ => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableChange {
    pub table: Table,
    pub op: ChangeOp,
}

impl TableChange {
    pub fn new(table: Table, op: ChangeOp) -> Self {
        TableChange { table, op }
    }

    /// Parse a `pg_notify` payload of the form `documents:UPDATE`.
    pub fn parse_notification(payload: &str) -> Option<Self> {
        let (table, op) = payload.split_once(':')?;
        let table = Table::from_name(table.trim())?;
        let op = match op.trim().to_ascii_uppercase().as_str() {
            "INSERT" => ChangeOp::Insert,
            "UPDATE" => ChangeOp::Update,
            "DELETE" => ChangeOp::Delete,
            _ => return None,
        };
        Some(TableChange { table, op })
    }
}

/// Broadcast fan-out of table changes to any number of subscribers.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<TableChange>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        ChangeFeed { tx }
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn publish(&self, change: TableChange) {
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        ChangeFeed::new(256)
    }
}
