//! Attaches actor and action to the history row written by the documents trigger.
//!
//! The trigger records *that* a document changed; only the caller knows *who*
//! changed it and *why*. After each mutation the reconciler waits a settle
//! delay, picks the newest action-less row for the document and annotates it.
//! If there is none (trigger disabled, or its row already claimed) it inserts
//! a complete row instead.
//!
//! Known limitation: two mutations of the same document in quick succession
//! can each claim the other's row, since "newest unreconciled row" is the only
//! correlation. History is best-effort and never rolls back the document change.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{DocumentFields, HistoryAction, NewHistoryEntry};
use crate::store::Store;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(250);

/// How the history row for a mutation ended up being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The trigger row was found and annotated in place.
    Patched { entry_id: i64 },
    /// No trigger row was found; a fallback row was inserted.
    Inserted { entry_id: i64 },
}

/// History could not be recorded. The document mutation itself stands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationWarning {
    #[error("Failed to update history: {0}")]
    PatchFailed(String),
    #[error("Failed to log history: {0}")]
    FallbackFailed(String),
}

#[derive(Clone)]
pub struct HistoryReconciler {
    store: Arc<dyn Store>,
    settle_delay: Duration,
}

impl HistoryReconciler {
    pub fn new(store: Arc<dyn Store>, settle_delay: Duration) -> Self {
        HistoryReconciler { store, settle_delay }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Annotate (or replace) the newest trigger row of `document_id`.
    ///
    /// `fields` is what the mutation wrote; it only feeds the fallback row.
    /// `status_override` replaces `fields.status` in that row.
    pub async fn correct_recent_entry(
        &self,
        document_id: Uuid,
        action: HistoryAction,
        received_by: Option<&str>,
        fields: &DocumentFields,
        status_override: Option<&str>,
    ) -> Result<Reconciliation, ReconciliationWarning> {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let received_by = received_by.map(str::trim).filter(|r| !r.is_empty());

        let found = match self.store.latest_unreconciled_history(document_id).await {
            Ok(found) => found,
            Err(e) => {
                log::warn!("History lookup failed for document {document_id}: {e}");
                None
            }
        };

        match found {
            Some(entry) => {
                self.store
                    .annotate_history(entry.id, action, received_by)
                    .await
                    .map_err(|e| {
                        log::error!("Failed to annotate history entry {} for {document_id}: {e}", entry.id);
                        ReconciliationWarning::PatchFailed(e.to_string())
                    })?;
                log::debug!("Reconciled history entry {} as {action} for {document_id}", entry.id);
                Ok(Reconciliation::Patched { entry_id: entry.id })
            }
            None => {
                log::warn!(
                    "Could not find trigger-generated history entry for document {document_id}; inserting fallback"
                );
                let row = NewHistoryEntry {
                    document_id,
                    action,
                    received_by: received_by.map(String::from),
                    department: fields.department.clone(),
                    status: status_override.unwrap_or(&fields.status).to_string(),
                    remarks: fields.remarks.clone(),
                };
                let inserted = self.store.insert_history(row).await.map_err(|e| {
                    log::error!("Failed to insert fallback history for {document_id}: {e}");
                    ReconciliationWarning::FallbackFailed(e.to_string())
                })?;
                Ok(Reconciliation::Inserted { entry_id: inserted.id })
            }
        }
    }
}
