//! Document lifecycle: create, edit, delete and the three named actions.
//!
//! Every mutation follows the same order. The document write is awaited
//! first; history is reconciled afterwards and can only add warnings to an
//! already-successful outcome.

pub mod numbering;
pub mod reconciler;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Identity, RoleMap};
use crate::cache::SnapshotCache;
use crate::errors::AppError;
use crate::models::{Document, DocumentFields, HistoryAction, NewDocument};
use crate::store::Store;

use numbering::NumberingStrategy;
use reconciler::{HistoryReconciler, Reconciliation};

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill out all required fields.";
pub const MISSING_ACTOR_MESSAGE: &str = "Please enter who performed this action.";

/// Fixed status transitions offered once a document exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleAction {
    Receive,
    Release,
    Complete,
}

impl LifecycleAction {
    pub fn target_status(&self) -> &'static str {
        match self {
            LifecycleAction::Receive => "In Process",
            LifecycleAction::Release => "Forwarded",
            LifecycleAction::Complete => "Completed",
        }
    }

    pub fn history_action(&self) -> HistoryAction {
        match self {
            LifecycleAction::Receive => HistoryAction::Received,
            LifecycleAction::Release => HistoryAction::Released,
            LifecycleAction::Complete => HistoryAction::Completed,
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleAction::Receive => "Receive",
            LifecycleAction::Release => "Release",
            LifecycleAction::Complete => "Complete",
        };
        f.write_str(name)
    }
}

impl FromStr for LifecycleAction {
    type Err = String;

    /// Accepts the action name or its history label (`Receive` / `Received`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "receive" | "received" => Ok(LifecycleAction::Receive),
            "release" | "released" => Ok(LifecycleAction::Release),
            "complete" | "completed" => Ok(LifecycleAction::Complete),
            other => Err(format!("unknown lifecycle action '{other}'")),
        }
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    pub message: String,
    /// Non-fatal problems, e.g. history that could not be recorded.
    pub warnings: Vec<String>,
}

impl MutationOutcome {
    fn new(document: Option<Document>, message: impl Into<String>) -> Self {
        MutationOutcome { document, message: message.into(), warnings: Vec::new() }
    }
}

#[derive(Clone)]
pub struct LifecycleController {
    store: Arc<dyn Store>,
    reconciler: HistoryReconciler,
    roles: RoleMap,
    cache: SnapshotCache,
    numbering: NumberingStrategy,
}

fn require_fields(fields: &DocumentFields) -> Result<DocumentFields, AppError> {
    let missing = fields.missing_fields();
    if !missing.is_empty() {
        let mut errors = vec![MISSING_FIELDS_MESSAGE.to_string()];
        errors.extend(missing);
        return Err(AppError::Validation(errors));
    }
    Ok(fields.normalized())
}

impl LifecycleController {
    pub fn new(
        store: Arc<dyn Store>,
        reconciler: HistoryReconciler,
        roles: RoleMap,
        cache: SnapshotCache,
        numbering: NumberingStrategy,
    ) -> Self {
        LifecycleController { store, reconciler, roles, cache, numbering }
    }

    pub fn roles(&self) -> &RoleMap {
        &self.roles
    }

    async fn reconcile(
        &self,
        outcome: &mut MutationOutcome,
        document_id: Uuid,
        action: HistoryAction,
        actor: Option<&str>,
        fields: &DocumentFields,
        status_override: Option<&str>,
    ) {
        match self
            .reconciler
            .correct_recent_entry(document_id, action, actor, fields, status_override)
            .await
        {
            Ok(Reconciliation::Patched { entry_id }) => {
                log::debug!("{action} recorded on trigger entry {entry_id}");
            }
            Ok(Reconciliation::Inserted { entry_id }) => {
                log::debug!("{action} recorded as fallback entry {entry_id}");
            }
            Err(warning) => outcome.warnings.push(warning.to_string()),
        }
    }

    async fn refresh_cache(&self) {
        if let Err(e) = self.cache.refresh_tables().await {
            log::warn!("Cache refresh after mutation failed: {e}");
        }
    }

    /// Create a document and record its `Created` history entry.
    pub async fn create(&self, actor: &Identity, fields: &DocumentFields) -> Result<MutationOutcome, AppError> {
        let fields = require_fields(fields)?;

        let cached_count = self.cache.document_count().await;
        let document_number = self
            .numbering
            .assign(self.store.as_ref(), Local::now().date_naive(), cached_count)
            .await
            .map_err(|e| AppError::store("Error saving document", e))?;

        let document = self
            .store
            .insert_document(NewDocument { fields: fields.clone(), document_number, processing_days: 0 })
            .await
            .map_err(|e| AppError::store("Error saving document", e))?;

        log::info!(
            "Document {} ({}) created by {}",
            document.document_number,
            document.id,
            actor.actor_label()
        );

        let mut outcome = MutationOutcome::new(Some(document.clone()), "Document created successfully!");
        self.reconcile(
            &mut outcome,
            document.id,
            HistoryAction::Created,
            Some(actor.actor_label()),
            &fields,
            None,
        )
        .await;
        self.refresh_cache().await;
        Ok(outcome)
    }

    /// Save edited fields. History is only reconciled when department,
    /// status or remarks changed; other edits leave the trigger row action-less.
    pub async fn update(
        &self,
        actor: &Identity,
        document_id: Uuid,
        fields: &DocumentFields,
    ) -> Result<MutationOutcome, AppError> {
        let fields = require_fields(fields)?;

        let prior = self
            .store
            .get_document(document_id)
            .await
            .map_err(|e| AppError::store("Error saving document", e))?;
        let meaningful = fields.differs_meaningfully(&prior);

        let document = self
            .store
            .update_document(document_id, &fields)
            .await
            .map_err(|e| AppError::store("Error saving document", e))?;

        log::info!(
            "Document {} updated by {} (history: {})",
            document.document_number,
            actor.actor_label(),
            if meaningful { "recorded" } else { "skipped" }
        );

        let mut outcome = MutationOutcome::new(Some(document), "Document updated successfully!");
        if meaningful {
            self.reconcile(
                &mut outcome,
                document_id,
                HistoryAction::Updated,
                Some(actor.actor_label()),
                &fields,
                None,
            )
            .await;
        }
        self.refresh_cache().await;
        Ok(outcome)
    }

    /// Delete a document and its history. Admins only; a denied request
    /// never reaches the store.
    pub async fn delete(&self, actor: &Identity, document_id: Uuid) -> Result<MutationOutcome, AppError> {
        if !self.roles.is_admin(actor) {
            return Err(AppError::PermissionDenied(
                "Only administrators can delete documents".to_string(),
            ));
        }

        let mut outcome = MutationOutcome::new(None, "Document deleted successfully.");

        // History goes first; a failure here must not stop the document delete.
        match self.store.delete_history(document_id).await {
            Ok(removed) => log::debug!("Removed {removed} history rows for {document_id}"),
            Err(e) => {
                log::error!("Failed to clear history for {document_id}: {e}");
                outcome
                    .warnings
                    .push(format!("Could not clear history, but will attempt to delete document: {e}"));
            }
        }

        if let Err(e) = self.store.delete_document(document_id).await {
            // Keep the history warning; the outcome carrying it is discarded.
            let context = match outcome.warnings.as_slice() {
                [] => "Error deleting document".to_string(),
                warnings => format!("Error deleting document ({})", warnings.join("; ")),
            };
            return Err(AppError::store(context, e));
        }

        log::info!("Document {document_id} deleted by {}", actor.actor_label());
        self.refresh_cache().await;
        Ok(outcome)
    }

    /// Move a document to the action's target status and record the action
    /// against `performed_by`. `fields` carries unsaved form edits; without
    /// them the stored fields are written back.
    pub async fn apply_action(
        &self,
        document_id: Uuid,
        action: LifecycleAction,
        performed_by: &str,
        fields: Option<&DocumentFields>,
    ) -> Result<MutationOutcome, AppError> {
        let performed_by = performed_by.trim();
        if performed_by.is_empty() {
            return Err(AppError::validation(MISSING_ACTOR_MESSAGE));
        }

        let base = match fields {
            Some(fields) => require_fields(fields)?,
            None => {
                let current = self
                    .store
                    .get_document(document_id)
                    .await
                    .map_err(|e| AppError::store("Failed to update document", e))?;
                DocumentFields::from_document(&current)
            }
        };
        let target = action.target_status();
        let fields = base.with_status(target);

        let document = self
            .store
            .update_document(document_id, &fields)
            .await
            .map_err(|e| AppError::store("Failed to update document", e))?;

        let history_action = action.history_action();
        log::info!(
            "Document {} marked as {history_action} by {performed_by}",
            document.document_number
        );

        let mut outcome = MutationOutcome::new(
            Some(document),
            format!("Document successfully marked as {history_action}!"),
        );
        self.reconcile(
            &mut outcome,
            document_id,
            history_action,
            Some(performed_by),
            &fields,
            Some(target),
        )
        .await;
        self.refresh_cache().await;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_map_to_fixed_statuses() {
        assert_eq!(LifecycleAction::Receive.target_status(), "In Process");
        assert_eq!(LifecycleAction::Release.target_status(), "Forwarded");
        assert_eq!(LifecycleAction::Complete.target_status(), "Completed");
        assert_eq!(LifecycleAction::Receive.history_action(), HistoryAction::Received);
        assert_eq!(LifecycleAction::Release.history_action(), HistoryAction::Released);
        assert_eq!(LifecycleAction::Complete.history_action(), HistoryAction::Completed);
    }

    #[test]
    fn parses_action_names_and_labels() {
        assert_eq!("Receive".parse(), Ok(LifecycleAction::Receive));
        assert_eq!("released".parse(), Ok(LifecycleAction::Release));
        assert_eq!(" COMPLETE ".parse(), Ok(LifecycleAction::Complete));
        assert!("approve".parse::<LifecycleAction>().is_err());
    }

    #[test]
    fn missing_fields_put_the_summary_first() {
        let fields = DocumentFields { title: "Budget".into(), ..Default::default() };
        match require_fields(&fields) {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors[0], MISSING_FIELDS_MESSAGE);
                assert_eq!(errors.len(), 4);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
