/// Integration tests for the document lifecycle controller.
///
/// Covers create/update/delete and the Receive/Release/Complete actions
/// against the memory store, including the history each one leaves behind.

use chrono::{Datelike, Local};
use actix_web::ResponseError;
use regex::Regex;

use doctrack::errors::AppError;
use doctrack::lifecycle::numbering::NumberingStrategy;
use doctrack::lifecycle::{LifecycleAction, MISSING_FIELDS_MESSAGE};
use doctrack::models::{DocumentFields, HistoryAction};
use doctrack::store::Store;
use doctrack::store::memory::Fault;

mod common;
use common::{CLERK_EMAIL, admin, clerk, fields, setup, setup_with};

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_assigns_formatted_document_number() {
    let env = setup();
    let outcome = env
        .controller
        .create(&clerk(), &fields("Road repair request", "Submitted"))
        .await
        .expect("create");
    let doc = outcome.document.expect("document");

    let re = Regex::new(r"^LGU-\d{4}-\d+$").expect("regex");
    assert!(re.is_match(&doc.document_number), "bad number {}", doc.document_number);

    let today = Local::now().date_naive();
    let period = format!("{:02}{:02}", today.year() % 100, today.month());
    assert_eq!(doc.document_number, format!("LGU-{period}-1"));
    assert_eq!(doc.processing_days, 0);
    assert_eq!(outcome.message, "Document created successfully!");
    assert!(outcome.warnings.is_empty());
}

#[tokio::test]
async fn test_create_numbers_follow_cached_count() {
    let env = setup();
    let first = env.controller.create(&clerk(), &fields("A", "Submitted")).await.expect("first");
    let second = env.controller.create(&clerk(), &fields("B", "Submitted")).await.expect("second");

    let first = first.document.expect("doc").document_number;
    let second = second.document.expect("doc").document_number;
    assert!(first.ends_with("-1"), "{first}");
    assert!(second.ends_with("-2"), "{second}");
}

#[tokio::test]
async fn test_create_with_store_sequence_numbering() {
    let env = setup_with(NumberingStrategy::StoreSequence);
    for expected in 1..=3 {
        let outcome = env
            .controller
            .create(&clerk(), &fields(&format!("Doc {expected}"), "Submitted"))
            .await
            .expect("create");
        let number = outcome.document.expect("doc").document_number;
        assert!(number.ends_with(&format!("-{expected}")), "{number}");
    }
}

#[tokio::test]
async fn test_create_leaves_exactly_one_created_entry() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Budget proposal", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");

    let history = env.store.list_history(doc.id).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].parsed_action(), Some(HistoryAction::Created));
    assert_eq!(history[0].received_by.as_deref(), Some(CLERK_EMAIL));
    assert_eq!(history[0].status.as_deref(), Some("Submitted"));
}

#[tokio::test]
async fn test_create_rejects_missing_fields() {
    let env = setup();
    let incomplete = DocumentFields { title: "  ".into(), ..fields("x", "Submitted") };

    let err = env.controller.create(&clerk(), &incomplete).await.expect_err("should fail");
    match err {
        AppError::Validation(errors) => {
            assert_eq!(errors[0], MISSING_FIELDS_MESSAGE);
            assert!(errors.contains(&"Title is required".to_string()));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(env.store.list_documents().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_create_surfaces_store_failure() {
    let env = setup();
    env.store.fail_on(Fault::InsertDocument);

    let err = env
        .controller
        .create(&clerk(), &fields("Permit", "Submitted"))
        .await
        .expect_err("insert should fail");
    assert!(err.to_string().starts_with("Error saving document: "), "{err}");
    assert!(env.store.list_documents().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_create_trims_fields_and_drops_blank_remarks() {
    let env = setup();
    let raw = DocumentFields {
        title: "  Zoning query ".into(),
        department: " Planning ".into(),
        sender: " Maria ".into(),
        status: "Submitted ".into(),
        remarks: Some("   ".into()),
    };
    let doc = env.controller.create(&clerk(), &raw).await.expect("create").document.expect("doc");
    assert_eq!(doc.title, "Zoning query");
    assert_eq!(doc.department, "Planning");
    assert_eq!(doc.sender, "Maria");
    assert_eq!(doc.status, "Submitted");
    assert_eq!(doc.remarks, None);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_title_only_leaves_trigger_row_unreconciled() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Old title", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");

    let outcome = env
        .controller
        .update(&clerk(), doc.id, &fields("New title", "Submitted"))
        .await
        .expect("update");
    assert_eq!(outcome.message, "Document updated successfully!");
    assert_eq!(outcome.document.expect("doc").title, "New title");

    let history = env.store.list_history(doc.id).await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].parsed_action(), Some(HistoryAction::Created));
    assert!(!history[1].is_reconciled(), "title-only edit must not be reconciled");
}

#[tokio::test]
async fn test_update_status_records_updated_entry() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Permit renewal", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");

    env.controller
        .update(&admin(), doc.id, &fields("Permit renewal", "Reviewing"))
        .await
        .expect("update");

    let history = env.store.list_history(doc.id).await.expect("history");
    let updated: Vec<_> = history
        .iter()
        .filter(|h| h.parsed_action() == Some(HistoryAction::Updated))
        .collect();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].status.as_deref(), Some("Reviewing"));
    assert_eq!(updated[0].received_by.as_deref(), Some("admin@lgu.gov"));
    assert!(history.iter().all(|h| h.is_reconciled()));
}

#[tokio::test]
async fn test_update_remarks_change_is_meaningful() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Payroll", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");

    let with_remarks = DocumentFields { remarks: Some("Needs signature".into()), ..fields("Payroll", "Submitted") };
    env.controller.update(&clerk(), doc.id, &with_remarks).await.expect("update");

    let history = env.store.list_history(doc.id).await.expect("history");
    let last = history.last().expect("entry");
    assert_eq!(last.parsed_action(), Some(HistoryAction::Updated));
    assert_eq!(last.remarks.as_deref(), Some("Needs signature"));
}

#[tokio::test]
async fn test_update_unknown_document_is_not_found() {
    let env = setup();
    let err = env
        .controller
        .update(&clerk(), uuid::Uuid::new_v4(), &fields("x", "Submitted"))
        .await
        .expect_err("missing document");
    assert_eq!(err.status_code(), actix_web::http::StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Lifecycle actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_receive_moves_to_in_process() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Road repair", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");

    let outcome = env
        .controller
        .apply_action(doc.id, LifecycleAction::Receive, "  Pedro Reyes ", None)
        .await
        .expect("receive");
    assert_eq!(outcome.message, "Document successfully marked as Received!");
    assert_eq!(outcome.document.expect("doc").status, "In Process");

    let history = env.store.list_history(doc.id).await.expect("history");
    let received = history.last().expect("entry");
    assert_eq!(received.parsed_action(), Some(HistoryAction::Received));
    assert_eq!(received.received_by.as_deref(), Some("Pedro Reyes"));
    assert_eq!(received.status.as_deref(), Some("In Process"));
    assert_eq!(history.len(), 2, "no separate Updated entry for an action");
}

#[tokio::test]
async fn test_release_then_complete() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Budget", "In Process"))
        .await
        .expect("create")
        .document
        .expect("doc");

    let released = env
        .controller
        .apply_action(doc.id, LifecycleAction::Release, "Maria", None)
        .await
        .expect("release");
    assert_eq!(released.document.expect("doc").status, "Forwarded");

    let completed = env
        .controller
        .apply_action(doc.id, LifecycleAction::Complete, "Maria", None)
        .await
        .expect("complete");
    assert_eq!(completed.document.expect("doc").status, "Completed");

    let actions: Vec<_> = env
        .store
        .list_history(doc.id)
        .await
        .expect("history")
        .iter()
        .map(|h| h.action.clone().unwrap_or_default())
        .collect();
    assert_eq!(actions, vec!["Created", "Released", "Completed"]);
}

#[tokio::test]
async fn test_action_writes_unsaved_edits() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Permit", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");

    let edits = DocumentFields { department: "Engineering".into(), ..fields("Permit", "Submitted") };
    let outcome = env
        .controller
        .apply_action(doc.id, LifecycleAction::Release, "Ana", Some(&edits))
        .await
        .expect("release");
    let updated = outcome.document.expect("doc");
    assert_eq!(updated.department, "Engineering");
    assert_eq!(updated.status, "Forwarded");
}

#[tokio::test]
async fn test_action_requires_performer() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Permit", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");

    let err = env
        .controller
        .apply_action(doc.id, LifecycleAction::Complete, "   ", None)
        .await
        .expect_err("blank performer");
    assert!(matches!(err, AppError::Validation(_)));

    let stored = env.store.get_document(doc.id).await.expect("doc");
    assert_eq!(stored.status, "Submitted");
}

#[tokio::test]
async fn test_action_update_failure_skips_history() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Permit", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");
    env.store.fail_on(Fault::UpdateDocument);

    let err = env
        .controller
        .apply_action(doc.id, LifecycleAction::Receive, "Pedro", None)
        .await
        .expect_err("update fails");
    assert!(err.to_string().starts_with("Failed to update document: "), "{err}");
    assert_eq!(env.store.list_history(doc.id).await.expect("history").len(), 1);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_delete_by_encoder_is_rejected() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Permit", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");
    // Any store call would trip these.
    env.store.fail_on(Fault::DeleteHistory);
    env.store.fail_on(Fault::DeleteDocument);

    let err = env.controller.delete(&clerk(), doc.id).await.expect_err("denied");
    assert!(matches!(err, AppError::PermissionDenied(_)));

    env.store.clear_faults();
    assert!(env.store.get_document(doc.id).await.is_ok());
    assert_eq!(env.store.list_history(doc.id).await.expect("history").len(), 1);
}

#[tokio::test]
async fn test_delete_by_admin_removes_history_and_document() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Permit", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");
    env.controller
        .apply_action(doc.id, LifecycleAction::Receive, "Pedro", None)
        .await
        .expect("receive");

    let outcome = env.controller.delete(&admin(), doc.id).await.expect("delete");
    assert_eq!(outcome.message, "Document deleted successfully.");
    assert!(outcome.warnings.is_empty());
    assert!(env.store.get_document(doc.id).await.is_err());
    assert!(env.store.list_history(doc.id).await.expect("history").is_empty());
}

#[tokio::test]
async fn test_delete_continues_when_history_clear_fails() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Permit", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");
    env.store.fail_on(Fault::DeleteHistory);

    let outcome = env.controller.delete(&admin(), doc.id).await.expect("delete");
    assert_eq!(outcome.warnings.len(), 1);
    assert!(
        outcome.warnings[0].starts_with("Could not clear history, but will attempt to delete document: "),
        "{}",
        outcome.warnings[0]
    );
    assert!(env.store.get_document(doc.id).await.is_err());
}

#[tokio::test]
async fn test_delete_failure_is_reported() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Permit", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");
    env.store.fail_on(Fault::DeleteDocument);

    let err = env.controller.delete(&admin(), doc.id).await.expect_err("delete fails");
    assert!(err.to_string().starts_with("Error deleting document: "), "{err}");

    // History is cleared before the document delete is attempted.
    env.store.clear_faults();
    assert!(env.store.get_document(doc.id).await.is_ok());
    assert!(env.store.list_history(doc.id).await.expect("history").is_empty());
}

#[tokio::test]
async fn test_delete_failure_keeps_history_warning() {
    let env = setup();
    let doc = env
        .controller
        .create(&clerk(), &fields("Permit", "Submitted"))
        .await
        .expect("create")
        .document
        .expect("doc");
    env.store.fail_on(Fault::DeleteHistory);
    env.store.fail_on(Fault::DeleteDocument);

    let err = env.controller.delete(&admin(), doc.id).await.expect_err("delete fails");
    let message = err.to_string();
    assert!(
        message.starts_with("Error deleting document (Could not clear history, but will attempt to delete document: "),
        "{message}"
    );
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mutations_refresh_the_cache() {
    let env = setup();
    env.controller.create(&clerk(), &fields("A", "Submitted")).await.expect("create");
    assert_eq!(env.cache.document_count().await, 1);
    let statuses = env.cache.snapshot().await.statuses;
    assert_eq!(statuses.len(), 7);
}
