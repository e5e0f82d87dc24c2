//! In-memory implementation of the store.
//!
//! State lives in plain collections behind one `tokio::sync::RwLock`, so every
//! operation is atomic with respect to the others. Nothing is durable.
//!
//! The store emulates the Postgres `documents_history_trigger`: each document
//! insert/update appends an action-less history row in the same critical
//! section. The trigger can be switched off, and individual operations can be
//! made to fail, so callers can exercise the reconciler's fallback and warning
//! paths without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentSearch, Store, StoreError, StoreResult};
use crate::models::reference::DEFAULT_STATUSES;
use crate::models::{
    Department, Document, DocumentFields, HistoryAction, HistoryEntry, NewDocument,
    NewHistoryEntry, SiteConfig, Status,
};
use crate::realtime::{ChangeFeed, ChangeOp, Table, TableChange};

/// Store operations that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    ListDocuments,
    InsertDocument,
    UpdateDocument,
    DeleteDocument,
    FindUnreconciled,
    AnnotateHistory,
    InsertHistory,
    DeleteHistory,
    ListHistory,
    SetLogo,
}

#[derive(Default)]
struct MemoryState {
    documents: Vec<Document>,
    history: Vec<HistoryEntry>,
    next_history_id: i64,
    departments: Vec<Department>,
    next_department_id: i64,
    statuses: Vec<Status>,
    site: SiteConfig,
    sequences: HashMap<String, i64>,
}

impl MemoryState {
    fn append_trigger_row(&mut self, doc: &Document, at: DateTime<Utc>) {
        self.next_history_id += 1;
        self.history.push(HistoryEntry {
            id: self.next_history_id,
            created_at: at,
            document_id: doc.id,
            action: None,
            department: Some(doc.department.clone()),
            status: Some(doc.status.clone()),
            received_by: None,
            remarks: doc.remarks.clone(),
        });
    }
}

pub struct MemoryStore {
    state: RwLock<MemoryState>,
    feed: ChangeFeed,
    history_trigger: AtomicBool,
    faults: Mutex<HashSet<Fault>>,
}

impl MemoryStore {
    /// Empty store with the history trigger enabled and no reference data.
    pub fn new() -> Self {
        MemoryStore::with_state(MemoryState::default())
    }

    /// Store pre-populated with the default statuses, as the migration seeds them.
    pub fn seeded() -> Self {
        let statuses = DEFAULT_STATUSES
            .iter()
            .map(|name| Status { id: Uuid::new_v4(), name: name.to_string() })
            .collect();
        MemoryStore::with_state(MemoryState { statuses, ..MemoryState::default() })
    }

    fn with_state(state: MemoryState) -> Self {
        MemoryStore {
            state: RwLock::new(state),
            feed: ChangeFeed::default(),
            history_trigger: AtomicBool::new(true),
            faults: Mutex::new(HashSet::new()),
        }
    }

    /// Enable or disable the emulated documents trigger.
    pub fn set_history_trigger(&self, enabled: bool) {
        self.history_trigger.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_on(&self, fault: Fault) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).insert(fault);
    }

    pub fn clear_faults(&self) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn check(&self, fault: Fault) -> StoreResult<()> {
        let faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        if faults.contains(&fault) {
            return Err(StoreError::Unavailable(format!("injected failure on {fault:?}")));
        }
        Ok(())
    }

    /// Append a raw history row, bypassing reconciliation. Lets callers stage
    /// trigger rows with chosen timestamps.
    pub async fn push_history_row(
        &self,
        document_id: Uuid,
        action: Option<&str>,
        status: &str,
        created_at: DateTime<Utc>,
    ) -> HistoryEntry {
        let mut state = self.state.write().await;
        state.next_history_id += 1;
        let entry = HistoryEntry {
            id: state.next_history_id,
            created_at,
            document_id,
            action: action.map(String::from),
            department: None,
            status: Some(status.to_string()),
            received_by: None,
            remarks: None,
        };
        state.history.push(entry.clone());
        entry
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_documents(&self) -> StoreResult<Vec<Document>> {
        self.check(Fault::ListDocuments)?;
        let state = self.state.read().await;
        let mut docs: Vec<Document> = state.documents.iter().rev().cloned().collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn search_documents(&self, search: &DocumentSearch) -> StoreResult<Vec<Document>> {
        self.check(Fault::ListDocuments)?;
        let state = self.state.read().await;
        let mut docs: Vec<Document> = state
            .documents
            .iter()
            .rev()
            .filter(|d| contains_ci(&d.sender, &search.sender))
            .filter(|d| {
                contains_ci(&d.document_number, &search.term) || contains_ci(&d.title, &search.term)
            })
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn get_document(&self, id: Uuid) -> StoreResult<Document> {
        let state = self.state.read().await;
        state
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("document {id}")))
    }

    async fn count_documents(&self) -> StoreResult<i64> {
        Ok(self.state.read().await.documents.len() as i64)
    }

    async fn insert_document(&self, new: NewDocument) -> StoreResult<Document> {
        self.check(Fault::InsertDocument)?;
        let mut state = self.state.write().await;
        if state.documents.iter().any(|d| d.document_number == new.document_number) {
            return Err(StoreError::Conflict(format!(
                "duplicate document number {}",
                new.document_number
            )));
        }
        let now = Utc::now();
        let fields = new.fields;
        let doc = Document {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: fields.title,
            department: fields.department,
            sender: fields.sender,
            status: fields.status,
            document_number: new.document_number,
            remarks: fields.remarks,
            processing_days: new.processing_days,
        };
        state.documents.push(doc.clone());
        if self.history_trigger.load(Ordering::SeqCst) {
            state.append_trigger_row(&doc, now);
        }
        drop(state);
        self.feed.publish(TableChange::new(Table::Documents, ChangeOp::Insert));
        Ok(doc)
    }

    async fn update_document(&self, id: Uuid, fields: &DocumentFields) -> StoreResult<Document> {
        self.check(Fault::UpdateDocument)?;
        let mut state = self.state.write().await;
        let now = Utc::now();
        let doc = {
            let doc = state
                .documents
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("document {id}")))?;
            doc.title = fields.title.clone();
            doc.department = fields.department.clone();
            doc.sender = fields.sender.clone();
            doc.status = fields.status.clone();
            doc.remarks = fields.remarks.clone();
            doc.updated_at = now;
            doc.clone()
        };
        if self.history_trigger.load(Ordering::SeqCst) {
            state.append_trigger_row(&doc, now);
        }
        drop(state);
        self.feed.publish(TableChange::new(Table::Documents, ChangeOp::Update));
        Ok(doc)
    }

    async fn delete_document(&self, id: Uuid) -> StoreResult<()> {
        self.check(Fault::DeleteDocument)?;
        let mut state = self.state.write().await;
        let before = state.documents.len();
        state.documents.retain(|d| d.id != id);
        if state.documents.len() == before {
            return Err(StoreError::NotFound(format!("document {id}")));
        }
        // Mirrors ON DELETE CASCADE.
        state.history.retain(|h| h.document_id != id);
        drop(state);
        self.feed.publish(TableChange::new(Table::Documents, ChangeOp::Delete));
        Ok(())
    }

    async fn next_document_sequence(&self, period: &str) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        let next = state.sequences.entry(period.to_string()).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    async fn list_history(&self, document_id: Uuid) -> StoreResult<Vec<HistoryEntry>> {
        self.check(Fault::ListHistory)?;
        let state = self.state.read().await;
        let mut rows: Vec<HistoryEntry> = state
            .history
            .iter()
            .filter(|h| h.document_id == document_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn latest_unreconciled_history(&self, document_id: Uuid) -> StoreResult<Option<HistoryEntry>> {
        self.check(Fault::FindUnreconciled)?;
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .filter(|h| h.document_id == document_id && h.action.is_none())
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn annotate_history(
        &self,
        entry_id: i64,
        action: HistoryAction,
        received_by: Option<&str>,
    ) -> StoreResult<()> {
        self.check(Fault::AnnotateHistory)?;
        let mut state = self.state.write().await;
        let entry = state
            .history
            .iter_mut()
            .find(|h| h.id == entry_id)
            .ok_or_else(|| StoreError::NotFound(format!("history entry {entry_id}")))?;
        entry.action = Some(action.as_str().to_string());
        entry.received_by = received_by.map(String::from);
        Ok(())
    }

    async fn insert_history(&self, entry: NewHistoryEntry) -> StoreResult<HistoryEntry> {
        self.check(Fault::InsertHistory)?;
        let mut state = self.state.write().await;
        if !state.documents.iter().any(|d| d.id == entry.document_id) {
            return Err(StoreError::Conflict(format!(
                "document {} does not exist",
                entry.document_id
            )));
        }
        state.next_history_id += 1;
        let row = HistoryEntry {
            id: state.next_history_id,
            created_at: Utc::now(),
            document_id: entry.document_id,
            action: Some(entry.action.as_str().to_string()),
            department: Some(entry.department),
            status: Some(entry.status),
            received_by: entry.received_by,
            remarks: entry.remarks,
        };
        state.history.push(row.clone());
        Ok(row)
    }

    async fn delete_history(&self, document_id: Uuid) -> StoreResult<u64> {
        self.check(Fault::DeleteHistory)?;
        let mut state = self.state.write().await;
        let before = state.history.len();
        state.history.retain(|h| h.document_id != document_id);
        Ok((before - state.history.len()) as u64)
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let mut depts = self.state.read().await.departments.clone();
        depts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(depts)
    }

    async fn insert_department(&self, name: &str) -> StoreResult<Department> {
        let mut state = self.state.write().await;
        if state.departments.iter().any(|d| d.name == name) {
            return Err(StoreError::Conflict(format!("department '{name}' already exists")));
        }
        state.next_department_id += 1;
        let dept = Department { id: state.next_department_id, name: name.to_string() };
        state.departments.push(dept.clone());
        drop(state);
        self.feed.publish(TableChange::new(Table::Departments, ChangeOp::Insert));
        Ok(dept)
    }

    async fn list_statuses(&self) -> StoreResult<Vec<Status>> {
        let mut statuses = self.state.read().await.statuses.clone();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(statuses)
    }

    async fn insert_status(&self, name: &str) -> StoreResult<Status> {
        let mut state = self.state.write().await;
        if state.statuses.iter().any(|s| s.name == name) {
            return Err(StoreError::Conflict(format!("status '{name}' already exists")));
        }
        let status = Status { id: Uuid::new_v4(), name: name.to_string() };
        state.statuses.push(status.clone());
        drop(state);
        self.feed.publish(TableChange::new(Table::Statuses, ChangeOp::Insert));
        Ok(status)
    }

    async fn rename_status(&self, id: Uuid, name: &str) -> StoreResult<Status> {
        let mut state = self.state.write().await;
        if state.statuses.iter().any(|s| s.name == name && s.id != id) {
            return Err(StoreError::Conflict(format!("status '{name}' already exists")));
        }
        let status = state
            .statuses
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("status {id}")))?;
        status.name = name.to_string();
        let renamed = status.clone();
        drop(state);
        self.feed.publish(TableChange::new(Table::Statuses, ChangeOp::Update));
        Ok(renamed)
    }

    async fn site_config(&self) -> StoreResult<SiteConfig> {
        Ok(self.state.read().await.site.clone())
    }

    async fn set_logo_url(&self, url: &str) -> StoreResult<SiteConfig> {
        self.check(Fault::SetLogo)?;
        let mut state = self.state.write().await;
        state.site.logo_url = Some(url.to_string());
        let site = state.site.clone();
        drop(state);
        self.feed.publish(TableChange::new(Table::SiteConfigs, ChangeOp::Update));
        Ok(site)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
