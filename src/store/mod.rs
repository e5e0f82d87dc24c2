//! The persistent store contract.
//!
//! The store owns all persisted state. Two backends implement [`Store`]:
//! [`postgres::PgStore`] for deployments and [`memory::MemoryStore`] for local
//! development and tests. Both reproduce the documents trigger: every document
//! insert or update appends one history row whose `action` is `NULL`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Department, Document, DocumentFields, HistoryAction, HistoryEntry, NewDocument,
    NewHistoryEntry, SiteConfig, Status,
};
use crate::realtime::ChangeFeed;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Public tracking query: sender substring AND (number OR title substring),
/// all case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct DocumentSearch {
    pub term: String,
    pub sender: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// All documents, newest first.
    async fn list_documents(&self) -> StoreResult<Vec<Document>>;
    async fn search_documents(&self, search: &DocumentSearch) -> StoreResult<Vec<Document>>;
    async fn get_document(&self, id: Uuid) -> StoreResult<Document>;
    async fn count_documents(&self) -> StoreResult<i64>;
    async fn insert_document(&self, new: NewDocument) -> StoreResult<Document>;
    async fn update_document(&self, id: Uuid, fields: &DocumentFields) -> StoreResult<Document>;
    async fn delete_document(&self, id: Uuid) -> StoreResult<()>;
    /// Atomically advance and return the per-period document counter.
    async fn next_document_sequence(&self, period: &str) -> StoreResult<i64>;

    /// History rows for one document, oldest first.
    async fn list_history(&self, document_id: Uuid) -> StoreResult<Vec<HistoryEntry>>;
    /// The most recent row for the document whose action is still `NULL`.
    async fn latest_unreconciled_history(&self, document_id: Uuid) -> StoreResult<Option<HistoryEntry>>;
    async fn annotate_history(
        &self,
        entry_id: i64,
        action: HistoryAction,
        received_by: Option<&str>,
    ) -> StoreResult<()>;
    async fn insert_history(&self, entry: NewHistoryEntry) -> StoreResult<HistoryEntry>;
    /// Delete every history row of a document. Returns the number of rows removed.
    async fn delete_history(&self, document_id: Uuid) -> StoreResult<u64>;

    async fn list_departments(&self) -> StoreResult<Vec<Department>>;
    async fn insert_department(&self, name: &str) -> StoreResult<Department>;
    async fn list_statuses(&self) -> StoreResult<Vec<Status>>;
    async fn insert_status(&self, name: &str) -> StoreResult<Status>;
    async fn rename_status(&self, id: Uuid, name: &str) -> StoreResult<Status>;

    async fn site_config(&self) -> StoreResult<SiteConfig>;
    async fn set_logo_url(&self, url: &str) -> StoreResult<SiteConfig>;

    /// Feed of committed row changes for this store.
    fn changes(&self) -> &ChangeFeed;
    fn backend_name(&self) -> &'static str;
}
