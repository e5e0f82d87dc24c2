//! Postgres-backed store.
//!
//! History rows for document inserts/updates are written by the
//! `documents_history_trigger` defined in `migrations/`, never by this module,
//! except for the reconciler's explicit fallback insert. Change notifications
//! are emitted by `doctrack_notify` and bridged into [`ChangeFeed`] by
//! [`crate::realtime::listener`].

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DocumentSearch, Store, StoreResult};
use crate::models::{
    Department, Document, DocumentFields, HistoryAction, HistoryEntry, NewDocument,
    NewHistoryEntry, SiteConfig, Status,
};
use crate::realtime::ChangeFeed;

const DOCUMENT_COLUMNS: &str = "id, created_at, updated_at, title, department, submitter, status, \
                                document_number, remarks, processing_days";

const HISTORY_COLUMNS: &str =
    "id, created_at, document_id, action, department, status, received_by, remarks";

pub struct PgStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgStore {
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        PgStore { pool, feed }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn like_pattern(input: &str) -> String {
    let escaped = input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl Store for PgStore {
    async fn list_documents(&self) -> StoreResult<Vec<Document>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY created_at DESC");
        let docs = sqlx::query_as::<_, Document>(&sql).fetch_all(&self.pool).await?;
        Ok(docs)
    }

    async fn search_documents(&self, search: &DocumentSearch) -> StoreResult<Vec<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE submitter ILIKE $1 \
               AND (document_number ILIKE $2 OR title ILIKE $2) \
             ORDER BY created_at DESC"
        );
        let docs = sqlx::query_as::<_, Document>(&sql)
            .bind(like_pattern(search.sender.trim()))
            .bind(like_pattern(search.term.trim()))
            .fetch_all(&self.pool)
            .await?;
        Ok(docs)
    }

    async fn get_document(&self, id: Uuid) -> StoreResult<Document> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1");
        let doc = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn count_documents(&self) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn insert_document(&self, new: NewDocument) -> StoreResult<Document> {
        let sql = format!(
            "INSERT INTO documents \
                 (title, department, submitter, status, remarks, document_number, processing_days) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {DOCUMENT_COLUMNS}"
        );
        let doc = sqlx::query_as::<_, Document>(&sql)
            .bind(&new.fields.title)
            .bind(&new.fields.department)
            .bind(&new.fields.sender)
            .bind(&new.fields.status)
            .bind(&new.fields.remarks)
            .bind(&new.document_number)
            .bind(new.processing_days)
            .fetch_one(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn update_document(&self, id: Uuid, fields: &DocumentFields) -> StoreResult<Document> {
        let sql = format!(
            "UPDATE documents \
             SET title = $1, department = $2, submitter = $3, status = $4, remarks = $5 \
             WHERE id = $6 \
             RETURNING {DOCUMENT_COLUMNS}"
        );
        let doc = sqlx::query_as::<_, Document>(&sql)
            .bind(&fields.title)
            .bind(&fields.department)
            .bind(&fields.sender)
            .bind(&fields.status)
            .bind(&fields.remarks)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn delete_document(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(super::StoreError::NotFound(format!("document {id}")));
        }
        Ok(())
    }

    async fn next_document_sequence(&self, period: &str) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO document_sequences (period, last_value) VALUES ($1, 1) \
             ON CONFLICT (period) DO UPDATE SET last_value = document_sequences.last_value + 1 \
             RETURNING last_value",
        )
        .bind(period)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn list_history(&self, document_id: Uuid) -> StoreResult<Vec<HistoryEntry>> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM document_history \
             WHERE document_id = $1 ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(document_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn latest_unreconciled_history(&self, document_id: Uuid) -> StoreResult<Option<HistoryEntry>> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM document_history \
             WHERE document_id = $1 AND action IS NULL \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn annotate_history(
        &self,
        entry_id: i64,
        action: HistoryAction,
        received_by: Option<&str>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE document_history SET action = $1, received_by = $2 WHERE id = $3",
        )
        .bind(action.as_str())
        .bind(received_by)
        .bind(entry_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::StoreError::NotFound(format!("history entry {entry_id}")));
        }
        Ok(())
    }

    async fn insert_history(&self, entry: NewHistoryEntry) -> StoreResult<HistoryEntry> {
        let sql = format!(
            "INSERT INTO document_history \
                 (document_id, action, received_by, department, status, remarks) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {HISTORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(entry.document_id)
            .bind(entry.action.as_str())
            .bind(&entry.received_by)
            .bind(&entry.department)
            .bind(&entry.status)
            .bind(&entry.remarks)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_history(&self, document_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM document_history WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_department(&self, name: &str) -> StoreResult<Department> {
        let row = sqlx::query_as::<_, Department>(
            "INSERT INTO departments (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_statuses(&self) -> StoreResult<Vec<Status>> {
        let rows = sqlx::query_as::<_, Status>("SELECT id, name FROM statuses ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_status(&self, name: &str) -> StoreResult<Status> {
        let row = sqlx::query_as::<_, Status>(
            "INSERT INTO statuses (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn rename_status(&self, id: Uuid, name: &str) -> StoreResult<Status> {
        let row = sqlx::query_as::<_, Status>(
            "UPDATE statuses SET name = $1 WHERE id = $2 RETURNING id, name",
        )
        .bind(name)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn site_config(&self) -> StoreResult<SiteConfig> {
        let row = sqlx::query_as::<_, SiteConfig>("SELECT logo_url FROM site_configs WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.unwrap_or_default())
    }

    async fn set_logo_url(&self, url: &str) -> StoreResult<SiteConfig> {
        let row = sqlx::query_as::<_, SiteConfig>(
            "INSERT INTO site_configs (id, logo_url) VALUES (1, $1) \
             ON CONFLICT (id) DO UPDATE SET logo_url = EXCLUDED.logo_url \
             RETURNING logo_url",
        )
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
