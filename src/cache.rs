//! Transient snapshot of the store's small tables.
//!
//! The store stays the source of truth. Any change notification for
//! documents, departments or statuses refetches all three; the refresher
//! never merges row-level diffs.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::models::{Department, Document, SiteConfig, Status};
use crate::realtime::Table;
use crate::store::{Store, StoreResult};

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub documents: Vec<Document>,
    pub departments: Vec<Department>,
    pub statuses: Vec<Status>,
    pub site: SiteConfig,
}

#[derive(Clone)]
pub struct SnapshotCache {
    store: Arc<dyn Store>,
    snapshot: Arc<RwLock<Snapshot>>,
}

impl SnapshotCache {
    /// Empty cache; call [`refresh_all`](Self::refresh_all) to populate it.
    pub fn new(store: Arc<dyn Store>) -> Self {
        SnapshotCache { store, snapshot: Arc::new(RwLock::new(Snapshot::default())) }
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn documents(&self) -> Vec<Document> {
        self.snapshot.read().await.documents.clone()
    }

    pub async fn document_count(&self) -> usize {
        self.snapshot.read().await.documents.len()
    }

    pub async fn site_config(&self) -> SiteConfig {
        self.snapshot.read().await.site.clone()
    }

    /// Refetch documents, departments and statuses together.
    pub async fn refresh_tables(&self) -> StoreResult<()> {
        let documents = self.store.list_documents().await?;
        let departments = self.store.list_departments().await?;
        let statuses = self.store.list_statuses().await?;

        let mut snapshot = self.snapshot.write().await;
        log::debug!(
            "Cache refreshed: {} documents, {} departments, {} statuses",
            documents.len(),
            departments.len(),
            statuses.len()
        );
        snapshot.documents = documents;
        snapshot.departments = departments;
        snapshot.statuses = statuses;
        Ok(())
    }

    pub async fn refresh_site(&self) -> StoreResult<()> {
        let site = self.store.site_config().await?;
        self.snapshot.write().await.site = site;
        log::debug!("Cache refreshed: site config");
        Ok(())
    }

    pub async fn refresh_all(&self) -> StoreResult<()> {
        self.refresh_tables().await?;
        self.refresh_site().await
    }

    async fn refresh_for(&self, table: Table) {
        let result = match table {
            Table::SiteConfigs => self.refresh_site().await,
            Table::Documents | Table::Departments | Table::Statuses => self.refresh_tables().await,
        };
        if let Err(e) = result {
            log::warn!("Cache refresh after {table} change failed: {e}");
        }
    }

    /// Follow the store's change feed until it closes.
    pub fn spawn_refresher(&self) -> JoinHandle<()> {
        let cache = self.clone();
        let mut rx = self.store.changes().subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => cache.refresh_for(change.table).await,
                    Err(RecvError::Lagged(skipped)) => {
                        log::debug!("Cache refresher lagged by {skipped} changes; refetching everything");
                        if let Err(e) = cache.refresh_all().await {
                            log::warn!("Cache refresh after lag failed: {e}");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::time::Duration;

    #[tokio::test]
    async fn refresher_follows_store_changes() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = SnapshotCache::new(store.clone());
        let handle = cache.spawn_refresher();

        store.insert_department("Treasury").await.unwrap();
        for _ in 0..50 {
            if !cache.snapshot().await.departments.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.departments.len(), 1);
        assert_eq!(snapshot.statuses.len(), 7, "statuses refetched with departments");
        handle.abort();
    }

    #[tokio::test]
    async fn refresh_site_loads_the_logo() {
        let store = Arc::new(MemoryStore::new());
        let cache = SnapshotCache::new(store.clone());
        store.set_logo_url("/assets/lgu-assets/logos/lgu_logo_1").await.unwrap();
        cache.refresh_site().await.unwrap();
        assert_eq!(
            cache.site_config().await.logo_url.as_deref(),
            Some("/assets/lgu-assets/logos/lgu_logo_1")
        );
    }
}
