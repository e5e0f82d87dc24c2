use std::sync::Arc;

use crate::assets::LogoBucket;
use crate::auth::{IdentityProvider, RoleMap};
use crate::cache::SnapshotCache;
use crate::config::AppConfig;
use crate::lifecycle::LifecycleController;
use crate::lifecycle::reconciler::HistoryReconciler;
use crate::store::Store;

/// Shared application state handed to every handler via `web::Data`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub cache: SnapshotCache,
    pub lifecycle: LifecycleController,
    pub identity: Arc<dyn IdentityProvider>,
    pub roles: RoleMap,
    pub logos: LogoBucket,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, identity: Arc<dyn IdentityProvider>, config: &AppConfig) -> Self {
        let roles = RoleMap::new(&config.admin_identities);
        let cache = SnapshotCache::new(store.clone());
        let reconciler = HistoryReconciler::new(store.clone(), config.reconcile_delay);
        let lifecycle = LifecycleController::new(
            store.clone(),
            reconciler,
            roles.clone(),
            cache.clone(),
            config.numbering,
        );
        AppState {
            store,
            cache,
            lifecycle,
            identity,
            roles,
            logos: LogoBucket::new(&config.asset_dir, &config.public_asset_base),
        }
    }
}
