//! Shared test infrastructure.
//!
//! Everything runs against `MemoryStore` with a zero reconcile delay, so the
//! history trigger and the reconciler can be driven deterministically.
//!
//! # Setup
//! - `setup()` - controller over a seeded memory store, count-based numbering
//! - `setup_with(numbering)` - same with an explicit numbering strategy
//! - `test_config()` - app config with one admin and one encoder account

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use doctrack::auth::{Identity, RoleMap};
use doctrack::cache::SnapshotCache;
use doctrack::config::AppConfig;
use doctrack::lifecycle::LifecycleController;
use doctrack::lifecycle::numbering::NumberingStrategy;
use doctrack::lifecycle::reconciler::HistoryReconciler;
use doctrack::models::DocumentFields;
use doctrack::store::Store;
use doctrack::store::memory::MemoryStore;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const ADMIN_EMAIL: &str = "admin@lgu.gov";
pub const CLERK_EMAIL: &str = "clerk@lgu.gov";
pub const PASSWORD: &str = "Password1!";

// ============================================================================
// CONTROLLER SETUP
// ============================================================================

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub cache: SnapshotCache,
    pub reconciler: HistoryReconciler,
    pub controller: LifecycleController,
}

impl TestEnv {
    pub fn dyn_store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }
}

pub fn setup() -> TestEnv {
    setup_with(NumberingStrategy::CachedCount)
}

pub fn setup_with(numbering: NumberingStrategy) -> TestEnv {
    let store = Arc::new(MemoryStore::seeded());
    let dyn_store: Arc<dyn Store> = store.clone();
    let cache = SnapshotCache::new(dyn_store.clone());
    let reconciler = HistoryReconciler::new(dyn_store.clone(), Duration::ZERO);
    let controller = LifecycleController::new(
        dyn_store,
        reconciler.clone(),
        RoleMap::new([ADMIN_EMAIL]),
        cache.clone(),
        numbering,
    );
    TestEnv { store, cache, reconciler, controller }
}

pub fn admin() -> Identity {
    Identity { id: "00000000-0000-0000-0000-00000000a001".to_string(), email: Some(ADMIN_EMAIL.to_string()) }
}

pub fn clerk() -> Identity {
    Identity { id: "00000000-0000-0000-0000-00000000c001".to_string(), email: Some(CLERK_EMAIL.to_string()) }
}

pub fn fields(title: &str, status: &str) -> DocumentFields {
    DocumentFields {
        title: title.to_string(),
        department: "Treasury".to_string(),
        sender: "Juan Dela Cruz".to_string(),
        status: status.to_string(),
        remarks: None,
    }
}

// ============================================================================
// APP CONFIG
// ============================================================================

pub fn test_config() -> AppConfig {
    let mut dev_accounts = HashMap::new();
    dev_accounts.insert(ADMIN_EMAIL.to_string(), PASSWORD.to_string());
    dev_accounts.insert(CLERK_EMAIL.to_string(), PASSWORD.to_string());
    AppConfig {
        admin_identities: vec![ADMIN_EMAIL.to_string()],
        reconcile_delay: Duration::ZERO,
        asset_dir: std::env::temp_dir().join(format!("doctrack-test-{}", uuid::Uuid::new_v4())),
        dev_accounts,
        ..AppConfig::default()
    }
}
