use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::lifecycle::numbering::NumberingStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub session_key: Option<String>,
    /// Identities (ids or emails) mapped to the privileged role.
    pub admin_identities: Vec<String>,
    pub reconcile_delay: Duration,
    pub numbering: NumberingStrategy,
    pub asset_dir: PathBuf,
    pub public_asset_base: String,
    /// `email -> password` accounts for the in-memory identity provider.
    pub dev_accounts: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_url: None,
            db_max_connections: 8,
            session_key: None,
            admin_identities: Vec::new(),
            reconcile_delay: Duration::from_millis(250),
            numbering: NumberingStrategy::CachedCount,
            asset_dir: PathBuf::from("data/assets"),
            public_asset_base: "/assets".to_string(),
            dev_accounts: HashMap::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(v) = get("DOCTRACK_BIND") {
            config.bind_addr = v.trim().parse().map_err(|e| ConfigError::Invalid {
                name: "DOCTRACK_BIND",
                reason: format!("{e}"),
            })?;
        }
        config.database_url = get("DATABASE_URL");
        if let Some(v) = get("DOCTRACK_DB_MAX_CONNECTIONS") {
            config.db_max_connections = v.trim().parse().map_err(|e| ConfigError::Invalid {
                name: "DOCTRACK_DB_MAX_CONNECTIONS",
                reason: format!("{e}"),
            })?;
        }
        config.session_key = get("SESSION_KEY");
        if let Some(v) = get("DOCTRACK_ADMIN_IDENTITIES") {
            config.admin_identities = split_list(&v);
        }
        if let Some(v) = get("DOCTRACK_RECONCILE_DELAY_MS") {
            let ms: u64 = v.trim().parse().map_err(|e| ConfigError::Invalid {
                name: "DOCTRACK_RECONCILE_DELAY_MS",
                reason: format!("{e}"),
            })?;
            config.reconcile_delay = Duration::from_millis(ms);
        }
        if let Some(v) = get("DOCTRACK_NUMBERING") {
            config.numbering = v.trim().parse().map_err(|reason| ConfigError::Invalid {
                name: "DOCTRACK_NUMBERING",
                reason,
            })?;
        }
        if let Some(v) = get("DOCTRACK_ASSET_DIR") {
            config.asset_dir = PathBuf::from(v.trim());
        }
        if let Some(v) = get("DOCTRACK_PUBLIC_ASSET_BASE") {
            config.public_asset_base = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = get("DOCTRACK_DEV_ACCOUNTS") {
            config.dev_accounts = parse_accounts(&v)?;
        }
        Ok(config)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_accounts(raw: &str) -> Result<HashMap<String, String>, ConfigError> {
    let mut accounts = HashMap::new();
    for pair in split_list(raw) {
        let (email, password) = pair.split_once(':').ok_or_else(|| ConfigError::Invalid {
            name: "DOCTRACK_DEV_ACCOUNTS",
            reason: format!("expected email:password, got '{pair}'"),
        })?;
        accounts.insert(email.trim().to_lowercase(), password.to_string());
    }
    Ok(accounts)
}
