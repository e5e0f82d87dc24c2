use serde::{Deserialize, Serialize};

/// The single `site_configs` row (id 1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SiteConfig {
    pub logo_url: Option<String>,
}
