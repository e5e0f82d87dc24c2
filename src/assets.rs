//! Local object bucket for the site logo.
//!
//! Objects live under `{asset_dir}/{bucket}/{path}` and are served by
//! actix-files from `{public_base}`.

use std::path::PathBuf;

use chrono::Utc;

pub const ASSET_BUCKET: &str = "lgu-assets";

#[derive(Debug, Clone)]
pub struct LogoBucket {
    root: PathBuf,
    public_base: String,
}

impl LogoBucket {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        LogoBucket { root: root.into(), public_base: public_base.trim_end_matches('/').to_string() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Object path for a logo uploaded now, e.g. `logos/lgu_logo_1714550400000`.
    pub fn logo_object_path() -> String {
        format!("logos/lgu_logo_{}", Utc::now().timestamp_millis())
    }

    pub fn public_url(&self, object_path: &str) -> String {
        format!("{}/{ASSET_BUCKET}/{object_path}", self.public_base)
    }

    /// Write `bytes` into the bucket (overwriting) and return the public URL.
    pub async fn upload(&self, object_path: &str, bytes: &[u8]) -> std::io::Result<String> {
        let target = self.root.join(ASSET_BUCKET).join(object_path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        log::info!("Stored {} bytes at {}", bytes.len(), target.display());
        Ok(self.public_url(object_path))
    }
}
