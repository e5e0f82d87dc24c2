use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::assets::LogoBucket;
use crate::auth::session::require_admin;
use crate::errors::AppError;
use crate::state::AppState;

pub const MAX_LOGO_BYTES: usize = 5 * 1024 * 1024;

/// GET /api/site
pub async fn show(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.cache.site_config().await))
}

/// POST /api/site/logo (admin only). The request body is the image itself.
pub async fn upload_logo(
    state: web::Data<AppState>,
    session: Session,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session, &state.roles, "upload the logo")?;
    if body.is_empty() {
        return Err(AppError::validation("Please choose a logo file to upload."));
    }

    let object_path = LogoBucket::logo_object_path();
    let url = state
        .logos
        .upload(&object_path, &body)
        .await
        .map_err(|e| AppError::asset("Failed to upload logo", e))?;

    let site = state
        .store
        .set_logo_url(&url)
        .await
        .map_err(|e| AppError::store("Failed to upload logo", e))?;
    if let Err(e) = state.cache.refresh_site().await {
        log::warn!("Cache refresh after logo upload failed: {e}");
    }
    log::info!("Logo replaced by {}: {url}", admin.actor_label());

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "site": site,
        "message": "Logo uploaded successfully!",
    })))
}
