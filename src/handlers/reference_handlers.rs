use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::session::require_admin;
use crate::errors::AppError;
use crate::models::reference::validate_name;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: String,
}

impl NameRequest {
    fn validated(&self, label: &str) -> Result<&str, AppError> {
        match validate_name(&self.name, label) {
            Some(error) => Err(AppError::validation(error)),
            None => Ok(self.name.trim()),
        }
    }
}

async fn refresh(state: &AppState) {
    if let Err(e) = state.cache.refresh_tables().await {
        log::warn!("Cache refresh after reference change failed: {e}");
    }
}

/// GET /api/departments
pub async fn list_departments(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let snapshot = state.cache.snapshot().await;
    Ok(HttpResponse::Ok().json(snapshot.departments))
}

/// POST /api/departments (admin only)
pub async fn add_department(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<NameRequest>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session, &state.roles, "manage departments")?;
    let name = body.validated("Department")?;

    let department = state
        .store
        .insert_department(name)
        .await
        .map_err(|e| AppError::store("Error adding department", e))?;
    log::info!("Department '{}' added by {}", department.name, admin.actor_label());
    refresh(&state).await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "department": department,
        "message": "Department added successfully.",
    })))
}

/// GET /api/statuses
pub async fn list_statuses(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let snapshot = state.cache.snapshot().await;
    Ok(HttpResponse::Ok().json(snapshot.statuses))
}

/// POST /api/statuses (admin only)
pub async fn add_status(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<NameRequest>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session, &state.roles, "manage statuses")?;
    let name = body.validated("Status")?;

    let status = state
        .store
        .insert_status(name)
        .await
        .map_err(|e| AppError::store("Error adding status", e))?;
    log::info!("Status '{}' added by {}", status.name, admin.actor_label());
    refresh(&state).await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "status": status,
        "message": "Status added successfully.",
    })))
}

/// PUT /api/statuses/{id} (admin only)
///
/// Documents and history keep the old name; they store labels, not ids.
pub async fn rename_status(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<Uuid>,
    body: web::Json<NameRequest>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session, &state.roles, "manage statuses")?;
    let name = body.validated("Status")?;

    let status = state
        .store
        .rename_status(path.into_inner(), name)
        .await
        .map_err(|e| AppError::store("Error updating status", e))?;
    log::info!("Status {} renamed to '{}' by {}", status.id, status.name, admin.actor_label());
    refresh(&state).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": status,
        "message": "Status updated successfully.",
    })))
}
