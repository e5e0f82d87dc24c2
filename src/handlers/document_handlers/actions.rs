use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::lifecycle::LifecycleAction;
use crate::models::DocumentFields;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ActionRequest {
    /// `Receive`, `Release` or `Complete`.
    pub action: String,
    /// Name of the person who physically handled the document.
    #[serde(default)]
    pub performed_by: String,
    /// Unsaved form edits to write along with the new status.
    #[serde(default)]
    pub fields: Option<DocumentFields>,
}

/// POST /api/documents/{id}/actions
pub async fn apply_action(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ActionRequest>,
) -> Result<HttpResponse, AppError> {
    let action: LifecycleAction = body.action.parse().map_err(AppError::validation)?;
    let outcome = state
        .lifecycle
        .apply_action(path.into_inner(), action, &body.performed_by, body.fields.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}
