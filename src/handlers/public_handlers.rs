use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::views::{PublicQuery, history_timeline};

/// GET /api/public/documents?q=&sender=
/// Unauthenticated tracking search; both parameters are required.
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<PublicQuery>,
) -> Result<HttpResponse, AppError> {
    let search = query.validate()?;
    let documents = state
        .store
        .search_documents(&search)
        .await
        .map_err(|e| AppError::store("Error searching", e))?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "documents": documents })))
}

/// GET /api/public/documents/{id}/history
pub async fn history(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    render_history(&state, path.into_inner()).await
}

pub(crate) async fn render_history(state: &AppState, document_id: Uuid) -> Result<HttpResponse, AppError> {
    let entries = state
        .store
        .list_history(document_id)
        .await
        .map_err(|e| AppError::store("Error fetching history", e))?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "history": history_timeline(&entries) })))
}
