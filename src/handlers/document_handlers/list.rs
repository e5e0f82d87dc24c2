use actix_web::{HttpResponse, web};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::handlers::public_handlers::render_history;
use crate::models::Document;
use crate::state::AppState;
use crate::views::{DashboardFilter, DashboardStats};

#[derive(Serialize)]
struct DashboardResponse {
    documents: Vec<Document>,
    /// Over all documents, not just the filtered ones.
    stats: DashboardStats,
}

/// GET /api/documents?department=&sender=&q=
pub async fn list(
    state: web::Data<AppState>,
    filter: web::Query<DashboardFilter>,
) -> Result<HttpResponse, AppError> {
    let all = state
        .store
        .list_documents()
        .await
        .map_err(|e| AppError::store("Error fetching documents", e))?;

    let response = DashboardResponse {
        stats: DashboardStats::compute(&all),
        documents: filter.apply(&all),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/documents/{id}/history
pub async fn history(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    render_history(&state, path.into_inner()).await
}
