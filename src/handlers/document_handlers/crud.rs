use actix_session::Session;
use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::session::require_identity;
use crate::errors::AppError;
use crate::models::DocumentFields;
use crate::state::AppState;

/// GET /api/documents/{id}
pub async fn detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let document = state.store.get_document(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(document))
}

/// POST /api/documents
pub async fn create(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<DocumentFields>,
) -> Result<HttpResponse, AppError> {
    let actor = require_identity(&session)?;
    let outcome = state.lifecycle.create(&actor, &body).await?;
    Ok(HttpResponse::Created().json(outcome))
}

/// PUT /api/documents/{id}
pub async fn update(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<Uuid>,
    body: web::Json<DocumentFields>,
) -> Result<HttpResponse, AppError> {
    let actor = require_identity(&session)?;
    let outcome = state.lifecycle.update(&actor, path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// DELETE /api/documents/{id} (admin only)
pub async fn delete(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let actor = require_identity(&session)?;
    let outcome = state.lifecycle.delete(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}
