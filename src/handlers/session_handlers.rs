use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::auth::session::{clear, get_identity, store_identity};
use crate::auth::{Identity, Role};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub identity: Identity,
    pub role: Role,
}

/// GET /api/session - the signed-in identity and its role, or `null`.
pub async fn current(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let body = get_identity(&session)?.map(|identity| SessionResponse {
        role: state.roles.role_of(&identity),
        identity,
    });
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/session
pub async fn sign_in(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<SignInRequest>,
) -> Result<HttpResponse, AppError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::validation("Email and password are required."));
    }

    let identity = match state.identity.sign_in(&body.email, &body.password).await {
        Ok(identity) => identity,
        Err(e) => {
            log::warn!("Failed sign-in for '{}': {e}", body.email.trim());
            return Err(e.into());
        }
    };
    store_identity(&session, &identity)?;

    let role = state.roles.role_of(&identity);
    log::info!("{} signed in as {:?}", identity.actor_label(), role);
    Ok(HttpResponse::Ok().json(SessionResponse { identity, role }))
}

/// DELETE /api/session
pub async fn sign_out(session: Session) -> Result<HttpResponse, AppError> {
    if let Some(identity) = get_identity(&session)? {
        log::info!("{} signed out", identity.actor_label());
    }
    clear(&session);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Signed out" })))
}
