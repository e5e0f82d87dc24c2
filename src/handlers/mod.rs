pub mod document_handlers;
pub mod public_handlers;
pub mod reference_handlers;
pub mod session_handlers;
pub mod site_handlers;

use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::{Next, from_fn},
    web,
};

use crate::auth::middleware::require_auth;
use crate::errors::ApiErrorResponse;
use crate::realtime::ws;

/// Rejects POST/PUT/DELETE requests whose Content-Type is not JSON.
///
/// Browsers cannot send cross-origin JSON with cookies from a plain form,
/// so this doubles as CSRF protection for the cookie session.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::BadRequest().json(ApiErrorResponse {
                error: "Content-Type must be application/json for mutation requests".to_string(),
                details: None,
            });
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Register every route. Expects `web::Data<AppState>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/session")
            .wrap(from_fn(require_json_content_type))
            .route("", web::get().to(session_handlers::current))
            .route("", web::post().to(session_handlers::sign_in))
            .route("", web::delete().to(session_handlers::sign_out)),
    );
    cfg.service(
        web::scope("/api/public")
            .route("/documents", web::get().to(public_handlers::search))
            .route("/documents/{id}/history", web::get().to(public_handlers::history)),
    );
    cfg.service(
        web::scope("/api/documents")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_auth))
            .route("", web::get().to(document_handlers::list))
            .route("", web::post().to(document_handlers::create))
            .route("/{id}", web::get().to(document_handlers::detail))
            .route("/{id}", web::put().to(document_handlers::update))
            .route("/{id}", web::delete().to(document_handlers::delete))
            .route("/{id}/actions", web::post().to(document_handlers::apply_action))
            .route("/{id}/history", web::get().to(document_handlers::history)),
    );
    cfg.service(
        web::scope("/api/departments")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_auth))
            .route("", web::get().to(reference_handlers::list_departments))
            .route("", web::post().to(reference_handlers::add_department)),
    );
    cfg.service(
        web::scope("/api/statuses")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_auth))
            .route("", web::get().to(reference_handlers::list_statuses))
            .route("", web::post().to(reference_handlers::add_status))
            .route("/{id}", web::put().to(reference_handlers::rename_status)),
    );
    // The logo upload takes a raw body, so it sits outside the JSON guard.
    cfg.service(
        web::scope("/api/site")
            .route("", web::get().to(site_handlers::show))
            .service(
                web::resource("/logo")
                    .app_data(web::PayloadConfig::new(site_handlers::MAX_LOGO_BYTES))
                    .route(web::post().to(site_handlers::upload_logo))
                    .wrap(from_fn(require_auth)),
            ),
    );
    cfg.route("/ws", web::get().to(ws::ws_connect));
}
