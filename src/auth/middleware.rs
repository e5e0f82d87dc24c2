use actix_session::SessionExt;
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use super::identity::Identity;
use crate::errors::ApiErrorResponse;

/// Rejects requests without a signed-in identity with a JSON 401.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let session = req.get_session();
    let signed_in = session.get::<Identity>("identity").unwrap_or(None).is_some();

    if !signed_in {
        let response = HttpResponse::Unauthorized().json(ApiErrorResponse {
            error: "Not signed in".to_string(),
            details: None,
        });
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
