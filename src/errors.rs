use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Not signed in")]
    Unauthorized,
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Not found")]
    NotFound,
    /// A failed store call, with the user-facing context prepended.
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
    /// A failed asset write, reported to the user with its context.
    #[error("{context}: {source}")]
    Asset {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Session error: {0}")]
    Session(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        AppError::Store { context: context.into(), source }
    }

    pub fn asset(context: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Asset { context: context.into(), source }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => AppError::NotFound,
            other => AppError::store("Store error", other),
        }
    }
}

/// JSON error body.
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store { source: StoreError::NotFound(_), .. } => StatusCode::NOT_FOUND,
            AppError::Store { source: StoreError::Conflict(_), .. } => StatusCode::CONFLICT,
            AppError::Store { .. } => StatusCode::BAD_GATEWAY,
            AppError::Asset { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::Backend(_)) => StatusCode::BAD_GATEWAY,
            AppError::Auth(AuthError::Hash(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            // The first message is the summary; the rest are per-field details.
            AppError::Validation(errors) => match errors.split_first() {
                Some((summary, rest)) => ApiErrorResponse {
                    error: summary.clone(),
                    details: (!rest.is_empty()).then(|| rest.join("; ")),
                },
                None => ApiErrorResponse { error: "Validation failed".to_string(), details: None },
            },
            AppError::Store { .. } | AppError::Asset { .. } => {
                log::error!("{self}");
                ApiErrorResponse { error: self.to_string(), details: None }
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                ApiErrorResponse { error: self.to_string(), details: None }
            }
            AppError::Auth(_) | AppError::Session(_) => {
                log::error!("{self}");
                ApiErrorResponse { error: "Internal Server Error".to_string(), details: None }
            }
            _ => ApiErrorResponse { error: self.to_string(), details: None },
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(AppError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::PermissionDenied("delete".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::store("Error saving document", StoreError::Unavailable("down".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(StoreError::NotFound("document".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn store_errors_keep_their_context() {
        let err = AppError::store("Error deleting document", StoreError::Unavailable("timeout".into()));
        assert_eq!(err.to_string(), "Error deleting document: store unavailable: timeout");
    }

    #[test]
    fn asset_errors_are_shown_with_their_context() {
        let err = AppError::asset(
            "Failed to upload logo",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to upload logo: read-only");
    }
}
