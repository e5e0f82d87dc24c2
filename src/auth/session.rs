use actix_session::Session;

use super::identity::Identity;
use super::role::{Role, RoleMap};
use crate::errors::AppError;

const IDENTITY_KEY: &str = "identity";

pub fn get_identity(session: &Session) -> Result<Option<Identity>, AppError> {
    session
        .get::<Identity>(IDENTITY_KEY)
        .map_err(|e| AppError::Session(format!("Failed to read identity: {e}")))
}

/// The signed-in identity, or `Unauthorized`.
pub fn require_identity(session: &Session) -> Result<Identity, AppError> {
    get_identity(session)?.ok_or(AppError::Unauthorized)
}

/// The signed-in identity if it maps to the admin role.
pub fn require_admin(session: &Session, roles: &RoleMap, action: &str) -> Result<Identity, AppError> {
    let identity = require_identity(session)?;
    match roles.role_of(&identity) {
        Role::Admin => Ok(identity),
        Role::Encoder => Err(AppError::PermissionDenied(format!(
            "Only administrators can {action}"
        ))),
    }
}

pub fn store_identity(session: &Session, identity: &Identity) -> Result<(), AppError> {
    session.renew();
    session
        .insert(IDENTITY_KEY, identity)
        .map_err(|e| AppError::Session(format!("Failed to store identity: {e}")))
}

pub fn clear(session: &Session) {
    session.purge();
}
