//! Sign-in against an identity provider.
//!
//! The application never owns credentials beyond checking them: a provider
//! turns an email/password pair into an [`Identity`], and the session cookie
//! carries that identity afterwards.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::password::{hash_password, verify_password};

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
}

impl Identity {
    /// Name recorded as `received_by` in history: the email, else the id.
    pub fn actor_label(&self) -> &str {
        self.email.as_deref().filter(|e| !e.is_empty()).unwrap_or(&self.id)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("identity provider unavailable: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("password hash error: {0}")]
    Hash(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
}

/// Staff accounts stored in Postgres (`staff_accounts`).
pub struct AccountDirectory {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: String,
}

impl AccountDirectory {
    pub fn new(pool: PgPool) -> Self {
        AccountDirectory { pool }
    }

    /// Create or replace an account's password.
    pub async fn upsert_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let hash = hash_password(password).map_err(AuthError::Hash)?;
        let row = sqlx::query_as::<_, AccountRow>(
            "INSERT INTO staff_accounts (email, password_hash) VALUES ($1, $2)
             ON CONFLICT (email) DO UPDATE SET password_hash = EXCLUDED.password_hash
             RETURNING id, email, password_hash",
        )
        .bind(email.trim().to_lowercase())
        .bind(&hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(Identity { id: row.id.to_string(), email: Some(row.email) })
    }
}

#[async_trait]
impl IdentityProvider for AccountDirectory {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash FROM staff_accounts WHERE lower(email) = lower($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        if verify_password(password, &row.password_hash).map_err(AuthError::Hash)? {
            Ok(Identity { id: row.id.to_string(), email: Some(row.email) })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Fixed accounts held in memory, for running without a database.
pub struct StaticAccounts {
    accounts: HashMap<String, (Identity, String)>,
}

impl StaticAccounts {
    /// Hashes every password up front; `email -> password`.
    pub fn new(accounts: &HashMap<String, String>) -> Result<Self, AuthError> {
        let mut hashed = HashMap::new();
        for (email, password) in accounts {
            let email = email.trim().to_lowercase();
            let identity = Identity { id: Uuid::new_v4().to_string(), email: Some(email.clone()) };
            let hash = hash_password(password).map_err(AuthError::Hash)?;
            hashed.insert(email, (identity, hash));
        }
        Ok(StaticAccounts { accounts: hashed })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for StaticAccounts {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let (identity, hash) = self
            .accounts
            .get(&email.trim().to_lowercase())
            .ok_or(AuthError::InvalidCredentials)?;
        if verify_password(password, hash).map_err(AuthError::Hash)? {
            Ok(identity.clone())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_label_prefers_email() {
        let with_email = Identity { id: "u1".into(), email: Some("clerk@lgu.gov".into()) };
        let without = Identity { id: "u2".into(), email: None };
        let blank = Identity { id: "u3".into(), email: Some(String::new()) };
        assert_eq!(with_email.actor_label(), "clerk@lgu.gov");
        assert_eq!(without.actor_label(), "u2");
        assert_eq!(blank.actor_label(), "u3");
    }

    #[tokio::test]
    async fn static_accounts_check_passwords() {
        let mut raw = HashMap::new();
        raw.insert("Clerk@LGU.gov".to_string(), "pw".to_string());
        let accounts = StaticAccounts::new(&raw).unwrap();

        let identity = accounts.sign_in(" clerk@lgu.gov ", "pw").await.unwrap();
        assert_eq!(identity.email.as_deref(), Some("clerk@lgu.gov"));
        assert!(matches!(
            accounts.sign_in("clerk@lgu.gov", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.sign_in("nobody@lgu.gov", "pw").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
