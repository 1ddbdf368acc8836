//! Admin sessions.
//!
//! Admins log in with a username and password and receive a bearer token
//! that expires after the configured TTL. Privileged operations take an
//! `AdminSession`, which can only be obtained by validating such a token.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AdminConfig;

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Admin login is not configured")]
    LoginDisabled,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Session lifetime out of range")]
    ExpiryOutOfRange,
}

/// Hex-encoded SHA-256 digest.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Compare two strings without short-circuiting on the first difference.
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

/// Proof that the current request carries a live admin session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub username: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    token_digest: String,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    username: String,
    expires_at: DateTime<Utc>,
}

/// Issues, validates and revokes admin sessions.
///
/// Only token digests are kept in memory.
#[derive(Debug)]
pub struct SessionStore {
    username: String,
    password_sha256: Option<String>,
    ttl: chrono::Duration,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(username: String, password_sha256: Option<String>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(12));
        Self {
            username,
            password_sha256: password_sha256.map(|h| h.to_ascii_lowercase()),
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store from validated admin configuration.
    pub fn from_config(config: &AdminConfig) -> Self {
        let ttl = crate::parse_duration(&config.session_ttl).unwrap_or(Duration::from_secs(12 * 3600));
        Self::new(config.username.clone(), config.password_sha256.clone(), ttl)
    }

    pub fn login_enabled(&self) -> bool {
        self.password_sha256.is_some()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        self.login_at(username, password, Utc::now()).await
    }

    pub async fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let expected = self
            .password_sha256
            .as_deref()
            .ok_or(AuthError::LoginDisabled)?;

        let user_ok = constant_time_eq(username, &self.username);
        let password_ok = constant_time_eq(&sha256_hex(password), expected);
        if !(user_ok && password_ok) {
            warn!("Rejected admin login for {:?}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::ExpiryOutOfRange)?;
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            sha256_hex(&token),
            SessionEntry {
                username: username.to_string(),
                expires_at,
            },
        );

        info!("Admin {} logged in, session expires {}", username, expires_at);
        Ok(IssuedToken { token, expires_at })
    }

    pub async fn validate(&self, token: &str) -> Result<AdminSession, AuthError> {
        self.validate_at(token, Utc::now()).await
    }

    pub async fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminSession, AuthError> {
        let digest = sha256_hex(token);
        let sessions = self.sessions.read().await;

        match sessions.get(&digest) {
            Some(entry) if entry.expires_at > now => Ok(AdminSession {
                username: entry.username.clone(),
                expires_at: entry.expires_at,
                token_digest: digest,
            }),
            Some(_) => {
                debug!("Rejected expired admin session");
                Err(AuthError::InvalidSession)
            }
            None => Err(AuthError::InvalidSession),
        }
    }

    /// End the session the capability was issued for.
    pub async fn revoke(&self, session: &AdminSession) -> bool {
        let removed = self
            .sessions
            .write()
            .await
            .remove(&session.token_digest)
            .is_some();
        if removed {
            info!("Admin {} logged out", session.username);
        }
        removed
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(
            "admin".to_string(),
            Some(sha256_hex("hunter2")),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("same", "same"));
        assert!(!constant_time_eq("same", "diff"));
        assert!(!constant_time_eq("short", "longer"));
    }

    #[tokio::test]
    async fn test_login_and_validate() {
        let store = store();
        let issued = store.login("admin", "hunter2").await.unwrap();
        assert_eq!(issued.token.len(), 64);

        let session = store.validate(&issued.token).await.unwrap();
        assert_eq!(session.username, "admin");
        assert_eq!(session.expires_at, issued.expires_at);
    }

    #[tokio::test]
    async fn test_login_with_unrepresentable_expiry() {
        let store = SessionStore::new(
            "admin".to_string(),
            Some(sha256_hex("hunter2")),
            Duration::from_secs(100_000_000 * 86_400),
        );

        let result = store.login("admin", "hunter2").await;
        assert_eq!(result.unwrap_err(), AuthError::ExpiryOutOfRange);
        assert!(store.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let store = store();
        assert_eq!(
            store.login("admin", "wrong").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            store.login("root", "hunter2").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_login_disabled_without_password() {
        let store = SessionStore::new("admin".to_string(), None, Duration::from_secs(60));
        assert!(!store.login_enabled());
        assert_eq!(
            store.login("admin", "").await.unwrap_err(),
            AuthError::LoginDisabled
        );
    }

    #[tokio::test]
    async fn test_session_expires() {
        let store = store();
        let now = Utc::now();
        let issued = store.login_at("admin", "hunter2", now).await.unwrap();

        let almost = now + chrono::Duration::minutes(59);
        assert!(store.validate_at(&issued.token, almost).await.is_ok());

        let later = now + chrono::Duration::minutes(61);
        assert_eq!(
            store.validate_at(&issued.token, later).await.unwrap_err(),
            AuthError::InvalidSession
        );
    }

    #[tokio::test]
    async fn test_expired_sessions_are_purged_on_login() {
        let store = store();
        let now = Utc::now();
        store.login_at("admin", "hunter2", now).await.unwrap();

        let later = now + chrono::Duration::hours(2);
        store.login_at("admin", "hunter2", later).await.unwrap();
        assert_eq!(store.active_sessions().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let store = store();
        assert_eq!(
            store.validate("not-a-token").await.unwrap_err(),
            AuthError::InvalidSession
        );
    }

    #[tokio::test]
    async fn test_revoke() {
        let store = store();
        let issued = store.login("admin", "hunter2").await.unwrap();
        let session = store.validate(&issued.token).await.unwrap();

        assert!(store.revoke(&session).await);
        assert!(!store.revoke(&session).await);
        assert!(store.validate(&issued.token).await.is_err());
    }

    #[tokio::test]
    async fn test_uppercase_digest_accepted() {
        let store = SessionStore::new(
            "admin".to_string(),
            Some(sha256_hex("pw").to_uppercase()),
            Duration::from_secs(60),
        );
        assert!(store.login("admin", "pw").await.is_ok());
    }
}
