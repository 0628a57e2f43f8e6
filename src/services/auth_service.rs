//! Minimal auth gate: configured credentials, opaque bearer tokens with a TTL.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("malformed authorization header")]
    MalformedHeader,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Decode `Basic <base64(username:password)>`.
    pub fn from_basic_header(value: &str) -> Result<Self, AuthError> {
        let encoded = value
            .strip_prefix("Basic ")
            .ok_or(AuthError::MalformedHeader)?;
        let decoded = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| AuthError::MalformedHeader)?;
        let text = String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader)?;
        let (username, password) = text.split_once(':').ok_or(AuthError::MalformedHeader)?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    username: String,
    password: String,
    ttl: Duration,
    sessions: Arc<RwLock<HashMap<String, AuthSession>>>,
}

impl AuthService {
    pub fn new(username: impl Into<String>, password: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        if credentials.username != self.username || credentials.password != self.password {
            warn!("failed login for `{}`", credentials.username);
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        let session = AuthSession {
            token: Uuid::new_v4().simple().to_string(),
            username: credentials.username.clone(),
            expires_at: now + self.ttl,
        };
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(session.token.clone(), session.clone());
        drop(sessions);
        info!("`{}` logged in", session.username);
        Ok(session)
    }

    pub async fn logout(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Forget every expired token. Returns how many were dropped.
    pub async fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    /// The live session for `token`. Expired sessions are dropped on sight.
    pub async fn authenticate(&self, token: &str) -> Option<AuthSession> {
        let session = self.sessions.read().await.get(token).cloned()?;
        if session.expires_at <= Utc::now() {
            self.sessions.write().await.remove(token);
            return None;
        }
        Some(session)
    }
}
