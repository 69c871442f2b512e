use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{app::AppState, error::AppError};

/// Single-credential admin gate with in-memory sliding sessions.
#[derive(Clone)]
pub struct AdminManager {
    username: Arc<str>,
    password: Arc<str>,
    session_ttl: Duration,
    sessions: Arc<RwLock<HashMap<String, Instant>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Valid,
    Expired,
    Invalid,
}

impl AdminManager {
    pub fn new(username: String, password: String, session_ttl: Duration) -> Self {
        let ttl = if session_ttl.is_zero() {
            Duration::from_secs(300)
        } else {
            session_ttl
        };

        Self {
            username: Arc::from(username.trim().to_string()),
            password: Arc::from(password),
            session_ttl: ttl,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        username.trim() == self.username.as_ref() && password == self.password.as_ref()
    }

    pub fn ttl_secs(&self) -> u64 {
        self.session_ttl.as_secs()
    }

    pub async fn issue_session(&self) -> String {
        self.prune_expired().await;
        let token = Uuid::new_v4().to_string();
        let expires_at = Instant::now() + self.session_ttl;
        self.sessions
            .write()
            .await
            .insert(token.clone(), expires_at);
        token
    }

    pub async fn validate_session(&self, token: &str) -> SessionStatus {
        let mut guard = self.sessions.write().await;
        let now = Instant::now();
        if let Some(expiry) = guard.get_mut(token) {
            if *expiry > now {
                *expiry = now + self.session_ttl;
                return SessionStatus::Valid;
            }
            guard.remove(token);
            return SessionStatus::Expired;
        }
        SessionStatus::Invalid
    }

    pub async fn revoke_session(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    /// The "is an authenticated session present" predicate used by read
    /// endpoints that show more to the admin.
    pub async fn has_session(&self, headers: &HeaderMap) -> bool {
        match extract_bearer(headers) {
            Some(token) => self.validate_session(&token).await == SessionStatus::Valid,
            None => false,
        }
    }

    async fn prune_expired(&self) {
        let now = Instant::now();
        self.sessions
            .write()
            .await
            .retain(|_, expiry| *expiry > now);
    }
}

pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()) else {
        return unauthorized("missing session token");
    };

    match state.admin.validate_session(&token).await {
        SessionStatus::Valid => next.run(req).await,
        SessionStatus::Expired => {
            tracing::info!(path = %req.uri().path(), "admin session expired");
            unauthorized("session expired")
        }
        SessionStatus::Invalid => unauthorized("invalid session token"),
    }
}

fn unauthorized(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?;
    let raw = value.to_str().ok()?;
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))?;
    if token.trim().is_empty() {
        None
    } else {
        Some(token.trim().to_string())
    }
}

pub fn invalid_credentials_error() -> AppError {
    AppError::Unauthorized("invalid username or password".to_string())
}
