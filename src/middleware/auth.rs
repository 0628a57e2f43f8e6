//! Auth gate for every route except `/login` and the health probes.
//!
//! Requests without a live bearer token are redirected to `/login`.

use crate::{services::auth_service::AuthSession, state::AppState};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

pub const LOGIN_PATH: &str = "/login";

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let session: Option<AuthSession> = match bearer_token(request.headers()) {
        Some(token) => state.auth.authenticate(token).await,
        None => None,
    };

    match session {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => {
            warn!("denied {} {}, redirecting to {}", request.method(), request.uri().path(), LOGIN_PATH);
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}
