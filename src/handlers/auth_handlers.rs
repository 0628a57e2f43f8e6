//! Login and logout.

use crate::{
    errors::AppError,
    middleware::auth::bearer_token,
    services::auth_service::{AuthSession, Credentials},
    state::AppState,
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};

/// POST `/login`
///
/// Accepts `Authorization: Basic ...` or a JSON body `{username, password}`.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AuthSession>, AppError> {
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("Basic "));

    let credentials = match basic {
        Some(value) => Credentials::from_basic_header(value)?,
        None => serde_json::from_slice::<Credentials>(&body)
            .map_err(|err| AppError::bad_request(format!("invalid login body: {}", err)))?,
    };

    Ok(Json(state.auth.login(&credentials).await?))
}

/// POST `/logout`: revokes the presented token.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        state.auth.logout(token).await;
    }
    StatusCode::NO_CONTENT
}
