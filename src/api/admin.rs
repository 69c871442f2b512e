use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    app::AppState,
    auth,
    error::{AppError, AppResult},
    model::{AdminLoginPayload, AdminLoginResponse, AdminLogoutPayload},
};

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginPayload>,
) -> AppResult<Json<AdminLoginResponse>> {
    if !state
        .admin
        .verify_credentials(&payload.username, &payload.password)
    {
        tracing::warn!(username = %payload.username.trim(), "admin login rejected");
        return Err(auth::invalid_credentials_error());
    }

    let token = state.admin.issue_session().await;
    tracing::info!(username = %payload.username.trim(), "admin session issued");

    Ok(Json(AdminLoginResponse {
        token,
        expires_in: state.admin.ttl_secs(),
    }))
}

/// The token may come in the body or as the bearer header.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<AdminLogoutPayload>>,
) -> AppResult<Json<serde_json::Value>> {
    let token = payload
        .map(|Json(body)| body.token)
        .filter(|token| !token.trim().is_empty())
        .or_else(|| auth::extract_bearer(&headers))
        .ok_or_else(|| AppError::BadRequest("session token is required".into()))?;

    state.admin.revoke_session(token.trim()).await;
    Ok(Json(serde_json::json!({ "ok": true })))
}
