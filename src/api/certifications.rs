use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{CertificationOut, CertificationPayload},
    service,
};

pub async fn list_certifications(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CertificationOut>>> {
    let certifications = service::certifications::list(&state.pool).await?;
    Ok(Json(certifications))
}

pub async fn create_certification(
    State(state): State<AppState>,
    Json(payload): Json<CertificationPayload>,
) -> AppResult<(StatusCode, Json<CertificationOut>)> {
    let certification =
        service::certifications::create(&state.pool, &state.pages, payload).await?;
    Ok((StatusCode::CREATED, Json(certification)))
}

pub async fn update_certification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CertificationPayload>,
) -> AppResult<Json<CertificationOut>> {
    let certification =
        service::certifications::update(&state.pool, &state.pages, id, payload).await?;
    Ok(Json(certification))
}

pub async fn delete_certification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    service::certifications::delete(&state.pool, &state.pages, id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
