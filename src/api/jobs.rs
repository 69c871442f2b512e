use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{JobOut, JobPayload},
    service,
};

pub async fn list_jobs(State(state): State<AppState>) -> AppResult<Json<Vec<JobOut>>> {
    let jobs = service::jobs::list(&state.pool).await?;
    Ok(Json(jobs))
}

pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<JobPayload>,
) -> AppResult<(StatusCode, Json<JobOut>)> {
    let job = service::jobs::create(&state.pool, &state.pages, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<JobPayload>,
) -> AppResult<Json<JobOut>> {
    let job = service::jobs::update(&state.pool, &state.pages, id, payload).await?;
    Ok(Json(job))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    service::jobs::delete(&state.pool, &state.pages, id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
