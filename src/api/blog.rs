use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{BlogListQuery, BlogPostOut, BlogPostPayload, BlogPostSummary},
    service,
};

/// Drafts are listed only when asked for and the caller holds a session.
pub async fn list_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BlogListQuery>,
) -> AppResult<Json<Vec<BlogPostSummary>>> {
    let include_unpublished = query.include_unpublished && state.admin.has_session(&headers).await;
    let posts = service::blog::list(&state.pool, include_unpublished).await?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> AppResult<Json<BlogPostOut>> {
    let include_unpublished = state.admin.has_session(&headers).await;
    let post = service::blog::get(&state.pool, &slug, include_unpublished).await?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<BlogPostPayload>,
) -> AppResult<(StatusCode, Json<BlogPostOut>)> {
    let post = service::blog::create(&state.pool, &state.pages, payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<BlogPostPayload>,
) -> AppResult<Json<BlogPostOut>> {
    let post = service::blog::update(&state.pool, &state.pages, &slug, payload).await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    service::blog::delete(&state.pool, &state.pages, &slug).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
