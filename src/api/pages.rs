use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::{app::AppState, config::FrontendPublicConfig, error::AppResult, service};

pub async fn home(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let page = service::pages::home(&state.pool, &state.feed, &state.pages).await?;
    Ok(Json(page))
}

pub async fn blog_index(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let page = service::pages::blog_index(&state.feed, &state.pages).await?;
    Ok(Json(page))
}

pub async fn blog_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Value>> {
    let page = service::pages::blog_post(&state.pool, &state.pages, &slug).await?;
    Ok(Json(page))
}

pub async fn site_config(State(state): State<AppState>) -> Json<FrontendPublicConfig> {
    Json(state.config.clone())
}
