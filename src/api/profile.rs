use axum::{extract::State, Json};

use crate::{
    app::AppState,
    error::AppResult,
    model::{ProfileOut, ProfilePayload},
    service,
};

/// `null` until a profile has been saved.
pub async fn get_profile(State(state): State<AppState>) -> AppResult<Json<Option<ProfileOut>>> {
    let profile = service::profile::get(&state.pool).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Json(payload): Json<ProfilePayload>,
) -> AppResult<Json<ProfileOut>> {
    let profile = service::profile::upsert(&state.pool, &state.pages, payload).await?;
    Ok(Json(profile))
}
