use sqlx::PgPool;

use super::{format_timestamp, non_blank, required};
use crate::{
    error::{AppError, AppResult},
    model::{ProfileOut, ProfilePayload},
    repo,
    util::pages::{self, PageCache},
};

pub async fn get(pool: &PgPool) -> AppResult<Option<ProfileOut>> {
    let row = repo::profile::get_current(pool).await?;
    Ok(row.map(profile_row_to_out))
}

/// Updates the current profile in place, or creates the first one.
pub async fn upsert(
    pool: &PgPool,
    cache: &PageCache,
    payload: ProfilePayload,
) -> AppResult<ProfileOut> {
    let record = profile_record(payload)?;

    let row = match repo::profile::get_current(pool).await? {
        Some(existing) => repo::profile::update(pool, existing.id, record).await?,
        None => repo::profile::insert(pool, record).await?,
    };

    tracing::info!(profile_id = row.id, "profile saved");
    cache.invalidate([pages::HOME]).await;

    Ok(profile_row_to_out(row))
}

fn profile_record(payload: ProfilePayload) -> AppResult<repo::profile::ProfileRecord> {
    let email = payload.email.trim().to_string();
    if !email.is_empty() && !email.contains('@') {
        return Err(AppError::BadRequest(format!("invalid email address {email:?}")));
    }

    Ok(repo::profile::ProfileRecord {
        name: required(payload.name, "name")?,
        title: required(payload.title, "title")?,
        summary: payload.summary.trim().to_string(),
        bio: payload.bio.trim().to_string(),
        email,
        phone: non_blank(payload.phone),
        location: non_blank(payload.location),
        linkedin: non_blank(payload.linkedin),
        profile_image: non_blank(payload.profile_image),
    })
}

fn profile_row_to_out(row: repo::profile::ProfileRow) -> ProfileOut {
    ProfileOut {
        id: row.id,
        name: row.name,
        title: row.title,
        summary: row.summary,
        bio: row.bio,
        email: row.email,
        phone: row.phone,
        location: row.location,
        linkedin: row.linkedin,
        profile_image: row.profile_image,
        updated_at: format_timestamp(row.updated_at),
    }
}
