use sqlx::PgPool;
use url::Url;

use super::{format_timestamp, non_blank, required};
use crate::{
    error::{AppError, AppResult},
    model::{CertificationOut, CertificationPayload},
    repo,
    util::pages::{self, PageCache},
};

pub async fn list(pool: &PgPool) -> AppResult<Vec<CertificationOut>> {
    let rows = repo::certifications::list_certifications(pool).await?;
    Ok(rows.into_iter().map(certification_row_to_out).collect())
}

pub async fn create(
    pool: &PgPool,
    cache: &PageCache,
    payload: CertificationPayload,
) -> AppResult<CertificationOut> {
    let record = certification_record(payload)?;
    let row = repo::certifications::insert_certification(pool, record).await?;

    tracing::info!(certification_id = row.id, name = %row.name, "certification created");
    invalidate(cache).await;

    Ok(certification_row_to_out(row))
}

pub async fn update(
    pool: &PgPool,
    cache: &PageCache,
    id: i64,
    payload: CertificationPayload,
) -> AppResult<CertificationOut> {
    let record = certification_record(payload)?;
    let row = repo::certifications::update_certification(pool, id, record)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("certification {id} not found")))?;

    tracing::info!(certification_id = row.id, "certification updated");
    invalidate(cache).await;

    Ok(certification_row_to_out(row))
}

pub async fn delete(pool: &PgPool, cache: &PageCache, id: i64) -> AppResult<()> {
    let affected = repo::certifications::delete_certification(pool, id).await?;
    if affected == 0 {
        return Err(AppError::NotFound(format!("certification {id} not found")));
    }

    tracing::info!(certification_id = id, "certification deleted");
    invalidate(cache).await;
    Ok(())
}

async fn invalidate(cache: &PageCache) {
    cache.invalidate([pages::HOME]).await;
}

fn certification_record(
    payload: CertificationPayload,
) -> AppResult<repo::certifications::CertificationRecord> {
    if let Some(expiry) = payload.expiry_date {
        if expiry < payload.issue_date {
            return Err(AppError::BadRequest(
                "expiry_date must not be before issue_date".into(),
            ));
        }
    }

    let credential_url = non_blank(payload.credential_url);
    if let Some(raw) = credential_url.as_deref() {
        let valid = Url::parse(raw)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            return Err(AppError::BadRequest(format!(
                "credential_url {raw:?} is not an http(s) url"
            )));
        }
    }

    Ok(repo::certifications::CertificationRecord {
        name: required(payload.name, "name")?,
        issuer: required(payload.issuer, "issuer")?,
        issue_date: payload.issue_date,
        expiry_date: payload.expiry_date,
        credential_id: non_blank(payload.credential_id),
        credential_url,
        description: non_blank(payload.description),
        sort_order: payload.order,
    })
}

fn certification_row_to_out(row: repo::certifications::CertificationRow) -> CertificationOut {
    CertificationOut {
        id: row.id,
        name: row.name,
        issuer: row.issuer,
        issue_date: format_timestamp(row.issue_date),
        expiry_date: row.expiry_date.map(format_timestamp),
        credential_id: row.credential_id,
        credential_url: row.credential_url,
        description: row.description,
        order: row.sort_order,
    }
}
