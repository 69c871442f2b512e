use sqlx::PgPool;

use super::{format_timestamp, required};
use crate::{
    error::{AppError, AppResult},
    model::{JobOut, JobPayload},
    repo,
    util::pages::{self, PageCache},
};

pub async fn list(pool: &PgPool) -> AppResult<Vec<JobOut>> {
    let rows = repo::jobs::list_jobs(pool).await?;
    Ok(rows.into_iter().map(job_row_to_out).collect())
}

pub async fn create(pool: &PgPool, cache: &PageCache, payload: JobPayload) -> AppResult<JobOut> {
    let record = job_record(payload)?;
    let row = repo::jobs::insert_job(pool, record).await?;

    tracing::info!(job_id = row.id, company = %row.company, "job history entry created");
    invalidate(cache).await;

    Ok(job_row_to_out(row))
}

pub async fn update(
    pool: &PgPool,
    cache: &PageCache,
    id: i64,
    payload: JobPayload,
) -> AppResult<JobOut> {
    let record = job_record(payload)?;
    let row = repo::jobs::update_job(pool, id, record)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job history entry {id} not found")))?;

    tracing::info!(job_id = row.id, "job history entry updated");
    invalidate(cache).await;

    Ok(job_row_to_out(row))
}

pub async fn delete(pool: &PgPool, cache: &PageCache, id: i64) -> AppResult<()> {
    let affected = repo::jobs::delete_job(pool, id).await?;
    if affected == 0 {
        return Err(AppError::NotFound(format!("job history entry {id} not found")));
    }

    tracing::info!(job_id = id, "job history entry deleted");
    invalidate(cache).await;
    Ok(())
}

async fn invalidate(cache: &PageCache) {
    cache.invalidate([pages::HOME]).await;
}

fn job_record(payload: JobPayload) -> AppResult<repo::jobs::JobRecord> {
    let JobPayload {
        company,
        position,
        start_date,
        end_date,
        current,
        description,
        order,
    } = payload;

    // a current position has no end
    let end_date = if current { None } else { end_date };
    if let Some(end) = end_date {
        if end < start_date {
            return Err(AppError::BadRequest(
                "end_date must not be before start_date".into(),
            ));
        }
    }

    Ok(repo::jobs::JobRecord {
        company: required(company, "company")?,
        position: required(position, "position")?,
        start_date,
        end_date,
        current,
        description: description.trim().to_string(),
        sort_order: order,
    })
}

fn job_row_to_out(row: repo::jobs::JobRow) -> JobOut {
    JobOut {
        id: row.id,
        company: row.company,
        position: row.position,
        start_date: format_timestamp(row.start_date),
        end_date: row.end_date.map(format_timestamp),
        current: row.current,
        description: row.description,
        order: row.sort_order,
    }
}
