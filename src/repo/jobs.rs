use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
pub struct JobRow {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub current: bool,
    pub description: String,
    pub sort_order: i32,
}

pub struct JobRecord {
    pub company: String,
    pub position: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub current: bool,
    pub description: String,
    pub sort_order: i32,
}

pub async fn list_jobs(pool: &PgPool) -> Result<Vec<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id,
               company,
               position,
               start_date,
               end_date,
               current,
               description,
               sort_order
        FROM portfolio.job_history
        ORDER BY sort_order ASC, start_date DESC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn insert_job(pool: &PgPool, record: JobRecord) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO portfolio.job_history (
            company, position, start_date, end_date, current, description, sort_order
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id,
                  company,
                  position,
                  start_date,
                  end_date,
                  current,
                  description,
                  sort_order
        "#,
    )
    .bind(record.company)
    .bind(record.position)
    .bind(record.start_date)
    .bind(record.end_date)
    .bind(record.current)
    .bind(record.description)
    .bind(record.sort_order)
    .fetch_one(pool)
    .await
}

pub async fn update_job(
    pool: &PgPool,
    id: i64,
    record: JobRecord,
) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE portfolio.job_history
        SET company = $2,
            position = $3,
            start_date = $4,
            end_date = $5,
            current = $6,
            description = $7,
            sort_order = $8,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id,
                  company,
                  position,
                  start_date,
                  end_date,
                  current,
                  description,
                  sort_order
        "#,
    )
    .bind(id)
    .bind(record.company)
    .bind(record.position)
    .bind(record.start_date)
    .bind(record.end_date)
    .bind(record.current)
    .bind(record.description)
    .bind(record.sort_order)
    .fetch_optional(pool)
    .await
}

pub async fn delete_job(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM portfolio.job_history
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
