use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
pub struct CertificationRow {
    pub id: i64,
    pub name: String,
    pub issuer: String,
    pub issue_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
}

pub struct CertificationRecord {
    pub name: String,
    pub issuer: String,
    pub issue_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
}

pub async fn list_certifications(pool: &PgPool) -> Result<Vec<CertificationRow>, sqlx::Error> {
    sqlx::query_as::<_, CertificationRow>(
        r#"
        SELECT id,
               name,
               issuer,
               issue_date,
               expiry_date,
               credential_id,
               credential_url,
               description,
               sort_order
        FROM portfolio.certifications
        ORDER BY sort_order ASC, issue_date DESC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn insert_certification(
    pool: &PgPool,
    record: CertificationRecord,
) -> Result<CertificationRow, sqlx::Error> {
    sqlx::query_as::<_, CertificationRow>(
        r#"
        INSERT INTO portfolio.certifications (
            name, issuer, issue_date, expiry_date, credential_id, credential_url, description, sort_order
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id,
                  name,
                  issuer,
                  issue_date,
                  expiry_date,
                  credential_id,
                  credential_url,
                  description,
                  sort_order
        "#,
    )
    .bind(record.name)
    .bind(record.issuer)
    .bind(record.issue_date)
    .bind(record.expiry_date)
    .bind(record.credential_id)
    .bind(record.credential_url)
    .bind(record.description)
    .bind(record.sort_order)
    .fetch_one(pool)
    .await
}

pub async fn update_certification(
    pool: &PgPool,
    id: i64,
    record: CertificationRecord,
) -> Result<Option<CertificationRow>, sqlx::Error> {
    sqlx::query_as::<_, CertificationRow>(
        r#"
        UPDATE portfolio.certifications
        SET name = $2,
            issuer = $3,
            issue_date = $4,
            expiry_date = $5,
            credential_id = $6,
            credential_url = $7,
            description = $8,
            sort_order = $9,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id,
                  name,
                  issuer,
                  issue_date,
                  expiry_date,
                  credential_id,
                  credential_url,
                  description,
                  sort_order
        "#,
    )
    .bind(id)
    .bind(record.name)
    .bind(record.issuer)
    .bind(record.issue_date)
    .bind(record.expiry_date)
    .bind(record.credential_id)
    .bind(record.credential_url)
    .bind(record.description)
    .bind(record.sort_order)
    .fetch_optional(pool)
    .await
}

pub async fn delete_certification(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM portfolio.certifications
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
