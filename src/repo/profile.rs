use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub summary: String,
    pub bio: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub profile_image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

pub struct ProfileRecord {
    pub name: String,
    pub title: String,
    pub summary: String,
    pub bio: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub profile_image: Option<String>,
}

/// The most recently updated profile is the one the site shows.
pub async fn get_current(pool: &PgPool) -> Result<Option<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id,
               name,
               title,
               summary,
               bio,
               email,
               phone,
               location,
               linkedin,
               profile_image,
               updated_at
        FROM portfolio.profiles
        ORDER BY updated_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, record: ProfileRecord) -> Result<ProfileRow, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO portfolio.profiles (
            name, title, summary, bio, email, phone, location, linkedin, profile_image
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id,
                  name,
                  title,
                  summary,
                  bio,
                  email,
                  phone,
                  location,
                  linkedin,
                  profile_image,
                  updated_at
        "#,
    )
    .bind(record.name)
    .bind(record.title)
    .bind(record.summary)
    .bind(record.bio)
    .bind(record.email)
    .bind(record.phone)
    .bind(record.location)
    .bind(record.linkedin)
    .bind(record.profile_image)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    record: ProfileRecord,
) -> Result<ProfileRow, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        UPDATE portfolio.profiles
        SET name = $2,
            title = $3,
            summary = $4,
            bio = $5,
            email = $6,
            phone = $7,
            location = $8,
            linkedin = $9,
            profile_image = $10,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id,
                  name,
                  title,
                  summary,
                  bio,
                  email,
                  phone,
                  location,
                  linkedin,
                  profile_image,
                  updated_at
        "#,
    )
    .bind(id)
    .bind(record.name)
    .bind(record.title)
    .bind(record.summary)
    .bind(record.bio)
    .bind(record.email)
    .bind(record.phone)
    .bind(record.location)
    .bind(record.linkedin)
    .bind(record.profile_image)
    .fetch_one(pool)
    .await
}
