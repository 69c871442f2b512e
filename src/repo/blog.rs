use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
pub struct BlogPostRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct BlogPostSummaryRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct BlogPostRecord {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

/// Editable fields; the slug is the key and never changes.
pub struct BlogPostChanges {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

pub async fn list_posts(
    pool: &PgPool,
    include_unpublished: bool,
) -> Result<Vec<BlogPostSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, BlogPostSummaryRow>(
        r#"
        SELECT id,
               title,
               slug,
               excerpt,
               cover_image,
               published,
               published_at,
               created_at,
               updated_at
        FROM portfolio.blog_posts
        WHERE ($1 OR published = TRUE)
        ORDER BY published_at DESC NULLS LAST, created_at DESC
        "#,
    )
    .bind(include_unpublished)
    .fetch_all(pool)
    .await
}

pub async fn get_by_slug(pool: &PgPool, slug: &str) -> Result<Option<BlogPostRow>, sqlx::Error> {
    sqlx::query_as::<_, BlogPostRow>(
        r#"
        SELECT id,
               title,
               slug,
               excerpt,
               content,
               cover_image,
               published,
               published_at,
               created_at,
               updated_at
        FROM portfolio.blog_posts
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn insert_post(pool: &PgPool, record: BlogPostRecord) -> Result<BlogPostRow, sqlx::Error> {
    sqlx::query_as::<_, BlogPostRow>(
        r#"
        INSERT INTO portfolio.blog_posts (
            title, slug, excerpt, content, cover_image, published, published_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id,
                  title,
                  slug,
                  excerpt,
                  content,
                  cover_image,
                  published,
                  published_at,
                  created_at,
                  updated_at
        "#,
    )
    .bind(record.title)
    .bind(record.slug)
    .bind(record.excerpt)
    .bind(record.content)
    .bind(record.cover_image)
    .bind(record.published)
    .bind(record.published_at)
    .fetch_one(pool)
    .await
}

pub async fn update_post(
    pool: &PgPool,
    slug: &str,
    changes: BlogPostChanges,
) -> Result<Option<BlogPostRow>, sqlx::Error> {
    sqlx::query_as::<_, BlogPostRow>(
        r#"
        UPDATE portfolio.blog_posts
        SET title = $2,
            excerpt = $3,
            content = $4,
            cover_image = $5,
            published = $6,
            published_at = $7,
            updated_at = NOW()
        WHERE slug = $1
        RETURNING id,
                  title,
                  slug,
                  excerpt,
                  content,
                  cover_image,
                  published,
                  published_at,
                  created_at,
                  updated_at
        "#,
    )
    .bind(slug)
    .bind(changes.title)
    .bind(changes.excerpt)
    .bind(changes.content)
    .bind(changes.cover_image)
    .bind(changes.published)
    .bind(changes.published_at)
    .fetch_optional(pool)
    .await
}

pub async fn delete_post(pool: &PgPool, slug: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM portfolio.blog_posts
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
