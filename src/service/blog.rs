use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{format_timestamp, non_blank, required};
use crate::{
    error::{AppError, AppResult},
    model::{BlogPostOut, BlogPostPayload, BlogPostSummary},
    repo,
    util::{
        pages::{self, PageCache},
        slug::{is_valid_slug, slugify},
    },
};

pub async fn list(pool: &PgPool, include_unpublished: bool) -> AppResult<Vec<BlogPostSummary>> {
    let rows = repo::blog::list_posts(pool, include_unpublished).await?;
    Ok(rows.into_iter().map(summary_row_to_out).collect())
}

/// Unpublished posts are only visible to callers holding a session.
pub async fn get(pool: &PgPool, slug: &str, include_unpublished: bool) -> AppResult<BlogPostOut> {
    let row = repo::blog::get_by_slug(pool, slug)
        .await?
        .filter(|row| row.published || include_unpublished)
        .ok_or_else(|| not_found(slug))?;
    Ok(post_row_to_out(row))
}

pub async fn create(
    pool: &PgPool,
    cache: &PageCache,
    payload: BlogPostPayload,
) -> AppResult<BlogPostOut> {
    let title = required(payload.title, "title")?;
    let slug = resolve_slug(payload.slug.as_deref(), &title)?;
    let published_at = publish_time_on_create(payload.published, payload.published_at, Utc::now());

    let record = repo::blog::BlogPostRecord {
        title,
        slug,
        excerpt: non_blank(payload.excerpt),
        content: payload.content,
        cover_image: non_blank(payload.cover_image),
        published: payload.published,
        published_at,
    };

    let row = repo::blog::insert_post(pool, record).await?;

    tracing::info!(slug = %row.slug, published = row.published, "blog post created");
    invalidate(cache, &row.slug).await;

    Ok(post_row_to_out(row))
}

pub async fn update(
    pool: &PgPool,
    cache: &PageCache,
    slug: &str,
    payload: BlogPostPayload,
) -> AppResult<BlogPostOut> {
    let existing = repo::blog::get_by_slug(pool, slug)
        .await?
        .ok_or_else(|| not_found(slug))?;

    let published_at = publish_time_on_update(
        payload.published,
        payload.published_at,
        existing.published_at,
        Utc::now(),
    );

    let changes = repo::blog::BlogPostChanges {
        title: required(payload.title, "title")?,
        excerpt: non_blank(payload.excerpt),
        content: payload.content,
        cover_image: non_blank(payload.cover_image),
        published: payload.published,
        published_at,
    };

    let row = repo::blog::update_post(pool, slug, changes)
        .await?
        .ok_or_else(|| not_found(slug))?;

    tracing::info!(slug = %row.slug, published = row.published, "blog post updated");
    invalidate(cache, &row.slug).await;

    Ok(post_row_to_out(row))
}

pub async fn delete(pool: &PgPool, cache: &PageCache, slug: &str) -> AppResult<()> {
    let affected = repo::blog::delete_post(pool, slug).await?;
    if affected == 0 {
        return Err(not_found(slug));
    }

    tracing::info!(slug, "blog post deleted");
    invalidate(cache, slug).await;
    Ok(())
}

async fn invalidate(cache: &PageCache, slug: &str) {
    cache
        .invalidate([pages::BLOG_INDEX.to_string(), pages::blog_post(slug)])
        .await;
}

fn not_found(slug: &str) -> AppError {
    AppError::NotFound(format!("blog post {slug:?} not found"))
}

/// An explicit slug must already be canonical; otherwise one is derived
/// from the title.
fn resolve_slug(explicit: Option<&str>, title: &str) -> AppResult<String> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) if is_valid_slug(slug) => Ok(slug.to_string()),
        Some(slug) => Err(AppError::BadRequest(format!(
            "slug {slug:?} may only contain lowercase letters, digits and dashes"
        ))),
        None => {
            let derived = slugify(title);
            if derived.is_empty() {
                return Err(AppError::BadRequest(
                    "cannot derive a slug from the title".into(),
                ));
            }
            Ok(derived)
        }
    }
}

fn publish_time_on_create(
    published: bool,
    requested: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if published {
        Some(requested.unwrap_or(now))
    } else {
        requested
    }
}

/// Publishing keeps the first publish time unless one is given explicitly.
fn publish_time_on_update(
    published: bool,
    requested: Option<DateTime<Utc>>,
    existing: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if published {
        Some(requested.or(existing).unwrap_or(now))
    } else {
        requested
    }
}

fn post_row_to_out(row: repo::blog::BlogPostRow) -> BlogPostOut {
    BlogPostOut {
        id: row.id,
        title: row.title,
        slug: row.slug,
        excerpt: row.excerpt,
        content: row.content,
        cover_image: row.cover_image,
        published: row.published,
        published_at: row.published_at.map(format_timestamp),
        created_at: format_timestamp(row.created_at),
        updated_at: format_timestamp(row.updated_at),
    }
}

fn summary_row_to_out(row: repo::blog::BlogPostSummaryRow) -> BlogPostSummary {
    BlogPostSummary {
        id: row.id,
        title: row.title,
        slug: row.slug,
        excerpt: row.excerpt,
        cover_image: row.cover_image,
        published: row.published,
        published_at: row.published_at.map(format_timestamp),
        created_at: format_timestamp(row.created_at),
        updated_at: format_timestamp(row.updated_at),
    }
}
