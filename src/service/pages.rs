//! Public view-models, rendered on demand and kept in the page cache until
//! a write marks them stale. A section whose source fails renders empty and
//! the page is then served without being cached.

use serde_json::Value;
use sqlx::PgPool;

use super::{blog, certifications, jobs, profile};
use crate::{
    error::AppResult,
    model::{BlogPage, HomePage},
    service::feed::FeedService,
    util::pages::{self, PageCache, Rendered},
};

/// How many feed posts the landing page shows.
pub const HOME_POST_LIMIT: usize = 3;

pub async fn home(pool: &PgPool, feed: &FeedService, cache: &PageCache) -> AppResult<Value> {
    cache
        .get_or_render(pages::HOME, || async {
            let mut complete = true;

            let profile = section("profile", profile::get(pool).await, &mut complete);
            let jobs = section("job history", jobs::list(pool).await, &mut complete);
            let certifications = section(
                "certifications",
                certifications::list(pool).await,
                &mut complete,
            );
            let posts = match feed.items_for_page().await {
                Some(items) => items.iter().take(HOME_POST_LIMIT).cloned().collect(),
                None => {
                    complete = false;
                    Vec::new()
                }
            };

            Ok(Rendered::new(
                HomePage {
                    profile,
                    jobs,
                    certifications,
                    posts,
                },
                complete,
            ))
        })
        .await
}

pub async fn blog_index(feed: &FeedService, cache: &PageCache) -> AppResult<Value> {
    cache
        .get_or_render(pages::BLOG_INDEX, || async {
            let items = feed.items_for_page().await;
            let complete = items.is_some();
            let page = BlogPage {
                feed_url: feed.source_url().to_string(),
                posts: items.map(|items| items.as_ref().clone()).unwrap_or_default(),
            };
            Ok(Rendered::new(page, complete))
        })
        .await
}

pub async fn blog_post(pool: &PgPool, cache: &PageCache, slug: &str) -> AppResult<Value> {
    cache
        .get_or_render(&pages::blog_post(slug), || async {
            blog::get(pool, slug, false).await.map(Rendered::complete)
        })
        .await
}

/// A failed section renders as its empty value and marks the page incomplete.
fn section<T: Default>(name: &str, result: AppResult<T>, complete: &mut bool) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(section = name, error = ?err, "home page section unavailable");
            *complete = false;
            T::default()
        }
    }
}
