use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

pub const HOME: &str = "/";
pub const BLOG_INDEX: &str = "/blog";

pub fn blog_post(slug: &str) -> String {
    format!("{BLOG_INDEX}/{slug}")
}

/// A freshly rendered page. A degraded page (some source was unavailable
/// and its section rendered empty) is served but never stored.
pub struct Rendered<T> {
    page: T,
    complete: bool,
}

impl<T> Rendered<T> {
    pub fn complete(page: T) -> Self {
        Self {
            page,
            complete: true,
        }
    }

    pub fn new(page: T, complete: bool) -> Self {
        Self { page, complete }
    }
}

struct CachedPage {
    body: Value,
    rendered_at: Instant,
}

/// Rendered public view-models keyed by site path. Writes mark paths stale
/// by evicting them; the next read renders afresh.
#[derive(Clone)]
pub struct PageCache {
    ttl: Duration,
    pages: Arc<RwLock<HashMap<String, CachedPage>>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pages: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, path: &str) -> Option<Value> {
        let pages = self.pages.read().await;
        pages
            .get(path)
            .filter(|page| page.rendered_at.elapsed() < self.ttl)
            .map(|page| page.body.clone())
    }

    pub async fn put(&self, path: &str, body: Value) {
        if self.ttl.is_zero() {
            return;
        }
        self.pages.write().await.insert(
            path.to_string(),
            CachedPage {
                body,
                rendered_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut pages = self.pages.write().await;
        for path in paths {
            let path = path.as_ref();
            if pages.remove(path).is_some() {
                tracing::debug!(path, "page marked stale");
            }
        }
    }

    /// Serves the cached page or renders a fresh one, storing it only when
    /// the render was complete.
    pub async fn get_or_render<T, F, Fut>(&self, path: &str, render: F) -> AppResult<Value>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Rendered<T>>>,
    {
        if let Some(body) = self.get(path).await {
            return Ok(body);
        }

        let Rendered { page, complete } = render().await?;
        let body = serde_json::to_value(page).map_err(|err| AppError::Internal(err.into()))?;
        if complete {
            self.put(path, body.clone()).await;
        } else {
            tracing::debug!(path, "degraded page served without caching");
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn renders_once_until_invalidated() {
        let cache = PageCache::new(Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let renders = &counter;
        let render = move || async move {
            let n = renders.fetch_add(1, Ordering::SeqCst) + 1;
            Ok::<_, AppError>(Rendered::complete(json!({ "render": n })))
        };

        assert_eq!(cache.get_or_render(HOME, render).await.unwrap(), json!({ "render": 1 }));
        assert_eq!(cache.get_or_render(HOME, render).await.unwrap(), json!({ "render": 1 }));

        cache.invalidate([HOME, BLOG_INDEX]).await;
        assert_eq!(cache.get_or_render(HOME, render).await.unwrap(), json!({ "render": 2 }));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_only_touches_named_paths() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.put(HOME, json!(1)).await;
        cache.put(&blog_post("hello"), json!(2)).await;

        cache.invalidate(vec![blog_post("hello")]).await;
        assert_eq!(cache.get(HOME).await, Some(json!(1)));
        assert_eq!(cache.get("/blog/hello").await, None);
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache = PageCache::new(Duration::ZERO);
        cache.put(BLOG_INDEX, json!([])).await;
        assert_eq!(cache.get(BLOG_INDEX).await, None);
    }

    #[tokio::test]
    async fn render_errors_are_not_cached() {
        let cache = PageCache::new(Duration::from_secs(60));
        let failed = cache
            .get_or_render(HOME, || async {
                Err::<Rendered<Value>, _>(AppError::NotFound("nothing".into()))
            })
            .await;
        assert!(matches!(failed, Err(AppError::NotFound(_))));
        assert_eq!(cache.get(HOME).await, None);
    }

    #[tokio::test]
    async fn degraded_renders_are_served_but_not_stored() {
        let cache = PageCache::new(Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let renders = &counter;
        let render = move || async move {
            let n = renders.fetch_add(1, Ordering::SeqCst) + 1;
            Ok::<_, AppError>(Rendered::new(json!({ "render": n }), n > 1))
        };

        assert_eq!(cache.get_or_render(HOME, render).await.unwrap(), json!({ "render": 1 }));
        assert_eq!(cache.get(HOME).await, None);

        assert_eq!(cache.get_or_render(HOME, render).await.unwrap(), json!({ "render": 2 }));
        assert_eq!(cache.get_or_render(HOME, render).await.unwrap(), json!({ "render": 2 }));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
