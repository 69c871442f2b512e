use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;

use crate::feed::{FeedClient, FeedError, FeedItem};

type CachedItems = (Instant, Arc<Vec<FeedItem>>);

/// Short-lived memory of the last successful fetch. Failures are never
/// cached, so the next request retries the source.
#[derive(Clone)]
pub struct FeedService {
    client: FeedClient,
    ttl: Duration,
    cached: Arc<RwLock<Option<CachedItems>>>,
}

impl FeedService {
    pub fn new(client: FeedClient, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    pub fn source_url(&self) -> &str {
        self.client.source_url()
    }

    pub async fn items(&self) -> Result<Arc<Vec<FeedItem>>, FeedError> {
        if let Some(items) = self.fresh().await {
            return Ok(items);
        }

        let items = Arc::new(self.client.fetch_items().await?);
        tracing::info!(
            source = self.client.source_url(),
            count = items.len(),
            "feed refreshed"
        );

        if !self.ttl.is_zero() {
            *self.cached.write().await = Some((Instant::now(), Arc::clone(&items)));
        }
        Ok(items)
    }

    /// For page rendering: a broken feed is logged and shows up as `None`, so
    /// the caller can render no posts without caching that page.
    pub async fn items_for_page(&self) -> Option<Arc<Vec<FeedItem>>> {
        match self.items().await {
            Ok(items) => Some(items),
            Err(err) => {
                tracing::warn!(
                    source = self.client.source_url(),
                    error = %err,
                    "feed unavailable, rendering without posts"
                );
                None
            }
        }
    }

    /// Raw document for relaying; bypasses the item cache.
    pub async fn document(&self) -> Result<String, FeedError> {
        self.client.fetch_document().await
    }

    async fn fresh(&self) -> Option<Arc<Vec<FeedItem>>> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.ttl)
            .map(|(_, items)| Arc::clone(items))
    }
}
