use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{app::AppState, feed::FeedItem};

const RELAY_CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=3600";
const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

pub async fn medium_rss(State(state): State<AppState>) -> Response {
    match state.feed.items().await {
        Ok(items) => Json::<Vec<FeedItem>>(items.as_ref().clone()).into_response(),
        Err(err) => {
            tracing::error!(
                source = state.feed.source_url(),
                error = %err,
                "medium rss fetch failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch Medium posts",
                    "posts": [],
                })),
            )
                .into_response()
        }
    }
}

/// Relays the upstream document untouched when it parses as a feed.
pub async fn feed_xml(State(state): State<AppState>) -> Response {
    let document = match state.feed.document().await {
        Ok(document) => document,
        Err(err) => {
            tracing::error!(
                source = state.feed.source_url(),
                error = %err,
                "feed relay fetch failed"
            );
            return fallback_feed(&state.config.base_url);
        }
    };

    if let Err(err) = feed_rs::parser::parse(document.as_bytes()) {
        tracing::error!(
            source = state.feed.source_url(),
            error = %err,
            "upstream document is not a feed"
        );
        return fallback_feed(&state.config.base_url);
    }

    (
        [
            (header::CONTENT_TYPE, XML_CONTENT_TYPE),
            (header::CACHE_CONTROL, RELAY_CACHE_CONTROL),
        ],
        document,
    )
        .into_response()
}

fn fallback_feed(base_url: &str) -> Response {
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Blog RSS Feed</title>
    <description>RSS feed temporarily unavailable</description>
    <link>{}</link>
  </channel>
</rss>"#,
        escape_xml(base_url)
    );

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
