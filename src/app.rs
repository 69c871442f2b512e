use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    api, auth,
    config::{AppConfig, FrontendPublicConfig},
    feed::FeedClient,
    repo,
    service::feed::FeedService,
    util::pages::PageCache,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: FrontendPublicConfig,
    pub admin: auth::AdminManager,
    pub feed: FeedService,
    pub pages: PageCache,
}

impl AppState {
    pub fn new(pool: PgPool, config: &AppConfig) -> anyhow::Result<Self> {
        let feed_client = FeedClient::from_config(&config.feed)?;
        let feed = FeedService::new(
            feed_client,
            Duration::from_secs(config.feed.cache_ttl_secs),
        );

        let admin = auth::AdminManager::new(
            config.admin.username.clone(),
            config.admin.password.clone(),
            Duration::from_secs(std::cmp::max(60_u64, config.admin.session_ttl_secs)),
        );

        Ok(Self {
            pool,
            config: config.frontend_public_config(),
            admin,
            feed,
            pages: PageCache::new(Duration::from_secs(config.site.page_cache_ttl_secs)),
        })
    }
}

pub async fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.db.url)
        .await?;

    repo::schema::ensure_schema(&pool).await?;

    let state = AppState::new(pool, config)?;
    tracing::info!(
        feed = state.feed.source_url(),
        base_url = %state.config.base_url,
        "application state ready"
    );

    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // same paths as the public reads; merged method routers keep the
    // session check on the write methods only
    let admin_api = Router::new()
        .route("/api/profile", put(api::profile::update_profile))
        .route("/api/job-history", post(api::jobs::create_job))
        .route(
            "/api/job-history/:id",
            put(api::jobs::update_job).delete(api::jobs::delete_job),
        )
        .route(
            "/api/certifications",
            post(api::certifications::create_certification),
        )
        .route(
            "/api/certifications/:id",
            put(api::certifications::update_certification)
                .delete(api::certifications::delete_certification),
        )
        .route("/api/blog", post(api::blog::create_post))
        .route(
            "/api/blog/:slug",
            put(api::blog::update_post).delete(api::blog::delete_post),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/healthz", get(api::health::health_check))
        .route("/api/profile", get(api::profile::get_profile))
        .route("/api/job-history", get(api::jobs::list_jobs))
        .route(
            "/api/certifications",
            get(api::certifications::list_certifications),
        )
        .route("/api/blog", get(api::blog::list_posts))
        .route("/api/blog/medium-rss", get(api::feed::medium_rss))
        .route("/api/blog/:slug", get(api::blog::get_post))
        .route("/api/pages/home", get(api::pages::home))
        .route("/api/pages/blog", get(api::pages::blog_index))
        .route("/api/pages/blog/:slug", get(api::pages::blog_post))
        .route("/api/site", get(api::pages::site_config))
        .route("/feed.xml", get(api::feed::feed_xml))
        .route("/admin/login", post(api::admin::login))
        .route("/admin/logout", post(api::admin::logout))
        .merge(admin_api)
        .layer(middleware)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Someone on Medium</title>
<link>https://medium.com/@someone</link><description>posts</description>
<item><title>First &amp; best</title><link>https://medium.com/p/1</link>
<pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
<description><![CDATA[<p>Hello <b>world</b></p>]]></description>
<category>rust</category></item>
</channel></rss>"#;

    fn test_state(feed_url: &str) -> AppState {
        let mut config = AppConfig::default();
        config.db.url = "postgres://portfolio@127.0.0.1:1/portfolio".into();
        config.admin.password = "hunter2".into();
        config.feed.source_url = feed_url.to_string();
        config.feed.request_timeout_secs = 2;
        config.feed.cache_ttl_secs = 0;

        // never connects unless a handler touches the database
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(&config.db.url)
            .unwrap();
        AppState::new(pool, &config).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let app = router(test_state("http://127.0.0.1:9/feed"));
        let (status, body) = send(app, get_request("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["ok"], json!(true));
    }

    #[tokio::test]
    async fn writes_without_session_are_unauthorized() {
        let app = router(test_state("http://127.0.0.1:9/feed"));
        for uri in ["/api/job-history", "/api/certifications", "/api/blog"] {
            let (status, body) = send(app.clone(), post_json(uri, json!({}), None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            let body: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(body["error"]["code"], json!("Unauthorized"));
        }

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/blog/some-post")
            .header(header::AUTHORIZATION, "Bearer not-a-session")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, delete).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_issues_a_session_that_passes_the_gate() {
        let app = router(test_state("http://127.0.0.1:9/feed"));

        let (status, _) = send(
            app.clone(),
            post_json("/admin/login", json!({"username": "admin", "password": "wrong"}), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            app.clone(),
            post_json("/admin/login", json!({"username": "admin", "password": "hunter2"}), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let login: Value = serde_json::from_str(&body).unwrap();
        let token = login["token"].as_str().unwrap().to_string();

        // past the gate, the incomplete payload is rejected before any query
        let request = post_json("/api/job-history", json!({}), Some(token.as_str()));
        let (status, _) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            app.clone(),
            post_json("/admin/logout", json!({ "token": token }), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let request = post_json("/api/job-history", json!({}), Some(token.as_str()));
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn medium_rss_returns_normalized_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let app = router(test_state(&format!("{}/feed", server.uri())));
        let (status, body) = send(app, get_request("/api/blog/medium-rss")).await;
        assert_eq!(status, StatusCode::OK);

        let items: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            items,
            json!([{
                "title": "First & best",
                "link": "https://medium.com/p/1",
                "published_at": "Mon, 01 Jan 2024 00:00:00 GMT",
                "excerpt": "Hello world...",
                "categories": ["rust"],
            }])
        );
    }

    #[tokio::test]
    async fn medium_rss_failure_is_500_with_empty_posts() {
        let app = router(test_state("http://127.0.0.1:9/feed"));
        let (status, body) = send(app, get_request("/api/blog/medium-rss")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["posts"], json!([]));
        assert_eq!(body["error"], json!("Failed to fetch Medium posts"));
    }

    #[tokio::test]
    async fn feed_xml_relays_upstream_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let app = router(test_state(&format!("{}/feed", server.uri())));
        let response = app.oneshot(get_request("/feed.xml")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=3600, s-maxage=3600"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), RSS);
    }

    #[tokio::test]
    async fn feed_xml_falls_back_when_upstream_is_not_a_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let app = router(test_state(&format!("{}/feed", server.uri())));
        let (status, body) = send(app, get_request("/feed.xml")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("RSS feed temporarily unavailable"));
        assert!(body.contains("<link>http://localhost:3000</link>"));
    }

    #[tokio::test]
    async fn blog_page_is_rendered_once_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .expect(1)
            .mount(&server)
            .await;

        let feed_url = format!("{}/feed", server.uri());
        let app = router(test_state(&feed_url));
        let (_, first) = send(app.clone(), get_request("/api/pages/blog")).await;
        let (status, second) = send(app, get_request("/api/pages/blog")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, second);
        let page: Value = serde_json::from_str(&second).unwrap();
        assert_eq!(page["feed_url"], json!(feed_url));
        assert_eq!(page["posts"][0]["title"], json!("First & best"));
    }

    #[tokio::test]
    async fn blog_page_recovers_after_feed_outage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let app = router(test_state(&format!("{}/feed", server.uri())));

        let (status, during) = send(app.clone(), get_request("/api/pages/blog")).await;
        assert_eq!(status, StatusCode::OK);
        let during: Value = serde_json::from_str(&during).unwrap();
        assert_eq!(during["posts"], json!([]));

        let (status, after) = send(app, get_request("/api/pages/blog")).await;
        assert_eq!(status, StatusCode::OK);
        let after: Value = serde_json::from_str(&after).unwrap();
        assert_eq!(after["posts"][0]["title"], json!("First & best"));
    }

    #[tokio::test]
    async fn home_page_degrades_when_database_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .expect(2)
            .mount(&server)
            .await;

        let app = router(test_state(&format!("{}/feed", server.uri())));
        for _ in 0..2 {
            let (status, body) = send(app.clone(), get_request("/api/pages/home")).await;
            assert_eq!(status, StatusCode::OK);
            let page: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(page["profile"], Value::Null);
            assert_eq!(page["jobs"], json!([]));
            assert_eq!(page["certifications"], json!([]));
            assert_eq!(page["posts"][0]["link"], json!("https://medium.com/p/1"));
        }
    }

    #[tokio::test]
    async fn site_config_exposes_public_values_only() {
        let app = router(test_state("http://127.0.0.1:9/feed"));
        let (status, body) = send(app, get_request("/api/site")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({ "base_url": "http://localhost:3000", "feed_url": "http://127.0.0.1:9/feed" })
        );
    }
}
