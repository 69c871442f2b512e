use std::time::{Duration, Instant};

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use reqwest::{header, Client};
use url::Url;

use super::{parse_document, FeedError, FeedItem, FetchError};
use crate::config::FeedConfig;

const USER_AGENT: &str = "PortfolioFeedReader/0.1";
const XML_DECL_SCAN: usize = 256;

/// Accepts only absolute `http`/`https` URLs.
pub fn validate_feed_url(raw: &str) -> Result<Url, FeedError> {
    let config_err = |reason: String| FeedError::Config {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|err| config_err(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(config_err(format!("unsupported scheme {other}"))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(config_err("missing host".to_string()));
    }
    Ok(url)
}

/// One GET of the feed document. No retries; timeouts surface as
/// [`FeedError::Cancelled`].
pub async fn fetch_document(
    client: &Client,
    url: &str,
    freshness: Option<Duration>,
) -> Result<String, FeedError> {
    let url = validate_feed_url(url)?;
    let started = Instant::now();

    let mut request = client.get(url.clone());
    if let Some(window) = freshness {
        request = request.header(
            header::CACHE_CONTROL,
            format!("max-age={}", window.as_secs()),
        );
    }

    let response = request
        .send()
        .await
        .map_err(|err| transport_error(err, started))?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %url, status = status.as_u16(), "feed fetch rejected");
        return Err(FetchError::Status(status.as_u16()).into());
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response
        .bytes()
        .await
        .map_err(|err| transport_error(err, started))?;

    tracing::debug!(
        url = %url,
        status = status.as_u16(),
        bytes = bytes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "feed document fetched"
    );

    Ok(decode_body(&bytes, content_type.as_deref()))
}

fn transport_error(err: reqwest::Error, started: Instant) -> FeedError {
    if err.is_timeout() {
        FeedError::Cancelled {
            elapsed_secs: started.elapsed().as_secs(),
        }
    } else {
        FetchError::Transport(err).into()
    }
}

/// Decodes with the header charset, then the XML declaration, then a guess.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_xml_declaration(bytes))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), "feed body contained undecodable bytes");
    }
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn charset_from_xml_declaration(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(XML_DECL_SCAN)];
    let head = match std::str::from_utf8(head) {
        Ok(text) => text,
        // the scan window may cut a multi-byte sequence in half
        Err(err) => std::str::from_utf8(&head[..err.valid_up_to()]).ok()?,
    };
    let decl_end = head.find("?>")?;
    let decl = &head[..decl_end];
    if !decl.starts_with("<?xml") {
        return None;
    }
    let rest = &decl[decl.find("encoding=")? + "encoding=".len()..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let end = value.find(quote)?;
    Some(value[..end].to_string())
}

/// Long-lived handle on the configured feed: one HTTP client, one validated
/// source URL, built at startup and shared.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    source: Url,
    freshness: Option<Duration>,
}

impl FeedClient {
    pub fn from_config(config: &FeedConfig) -> anyhow::Result<Self> {
        let source = validate_feed_url(&config.source_url)?;
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            source,
            freshness: (config.cache_ttl_secs > 0)
                .then(|| Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    pub fn source_url(&self) -> &str {
        self.source.as_str()
    }

    pub async fn fetch_document(&self) -> Result<String, FeedError> {
        fetch_document(&self.client, self.source.as_str(), self.freshness).await
    }

    pub async fn fetch_items(&self) -> Result<Vec<FeedItem>, FeedError> {
        let document = self.fetch_document().await?;
        Ok(parse_document(&document))
    }
}
