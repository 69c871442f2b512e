use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_FEED_URL: &str = "https://medium.com/feed/@yourusername";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub source_url: String,
    pub request_timeout_secs: u64,
    /// How long fetched items are served from memory; 0 disables the cache.
    pub cache_ttl_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_FEED_URL.to_string(),
            request_timeout_secs: 10,
            cache_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    pub session_ttl_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: String::new(),
            session_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub page_cache_ttl_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            page_cache_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/portfolio.log".to_string(),
            level: Some("info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub feed: FeedConfig,
    pub admin: AdminConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
}

/// Values the public site is allowed to see.
#[derive(Debug, Clone, Serialize)]
pub struct FrontendPublicConfig {
    pub base_url: String,
    pub feed_url: String,
}

impl AppConfig {
    pub fn frontend_public_config(&self) -> FrontendPublicConfig {
        FrontendPublicConfig {
            base_url: self.site.base_url.clone(),
            feed_url: self.feed.source_url.clone(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let explicit_path = std::env::var("CONFIG_FILE").ok();
        let config = if let Some(path) = explicit_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(anyhow!("config file {:?} not found", path));
            }
            Self::load_from_file(&path)?
        } else {
            let path = locate_default_config();
            if let Some(path) = path {
                Self::load_from_file(&path)?
            } else {
                AppConfig::default()
            }
        };

        let config = Self::apply_env_overrides(config)?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("failed to parse config file {:?}", path))
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    fn apply_env_overrides(mut config: AppConfig) -> anyhow::Result<AppConfig> {
        if let Ok(bind) = std::env::var("SERVER_BIND") {
            config.server.bind = bind;
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.db.url = url;
        }

        if let Some(max_conn) = parse_optional_env("DB_MAX_CONNECTIONS")? {
            config.db.max_connections = max_conn;
        }

        if let Some(url) = std::env::var("FEED_SOURCE_URL")
            .ok()
            .or_else(|| std::env::var("MEDIUM_RSS_URL").ok())
        {
            config.feed.source_url = url;
        }

        if let Some(timeout) = parse_optional_env("FEED_TIMEOUT_SECS")? {
            config.feed.request_timeout_secs = timeout;
        }

        if let Some(ttl) = parse_optional_env("FEED_CACHE_TTL_SECS")? {
            config.feed.cache_ttl_secs = ttl;
        }

        if let Ok(username) = std::env::var("ADMIN_USERNAME") {
            config.admin.username = username;
        }

        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            config.admin.password = password;
        }

        if let Some(ttl) = parse_optional_env("ADMIN_SESSION_TTL_SECS")? {
            config.admin.session_ttl_secs = ttl;
        }

        if let Ok(base_url) = std::env::var("PUBLIC_BASE_URL") {
            config.site.base_url = base_url;
        }

        if let Some(ttl) = parse_optional_env("PAGE_CACHE_TTL_SECS")? {
            config.site.page_cache_ttl_secs = ttl;
        }

        if let Ok(log_file) = std::env::var("LOG_FILE_PATH") {
            config.logging.file = log_file;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.logging.level = Some(log_level);
        }

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.db.url.trim().is_empty() {
            return Err(anyhow!(
                "database url missing; set DATABASE_URL env var or db.url in config file"
            ));
        }

        if self.admin.password.is_empty() {
            return Err(anyhow!(
                "admin password missing; set ADMIN_PASSWORD env var or admin.password in config file"
            ));
        }

        if self.feed.source_url.trim().is_empty() {
            return Err(anyhow!("feed source url must not be empty"));
        }

        Ok(())
    }
}

fn parse_optional_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => Ok(Some(
            v.parse::<T>()
                .with_context(|| format!("{key} must be a valid value"))?,
        )),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn locate_default_config() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config/config.yaml"),
        PathBuf::from("../config/config.yaml"),
    ];

    candidates.into_iter().find(|path| path.exists())
}
