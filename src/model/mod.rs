use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::FeedItem;

#[derive(Debug, Deserialize)]
pub struct AdminLoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct AdminLogoutPayload {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileOut {
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
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfilePayload {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobOut {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: String,
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobPayload {
    pub company: String,
    pub position: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificationOut {
    pub id: i64,
    pub name: String,
    pub issuer: String,
    pub issue_date: String,
    pub expiry_date: Option<String>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub description: Option<String>,
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificationPayload {
    pub name: String,
    pub issuer: String,
    pub issue_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPostOut {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing shape: everything but the body.
#[derive(Debug, Clone, Serialize)]
pub struct BlogPostSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogPostPayload {
    pub title: String,
    /// Derived from the title when omitted on create; ignored on update.
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlogListQuery {
    pub include_unpublished: bool,
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub profile: Option<ProfileOut>,
    pub jobs: Vec<JobOut>,
    pub certifications: Vec<CertificationOut>,
    pub posts: Vec<FeedItem>,
}

#[derive(Debug, Serialize)]
pub struct BlogPage {
    pub feed_url: String,
    pub posts: Vec<FeedItem>,
}
