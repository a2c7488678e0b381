//! Request/response DTOs shared by the link service, the HTTP layer and the
//! remote lookup client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{LinkStatus, ShortLinkRecord};

/// Request to create a short link
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortenRequest {
    pub original_url: String,
    /// Caller supplied code; bypasses the allocator
    #[serde(default)]
    pub custom_code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expire_at: Option<DateTime<Utc>>,
}

impl ShortenRequest {
    pub fn for_url(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchShortenRequest {
    pub urls: Vec<String>,
}

/// Batch result; only successful items appear in `results`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchShortenResponse {
    pub results: Vec<ShortenResponse>,
    pub success: usize,
    pub failed: usize,
}

/// Full record projection returned by `GET /api/links/{code}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDetail {
    pub short_code: String,
    pub original_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visit_count: i64,
    pub status: LinkStatus,
    #[serde(default)]
    pub expire_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&ShortLinkRecord> for LinkDetail {
    fn from(record: &ShortLinkRecord) -> Self {
        Self {
            short_code: record.code.clone(),
            original_url: record.original_url.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            visit_count: record.visit_count,
            status: record.status,
            expire_at: record.expire_at,
            created_at: record.created_at,
        }
    }
}

impl From<LinkDetail> for ShortLinkRecord {
    /// The projection carries no owner or update time; `updated_at` falls
    /// back to `created_at`.
    fn from(detail: LinkDetail) -> Self {
        Self {
            code: detail.short_code,
            original_url: detail.original_url,
            owner: None,
            title: detail.title,
            description: detail.description,
            status: detail.status,
            expire_at: detail.expire_at,
            visit_count: detail.visit_count,
            created_at: detail.created_at,
            updated_at: detail.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkPage {
    pub items: Vec<LinkDetail>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}
