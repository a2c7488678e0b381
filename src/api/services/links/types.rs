//! Link API 类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::LinkStatus;

use super::error_code::ErrorCode;

/// 统一响应信封，成功时 `code = 0`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct GetLinksQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct VisitLogsQuery {
    pub limit: Option<u64>,
}

/// `PATCH /api/links/{code}`，至少需要一个字段
///
/// `expire_at` 区分三种情况：缺省（不修改）、`null`（清除）、时间值。
#[derive(Deserialize, Clone, Debug, Default)]
pub struct UpdateLinkRequest {
    #[serde(default)]
    pub status: Option<LinkStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub expire_at: Option<Option<DateTime<Utc>>>,
}

fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
