use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// 链接状态（持久化为整数：0 = disabled, 1 = active）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum LinkStatus {
    Disabled = 0,
    #[default]
    Active = 1,
}

impl LinkStatus {
    pub fn from_i16(value: i16) -> Self {
        if value == LinkStatus::Active as i16 {
            LinkStatus::Active
        } else {
            LinkStatus::Disabled
        }
    }

    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

/// 短链接记录
///
/// `code` 与 `original_url` 创建后不可变；`visit_count` 为最终一致的计数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLinkRecord {
    #[serde(rename = "short_code")]
    pub code: String,
    pub original_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: LinkStatus,
    #[serde(default)]
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortLinkRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|expire_at| now >= expire_at)
    }

    /// 可解析：状态为 active 且未过期
    pub fn is_resolvable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == LinkStatus::Active && !self.is_expired_at(now)
    }

    pub fn is_resolvable(&self) -> bool {
        self.is_resolvable_at(Utc::now())
    }
}

/// 新建链接所需字段
#[derive(Debug, Clone, Default)]
pub struct NewLink {
    pub code: String,
    pub original_url: String,
    pub owner: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub expire_at: Option<DateTime<Utc>>,
}

impl NewLink {
    /// 生成初始记录：status = active, visit_count = 0
    pub fn into_record(self, now: DateTime<Utc>) -> ShortLinkRecord {
        ShortLinkRecord {
            code: self.code,
            original_url: self.original_url,
            owner: self.owner,
            title: self.title,
            description: self.description,
            status: LinkStatus::Active,
            expire_at: self.expire_at,
            visit_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 单次访问的原始请求属性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitLog {
    pub short_code: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub visited_at: DateTime<Utc>,
}

/// 单个短码的访问统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitStats {
    pub short_code: String,
    pub total_visits: u64,
    pub unique_ips: u64,
    pub today_visits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(status: LinkStatus, expire_at: Option<DateTime<Utc>>) -> ShortLinkRecord {
        NewLink {
            code: "B7".into(),
            original_url: "https://example.com/a".into(),
            expire_at,
            ..Default::default()
        }
        .into_record(Utc::now())
        .with_status(status)
    }

    impl ShortLinkRecord {
        fn with_status(mut self, status: LinkStatus) -> Self {
            self.status = status;
            self
        }
    }

    #[test]
    fn test_resolvability() {
        let now = Utc::now();
        assert!(record(LinkStatus::Active, None).is_resolvable_at(now));
        assert!(
            record(LinkStatus::Active, Some(now + Duration::hours(1))).is_resolvable_at(now)
        );
        assert!(!record(LinkStatus::Active, Some(now - Duration::seconds(1))).is_resolvable_at(now));
        assert!(!record(LinkStatus::Disabled, None).is_resolvable_at(now));
    }

    #[test]
    fn test_expire_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(record(LinkStatus::Active, Some(now)).is_expired_at(now));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(record(LinkStatus::Active, None)).unwrap();
        assert_eq!(json["short_code"], "B7");
        assert_eq!(json["status"], 1);
        assert_eq!(json["visit_count"], 0);
        assert!(json.get("owner").is_none());
    }
}
