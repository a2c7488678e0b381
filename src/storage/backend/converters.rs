use crate::storage::{LinkStatus, ShortLinkRecord, VisitLog};
use migration::entities::{short_link, visit_log};

pub fn model_to_record(model: short_link::Model) -> ShortLinkRecord {
    ShortLinkRecord {
        code: model.short_code,
        original_url: model.original_url,
        owner: model.owner,
        title: model.title,
        description: model.description,
        status: LinkStatus::from_i16(model.status),
        expire_at: model.expire_at,
        visit_count: model.visit_count.max(0),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn record_to_active_model(record: &ShortLinkRecord) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::Set;

    short_link::ActiveModel {
        short_code: Set(record.code.clone()),
        original_url: Set(record.original_url.clone()),
        owner: Set(record.owner.clone()),
        title: Set(record.title.clone()),
        description: Set(record.description.clone()),
        status: Set(record.status.as_i16()),
        expire_at: Set(record.expire_at),
        visit_count: Set(record.visit_count),
        created_at: Set(record.created_at),
        updated_at: Set(record.updated_at),
    }
}

pub fn visit_log_to_active_model(log: &VisitLog) -> visit_log::ActiveModel {
    use sea_orm::ActiveValue::{NotSet, Set};

    visit_log::ActiveModel {
        id: NotSet,
        short_code: Set(log.short_code.clone()),
        ip: Set(log.ip.clone()),
        user_agent: Set(log.user_agent.clone().map(|ua| truncate(ua, 500))),
        referer: Set(log.referer.clone().map(|r| truncate(r, 500))),
        visited_at: Set(log.visited_at),
    }
}

pub fn visit_model_to_log(model: visit_log::Model) -> VisitLog {
    VisitLog {
        short_code: model.short_code,
        ip: model.ip,
        user_agent: model.user_agent,
        referer: model.referer,
        visited_at: model.visited_at,
    }
}

/// 按字符截断，避免超过列宽
fn truncate(mut value: String, max_chars: usize) -> String {
    if let Some((idx, _)) = value.char_indices().nth(max_chars) {
        value.truncate(idx);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_model_round_trip() {
        let now = Utc::now();
        let model = short_link::Model {
            short_code: "abc123".to_string(),
            original_url: "https://example.com".to_string(),
            owner: None,
            title: Some("Example".to_string()),
            description: None,
            status: 0,
            expire_at: None,
            visit_count: 42,
            created_at: now,
            updated_at: now,
        };

        let record = model_to_record(model);
        assert_eq!(record.code, "abc123");
        assert_eq!(record.status, LinkStatus::Disabled);
        assert_eq!(record.visit_count, 42);

        let active = record_to_active_model(&record);
        assert_eq!(active.status.unwrap(), 0);
        assert_eq!(active.title.unwrap(), Some("Example".to_string()));
    }

    #[test]
    fn test_unknown_status_is_disabled() {
        assert_eq!(LinkStatus::from_i16(7), LinkStatus::Disabled);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("中文字符".to_string(), 2), "中文");
        assert_eq!(truncate("abc".to_string(), 10), "abc");
    }
}
