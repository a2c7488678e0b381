//! 访问日志写入与统计查询

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::debug;

use super::converters::{visit_log_to_active_model, visit_model_to_log};
use super::{SeaOrmStorage, retry};
use crate::analytics::{VisitCountSink, VisitLogSink};
use crate::errors::Result;
use crate::storage::{VisitLog, VisitStats};

use migration::entities::visit_log;

#[async_trait]
impl VisitCountSink for SeaOrmStorage {
    async fn flush_counts(&self, updates: Vec<(String, u64)>) -> anyhow::Result<()> {
        self.increment_batch(&updates)
            .await
            .map_err(|e| anyhow::anyhow!("批量更新访问计数失败: {}", e))?;
        Ok(())
    }
}

#[async_trait]
impl VisitLogSink for SeaOrmStorage {
    async fn write_visits(&self, logs: Vec<VisitLog>) -> anyhow::Result<()> {
        if logs.is_empty() {
            return Ok(());
        }

        let db = &self.db;
        let logs_ref = &logs;
        retry::with_retry("write_visits", self.retry_config, || async {
            visit_log::Entity::insert_many(logs_ref.iter().map(visit_log_to_active_model))
                .exec(db)
                .await
                .map(|_| ())
        })
        .await
        .map_err(|e| anyhow::anyhow!("写入访问日志失败: {}", e))?;

        debug!("Wrote {} visit logs", logs.len());
        Ok(())
    }
}

impl SeaOrmStorage {
    /// 访问统计：总数、独立 IP 数、今日（UTC）访问数
    pub async fn visit_stats(&self, code: &str) -> Result<VisitStats> {
        let db = &self.db;
        let today_start = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or_else(Utc::now);

        let total_visits = visit_log::Entity::find()
            .filter(visit_log::Column::ShortCode.eq(code))
            .count(db)
            .await?;

        let unique_ips = visit_log::Entity::find()
            .select_only()
            .column(visit_log::Column::Ip)
            .distinct()
            .filter(visit_log::Column::ShortCode.eq(code))
            .filter(visit_log::Column::Ip.is_not_null())
            .count(db)
            .await?;

        let today_visits = visit_log::Entity::find()
            .filter(visit_log::Column::ShortCode.eq(code))
            .filter(visit_log::Column::VisitedAt.gte(today_start))
            .count(db)
            .await?;

        Ok(VisitStats {
            short_code: code.to_string(),
            total_visits,
            unique_ips,
            today_visits,
        })
    }

    /// 最近的访问记录（按时间倒序）
    pub async fn recent_visits(&self, code: &str, limit: u64) -> Result<Vec<VisitLog>> {
        let models = visit_log::Entity::find()
            .filter(visit_log::Column::ShortCode.eq(code))
            .order_by_desc(visit_log::Column::VisitedAt)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(visit_model_to_log).collect())
    }
}
