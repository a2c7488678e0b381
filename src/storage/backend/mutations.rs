//! 写操作

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{CaseStatement, Expr, Query};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, ExprTrait, QueryFilter};
use tracing::{debug, info};

use super::converters::record_to_active_model;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShortUrlError};
use crate::storage::{LinkStatus, ShortLinkRecord};
use crate::utils::is_valid_short_code;

use migration::entities::short_link;

impl SeaOrmStorage {
    /// 插入新记录；主键冲突映射为 `Conflict`
    pub(super) async fn insert_record(&self, record: &ShortLinkRecord) -> Result<()> {
        let db = &self.db;
        retry::with_retry(&format!("create({})", record.code), self.retry_config, || async {
            short_link::Entity::insert(record_to_active_model(record))
                .exec(db)
                .await
                .map(|_| ())
        })
        .await
        .map_err(|e| match ShortUrlError::from(e) {
            ShortUrlError::Conflict(_) => {
                ShortUrlError::conflict(format!("短码已存在: {}", record.code))
            }
            other => other,
        })?;

        info!("Short link created: {} -> {}", record.code, record.original_url);
        Ok(())
    }

    pub(super) async fn increment_one(&self, code: &str) -> Result<()> {
        let db = &self.db;
        let result = retry::with_retry(&format!("increment({})", code), self.retry_config, || {
            async {
                short_link::Entity::update_many()
                    .col_expr(
                        short_link::Column::VisitCount,
                        Expr::col(short_link::Column::VisitCount).add(1),
                    )
                    .filter(short_link::Column::ShortCode.eq(code))
                    .exec(db)
                    .await
            }
        })
        .await?;

        if result.rows_affected == 0 {
            return Err(ShortUrlError::not_found(format!("短链接不存在: {}", code)));
        }
        Ok(())
    }

    /// 单条 UPDATE ... CASE WHEN 批量累加计数
    pub(super) async fn increment_batch(&self, updates: &[(String, u64)]) -> Result<u64> {
        let updates: Vec<&(String, u64)> = updates
            .iter()
            .filter(|(code, count)| *count > 0 && is_valid_short_code(code))
            .collect();
        if updates.is_empty() {
            return Ok(0);
        }

        let mut case_stmt = CaseStatement::new();
        let mut codes = Vec::with_capacity(updates.len());
        for (code, count) in &updates {
            case_stmt = case_stmt.case(
                Expr::col(short_link::Column::ShortCode).eq(Expr::val(code.as_str())),
                Expr::col(short_link::Column::VisitCount).add(Expr::val(*count as i64)),
            );
            codes.push(code.clone());
        }
        case_stmt = case_stmt.finally(Expr::col(short_link::Column::VisitCount));

        let stmt = Query::update()
            .table(short_link::Entity)
            .value(short_link::Column::VisitCount, case_stmt)
            .and_where(Expr::col(short_link::Column::ShortCode).is_in(codes))
            .to_owned();

        let db = &self.db;
        let stmt_ref = &stmt;
        let result = retry::with_retry("increment_batch", self.retry_config, || async {
            db.execute(stmt_ref).await
        })
        .await?;

        debug!(
            "Flushed visit counts for {} codes ({} rows)",
            updates.len(),
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }

    pub(super) async fn update_columns(
        &self,
        code: &str,
        status: Option<LinkStatus>,
        expire_at: Option<Option<DateTime<Utc>>>,
    ) -> Result<ShortLinkRecord> {
        let db = &self.db;
        let now = Utc::now();

        let result = retry::with_retry(&format!("update({})", code), self.retry_config, || {
            let mut update = short_link::Entity::update_many()
                .col_expr(short_link::Column::UpdatedAt, Expr::val(now).into())
                .filter(short_link::Column::ShortCode.eq(code));
            if let Some(status) = status {
                update = update.col_expr(short_link::Column::Status, Expr::val(status.as_i16()).into());
            }
            if let Some(expire_at) = expire_at {
                update = update.col_expr(short_link::Column::ExpireAt, Expr::val(expire_at).into());
            }
            async move { update.exec(db).await }
        })
        .await?;

        if result.rows_affected == 0 {
            return Err(ShortUrlError::not_found(format!("短链接不存在: {}", code)));
        }

        info!("Short link updated: {}", code);
        self.find_by_code(code)
            .await?
            .ok_or_else(|| ShortUrlError::not_found(format!("短链接不存在: {}", code)))
    }
}
