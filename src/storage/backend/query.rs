//! 只读查询

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use super::converters::model_to_record;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShortUrlError};
use crate::storage::{LinkStatus, LinkStore, ShortLinkRecord};

use migration::entities::short_link;

impl SeaOrmStorage {
    pub(super) async fn find_by_code(&self, code: &str) -> Result<Option<ShortLinkRecord>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get({})", code), self.retry_config, || async {
            short_link::Entity::find_by_id(code).one(db).await
        })
        .await?;

        Ok(model.map(model_to_record))
    }
}

#[async_trait]
impl LinkStore for SeaOrmStorage {
    async fn create(&self, record: &ShortLinkRecord) -> Result<()> {
        self.insert_record(record).await
    }

    async fn get_by_code(&self, code: &str) -> Result<ShortLinkRecord> {
        self.find_by_code(code)
            .await?
            .ok_or_else(|| ShortUrlError::not_found(format!("短链接不存在: {}", code)))
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<ShortLinkRecord>> {
        let db = &self.db;
        let model = retry::with_retry("get_by_url", self.retry_config, || async {
            short_link::Entity::find()
                .filter(short_link::Column::OriginalUrl.eq(url))
                .order_by_asc(short_link::Column::CreatedAt)
                .one(db)
                .await
        })
        .await?;

        Ok(model.map(model_to_record))
    }

    async fn increment_visit_count(&self, code: &str) -> Result<()> {
        self.increment_one(code).await
    }

    async fn increment_visit_counts(&self, updates: &[(String, u64)]) -> Result<u64> {
        self.increment_batch(updates).await
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<ShortLinkRecord>, u64)> {
        let db = &self.db;

        let total = retry::with_retry("list_count", self.retry_config, || async {
            short_link::Entity::find().count(db).await
        })
        .await?;

        let models = retry::with_retry("list", self.retry_config, || async {
            short_link::Entity::find()
                .order_by_desc(short_link::Column::CreatedAt)
                .order_by_asc(short_link::Column::ShortCode)
                .offset(offset)
                .limit(limit)
                .all(db)
                .await
        })
        .await?;

        Ok((models.into_iter().map(model_to_record).collect(), total))
    }

    async fn update_status(&self, code: &str, status: LinkStatus) -> Result<ShortLinkRecord> {
        self.update_columns(code, Some(status), None).await
    }

    async fn update_expire_at(
        &self,
        code: &str,
        expire_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLinkRecord> {
        self.update_columns(code, None, Some(expire_at)).await
    }
}
