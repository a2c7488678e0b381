//! 持久化存储
//!
//! `LinkStore` 是短码唯一性的唯一权威：`create` 遇到已存在的短码返回 `Conflict`。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use models::{LinkStatus, NewLink, ShortLinkRecord, VisitLog, VisitStats};

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// 插入新记录，短码已存在时返回 `Conflict`
    async fn create(&self, record: &ShortLinkRecord) -> Result<()>;

    /// 按短码查询，不存在时返回 `NotFound`
    async fn get_by_code(&self, code: &str) -> Result<ShortLinkRecord>;

    /// 按原始 URL 查询第一条匹配记录（仅供参考，并发下不保证唯一）
    async fn get_by_url(&self, url: &str) -> Result<Option<ShortLinkRecord>>;

    /// 访问计数 +1
    async fn increment_visit_count(&self, code: &str) -> Result<()>;

    /// 批量累加访问计数，返回受影响的行数
    async fn increment_visit_counts(&self, updates: &[(String, u64)]) -> Result<u64>;

    /// 按创建时间倒序分页，返回 (记录, 总数)
    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<ShortLinkRecord>, u64)>;

    async fn update_status(&self, code: &str, status: LinkStatus) -> Result<ShortLinkRecord>;

    async fn update_expire_at(
        &self,
        code: &str,
        expire_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLinkRecord>;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let backend_type = backend::infer_backend_from_url(&config.database_url)?;
        let storage = SeaOrmStorage::new(config, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}
