use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;
use crate::storage::ShortLinkRecord;

/// 双索引链接缓存
///
/// - 主键 `code -> record`
/// - 副键 `url -> code`
///
/// 两个键在写入时共用同一个 TTL。缓存只是加速层：未命中不代表上游不存在，
/// 命中的记录仍需调用方重新校验 `status` 与 `expire_at`。
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// 同时写入主键与副键；`ttl` 为零时不写入
    async fn put(&self, record: &ShortLinkRecord, ttl: Duration) -> Result<()>;

    async fn get_by_code(&self, code: &str) -> Result<Option<ShortLinkRecord>>;

    async fn get_code_by_url(&self, url: &str) -> Result<Option<String>>;

    /// 仅删除主键，副键等待 TTL 自然过期
    async fn invalidate(&self, code: &str) -> Result<()>;

    async fn exists(&self, code: &str) -> Result<bool>;

    async fn clear(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
