use std::time::Duration;

use async_trait::async_trait;

use crate::cache::LinkCache;
use crate::config::CacheConfig;
use crate::declare_cache_plugin;
use crate::errors::Result;
use crate::storage::ShortLinkRecord;

declare_cache_plugin!("null", NullLinkCache);

/// 永远未命中的缓存，用于关闭缓存层
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLinkCache;

impl NullLinkCache {
    pub async fn from_config(_config: CacheConfig) -> Result<Self> {
        Ok(Self)
    }
}

#[async_trait]
impl LinkCache for NullLinkCache {
    async fn put(&self, _record: &ShortLinkRecord, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn get_by_code(&self, _code: &str) -> Result<Option<ShortLinkRecord>> {
        Ok(None)
    }

    async fn get_code_by_url(&self, _url: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn invalidate(&self, _code: &str) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, _code: &str) -> Result<bool> {
        Ok(false)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "null"
    }
}
