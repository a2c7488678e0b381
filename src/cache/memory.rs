use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use crate::cache::LinkCache;
use crate::config::CacheConfig;
use crate::declare_cache_plugin;
use crate::errors::Result;
use crate::storage::ShortLinkRecord;

declare_cache_plugin!("memory", MemoryLinkCache);

/// 带写入时 TTL 的缓存值
#[derive(Debug, Clone)]
struct TtlEntry<V> {
    value: V,
    ttl: Duration,
}

/// 每个条目按写入时给定的 TTL 过期；覆盖写入会重置 TTL
struct WriteTtlExpiry;

impl<V> Expiry<String, TtlEntry<V>> for WriteTtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &TtlEntry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &TtlEntry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// 进程内双索引缓存（moka）
pub struct MemoryLinkCache {
    records: Cache<String, TtlEntry<ShortLinkRecord>>,
    urls: Cache<String, TtlEntry<String>>,
}

impl MemoryLinkCache {
    pub fn new(max_capacity: u64) -> Self {
        let records = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(WriteTtlExpiry)
            .build();
        let urls = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(WriteTtlExpiry)
            .build();

        debug!("MemoryLinkCache initialized, max capacity: {}", max_capacity);
        Self { records, urls }
    }

    pub async fn from_config(config: CacheConfig) -> Result<Self> {
        Ok(Self::new(config.memory.max_capacity))
    }
}

#[async_trait]
impl LinkCache for MemoryLinkCache {
    async fn put(&self, record: &ShortLinkRecord, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Ok(());
        }

        self.records
            .insert(
                record.code.clone(),
                TtlEntry {
                    value: record.clone(),
                    ttl,
                },
            )
            .await;
        self.urls
            .insert(
                record.original_url.clone(),
                TtlEntry {
                    value: record.code.clone(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<ShortLinkRecord>> {
        Ok(self.records.get(code).await.map(|entry| entry.value))
    }

    async fn get_code_by_url(&self, url: &str) -> Result<Option<String>> {
        Ok(self.urls.get(url).await.map(|entry| entry.value))
    }

    async fn invalidate(&self, code: &str) -> Result<()> {
        self.records.invalidate(code).await;
        Ok(())
    }

    async fn exists(&self, code: &str) -> Result<bool> {
        Ok(self.records.contains_key(code))
    }

    async fn clear(&self) -> Result<()> {
        self.records.invalidate_all();
        self.urls.invalidate_all();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
