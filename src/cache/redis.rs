use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, trace};

use crate::cache::LinkCache;
use crate::config::CacheConfig;
use crate::declare_cache_plugin;
use crate::errors::Result;
use crate::storage::ShortLinkRecord;

declare_cache_plugin!("redis", RedisLinkCache);

/// Redis 双索引缓存
///
/// - `<prefix>code:<code>` → 记录 JSON
/// - `<prefix>url:<url>` → code
pub struct RedisLinkCache {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisLinkCache {
    pub async fn connect(url: &str, key_prefix: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        debug!("RedisLinkCache connected, key prefix: '{}'", key_prefix);
        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
        })
    }

    pub async fn from_config(config: CacheConfig) -> Result<Self> {
        Self::connect(&config.redis.url, &config.redis.key_prefix).await
    }

    fn code_key(&self, code: &str) -> String {
        format!("{}code:{}", self.key_prefix, code)
    }

    fn url_key(&self, url: &str) -> String {
        format!("{}url:{}", self.key_prefix, url)
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn put(&self, record: &ShortLinkRecord, ttl: Duration) -> Result<()> {
        // SET EX 以秒为单位，不足一秒按一秒计
        let secs = ttl.as_secs().max(u64::from(ttl.subsec_nanos() > 0));
        if secs == 0 {
            return Ok(());
        }

        let payload = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        redis::pipe()
            .set_ex(self.code_key(&record.code), payload, secs)
            .ignore()
            .set_ex(self.url_key(&record.original_url), &record.code, secs)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;

        trace!("Cached link {} for {}s", record.code, secs);
        Ok(())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<ShortLinkRecord>> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(self.code_key(code)).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn get_code_by_url(&self, url: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(self.url_key(url)).await?)
    }

    async fn invalidate(&self, code: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.code_key(code)).await?;
        Ok(())
    }

    async fn exists(&self, code: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(self.code_key(code)).await?)
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.key_prefix);
        let mut cursor: u64 = 0;
        let mut removed = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(500)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                removed += keys.len();
                conn.del::<_, ()>(keys).await?;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("RedisLinkCache cleared {} keys", removed);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
