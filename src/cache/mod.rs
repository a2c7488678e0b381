//! 链接缓存层
//!
//! 通过插件表按名称选择实现：`memory`（moka）、`redis`、`null`。

pub mod macros;
pub mod memory;
pub mod null;
pub mod redis;
pub mod register;
pub mod traits;

use std::sync::Arc;

use tracing::info;

use crate::config::CacheConfig;
use crate::errors::{Result, ShortUrlError};

pub use self::memory::MemoryLinkCache;
pub use self::null::NullLinkCache;
pub use self::redis::RedisLinkCache;
pub use self::traits::LinkCache;

pub struct CacheFactory;

impl CacheFactory {
    pub async fn create(config: &CacheConfig) -> Result<Arc<dyn LinkCache>> {
        let constructor = register::get_cache_plugin(&config.cache_type).ok_or_else(|| {
            ShortUrlError::cache_plugin_not_found(format!(
                "Cache plugin not found: {} (available: {})",
                config.cache_type,
                register::registered_cache_plugins().join(", ")
            ))
        })?;

        let cache = constructor(config.clone()).await?;
        info!(
            "Cache initialized: {} (default TTL {}s)",
            cache.backend_name(),
            config.default_ttl
        );
        Ok(Arc::from(cache))
    }
}
