//! Redirect resolution
//!
//! Cache first, then an authoritative [`LinkLookup`] (the local store or a
//! remote link service). Every answer is checked for resolvability before it
//! is served; visits are handed to the [`VisitRecorder`] without waiting for
//! the count or log write.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, trace, warn};

use crate::analytics::{VisitContext, VisitRecorder};
use crate::cache::LinkCache;
use crate::errors::{Result, ShortUrlError};
use crate::storage::{LinkStore, ShortLinkRecord};

/// Authoritative source consulted on a cache miss
#[async_trait]
pub trait LinkLookup: Send + Sync {
    /// `NotFound` when the code is unknown, `Unavailable` when the source
    /// cannot be reached.
    async fn lookup(&self, code: &str) -> Result<ShortLinkRecord>;

    fn name(&self) -> &'static str;
}

/// Lookup against a co-located store
pub struct StoreLookup {
    store: Arc<dyn LinkStore>,
}

impl StoreLookup {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LinkLookup for StoreLookup {
    async fn lookup(&self, code: &str) -> Result<ShortLinkRecord> {
        self.store.get_by_code(code).await
    }

    fn name(&self) -> &'static str {
        "store"
    }
}

pub struct RedirectResolver {
    cache: Arc<dyn LinkCache>,
    upstream: Arc<dyn LinkLookup>,
    recorder: Arc<VisitRecorder>,
    cache_ttl: Duration,
}

impl RedirectResolver {
    pub fn new(
        cache: Arc<dyn LinkCache>,
        upstream: Arc<dyn LinkLookup>,
        recorder: Arc<VisitRecorder>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            upstream,
            recorder,
            cache_ttl,
        }
    }

    pub fn upstream_name(&self) -> &'static str {
        self.upstream.name()
    }

    /// Resolve `code` to its destination URL.
    ///
    /// Errors: `NotFound` (unknown), `Gone` (disabled or expired),
    /// `Unavailable` (upstream unreachable).
    pub async fn resolve(&self, code: &str, context: VisitContext) -> Result<String> {
        let cached = match self.cache.get_by_code(code).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache lookup failed for {}, treating as miss: {}", code, e);
                None
            }
        };

        if let Some(record) = cached {
            if record.is_resolvable_at(Utc::now()) {
                trace!("Cache hit for {}", code);
                return Ok(self.serve(record, context).await);
            }
            // 缓存中的状态可能已过时，回源确认
            debug!("Cached record {} not resolvable, revalidating", code);
        }

        let record = self.upstream.lookup(code).await?;

        if let Err(e) = self.cache.put(&record, self.cache_ttl).await {
            warn!("Failed to populate cache for {}: {}", code, e);
        }

        if !record.is_resolvable_at(Utc::now()) {
            debug!("Link {} is disabled or expired", code);
            return Err(ShortUrlError::gone(format!("短链接已失效: {}", code)));
        }

        Ok(self.serve(record, context).await)
    }

    async fn serve(&self, record: ShortLinkRecord, context: VisitContext) -> String {
        if !self.recorder.record(&record.code, context).await {
            trace!("Visit for {} not recorded", record.code);
        }
        record.original_url
    }
}
