use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::VisitEvent;
use crate::cache::LinkCache;
use crate::storage::VisitLog;

/// 访问计数 Sink（按短码聚合后批量累加）
#[async_trait]
pub trait VisitCountSink: Send + Sync {
    async fn flush_counts(&self, updates: Vec<(String, u64)>) -> anyhow::Result<()>;
}

/// 计数落库后失效对应短码的主缓存，下次读取从存储回填最新 `visit_count`。
/// URL 索引只存短码，保持不变。
pub struct CacheEvictingCountSink {
    inner: Arc<dyn VisitCountSink>,
    cache: Arc<dyn LinkCache>,
}

impl CacheEvictingCountSink {
    pub fn new(inner: Arc<dyn VisitCountSink>, cache: Arc<dyn LinkCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl VisitCountSink for CacheEvictingCountSink {
    async fn flush_counts(&self, updates: Vec<(String, u64)>) -> anyhow::Result<()> {
        let codes: Vec<String> = updates.iter().map(|(code, _)| code.clone()).collect();
        self.inner.flush_counts(updates).await?;

        for code in &codes {
            if let Err(e) = self.cache.invalidate(code).await {
                warn!("Failed to evict cached record for {} after count flush: {}", code, e);
            }
        }
        Ok(())
    }
}

/// 原始访问日志 Sink
#[async_trait]
pub trait VisitLogSink: Send + Sync {
    async fn write_visits(&self, logs: Vec<VisitLog>) -> anyhow::Result<()>;
}

/// 访问事件发布（以短码为 key，JSON 负载）
///
/// 同一批次内保持提交顺序，下游按 key 保序消费。
#[async_trait]
pub trait VisitEventPublisher: Send + Sync {
    async fn publish(&self, events: &[VisitEvent]) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

/// 通过 tracing 输出访问事件
pub struct TracingPublisher;

#[async_trait]
impl VisitEventPublisher for TracingPublisher {
    async fn publish(&self, events: &[VisitEvent]) -> anyhow::Result<()> {
        for event in events {
            let payload = serde_json::to_string(event)?;
            info!(target: "shorturl::visit_events", key = %event.short_code, %payload);
        }
        debug!("Published {} visit events", events.len());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}
