use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::queue::{QueueOptions, QueueStats, TaskHandler, TaskQueue};
use super::sink::{VisitCountSink, VisitEventPublisher, VisitLogSink};
use super::{VisitContext, VisitEvent};
use crate::config::AnalyticsConfig;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecorderOptions {
    pub queue: QueueOptions,
    pub enable_visit_log: bool,
}

impl From<&AnalyticsConfig> for RecorderOptions {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            queue: QueueOptions::from(config),
            enable_visit_log: config.enable_visit_log,
        }
    }
}

struct VisitBatchHandler {
    counts: Arc<dyn VisitCountSink>,
    logs: Option<Arc<dyn VisitLogSink>>,
    publisher: Option<Arc<dyn VisitEventPublisher>>,
}

/// 按短码聚合，保持首次出现的顺序
fn aggregate_counts(events: &[VisitEvent]) -> Vec<(String, u64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut updates: Vec<(String, u64)> = Vec::new();
    for event in events {
        match index.get(event.short_code.as_str()) {
            Some(&i) => updates[i].1 += 1,
            None => {
                index.insert(&event.short_code, updates.len());
                updates.push((event.short_code.clone(), 1));
            }
        }
    }
    updates
}

#[async_trait]
impl TaskHandler<VisitEvent> for VisitBatchHandler {
    async fn handle_batch(&self, events: Vec<VisitEvent>) -> anyhow::Result<()> {
        if let Some(logs) = &self.logs
            && let Err(e) = logs
                .write_visits(events.iter().map(VisitEvent::to_log).collect())
                .await
        {
            warn!("Failed to write {} visit logs: {}", events.len(), e);
        }

        if let Some(publisher) = &self.publisher
            && let Err(e) = publisher.publish(&events).await
        {
            warn!(
                "Failed to publish {} visit events via {}: {}",
                events.len(),
                publisher.name(),
                e
            );
        }

        self.counts.flush_counts(aggregate_counts(&events)).await
    }
}

/// 非阻塞访问记录器
///
/// 关闭统计时所有记录直接忽略。
pub struct VisitRecorder {
    queue: Option<TaskQueue<VisitEvent>>,
}

impl VisitRecorder {
    pub fn start(
        options: RecorderOptions,
        counts: Arc<dyn VisitCountSink>,
        logs: Option<Arc<dyn VisitLogSink>>,
        publisher: Option<Arc<dyn VisitEventPublisher>>,
    ) -> Self {
        let handler = VisitBatchHandler {
            counts,
            logs: logs.filter(|_| options.enable_visit_log),
            publisher,
        };
        info!(
            "Visit recorder started (visit log: {}, publisher: {})",
            handler.logs.is_some(),
            handler.publisher.as_ref().map_or("none", |p| p.name())
        );

        Self {
            queue: Some(TaskQueue::start("visits", options.queue, Arc::new(handler))),
        }
    }

    pub fn disabled() -> Self {
        Self { queue: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.queue.is_some()
    }

    /// 提交一次访问；返回是否入队。绝不返回错误。
    pub async fn record(&self, code: &str, context: VisitContext) -> bool {
        match &self.queue {
            Some(queue) => queue.submit(VisitEvent::new(code, context)).await,
            None => false,
        }
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.as_ref().map(TaskQueue::stats).unwrap_or_default()
    }

    pub async fn shutdown(&self) {
        if let Some(queue) = &self.queue {
            queue.shutdown().await;
        }
    }
}
