//! 访问统计
//!
//! 重定向路径只负责把 [`VisitEvent`] 提交到有界队列，计数累加、
//! 访问日志写入和事件发布都在后台 worker 中完成。

pub mod queue;
pub mod recorder;
pub mod sink;

pub use queue::{QueueOptions, QueueStats, TaskHandler, TaskQueue};
pub use recorder::{RecorderOptions, VisitRecorder};
pub use sink::{
    CacheEvictingCountSink, TracingPublisher, VisitCountSink, VisitEventPublisher, VisitLogSink,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::VisitLog;

/// 请求侧的访问属性（在响应前采集）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitEvent {
    pub short_code: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub visited_at: DateTime<Utc>,
}

impl VisitEvent {
    pub fn new(short_code: impl Into<String>, context: VisitContext) -> Self {
        Self {
            short_code: short_code.into(),
            ip: context.ip,
            user_agent: context.user_agent,
            referer: context.referer,
            visited_at: Utc::now(),
        }
    }

    pub fn to_log(&self) -> VisitLog {
        VisitLog {
            short_code: self.short_code.clone(),
            ip: self.ip.clone(),
            user_agent: self.user_agent.clone(),
            referer: self.referer.clone(),
            visited_at: self.visited_at,
        }
    }
}
