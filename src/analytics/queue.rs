//! 有界后台任务队列
//!
//! 单个 worker 按批处理任务，满批或到达刷新间隔时调用 [`TaskHandler`]。
//! 队列满时的行为由 [`OverflowPolicy`] 决定：
//! - `Drop`：提交立即返回，任务被丢弃并计入 `dropped`
//! - `Block`：提交方等待队列腾出空间
//!
//! 处理失败只记录日志并计入 `failed`，不重试。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::config::{AnalyticsConfig, OverflowPolicy};

#[async_trait]
pub trait TaskHandler<T: Send + 'static>: Send + Sync + 'static {
    async fn handle_batch(&self, batch: Vec<T>) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct QueueOptions {
    pub capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub overflow: OverflowPolicy,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            batch_size: 256,
            flush_interval: Duration::from_secs(1),
            overflow: OverflowPolicy::Drop,
        }
    }
}

impl From<&AnalyticsConfig> for QueueOptions {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            capacity: config.queue_capacity,
            batch_size: config.batch_size,
            flush_interval: Duration::from_millis(config.flush_interval_ms),
            overflow: config.overflow,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    dropped: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
}

/// 队列计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub submitted: u64,
    pub dropped: u64,
    pub processed: u64,
    pub failed: u64,
}

impl QueueStats {
    /// 已入队但尚未处理完的任务数
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.processed.saturating_add(self.failed))
    }
}

pub struct TaskQueue<T: Send + 'static> {
    name: &'static str,
    sender: mpsc::Sender<T>,
    overflow: OverflowPolicy,
    counters: Arc<Counters>,
    closed: AtomicBool,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> TaskQueue<T> {
    /// 创建队列并启动 worker（需在 tokio 运行时内调用）
    pub fn start<H>(name: &'static str, options: QueueOptions, handler: Arc<H>) -> Self
    where
        H: TaskHandler<T>,
    {
        let (sender, receiver) = mpsc::channel(options.capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let counters = Arc::new(Counters::default());

        let worker = tokio::spawn(run_worker(
            name,
            receiver,
            shutdown_rx,
            handler,
            options,
            Arc::clone(&counters),
        ));

        debug!(
            "TaskQueue '{}' started (capacity: {}, batch: {}, overflow: {})",
            name, options.capacity, options.batch_size, options.overflow
        );

        Self {
            name,
            sender,
            overflow: options.overflow,
            counters,
            closed: AtomicBool::new(false),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// 按溢出策略提交任务，返回是否入队
    pub async fn submit(&self, task: T) -> bool {
        match self.overflow {
            OverflowPolicy::Drop => self.try_submit(task),
            OverflowPolicy::Block => {
                if self.closed.load(Ordering::Acquire) {
                    return self.record_drop("closed");
                }
                match self.sender.send(task).await {
                    Ok(()) => {
                        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                        true
                    }
                    Err(_) => self.record_drop("closed"),
                }
            }
        }
    }

    /// 非阻塞提交，队列满时直接丢弃
    pub fn try_submit(&self, task: T) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return self.record_drop("closed");
        }
        match self.sender.try_send(task) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => self.record_drop("full"),
            Err(mpsc::error::TrySendError::Closed(_)) => self.record_drop("closed"),
        }
    }

    fn record_drop(&self, reason: &str) -> bool {
        let dropped = self.counters.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "TaskQueue '{}' dropped task ({}), total dropped: {}",
            self.name, reason, dropped
        );
        false
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            processed: self.counters.processed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 停止接收新任务，处理完已入队的任务后退出 worker
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
        let worker = self.worker.lock().take();
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            warn!("TaskQueue '{}' worker terminated abnormally: {}", self.name, e);
        }
        debug!("TaskQueue '{}' stopped: {:?}", self.name, self.stats());
    }
}

async fn run_worker<T, H>(
    name: &'static str,
    mut receiver: mpsc::Receiver<T>,
    mut shutdown_rx: oneshot::Receiver<()>,
    handler: Arc<H>,
    options: QueueOptions,
    counters: Arc<Counters>,
) where
    T: Send + 'static,
    H: TaskHandler<T>,
{
    let batch_size = options.batch_size.max(1);
    let mut ticker = tokio::time::interval(options.flush_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut batch: Vec<T> = Vec::with_capacity(batch_size);

    loop {
        tokio::select! {
            maybe_task = receiver.recv() => match maybe_task {
                Some(task) => {
                    batch.push(task);
                    if batch.len() >= batch_size {
                        process_batch(name, &mut batch, handler.as_ref(), &counters).await;
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    process_batch(name, &mut batch, handler.as_ref(), &counters).await;
                }
            }
            _ = &mut shutdown_rx => {
                receiver.close();
                while let Some(task) = receiver.recv().await {
                    batch.push(task);
                    if batch.len() >= batch_size {
                        process_batch(name, &mut batch, handler.as_ref(), &counters).await;
                    }
                }
                break;
            }
        }
    }

    if !batch.is_empty() {
        process_batch(name, &mut batch, handler.as_ref(), &counters).await;
    }
    trace!("TaskQueue '{}' worker exited", name);
}

async fn process_batch<T, H>(name: &str, batch: &mut Vec<T>, handler: &H, counters: &Counters)
where
    T: Send + 'static,
    H: TaskHandler<T>,
{
    let tasks = std::mem::take(batch);
    let count = tasks.len() as u64;

    match handler.handle_batch(tasks).await {
        Ok(()) => {
            counters.processed.fetch_add(count, Ordering::Relaxed);
            trace!("TaskQueue '{}' processed {} tasks", name, count);
        }
        Err(e) => {
            counters.failed.fetch_add(count, Ordering::Relaxed);
            warn!("TaskQueue '{}' failed to process {} tasks: {}", name, count, e);
        }
    }
}
