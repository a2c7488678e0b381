use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::analytics::VisitRecorder;

/// 单个关闭任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, flushing data..."),
        Err(e) => warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        ),
    }
}

/// 排空访问队列，超时后放弃剩余任务
pub async fn perform_shutdown_tasks(recorder: &VisitRecorder) {
    match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), recorder.shutdown()).await {
        Ok(()) => {
            let stats = recorder.stats();
            info!(
                "Visit queue drained: submitted={}, processed={}, failed={}, dropped={}",
                stats.submitted, stats.processed, stats.failed, stats.dropped
            );
        }
        Err(_) => error!(
            "Visit queue drain timed out after {} seconds, {} visits lost",
            TASK_TIMEOUT_SECS,
            recorder.stats().pending()
        ),
    }
}
