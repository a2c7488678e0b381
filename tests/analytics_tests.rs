//! Visit accounting tests
//!
//! The recorder must never hold up a redirect: slow or failing sinks only show
//! up in the queue counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use shorturl::analytics::{
    CacheEvictingCountSink, QueueOptions, RecorderOptions, VisitContext, VisitCountSink,
    VisitEvent, VisitEventPublisher, VisitLogSink, VisitRecorder,
};
use shorturl::cache::{LinkCache, MemoryLinkCache};
use shorturl::config::{DatabaseConfig, OverflowPolicy};
use shorturl::storage::{LinkStore, NewLink, StorageFactory};

/// Records every flush; optionally sleeps or fails
#[derive(Default)]
struct CountingSink {
    flushed: Mutex<Vec<(String, u64)>>,
    delay: Option<Duration>,
    fail: bool,
    calls: AtomicU64,
}

#[async_trait]
impl VisitCountSink for CountingSink {
    async fn flush_counts(&self, updates: Vec<(String, u64)>) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("sink offline");
        }
        self.flushed.lock().extend(updates);
        Ok(())
    }
}

impl CountingSink {
    fn total_for(&self, code: &str) -> u64 {
        self.flushed
            .lock()
            .iter()
            .filter(|(c, _)| c == code)
            .map(|(_, n)| n)
            .sum()
    }
}

#[derive(Default)]
struct CapturingPublisher {
    events: Mutex<Vec<VisitEvent>>,
}

#[async_trait]
impl VisitEventPublisher for CapturingPublisher {
    async fn publish(&self, events: &[VisitEvent]) -> anyhow::Result<()> {
        self.events.lock().extend_from_slice(events);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "capture"
    }
}

fn options(capacity: usize, batch_size: usize, overflow: OverflowPolicy) -> RecorderOptions {
    RecorderOptions {
        queue: QueueOptions {
            capacity,
            batch_size,
            flush_interval: Duration::from_millis(10),
            overflow,
        },
        enable_visit_log: false,
    }
}

#[tokio::test]
async fn test_counts_aggregated_per_code() {
    let sink = Arc::new(CountingSink::default());
    let recorder = VisitRecorder::start(
        options(1_000, 100, OverflowPolicy::Drop),
        sink.clone(),
        None,
        None,
    );

    for _ in 0..5 {
        assert!(recorder.record("aaa", VisitContext::default()).await);
    }
    for _ in 0..2 {
        assert!(recorder.record("bbb", VisitContext::default()).await);
    }
    recorder.shutdown().await;

    assert_eq!(sink.total_for("aaa"), 5);
    assert_eq!(sink.total_for("bbb"), 2);

    let stats = recorder.stats();
    assert_eq!(stats.submitted, 7);
    assert_eq!(stats.processed, 7);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.pending(), 0);
}

#[tokio::test]
async fn test_publisher_sees_events_in_submission_order() {
    let sink = Arc::new(CountingSink::default());
    let publisher = Arc::new(CapturingPublisher::default());
    let recorder = VisitRecorder::start(
        options(1_000, 4, OverflowPolicy::Block),
        sink,
        None,
        Some(publisher.clone() as Arc<dyn VisitEventPublisher>),
    );

    for i in 0..10 {
        let ctx = VisitContext {
            ip: Some(format!("10.0.0.{}", i)),
            ..Default::default()
        };
        recorder.record("ord", ctx).await;
    }
    recorder.shutdown().await;

    let ips: Vec<String> = publisher
        .events
        .lock()
        .iter()
        .filter_map(|e| e.ip.clone())
        .collect();
    let expected: Vec<String> = (0..10).map(|i| format!("10.0.0.{}", i)).collect();
    assert_eq!(ips, expected);
}

#[tokio::test]
async fn test_slow_sink_never_blocks_submit() {
    let sink = Arc::new(CountingSink {
        delay: Some(Duration::from_millis(300)),
        ..Default::default()
    });
    let recorder = VisitRecorder::start(
        options(2, 1, OverflowPolicy::Drop),
        sink.clone(),
        None,
        None,
    );

    let started = Instant::now();
    for _ in 0..50 {
        recorder.record("slow", VisitContext::default()).await;
    }
    assert!(
        started.elapsed() < Duration::from_millis(200),
        "submits waited on the sink: {:?}",
        started.elapsed()
    );

    let stats = recorder.stats();
    assert!(stats.dropped > 0);
    assert_eq!(stats.submitted + stats.dropped, 50);
}

#[tokio::test]
async fn test_failing_sink_counted_not_retried() {
    let sink = Arc::new(CountingSink {
        fail: true,
        ..Default::default()
    });
    let recorder = VisitRecorder::start(
        options(100, 10, OverflowPolicy::Drop),
        sink.clone(),
        None,
        None,
    );

    for _ in 0..3 {
        recorder.record("bad", VisitContext::default()).await;
    }
    recorder.shutdown().await;

    let stats = recorder.stats();
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.processed, 0);
    assert!(sink.calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_disabled_recorder_ignores_visits() {
    let recorder = VisitRecorder::disabled();
    assert!(!recorder.is_enabled());
    assert!(!recorder.record("x", VisitContext::default()).await);
    recorder.shutdown().await;
    assert_eq!(recorder.stats().submitted, 0);
}

#[tokio::test]
async fn test_recorder_writes_counts_and_logs_to_store() {
    let temp_dir = TempDir::new().unwrap();
    let storage = StorageFactory::create(&DatabaseConfig {
        database_url: format!(
            "sqlite://{}?mode=rwc",
            temp_dir.path().join("analytics.db").display()
        ),
        ..Default::default()
    })
    .await
    .unwrap();

    storage
        .create(
            &NewLink {
                code: "logged".to_string(),
                original_url: "https://example.com/logged".to_string(),
                ..Default::default()
            }
            .into_record(chrono::Utc::now()),
        )
        .await
        .unwrap();

    let recorder = VisitRecorder::start(
        RecorderOptions {
            enable_visit_log: true,
            ..options(100, 10, OverflowPolicy::Drop)
        },
        storage.clone(),
        Some(storage.clone() as Arc<dyn VisitLogSink>),
        None,
    );

    for ip in ["1.1.1.1", "2.2.2.2"] {
        recorder
            .record(
                "logged",
                VisitContext {
                    ip: Some(ip.to_string()),
                    user_agent: Some("agent".to_string()),
                    referer: None,
                },
            )
            .await;
    }
    // 不存在的短码只影响 0 行，不算失败
    recorder.record("ghost", VisitContext::default()).await;
    recorder.shutdown().await;

    assert_eq!(storage.get_by_code("logged").await.unwrap().visit_count, 2);
    let stats = storage.visit_stats("logged").await.unwrap();
    assert_eq!(stats.total_visits, 2);
    assert_eq!(stats.unique_ips, 2);
    assert_eq!(recorder.stats().failed, 0);
}

#[tokio::test]
async fn test_count_flush_evicts_primary_cache_key() {
    let cache = Arc::new(MemoryLinkCache::new(100));
    let record = NewLink {
        code: "hot".to_string(),
        original_url: "https://example.com/hot".to_string(),
        owner: None,
        title: None,
        description: None,
        expire_at: None,
    }
    .into_record(chrono::Utc::now());
    cache.put(&record, Duration::from_secs(60)).await.unwrap();

    let ok_sink = Arc::new(CountingSink::default());
    let evicting = CacheEvictingCountSink::new(ok_sink.clone(), cache.clone());
    evicting
        .flush_counts(vec![("hot".to_string(), 2)])
        .await
        .unwrap();

    assert_eq!(ok_sink.total_for("hot"), 2);
    assert!(cache.get_by_code("hot").await.unwrap().is_none());
    // URL 索引保留
    assert_eq!(
        cache
            .get_code_by_url("https://example.com/hot")
            .await
            .unwrap()
            .as_deref(),
        Some("hot")
    );

    // 落库失败时缓存保持不变
    cache.put(&record, Duration::from_secs(60)).await.unwrap();
    let failing = CacheEvictingCountSink::new(
        Arc::new(CountingSink {
            fail: true,
            ..Default::default()
        }),
        cache.clone(),
    );
    assert!(
        failing
            .flush_counts(vec![("hot".to_string(), 1)])
            .await
            .is_err()
    );
    assert!(cache.get_by_code("hot").await.unwrap().is_some());
}
