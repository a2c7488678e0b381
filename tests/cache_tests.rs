//! Cache layer tests
//!
//! Memory and null backends are exercised directly; the Redis backend runs
//! only when `SHORTURL_TEST_REDIS_URL` points at a live server.

use std::time::Duration;

use chrono::Utc;

use shorturl::cache::{CacheFactory, LinkCache, MemoryLinkCache, NullLinkCache, RedisLinkCache};
use shorturl::config::CacheConfig;
use shorturl::errors::ShortUrlError;
use shorturl::storage::{LinkStatus, ShortLinkRecord};

fn record(code: &str, url: &str) -> ShortLinkRecord {
    let now = Utc::now();
    ShortLinkRecord {
        code: code.to_string(),
        original_url: url.to_string(),
        owner: None,
        title: Some("cached".to_string()),
        description: None,
        status: LinkStatus::Active,
        expire_at: None,
        visit_count: 7,
        created_at: now,
        updated_at: now,
    }
}

async fn exercise_dual_index(cache: &dyn LinkCache) {
    let rec = record("dual1", "https://example.com/dual");
    cache.put(&rec, Duration::from_secs(60)).await.unwrap();

    assert_eq!(cache.get_by_code("dual1").await.unwrap(), Some(rec.clone()));
    assert_eq!(
        cache
            .get_code_by_url("https://example.com/dual")
            .await
            .unwrap()
            .as_deref(),
        Some("dual1")
    );
    assert!(cache.exists("dual1").await.unwrap());

    // 只删主键
    cache.invalidate("dual1").await.unwrap();
    assert_eq!(cache.get_by_code("dual1").await.unwrap(), None);
    assert!(!cache.exists("dual1").await.unwrap());
    assert_eq!(
        cache
            .get_code_by_url("https://example.com/dual")
            .await
            .unwrap()
            .as_deref(),
        Some("dual1")
    );

    cache.clear().await.unwrap();
    assert_eq!(
        cache
            .get_code_by_url("https://example.com/dual")
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_memory_cache_dual_index() {
    let cache = MemoryLinkCache::new(1_000);
    exercise_dual_index(&cache).await;
    assert_eq!(cache.backend_name(), "memory");
}

#[tokio::test]
async fn test_memory_cache_entries_expire_with_ttl() {
    let cache = MemoryLinkCache::new(1_000);
    let rec = record("ttl1", "https://example.com/ttl");

    cache.put(&rec, Duration::from_millis(50)).await.unwrap();
    assert!(cache.get_by_code("ttl1").await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(cache.get_by_code("ttl1").await.unwrap().is_none());
    assert!(
        cache
            .get_code_by_url("https://example.com/ttl")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_memory_cache_overwrite_refreshes_record() {
    let cache = MemoryLinkCache::new(1_000);
    let mut rec = record("ow1", "https://example.com/ow");
    cache.put(&rec, Duration::from_secs(60)).await.unwrap();

    rec.status = LinkStatus::Disabled;
    cache.put(&rec, Duration::from_secs(60)).await.unwrap();

    let cached = cache.get_by_code("ow1").await.unwrap().unwrap();
    assert_eq!(cached.status, LinkStatus::Disabled);
}

#[tokio::test]
async fn test_null_cache_always_misses() {
    let cache = NullLinkCache;
    let rec = record("null1", "https://example.com/null");

    cache.put(&rec, Duration::from_secs(60)).await.unwrap();
    assert_eq!(cache.get_by_code("null1").await.unwrap(), None);
    assert_eq!(
        cache
            .get_code_by_url("https://example.com/null")
            .await
            .unwrap(),
        None
    );
    assert!(!cache.exists("null1").await.unwrap());
    assert_eq!(cache.backend_name(), "null");
}

#[tokio::test]
async fn test_unknown_cache_plugin_rejected() {
    let config = CacheConfig {
        cache_type: "does-not-exist".to_string(),
        ..Default::default()
    };
    let err = CacheFactory::create(&config).await.err().unwrap();
    assert!(matches!(err, ShortUrlError::CachePluginNotFound(_)));
}

#[tokio::test]
async fn test_redis_cache_dual_index() {
    let Ok(url) = std::env::var("SHORTURL_TEST_REDIS_URL") else {
        eprintln!("SHORTURL_TEST_REDIS_URL not set, skipping");
        return;
    };

    let prefix = format!("shorturl-test-{}:", std::process::id());
    let cache = RedisLinkCache::connect(&url, &prefix)
        .await
        .expect("connect redis");
    exercise_dual_index(&cache).await;
}
