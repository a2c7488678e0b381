//! Redirect resolver tests
//!
//! Cache / upstream interplay with a scripted upstream, plus the remote
//! lookup client against a local actix server.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actix_web::{App, HttpResponse, HttpServer, web};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;

use shorturl::analytics::{VisitContext, VisitRecorder};
use shorturl::cache::{LinkCache, MemoryLinkCache};
use shorturl::errors::{Result, ShortUrlError};
use shorturl::services::{LinkDetail, LinkLookup, RedirectResolver, RemoteLinkLookup};
use shorturl::storage::{LinkStatus, NewLink, ShortLinkRecord};

// =============================================================================
// Scripted upstream
// =============================================================================

#[derive(Default)]
struct ScriptedLookup {
    records: Mutex<HashMap<String, Result<ShortLinkRecord>>>,
    calls: AtomicUsize,
}

impl ScriptedLookup {
    fn with(self, code: &str, answer: Result<ShortLinkRecord>) -> Self {
        self.records.lock().insert(code.to_string(), answer);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkLookup for ScriptedLookup {
    async fn lookup(&self, code: &str) -> Result<ShortLinkRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .get(code)
            .cloned()
            .unwrap_or_else(|| Err(ShortUrlError::not_found(code)))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn record(code: &str, url: &str) -> ShortLinkRecord {
    NewLink {
        code: code.to_string(),
        original_url: url.to_string(),
        ..Default::default()
    }
    .into_record(Utc::now())
}

fn resolver(
    cache: Arc<MemoryLinkCache>,
    upstream: Arc<ScriptedLookup>,
) -> RedirectResolver {
    RedirectResolver::new(
        cache,
        upstream,
        Arc::new(VisitRecorder::disabled()),
        Duration::from_secs(60),
    )
}

// =============================================================================
// Resolver
// =============================================================================

#[tokio::test]
async fn test_miss_then_hit_consults_upstream_once() {
    let cache = Arc::new(MemoryLinkCache::new(100));
    let upstream = Arc::new(
        ScriptedLookup::default().with("abc", Ok(record("abc", "https://example.com/abc"))),
    );
    let resolver = resolver(cache.clone(), upstream.clone());

    for _ in 0..3 {
        let target = resolver
            .resolve("abc", VisitContext::default())
            .await
            .unwrap();
        assert_eq!(target, "https://example.com/abc");
    }

    assert_eq!(upstream.calls(), 1);
    assert!(cache.get_by_code("abc").await.unwrap().is_some());
    assert_eq!(
        cache
            .get_code_by_url("https://example.com/abc")
            .await
            .unwrap()
            .as_deref(),
        Some("abc")
    );
}

#[tokio::test]
async fn test_unknown_code_not_found() {
    let cache = Arc::new(MemoryLinkCache::new(100));
    let upstream = Arc::new(ScriptedLookup::default());
    let resolver = resolver(cache, upstream);

    let err = resolver
        .resolve("ghost", VisitContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ShortUrlError::NotFound(_)));
}

#[tokio::test]
async fn test_upstream_unavailable_propagates() {
    let cache = Arc::new(MemoryLinkCache::new(100));
    let upstream = Arc::new(
        ScriptedLookup::default().with("down", Err(ShortUrlError::unavailable("no route"))),
    );
    let resolver = resolver(cache, upstream);

    let err = resolver
        .resolve("down", VisitContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ShortUrlError::Unavailable(_)));
}

#[tokio::test]
async fn test_disabled_and_expired_are_gone() {
    let mut disabled = record("off", "https://example.com/off");
    disabled.status = LinkStatus::Disabled;
    let mut expired = record("old", "https://example.com/old");
    expired.expire_at = Some(Utc::now() - ChronoDuration::seconds(1));

    let cache = Arc::new(MemoryLinkCache::new(100));
    let upstream = Arc::new(
        ScriptedLookup::default()
            .with("off", Ok(disabled))
            .with("old", Ok(expired)),
    );
    let resolver = resolver(cache, upstream.clone());

    for code in ["off", "old"] {
        let err = resolver
            .resolve(code, VisitContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ShortUrlError::Gone(_)), "{}: {:?}", code, err);
    }

    // 不可解析的缓存命中总会回源确认
    let _ = resolver.resolve("off", VisitContext::default()).await;
    assert_eq!(upstream.calls(), 3);
}

#[tokio::test]
async fn test_cached_entry_expiring_between_writes_is_gone() {
    let mut soon = record("soon", "https://example.com/soon");
    soon.expire_at = Some(Utc::now() + ChronoDuration::milliseconds(50));

    let cache = Arc::new(MemoryLinkCache::new(100));
    let upstream = Arc::new(ScriptedLookup::default().with("soon", Ok(soon)));
    let resolver = resolver(cache, upstream);

    assert!(resolver.resolve("soon", VisitContext::default()).await.is_ok());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let err = resolver
        .resolve("soon", VisitContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ShortUrlError::Gone(_)));
}

// =============================================================================
// Remote lookup
// =============================================================================

async fn remote_link(path: web::Path<String>) -> HttpResponse {
    let code = path.into_inner();
    match code.as_str() {
        "live" => {
            let detail = LinkDetail::from(&record("live", "https://example.com/live"));
            HttpResponse::Ok().json(serde_json::json!({
                "code": 0,
                "message": "OK",
                "data": detail,
            }))
        }
        "rejected" => HttpResponse::Ok().json(serde_json::json!({
            "code": 3000,
            "message": "not found",
        })),
        "garbled" => HttpResponse::Ok()
            .content_type("application/json")
            .body("{not json"),
        "boom" => HttpResponse::InternalServerError().finish(),
        _ => HttpResponse::NotFound().json(serde_json::json!({
            "code": 3000,
            "message": "not found",
        })),
    }
}

#[actix_rt::test]
async fn test_remote_lookup_against_live_server() {
    let server = HttpServer::new(|| {
        App::new().route("/api/links/{code}", web::get().to(remote_link))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind");
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);

    let lookup = RemoteLinkLookup::new(&format!("http://{}/", addr), Duration::from_secs(2));
    assert_eq!(lookup.base_url(), format!("http://{}", addr));

    let live = lookup.lookup("live").await.unwrap();
    assert_eq!(live.code, "live");
    assert_eq!(live.original_url, "https://example.com/live");
    assert_eq!(live.status, LinkStatus::Active);

    let missing = lookup.lookup("missing").await.unwrap_err();
    assert!(matches!(missing, ShortUrlError::NotFound(_)), "{:?}", missing);

    let rejected = lookup.lookup("rejected").await.unwrap_err();
    assert!(matches!(rejected, ShortUrlError::NotFound(_)), "{:?}", rejected);

    let garbled = lookup.lookup("garbled").await.unwrap_err();
    assert!(
        matches!(garbled, ShortUrlError::Serialization(_)),
        "{:?}",
        garbled
    );

    let boom = lookup.lookup("boom").await.unwrap_err();
    assert!(matches!(boom, ShortUrlError::NotFound(_)), "{:?}", boom);

    handle.stop(true).await;
}

#[tokio::test]
async fn test_remote_lookup_unreachable_is_unavailable() {
    // 占用后立即释放，得到一个没有监听者的端口
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let lookup = RemoteLinkLookup::new(
        &format!("http://127.0.0.1:{}", port),
        Duration::from_millis(500),
    );
    let err = lookup.lookup("abc").await.unwrap_err();
    assert!(matches!(err, ShortUrlError::Unavailable(_)), "{:?}", err);
}

#[tokio::test]
async fn test_remote_lookup_rejects_invalid_code_locally() {
    let lookup = RemoteLinkLookup::new("http://127.0.0.1:9", Duration::from_millis(100));
    let err = lookup.lookup("../etc/passwd").await.unwrap_err();
    assert!(matches!(err, ShortUrlError::NotFound(_)));
}

#[tokio::test]
async fn test_resolver_with_unreachable_remote() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let cache = Arc::new(MemoryLinkCache::new(100));
    let remote = Arc::new(RemoteLinkLookup::new(
        &format!("http://127.0.0.1:{}", port),
        Duration::from_millis(500),
    ));
    let resolver = RedirectResolver::new(
        cache.clone(),
        remote,
        Arc::new(VisitRecorder::disabled()),
        Duration::from_secs(60),
    );
    assert_eq!(resolver.upstream_name(), "remote");

    let err = resolver
        .resolve("abc", VisitContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ShortUrlError::Unavailable(_)));

    // 缓存命中时不需要上游
    cache
        .put(&record("abc", "https://example.com/cached"), Duration::from_secs(60))
        .await
        .unwrap();
    let target = resolver
        .resolve("abc", VisitContext::default())
        .await
        .unwrap();
    assert_eq!(target, "https://example.com/cached");
}
