use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::analytics::{
    CacheEvictingCountSink, RecorderOptions, TracingPublisher, VisitCountSink,
    VisitEventPublisher, VisitLogSink, VisitRecorder,
};
use crate::cache::{CacheFactory, LinkCache};
use crate::config::StaticConfig;
use crate::idgen::{CodeGenerator, build_generator};
use crate::services::{
    LinkLookup, LinkService, LinkServiceOptions, RedirectResolver, RemoteLinkLookup, StoreLookup,
};
use crate::storage::{LinkStore, SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub cache: Arc<dyn LinkCache>,
    pub generator: Arc<dyn CodeGenerator>,
    pub recorder: Arc<VisitRecorder>,
    pub link_service: Arc<LinkService>,
    pub resolver: Arc<RedirectResolver>,
}

/// 准备服务器启动的上下文：存储、缓存、分配器、访问统计、服务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let cache = CacheFactory::create(&config.cache)
        .await
        .context("Failed to create cache")?;

    let generator = build_generator(&config.idgen).context("Failed to build code generator")?;

    let recorder = Arc::new(build_recorder(config, &storage, &cache));

    let store: Arc<dyn LinkStore> = storage.clone();
    let options = LinkServiceOptions::from_config(config);
    let cache_ttl = options.cache_ttl;
    let link_service = Arc::new(LinkService::new(
        store.clone(),
        cache.clone(),
        generator.clone(),
        recorder.clone(),
        options,
    ));

    let upstream: Arc<dyn LinkLookup> = match config.redirect.upstream_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            let timeout = Duration::from_millis(config.redirect.upstream_timeout_ms.max(1));
            info!("Redirect upstream: remote link service at {}", url);
            Arc::new(RemoteLinkLookup::new(url, timeout))
        }
        _ => Arc::new(StoreLookup::new(store)),
    };
    let resolver = Arc::new(RedirectResolver::new(
        cache.clone(),
        upstream,
        recorder.clone(),
        cache_ttl,
    ));

    info!(
        "Startup completed in {:?}: storage={}, cache={}, idgen={}, redirect upstream={}, visit accounting={}",
        start_time.elapsed(),
        storage.backend_name(),
        cache.backend_name(),
        generator.name(),
        resolver.upstream_name(),
        if recorder.is_enabled() { "on" } else { "off" }
    );

    Ok(StartupContext {
        storage,
        cache,
        generator,
        recorder,
        link_service,
        resolver,
    })
}

fn build_recorder(
    config: &StaticConfig,
    storage: &Arc<SeaOrmStorage>,
    cache: &Arc<dyn LinkCache>,
) -> VisitRecorder {
    if !config.analytics.enabled {
        warn!("Visit accounting is disabled in configuration");
        return VisitRecorder::disabled();
    }

    let options = RecorderOptions::from(&config.analytics);
    let counts: Arc<dyn VisitCountSink> = Arc::new(CacheEvictingCountSink::new(
        storage.clone() as Arc<dyn VisitCountSink>,
        Arc::clone(cache),
    ));
    let logs: Option<Arc<dyn VisitLogSink>> = if options.enable_visit_log {
        Some(storage.clone() as Arc<dyn VisitLogSink>)
    } else {
        None
    };
    let publisher: Option<Arc<dyn VisitEventPublisher>> = if config.analytics.publish_events {
        Some(Arc::new(TracingPublisher) as Arc<dyn VisitEventPublisher>)
    } else {
        None
    };

    debug!(
        "VisitRecorder initialized: capacity={}, batch_size={}, flush_interval={:?}",
        options.queue.capacity, options.queue.batch_size, options.queue.flush_interval
    );
    VisitRecorder::start(options, counts, logs, publisher)
}
