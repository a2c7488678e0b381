//! Link service
//!
//! Create path: URL dedup through the cache secondary index and the store,
//! then allocation (custom code or generator), then `LinkStore::create`, which
//! is the only uniqueness check that counts. Read path: cache, then store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::redirect::{RedirectResolver, StoreLookup};
use super::types::{BatchShortenResponse, LinkDetail, LinkPage, ShortenRequest, ShortenResponse};
use crate::analytics::{VisitContext, VisitRecorder};
use crate::cache::LinkCache;
use crate::config::StaticConfig;
use crate::errors::{Result, ShortUrlError};
use crate::idgen::{CodeGenerator, generate_code};
use crate::storage::{LinkStatus, LinkStore, NewLink, ShortLinkRecord};
use crate::utils::{is_reserved_code, is_valid_short_code, validate_url};

const MAX_TITLE_CHARS: usize = 255;
const MAX_DESCRIPTION_CHARS: usize = 500;
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone)]
pub struct LinkServiceOptions {
    /// Prefix for `short_url`, e.g. `https://sho.rt`
    pub domain: String,
    pub cache_ttl: Duration,
    /// Extra attempts after a generated-code collision
    pub max_create_retries: u32,
    pub max_batch_size: usize,
    pub max_custom_code_length: usize,
}

impl Default for LinkServiceOptions {
    fn default() -> Self {
        Self {
            domain: "http://localhost:8080".to_string(),
            cache_ttl: Duration::from_secs(3600),
            max_create_retries: 3,
            max_batch_size: 100,
            max_custom_code_length: 32,
        }
    }
}

impl LinkServiceOptions {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            domain: config.shortener.domain.trim_end_matches('/').to_string(),
            cache_ttl: Duration::from_secs(config.cache.default_ttl),
            max_create_retries: config.shortener.max_create_retries,
            max_batch_size: config.shortener.max_batch_size,
            max_custom_code_length: config.shortener.max_custom_code_length,
        }
    }
}

pub struct LinkService {
    store: Arc<dyn LinkStore>,
    cache: Arc<dyn LinkCache>,
    generator: Arc<dyn CodeGenerator>,
    resolver: RedirectResolver,
    options: LinkServiceOptions,
}

impl LinkService {
    pub fn new(
        store: Arc<dyn LinkStore>,
        cache: Arc<dyn LinkCache>,
        generator: Arc<dyn CodeGenerator>,
        recorder: Arc<VisitRecorder>,
        options: LinkServiceOptions,
    ) -> Self {
        let resolver = RedirectResolver::new(
            Arc::clone(&cache),
            Arc::new(StoreLookup::new(Arc::clone(&store))),
            recorder,
            options.cache_ttl,
        );

        Self {
            store,
            cache,
            generator,
            resolver,
            options,
        }
    }

    pub fn options(&self) -> &LinkServiceOptions {
        &self.options
    }

    // ============ Create ============

    pub async fn create_link(&self, req: ShortenRequest) -> Result<ShortenResponse> {
        let original_url = validate_url(&req.original_url)?.to_string();
        let custom_code = req
            .custom_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        validate_metadata(&req)?;

        let template = NewLink {
            code: String::new(),
            original_url,
            owner: None,
            title: req.title,
            description: req.description,
            expire_at: req.expire_at,
        };

        if let Some(existing) = self.find_existing(&template.original_url).await? {
            debug!(
                "URL already shortened as {}: {}",
                existing.code, existing.original_url
            );
            return Ok(self.build_response(&existing));
        }

        let record = match custom_code {
            Some(code) => self.create_with_custom_code(code, template).await?,
            None => self.create_with_generated_code(template).await?,
        };

        Ok(self.build_response(&record))
    }

    /// Dedup lookup: cache secondary index first, then the store
    async fn find_existing(&self, url: &str) -> Result<Option<ShortLinkRecord>> {
        if let Some(code) = self.cache_code_by_url(url).await {
            match self.store.get_by_code(&code).await {
                Ok(record) if record.original_url == url => return Ok(Some(record)),
                Ok(_) | Err(ShortUrlError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        match self.store.get_by_url(url).await? {
            Some(record) => {
                self.populate_cache(&record).await;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn create_with_custom_code(
        &self,
        code: String,
        template: NewLink,
    ) -> Result<ShortLinkRecord> {
        self.validate_custom_code(&code)?;

        if self.cache_exists(&code).await {
            return Err(ShortUrlError::conflict(format!("短码已存在: {}", code)));
        }
        match self.store.get_by_code(&code).await {
            Ok(_) => return Err(ShortUrlError::conflict(format!("短码已存在: {}", code))),
            Err(ShortUrlError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let record = NewLink { code, ..template }.into_record(Utc::now());
        // 并发下仍可能冲突，由存储层的唯一约束兜底
        self.store.create(&record).await?;
        self.populate_cache(&record).await;

        info!("Created link {} -> {} (custom)", record.code, record.original_url);
        Ok(record)
    }

    async fn create_with_generated_code(&self, template: NewLink) -> Result<ShortLinkRecord> {
        let max_attempts = self.options.max_create_retries.saturating_add(1);

        for attempt in 1..=max_attempts {
            let code = generate_code(self.generator.as_ref()).await?;

            if self.generator.requires_existence_check() && self.code_taken(&code).await? {
                debug!("Generated code {} already taken (attempt {})", code, attempt);
                continue;
            }

            let record = NewLink {
                code,
                ..template.clone()
            }
            .into_record(Utc::now());

            match self.store.create(&record).await {
                Ok(()) => {
                    self.populate_cache(&record).await;
                    info!("Created link {} -> {}", record.code, record.original_url);
                    return Ok(record);
                }
                Err(ShortUrlError::Conflict(_)) => {
                    warn!(
                        "Generated code {} collided (attempt {}/{})",
                        record.code, attempt, max_attempts
                    );
                    // 另一个创建者可能刚写入同一 URL
                    if let Some(existing) = self.store.get_by_url(&record.original_url).await? {
                        self.populate_cache(&existing).await;
                        return Ok(existing);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(ShortUrlError::conflict(format!(
            "无法分配短码，已重试 {} 次",
            max_attempts
        )))
    }

    async fn code_taken(&self, code: &str) -> Result<bool> {
        if self.cache_exists(code).await {
            return Ok(true);
        }
        match self.store.get_by_code(code).await {
            Ok(_) => Ok(true),
            Err(ShortUrlError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn validate_custom_code(&self, code: &str) -> Result<()> {
        if !is_valid_short_code(code) {
            return Err(ShortUrlError::validation(format!(
                "Invalid short code '{}': only [0-9A-Za-z_-] allowed",
                code
            )));
        }
        if code.len() > self.options.max_custom_code_length {
            return Err(ShortUrlError::validation(format!(
                "Short code '{}' exceeds {} characters",
                code, self.options.max_custom_code_length
            )));
        }
        if is_reserved_code(code) {
            return Err(ShortUrlError::validation(format!(
                "Short code '{}' is reserved",
                code
            )));
        }
        Ok(())
    }

    /// Each URL goes through [`create_link`](Self::create_link) on its own;
    /// one failure never aborts the rest.
    pub async fn batch_create(&self, urls: Vec<String>) -> Result<BatchShortenResponse> {
        if urls.is_empty() || urls.len() > self.options.max_batch_size {
            return Err(ShortUrlError::validation(format!(
                "Batch size must be between 1 and {}, got {}",
                self.options.max_batch_size,
                urls.len()
            )));
        }

        let mut response = BatchShortenResponse {
            results: Vec::with_capacity(urls.len()),
            ..Default::default()
        };

        for url in urls {
            match self.create_link(ShortenRequest::for_url(url.as_str())).await {
                Ok(result) => {
                    response.results.push(result);
                    response.success += 1;
                }
                Err(e) => {
                    debug!("Batch item {} failed: {}", url, e);
                    response.failed += 1;
                }
            }
        }

        info!(
            "Batch create finished: {} succeeded, {} failed",
            response.success, response.failed
        );
        Ok(response)
    }

    // ============ Read ============

    /// Administrative read: returns disabled and expired records too
    pub async fn get_link(&self, code: &str) -> Result<LinkDetail> {
        match self.cache.get_by_code(code).await {
            Ok(Some(record)) => return Ok(LinkDetail::from(&record)),
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed for {}, treating as miss: {}", code, e),
        }

        let record = self.store.get_by_code(code).await?;
        self.populate_cache(&record).await;
        Ok(LinkDetail::from(&record))
    }

    /// Hot path: inactive or expired links yield `Gone`
    pub async fn resolve_for_redirect(&self, code: &str, context: VisitContext) -> Result<String> {
        self.resolver.resolve(code, context).await
    }

    pub async fn list_links(&self, page: u64, page_size: u64) -> Result<LinkPage> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(page_size);

        let (records, total) = self.store.list(offset, page_size).await?;
        Ok(LinkPage {
            items: records.iter().map(LinkDetail::from).collect(),
            total,
            page,
            page_size,
        })
    }

    // ============ Administrative updates ============

    pub async fn set_status(&self, code: &str, status: LinkStatus) -> Result<LinkDetail> {
        let record = self.store.update_status(code, status).await?;
        self.invalidate_cache(code).await;
        info!("Link {} status set to {:?}", code, status);
        Ok(LinkDetail::from(&record))
    }

    pub async fn set_expire_at(
        &self,
        code: &str,
        expire_at: Option<DateTime<Utc>>,
    ) -> Result<LinkDetail> {
        let record = self.store.update_expire_at(code, expire_at).await?;
        self.invalidate_cache(code).await;
        info!("Link {} expire_at set to {:?}", code, expire_at);
        Ok(LinkDetail::from(&record))
    }

    // ============ Cache helpers (errors logged, never surfaced) ============

    async fn populate_cache(&self, record: &ShortLinkRecord) {
        if let Err(e) = self.cache.put(record, self.options.cache_ttl).await {
            warn!("Failed to populate cache for {}: {}", record.code, e);
        }
    }

    async fn invalidate_cache(&self, code: &str) {
        if let Err(e) = self.cache.invalidate(code).await {
            warn!("Failed to invalidate cache for {}: {}", code, e);
        }
    }

    async fn cache_code_by_url(&self, url: &str) -> Option<String> {
        self.cache.get_code_by_url(url).await.unwrap_or_else(|e| {
            warn!("Cache url lookup failed, treating as miss: {}", e);
            None
        })
    }

    async fn cache_exists(&self, code: &str) -> bool {
        self.cache.exists(code).await.unwrap_or_else(|e| {
            warn!("Cache exists probe failed for {}: {}", code, e);
            false
        })
    }

    fn build_response(&self, record: &ShortLinkRecord) -> ShortenResponse {
        ShortenResponse {
            short_code: record.code.clone(),
            short_url: format!("{}/{}", self.options.domain, record.code),
            original_url: record.original_url.clone(),
            created_at: record.created_at,
        }
    }
}

fn validate_metadata(req: &ShortenRequest) -> Result<()> {
    if req
        .title
        .as_deref()
        .is_some_and(|t| t.chars().count() > MAX_TITLE_CHARS)
    {
        return Err(ShortUrlError::validation(format!(
            "Title exceeds {} characters",
            MAX_TITLE_CHARS
        )));
    }
    if req
        .description
        .as_deref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS)
    {
        return Err(ShortUrlError::validation(format!(
            "Description exceeds {} characters",
            MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(())
}
