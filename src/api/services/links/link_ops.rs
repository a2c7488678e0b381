//! Link API 链接操作

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{Responder, web};
use tracing::{info, trace};

use crate::errors::ShortUrlError;
use crate::services::{BatchShortenRequest, LinkService, ShortenRequest};

use super::error_code::ErrorCode;
use super::helpers::{api_result, error_from_shorturl, error_response, json_response};
use super::types::{GetLinksQuery, UpdateLinkRequest};

const DEFAULT_PAGE_SIZE: u64 = 20;

/// 创建短链接
pub async fn post_link(
    service: web::Data<Arc<LinkService>>,
    body: web::Json<ShortenRequest>,
) -> impl Responder {
    let req = body.into_inner();
    trace!("Link API: create request for {}", req.original_url);

    match service.create_link(req).await {
        Ok(created) => json_response(
            StatusCode::CREATED,
            ErrorCode::Success,
            "Created",
            Some(created),
        ),
        Err(e) => error_from_shorturl(&e),
    }
}

/// 批量创建
pub async fn batch_create_links(
    service: web::Data<Arc<LinkService>>,
    body: web::Json<BatchShortenRequest>,
) -> impl Responder {
    let urls = body.into_inner().urls;
    let max = service.options().max_batch_size;

    if urls.len() > max {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::BatchSizeTooLarge,
            &format!("Batch size {} exceeds limit {}", urls.len(), max),
        );
    }

    let result = service.batch_create(urls).await;
    if let Ok(ref summary) = result {
        info!(
            "Link API: batch create {} ok / {} failed",
            summary.success, summary.failed
        );
    }
    api_result(result)
}

/// 分页列出链接（按创建时间倒序）
pub async fn get_all_links(
    service: web::Data<Arc<LinkService>>,
    query: web::Query<GetLinksQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    api_result(service.list_links(page, page_size).await)
}

/// 查询单个链接（远程查询端点，包含已禁用和已过期的链接）
pub async fn get_link(
    service: web::Data<Arc<LinkService>>,
    path: web::Path<String>,
) -> impl Responder {
    let code = path.into_inner();
    api_result(service.get_link(&code).await)
}

/// 修改状态或过期时间
pub async fn update_link(
    service: web::Data<Arc<LinkService>>,
    path: web::Path<String>,
    body: web::Json<UpdateLinkRequest>,
) -> impl Responder {
    let code = path.into_inner();
    let update = body.into_inner();

    if update.status.is_none() && update.expire_at.is_none() {
        return error_from_shorturl(&ShortUrlError::validation(
            "Nothing to update: provide status and/or expire_at",
        ));
    }

    let mut detail = None;
    if let Some(status) = update.status {
        match service.set_status(&code, status).await {
            Ok(d) => detail = Some(d),
            Err(e) => return error_from_shorturl(&e),
        }
    }
    if let Some(expire_at) = update.expire_at {
        match service.set_expire_at(&code, expire_at).await {
            Ok(d) => detail = Some(d),
            Err(e) => return error_from_shorturl(&e),
        }
    }

    info!("Link API: updated link {}", code);
    json_response(StatusCode::OK, ErrorCode::Success, "Updated", detail)
}
