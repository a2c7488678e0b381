//! Link API 访问统计

use std::sync::Arc;

use actix_web::{Responder, web};
use tracing::trace;

use crate::services::LinkService;
use crate::storage::SeaOrmStorage;

use super::helpers::{api_result, error_from_shorturl};
use super::types::VisitLogsQuery;

const DEFAULT_LOG_LIMIT: u64 = 50;
const MAX_LOG_LIMIT: u64 = 1000;

/// 单链接汇总统计：总访问、独立 IP、今日访问
pub async fn get_link_stats(
    service: web::Data<Arc<LinkService>>,
    storage: web::Data<Arc<SeaOrmStorage>>,
    path: web::Path<String>,
) -> impl Responder {
    let code = path.into_inner();

    if let Err(e) = service.get_link(&code).await {
        return error_from_shorturl(&e);
    }

    trace!("Link API: stats for {}", code);
    api_result(storage.visit_stats(&code).await)
}

/// 最近访问日志，按时间倒序
pub async fn get_visit_logs(
    service: web::Data<Arc<LinkService>>,
    storage: web::Data<Arc<SeaOrmStorage>>,
    path: web::Path<String>,
    query: web::Query<VisitLogsQuery>,
) -> impl Responder {
    let code = path.into_inner();

    if let Err(e) = service.get_link(&code).await {
        return error_from_shorturl(&e);
    }

    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    api_result(storage.recent_visits(&code, limit).await)
}
