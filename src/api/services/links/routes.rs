//! Link API 路由配置

use actix_web::web;

use super::link_ops::{batch_create_links, get_all_links, get_link, post_link, update_link};
use super::stats::{get_link_stats, get_visit_logs};

/// 链接管理路由 `/links`
///
/// - GET /links - 分页列出
/// - POST /links - 创建
/// - POST /links/batch - 批量创建
/// - GET /links/{code} - 查询单个链接
/// - PATCH /links/{code} - 修改状态或过期时间
pub fn links_routes() -> actix_web::Scope {
    web::scope("/links")
        .route("", web::get().to(get_all_links))
        .route("", web::post().to(post_link))
        // 必须在 /{code} 之前
        .route("/batch", web::post().to(batch_create_links))
        .route("/{code}", web::get().to(get_link))
        .route("/{code}", web::patch().to(update_link))
}

/// 统计路由 `/stats`
pub fn stats_routes() -> actix_web::Scope {
    web::scope("/stats")
        .route("/{code}", web::get().to(get_link_stats))
        .route("/{code}/logs", web::get().to(get_visit_logs))
}

/// `/api` 作用域
pub fn api_routes() -> actix_web::Scope {
    web::scope("/api")
        .service(links_routes())
        .service(stats_routes())
}
