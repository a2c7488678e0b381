use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderMap};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, error, trace, warn};

use crate::analytics::VisitContext;
use crate::config::get_config;
use crate::errors::ShortUrlError;
use crate::services::RedirectResolver;
use crate::utils::ip::extract_client_ip;
use crate::utils::is_valid_short_code;

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        resolver: web::Data<Arc<RedirectResolver>>,
    ) -> impl Responder {
        let captured_path = path.into_inner();
        let config = get_config();

        if captured_path.is_empty() {
            return Self::found(&config.redirect.default_url);
        }
        if !is_valid_short_code(&captured_path) {
            // 非法短码，直接 404（不查缓存、不回源）
            trace!("Invalid short code rejected: {}", &captured_path);
            return Self::not_found_response();
        }

        // 响应前采集访问属性
        let context = VisitContext {
            ip: extract_client_ip(&req, &config.server.trusted_proxies),
            user_agent: header_value(req.headers(), &header::USER_AGENT),
            referer: header_value(req.headers(), &header::REFERER),
        };

        match resolver.resolve(&captured_path, context).await {
            Ok(target) => Self::found(&target),
            Err(e) if e.is_not_found_class() => {
                debug!("Redirect {} not served: {}", &captured_path, e);
                Self::not_found_response()
            }
            Err(ShortUrlError::Unavailable(msg)) => {
                warn!("Redirect {} upstream unavailable: {}", &captured_path, msg);
                Self::unavailable_response()
            }
            Err(e) => {
                error!("Redirect {} failed: {}", &captured_path, e);
                Self::error_response()
            }
        }
    }

    #[inline]
    fn found(target: &str) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, target))
            .finish()
    }

    /// 不存在、已禁用、已过期共用同一个响应
    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "public, max-age=60"))
            .body("Not Found")
    }

    #[inline]
    fn unavailable_response() -> HttpResponse {
        HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Retry-After", "5"))
            .body("Service Unavailable")
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body("Internal Server Error")
    }
}

fn header_value(headers: &HeaderMap, name: &header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Redirect 路由配置
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{path}*", web::get().to(RedirectService::handle_redirect))
        .route("/{path}*", web::head().to(RedirectService::handle_redirect))
}
