//! Link API
//!
//! `/api/links` 与 `/api/stats` 端点，响应统一使用 `{code, message, data}` 信封。

pub mod error_code;
mod helpers;
mod link_ops;
pub mod routes;
mod stats;
mod types;

pub use error_code::ErrorCode;
pub use helpers::{api_result, error_from_shorturl, error_response, success_response};
pub use link_ops::{batch_create_links, get_all_links, get_link, post_link, update_link};
pub use routes::{api_routes, links_routes, stats_routes};
pub use stats::{get_link_stats, get_visit_logs};
pub use types::*;
