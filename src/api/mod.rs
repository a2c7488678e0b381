//! HTTP 接口层（actix-web）

pub mod services;
