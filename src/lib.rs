//! shorturl - short-link generation and cache-coherent resolution
//!
//! # Features
//! - **server**: HTTP server mode (default)
//!
//! # Architecture
//! - `idgen`: short code allocation (snowflake + base62, random)
//! - `storage`: durable link store (sea-orm) and visit logs
//! - `cache`: dual-index link cache (memory / redis / null)
//! - `analytics`: non-blocking visit accounting
//! - `services`: link service, redirect resolver, remote lookup
//! - `api`: HTTP handlers (`server` feature)
//! - `config`: configuration management
//! - `runtime`: startup wiring and server lifecycle
//! - `system`: logging

pub mod analytics;
#[cfg(feature = "server")]
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod idgen;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
