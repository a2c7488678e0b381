use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::cache::LinkCache;
use crate::config::CacheConfig;
use crate::errors::Result;

pub type BoxedLinkCacheFuture = Pin<Box<dyn Future<Output = Result<Box<dyn LinkCache>>> + Send>>;
pub type LinkCacheConstructor = Arc<dyn Fn(CacheConfig) -> BoxedLinkCacheFuture + Send + Sync>;

static CACHE_REGISTRY: Lazy<RwLock<HashMap<String, LinkCacheConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

pub fn register_cache_plugin<S: Into<String>>(name: S, constructor: LinkCacheConstructor) {
    CACHE_REGISTRY.write().insert(name.into(), constructor);
}

pub fn get_cache_plugin(name: &str) -> Option<LinkCacheConstructor> {
    CACHE_REGISTRY.read().get(name).cloned()
}

pub fn registered_cache_plugins() -> Vec<String> {
    let mut names: Vec<String> = CACHE_REGISTRY.read().keys().cloned().collect();
    names.sort();
    names
}
