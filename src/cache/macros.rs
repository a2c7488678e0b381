/// 通过 ctor 在启动时把缓存实现注册到插件表
///
/// 类型需提供 `async fn from_config(CacheConfig) -> Result<Self>`。
#[macro_export]
macro_rules! declare_cache_plugin {
    ($name:expr, $ty:ty) => {
        #[ctor::ctor]
        fn __register_cache_plugin() {
            use std::sync::Arc;
            use $crate::cache::register::{BoxedLinkCacheFuture, register_cache_plugin};

            register_cache_plugin(
                $name,
                Arc::new(|config: $crate::config::CacheConfig| {
                    Box::pin(async move {
                        <$ty>::from_config(config)
                            .await
                            .map(|cache| Box::new(cache) as Box<dyn $crate::cache::LinkCache>)
                    }) as BoxedLinkCacheFuture
                }),
            );
        }
    };
}
