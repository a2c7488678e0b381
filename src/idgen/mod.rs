//! 短码分配器
//!
//! - `snowflake`: 时间戳 + 节点 + 序列号组合的 64 位整数，Base62 渲染，全局唯一
//! - `random`: 固定长度随机码，需调用方做存在性检查
//!
//! 自定义短码不经过分配器，唯一性由存储层的 `create` 冲突检测保证。

pub mod base62;
pub mod random;
pub mod snowflake;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{IdGenConfig, IdGenMode};
use crate::errors::Result;

pub use random::{RandomGenerator, generate_random_code};
pub use snowflake::{SnowflakeGenerator, SnowflakeId, SystemClock, TWITTER_EPOCH, TimeSource};

/// 单次非阻塞生成的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeStatus {
    Ready(String),
    /// 需要等待 `yield_for` 毫秒后重试
    Pending { yield_for: u64 },
}

/// 短码生成器
pub trait CodeGenerator: Send + Sync {
    /// 生成一个新短码，必要时阻塞当前线程等待
    fn generate(&self) -> Result<String>;

    /// 不阻塞的单次尝试
    fn try_generate(&self) -> Result<CodeStatus> {
        self.generate().map(CodeStatus::Ready)
    }

    /// 生成结果是否可能与已有短码重复（需要提交前检查）
    fn requires_existence_check(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// 异步上下文中的生成：等待通过 tokio 定时器完成，不占用 worker 线程
pub async fn generate_code(generator: &dyn CodeGenerator) -> Result<String> {
    loop {
        match generator.try_generate()? {
            CodeStatus::Ready(code) => return Ok(code),
            CodeStatus::Pending { yield_for } => {
                tokio::time::sleep(Duration::from_millis(yield_for.max(1))).await;
            }
        }
    }
}

/// 根据配置构建生成器
pub fn build_generator(config: &IdGenConfig) -> Result<Arc<dyn CodeGenerator>> {
    let generator: Arc<dyn CodeGenerator> = match config.mode {
        IdGenMode::Snowflake => Arc::new(SnowflakeGenerator::with_system_clock(
            config.node_id,
            config.clock_tolerance_ms,
        )?),
        IdGenMode::Random => Arc::new(RandomGenerator::new(config.code_length)?),
    };

    info!(
        "Code generator initialized: {} (node_id: {}, code_length: {})",
        generator.name(),
        config.node_id,
        config.code_length
    );
    Ok(generator)
}
