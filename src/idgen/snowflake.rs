//! Snowflake 风格的短码生成器
//!
//! 64 位整数布局（高位到低位）：
//! - 1 bit 保留（恒为 0）
//! - 41 bits 毫秒时间戳（自 [`TWITTER_EPOCH`] 起）
//! - 10 bits 节点 ID
//! - 12 bits 同一毫秒内的序列号
//!
//! 同一毫秒序列号耗尽时等待下一毫秒，绝不复用序列号。
//! 时钟回拨在容忍范围内时等待追平；超出容忍范围则该实例永久失效。

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{error, trace};

use super::{CodeGenerator, CodeStatus, base62};
use crate::errors::{Result, ShortUrlError};

/// Twitter snowflake 纪元（2010-11-04T01:42:54.657Z）
pub const TWITTER_EPOCH: u64 = 1_288_834_974_657;

const TIMESTAMP_BITS: u32 = 41;
const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;

pub const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;
pub const MAX_NODE_ID: u16 = (1 << NODE_BITS) - 1;
pub const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;

const NODE_SHIFT: u32 = SEQUENCE_BITS;
const TIMESTAMP_SHIFT: u32 = SEQUENCE_BITS + NODE_BITS;

/// 时间源：返回自纪元以来的毫秒数
pub trait TimeSource: Send + Sync {
    fn current_millis(&self) -> u64;
}

/// 基于系统时钟的时间源
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: u64,
}

impl SystemClock {
    pub fn with_epoch(epoch: u64) -> Self {
        Self { epoch }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_epoch(TWITTER_EPOCH)
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        now.saturating_sub(self.epoch)
    }
}

/// 组合后的 64 位 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId(u64);

impl SnowflakeId {
    pub fn from_components(timestamp: u64, node_id: u16, sequence: u16) -> Self {
        Self(
            ((timestamp & MAX_TIMESTAMP) << TIMESTAMP_SHIFT)
                | (u64::from(node_id & MAX_NODE_ID) << NODE_SHIFT)
                | u64::from(sequence & MAX_SEQUENCE),
        )
    }

    pub fn timestamp(&self) -> u64 {
        self.0 >> TIMESTAMP_SHIFT
    }

    pub fn node_id(&self) -> u16 {
        ((self.0 >> NODE_SHIFT) & u64::from(MAX_NODE_ID)) as u16
    }

    pub fn sequence(&self) -> u16 {
        (self.0 & u64::from(MAX_SEQUENCE)) as u16
    }

    pub fn to_u64(self) -> u64 {
        self.0
    }

    /// Base62 渲染后的短码
    pub fn to_code(self) -> String {
        base62::encode(self.0)
    }
}

/// 单次生成尝试的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    Ready { id: SnowflakeId },
    /// 需要等待 `yield_for` 毫秒后重试（序列耗尽或小幅时钟回拨）
    Pending { yield_for: u64 },
}

struct GeneratorState {
    last_timestamp: u64,
    sequence: u16,
}

/// 线程安全的 Snowflake 生成器
pub struct SnowflakeGenerator<T: TimeSource = SystemClock> {
    node_id: u16,
    state: Mutex<GeneratorState>,
    time: T,
    clock_tolerance_ms: u64,
    poisoned: AtomicBool,
}

impl SnowflakeGenerator<SystemClock> {
    pub fn with_system_clock(node_id: u16, clock_tolerance_ms: u64) -> Result<Self> {
        Self::new(node_id, SystemClock::default(), clock_tolerance_ms)
    }
}

impl<T: TimeSource> SnowflakeGenerator<T> {
    pub fn new(node_id: u16, time: T, clock_tolerance_ms: u64) -> Result<Self> {
        if node_id > MAX_NODE_ID {
            return Err(ShortUrlError::validation(format!(
                "Snowflake node id {} out of range (0..={})",
                node_id, MAX_NODE_ID
            )));
        }

        Ok(Self {
            node_id,
            state: Mutex::new(GeneratorState {
                last_timestamp: 0,
                sequence: 0,
            }),
            time,
            clock_tolerance_ms,
            poisoned: AtomicBool::new(false),
        })
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }

    /// 尝试生成下一个 ID，不阻塞
    pub fn try_next_id(&self) -> Result<IdGenStatus> {
        if self.is_poisoned() {
            return Err(ShortUrlError::clock_regression(
                "Snowflake generator disabled after clock regression",
            ));
        }

        let now = self.time.current_millis();
        if now > MAX_TIMESTAMP {
            return Err(ShortUrlError::internal(format!(
                "Timestamp {} exceeds snowflake range",
                now
            )));
        }

        let mut state = self.state.lock();
        match now.cmp(&state.last_timestamp) {
            std::cmp::Ordering::Equal => {
                if state.sequence < MAX_SEQUENCE {
                    state.sequence += 1;
                    Ok(IdGenStatus::Ready {
                        id: SnowflakeId::from_components(now, self.node_id, state.sequence),
                    })
                } else {
                    trace!("Snowflake sequence exhausted at {}", now);
                    Ok(IdGenStatus::Pending { yield_for: 1 })
                }
            }
            std::cmp::Ordering::Greater => {
                state.last_timestamp = now;
                state.sequence = 0;
                Ok(IdGenStatus::Ready {
                    id: SnowflakeId::from_components(now, self.node_id, 0),
                })
            }
            std::cmp::Ordering::Less => {
                let behind = state.last_timestamp - now;
                if behind > self.clock_tolerance_ms {
                    self.poisoned.store(true, Ordering::Release);
                    error!(
                        "Clock moved backwards by {} ms (tolerance {} ms), snowflake node {} disabled",
                        behind, self.clock_tolerance_ms, self.node_id
                    );
                    Err(ShortUrlError::clock_regression(format!(
                        "Clock moved backwards by {} ms",
                        behind
                    )))
                } else {
                    Ok(IdGenStatus::Pending { yield_for: behind })
                }
            }
        }
    }

    /// 生成下一个 ID，必要时阻塞线程等待时钟前进。
    /// 异步代码应通过 [`generate_code`](super::generate_code) 调用。
    pub fn next_id(&self) -> Result<SnowflakeId> {
        loop {
            match self.try_next_id()? {
                IdGenStatus::Ready { id } => return Ok(id),
                IdGenStatus::Pending { yield_for } => {
                    std::thread::sleep(Duration::from_millis(yield_for.max(1)));
                }
            }
        }
    }
}

impl<T: TimeSource> CodeGenerator for SnowflakeGenerator<T> {
    fn generate(&self) -> Result<String> {
        self.next_id().map(SnowflakeId::to_code)
    }

    fn try_generate(&self) -> Result<CodeStatus> {
        Ok(match self.try_next_id()? {
            IdGenStatus::Ready { id } => CodeStatus::Ready(id.to_code()),
            IdGenStatus::Pending { yield_for } => CodeStatus::Pending { yield_for },
        })
    }

    fn name(&self) -> &'static str {
        "snowflake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU64;

    #[derive(Clone, Default)]
    struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        fn set(&self, millis: u64) {
            self.0.store(millis, Ordering::SeqCst);
        }
    }

    impl TimeSource for ManualClock {
        fn current_millis(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn ready(status: IdGenStatus) -> SnowflakeId {
        match status {
            IdGenStatus::Ready { id } => id,
            IdGenStatus::Pending { yield_for } => panic!("expected ready, pending {}", yield_for),
        }
    }

    #[test]
    fn test_components_round_trip() {
        let id = SnowflakeId::from_components(123_456, 42, 7);
        assert_eq!(id.timestamp(), 123_456);
        assert_eq!(id.node_id(), 42);
        assert_eq!(id.sequence(), 7);
    }

    #[test]
    fn test_rejects_out_of_range_node() {
        let result = SnowflakeGenerator::new(MAX_NODE_ID + 1, ManualClock::default(), 10);
        assert!(matches!(result, Err(ShortUrlError::Validation(_))));
    }

    #[test]
    fn test_sequence_increments_within_same_millis() {
        let clock = ManualClock::default();
        clock.set(1_000);
        let generator = SnowflakeGenerator::new(3, clock.clone(), 10).unwrap();

        let a = ready(generator.try_next_id().unwrap());
        let b = ready(generator.try_next_id().unwrap());
        assert_eq!(a.sequence(), 0);
        assert_eq!(b.sequence(), 1);
        assert_eq!(b.node_id(), 3);
        assert!(b > a);

        clock.set(1_001);
        let c = ready(generator.try_next_id().unwrap());
        assert_eq!(c.sequence(), 0);
        assert_eq!(c.timestamp(), 1_001);
    }

    #[test]
    fn test_sequence_exhaustion_waits_instead_of_reusing() {
        let clock = ManualClock::default();
        clock.set(5_000);
        let generator = SnowflakeGenerator::new(0, clock.clone(), 10).unwrap();

        for _ in 0..=MAX_SEQUENCE {
            ready(generator.try_next_id().unwrap());
        }
        assert_eq!(
            generator.try_next_id().unwrap(),
            IdGenStatus::Pending { yield_for: 1 }
        );

        clock.set(5_001);
        let next = ready(generator.try_next_id().unwrap());
        assert_eq!(next.timestamp(), 5_001);
        assert_eq!(next.sequence(), 0);
    }

    #[test]
    fn test_small_regression_is_waited_out() {
        let clock = ManualClock::default();
        clock.set(10_000);
        let generator = SnowflakeGenerator::new(0, clock.clone(), 10).unwrap();
        ready(generator.try_next_id().unwrap());

        clock.set(9_995);
        assert_eq!(
            generator.try_next_id().unwrap(),
            IdGenStatus::Pending { yield_for: 5 }
        );
        assert!(!generator.is_poisoned());
    }

    #[test]
    fn test_large_regression_poisons_generator() {
        let clock = ManualClock::default();
        clock.set(10_000);
        let generator = SnowflakeGenerator::new(0, clock.clone(), 10).unwrap();
        ready(generator.try_next_id().unwrap());

        clock.set(9_000);
        assert!(matches!(
            generator.try_next_id(),
            Err(ShortUrlError::ClockRegression(_))
        ));

        // 时钟恢复后依旧不可用
        clock.set(20_000);
        assert!(matches!(
            generator.generate(),
            Err(ShortUrlError::ClockRegression(_))
        ));
    }

    #[tokio::test]
    async fn test_async_generation_waits_out_small_regression() {
        let clock = ManualClock::default();
        clock.set(10_000);
        let generator = SnowflakeGenerator::new(0, clock.clone(), 10).unwrap();
        ready(generator.try_next_id().unwrap());

        clock.set(9_995);
        assert!(matches!(
            generator.try_generate().unwrap(),
            CodeStatus::Pending { yield_for: 5 }
        ));

        // 单线程 runtime：只有等待让出 worker，时钟才会被推进
        let advancer = {
            let clock = clock.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                clock.set(10_001);
            })
        };

        let code = crate::idgen::generate_code(&generator).await.unwrap();
        assert_eq!(code, SnowflakeId::from_components(10_001, 0, 0).to_code());
        assert!(!generator.is_poisoned());
        advancer.await.unwrap();
    }

    #[test]
    fn test_concurrent_generation_is_unique() {
        let generator = Arc::new(SnowflakeGenerator::with_system_clock(7, 10).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..2_000)
                        .map(|_| generator.generate().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for code in handle.join().unwrap() {
                assert!(seen.insert(code), "duplicate code generated");
            }
        }
        assert_eq!(seen.len(), 16_000);
    }
}
