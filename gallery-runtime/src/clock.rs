//! # Clock 模块
//!
//! 单调时钟抽象。
//!
//! 死亡冷却与台词停留都是"距某时刻经过了多久"的判断，
//! 运行时只通过 [`Clock`] 读取时间，测试中注入 [`ManualClock`] 即可确定性地推进。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 单调时钟
///
/// `now()` 返回相对于时钟原点的时长，保证不回退。
pub trait Clock: Send {
    /// 当前时刻（相对于时钟原点）
    fn now(&self) -> Duration;
}

/// 系统单调时钟
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// 以当前时刻为原点创建时钟
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// 手动推进的时钟
///
/// 克隆后共享同一时间线：测试持有一份用于推进，运行时持有另一份用于读取。
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// 创建位于原点的时钟
    pub fn new() -> Self {
        Self::default()
    }

    /// 向前推进
    pub fn advance(&self, delta: Duration) {
        self.nanos.fetch_add(delta.as_nanos() as u64, Ordering::SeqCst);
    }

    /// 以毫秒推进
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// 设置到指定时刻（不得早于当前时刻）
    pub fn set(&self, at: Duration) {
        self.nanos.fetch_max(at.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new();
        let reader = clock.clone();
        assert_eq!(reader.now(), Duration::ZERO);

        clock.advance_millis(1500);
        assert_eq!(reader.now(), Duration::from_millis(1500));

        // set 不会让时间回退
        clock.set(Duration::from_millis(100));
        assert_eq!(reader.now(), Duration::from_millis(1500));

        clock.set(Duration::from_secs(10));
        assert_eq!(reader.now(), Duration::from_secs(10));
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
