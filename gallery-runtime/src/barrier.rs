//! # Barrier 模块
//!
//! 资源加载屏障：统计"预期"与"已结算"的异步加载数量，在两者相等时触发一次 Ready。
//!
//! ## 触发条件
//!
//! ```text
//! completed == expected && expected > 0 && !fired
//! ```
//!
//! - 成功与失败都算结算：失败的资源降级为缺失占位，不阻塞进度
//! - `expected > 0` 防止在尚未登记任何资源时误触发
//! - 最多触发一次：重复结算、重复检查都不会再次触发
//! - 没有超时与重试：永不结算的加载会让 Ready 永远不触发
//!
//! ## 所有权
//!
//! [`LoadTracker`] 由加载编排者独占，内部持有屏障和结算通道的接收端。
//! 每个单资源加载器拿到一个 [`CompletionHandle`]，结算时消耗它，
//! 结算结果由编排者在自己的线程上取出并应用。

use std::sync::mpsc::{self, Receiver, Sender};

/// 加载进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    pub completed: usize,
    pub expected: usize,
}

/// 加载屏障
#[derive(Debug, Clone, Default)]
pub struct LoadBarrier {
    expected: usize,
    completed: usize,
    fired: bool,
}

impl LoadBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记 `n` 个预期加载
    ///
    /// 调用方必须在派发任何加载之前登记全部数量。
    pub fn register(&mut self, n: usize) -> bool {
        self.expected += n;
        self.evaluate()
    }

    /// 结算一个加载（无论成功或失败）
    ///
    /// 仅在本次结算使屏障跨入 Ready 时返回 `true`。
    pub fn complete(&mut self) -> bool {
        self.completed += 1;
        self.evaluate()
    }

    fn evaluate(&mut self) -> bool {
        if !self.fired && self.expected > 0 && self.completed == self.expected {
            self.fired = true;
            return true;
        }
        false
    }

    /// 是否已触发 Ready
    pub fn is_ready(&self) -> bool {
        self.fired
    }

    pub fn progress(&self) -> LoadProgress {
        LoadProgress {
            completed: self.completed,
            expected: self.expected,
        }
    }
}

/// 单个资源的结算句柄
///
/// `complete` 消耗句柄，保证每个资源恰好结算一次。
#[derive(Debug)]
pub struct CompletionHandle<T> {
    tx: Sender<T>,
}

impl<T> CompletionHandle<T> {
    /// 结算并交回结果
    ///
    /// 编排者已退出时结果被丢弃。
    pub fn complete(self, payload: T) {
        let _ = self.tx.send(payload);
    }
}

/// 屏障 + 结算通道
#[derive(Debug)]
pub struct LoadTracker<T> {
    barrier: LoadBarrier,
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> LoadTracker<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            barrier: LoadBarrier::new(),
            tx,
            rx,
        }
    }

    /// 登记 `n` 个预期加载
    pub fn register(&mut self, n: usize) -> bool {
        self.barrier.register(n)
    }

    /// 为一个资源发放结算句柄
    pub fn handle(&self) -> CompletionHandle<T> {
        CompletionHandle {
            tx: self.tx.clone(),
        }
    }

    /// 非阻塞地取出所有已结算的结果
    ///
    /// 每个结果先交给 `apply`，再计入屏障。本次调用中触发 Ready 时返回 `true`。
    pub fn drain(&mut self, mut apply: impl FnMut(T)) -> bool {
        let mut fired = false;
        while let Ok(payload) = self.rx.try_recv() {
            apply(payload);
            fired |= self.barrier.complete();
        }
        fired
    }

    /// 阻塞直到 Ready，返回是否已 Ready
    ///
    /// 尚未登记任何加载时立即返回 `false`。
    /// 追踪器自身持有一个发送端，通道永不断开：有加载永不结算时，此调用永不返回。
    pub fn wait_ready(&mut self, mut apply: impl FnMut(T)) -> bool {
        if self.barrier.progress().expected == 0 {
            return false;
        }
        while !self.barrier.is_ready() {
            match self.rx.recv() {
                Ok(payload) => {
                    apply(payload);
                    self.barrier.complete();
                }
                Err(_) => break,
            }
        }
        self.barrier.is_ready()
    }

    pub fn is_ready(&self) -> bool {
        self.barrier.is_ready()
    }

    pub fn progress(&self) -> LoadProgress {
        self.barrier.progress()
    }
}

impl<T> Default for LoadTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fires_once_at_expected() {
        let mut barrier = LoadBarrier::new();
        assert!(!barrier.register(3));
        assert!(!barrier.complete());
        assert!(!barrier.complete());
        assert!(barrier.complete());
        assert!(barrier.is_ready());

        // 重复结算不会再次触发
        assert!(!barrier.complete());
        assert!(barrier.is_ready());
    }

    #[test]
    fn test_never_fires_with_zero_expected() {
        let mut barrier = LoadBarrier::new();
        assert!(!barrier.register(0));
        assert!(!barrier.is_ready());
        assert_eq!(barrier.progress(), LoadProgress::default());
    }

    #[test]
    fn test_wait_ready_returns_with_nothing_registered() {
        let mut tracker: LoadTracker<usize> = LoadTracker::new();
        let mut applied = 0;
        assert!(!tracker.wait_ready(|_| applied += 1));
        assert_eq!(applied, 0);

        tracker.register(0);
        assert!(!tracker.wait_ready(|_| applied += 1));
        assert!(!tracker.is_ready());
    }

    #[test]
    fn test_permutation_invariance() {
        // 不同的结算顺序都在第 N 次结算时触发且只触发一次
        let n = 5;
        let orders: [[usize; 5]; 3] = [[0, 1, 2, 3, 4], [4, 3, 2, 1, 0], [2, 0, 4, 1, 3]];

        for order in orders {
            let mut tracker: LoadTracker<usize> = LoadTracker::new();
            tracker.register(n);
            let handles: Vec<_> = (0..n).map(|_| tracker.handle()).collect();

            let mut handles: Vec<Option<_>> = handles.into_iter().map(Some).collect();
            let mut fired_at = Vec::new();
            for (step, &i) in order.iter().enumerate() {
                handles[i].take().unwrap().complete(i);
                if tracker.drain(|_| {}) {
                    fired_at.push(step);
                }
            }
            assert_eq!(fired_at, vec![n - 1]);
            assert_eq!(tracker.progress(), LoadProgress { completed: n, expected: n });
        }
    }

    #[test]
    fn test_drain_applies_payloads() {
        let mut tracker: LoadTracker<&'static str> = LoadTracker::new();
        tracker.register(2);
        tracker.handle().complete("a");

        let mut seen = Vec::new();
        assert!(!tracker.drain(|p| seen.push(p)));
        tracker.handle().complete("b");
        assert!(tracker.drain(|p| seen.push(p)));
        assert_eq!(seen, vec!["a", "b"]);

        // 之后的 drain 不再触发
        assert!(!tracker.drain(|_| {}));
    }

    #[test]
    fn test_wait_ready_across_threads() {
        let mut tracker: LoadTracker<usize> = LoadTracker::new();
        tracker.register(8);

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let handle = tracker.handle();
                thread::spawn(move || handle.complete(i))
            })
            .collect();

        let mut sum = 0;
        tracker.wait_ready(|i| sum += i);
        for w in workers {
            w.join().unwrap();
        }

        assert!(tracker.is_ready());
        assert_eq!(sum, (0..8).sum::<usize>());
    }
}
