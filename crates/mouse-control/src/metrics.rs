//! 控制循环指标
//!
//! 原子计数器，可在任意线程读取，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 控制循环实时指标
///
/// ```rust
/// use mouse_control::LoopMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = LoopMetrics::default();
/// metrics.ticks.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(metrics.snapshot().ticks, 1);
/// ```
#[derive(Debug, Default)]
pub struct LoopMetrics {
    /// 执行的周期数
    pub ticks: AtomicU64,

    /// 因读数超时输出零电压的周期数
    pub stale_ticks: AtomicU64,

    /// 其他外设错误（含电机写入失败）
    pub device_errors: AtomicU64,

    /// dt 被钳位的次数（周期超时）
    pub dt_clamps: AtomicU64,

    /// 完成信号发送次数
    pub completions: AtomicU64,

    /// 走行参数在被取走之前被覆盖的次数
    pub parameter_overwrites: AtomicU64,
}

impl LoopMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        LoopMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            stale_ticks: self.stale_ticks.load(Ordering::Relaxed),
            device_errors: self.device_errors.load(Ordering::Relaxed),
            dt_clamps: self.dt_clamps.load(Ordering::Relaxed),
            completions: self.completions.load(Ordering::Relaxed),
            parameter_overwrites: self.parameter_overwrites.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
        self.stale_ticks.store(0, Ordering::Relaxed);
        self.device_errors.store(0, Ordering::Relaxed);
        self.dt_clamps.store(0, Ordering::Relaxed);
        self.completions.store(0, Ordering::Relaxed);
        self.parameter_overwrites.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopMetricsSnapshot {
    pub ticks: u64,
    pub stale_ticks: u64,
    pub device_errors: u64,
    pub dt_clamps: u64,
    pub completions: u64,
    pub parameter_overwrites: u64,
}

impl LoopMetricsSnapshot {
    /// 读数超时周期的比例（百分比），没有周期时为 0
    pub fn stale_rate(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        (self.stale_ticks as f64 / self.ticks as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_reset() {
        let metrics = LoopMetrics::new();
        metrics.ticks.fetch_add(200, Ordering::Relaxed);
        metrics.stale_ticks.fetch_add(10, Ordering::Relaxed);
        metrics.completions.fetch_add(3, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 200);
        assert_eq!(snapshot.completions, 3);
        assert!((snapshot.stale_rate() - 5.0).abs() < 1e-12);

        metrics.reset();
        assert_eq!(metrics.snapshot(), LoopMetricsSnapshot::default());
        assert_eq!(metrics.snapshot().stale_rate(), 0.0);
    }
}
