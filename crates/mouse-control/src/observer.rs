//! 控制循环状态的只读视图
//!
//! 控制线程每个周期发布一次传感器快照与目标值（`ArcSwap`，无锁读取），
//! 其他线程通过 [`LoopObserver`] 读取。

use crate::metrics::{LoopMetrics, LoopMetricsSnapshot};
use crate::parameter::MotionTarget;
use arc_swap::ArcSwap;
use mouse_driver::Sensed;
use std::sync::Arc;

#[derive(Debug)]
struct LoopShared {
    sensed: ArcSwap<Sensed>,
    target: ArcSwap<MotionTarget>,
    metrics: Arc<LoopMetrics>,
}

/// 控制循环观察器（可克隆，线程安全）
#[derive(Debug, Clone)]
pub struct LoopObserver {
    shared: Arc<LoopShared>,
}

impl LoopObserver {
    pub(crate) fn new(metrics: Arc<LoopMetrics>, sensed: Sensed, target: MotionTarget) -> Self {
        Self {
            shared: Arc::new(LoopShared {
                sensed: ArcSwap::from_pointee(sensed),
                target: ArcSwap::from_pointee(target),
                metrics,
            }),
        }
    }

    pub(crate) fn publish_sensed(&self, sensed: Sensed) {
        self.shared.sensed.store(Arc::new(sensed));
    }

    pub(crate) fn publish_target(&self, target: MotionTarget) {
        self.shared.target.store(Arc::new(target));
    }

    /// 最近一次成功读取的传感器快照
    pub fn sensed(&self) -> Sensed {
        **self.shared.sensed.load()
    }

    /// 最近一个周期的目标值
    pub fn target(&self) -> MotionTarget {
        **self.shared.target.load()
    }

    pub fn metrics(&self) -> LoopMetricsSnapshot {
        self.shared.metrics.snapshot()
    }
}
