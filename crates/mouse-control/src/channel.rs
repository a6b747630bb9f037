//! 序列器与控制循环之间的通道
//!
//! - [`ParameterSlot`]：走行参数邮箱（Last Write Wins），控制循环每个周期取走一次
//! - 完成信号：`crossbeam_channel` 有界队列，携带指令序号
//! - [`MotorPower`]：电机使能标志

use crate::error::ControlError;
use crate::metrics::LoopMetrics;
use crate::parameter::MotionParameter;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

/// 完成信号队列容量
pub(crate) const COMPLETION_CAPACITY: usize = 4;

/// 带序号的走行指令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    /// 从 1 开始单调递增
    pub seq: u64,
    pub param: MotionParameter,
}

/// 走行参数邮箱
///
/// 控制循环取走之前再次写入会覆盖旧参数（计入 `parameter_overwrites`）。
#[derive(Debug, Clone)]
pub struct ParameterSlot {
    slot: Arc<Mutex<Option<Command>>>,
    next_seq: Arc<AtomicU64>,
    metrics: Arc<LoopMetrics>,
}

impl ParameterSlot {
    pub fn new(metrics: Arc<LoopMetrics>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            next_seq: Arc::new(AtomicU64::new(0)),
            metrics,
        }
    }

    /// 写入新的走行参数，返回指令序号
    pub fn send(&self, param: MotionParameter) -> Result<u64, ControlError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;

        match self.slot.lock() {
            Ok(mut slot) => {
                let is_overwrite = slot.is_some();
                *slot = Some(Command { seq, param });
                drop(slot);

                if is_overwrite {
                    let overwrites =
                        self.metrics.parameter_overwrites.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        "Motion parameter #{} overwrote a pending one ({} overwrites so far)",
                        seq, overwrites
                    );
                }
                Ok(seq)
            },
            Err(_) => {
                error!("Parameter slot lock poisoned, control thread may have panicked");
                Err(ControlError::PoisonedLock)
            },
        }
    }

    /// 取出待处理的指令（插槽变为空）
    pub fn take(&self) -> Option<Command> {
        match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                error!("Parameter slot lock poisoned");
                None
            },
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

/// 电机使能标志
///
/// 禁用时控制循环每个周期输出零电压。
#[derive(Debug, Clone, Default)]
pub struct MotorPower {
    enabled: Arc<AtomicBool>,
}

impl MotorPower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}
