//! 驱动层错误类型定义

use crate::hardware::SensorKind;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// 本周期的读数没有及时刷新
    ///
    /// 控制循环收到该错误时输出零电压，并在下一周期继续。
    #[error("Stale reading from {sensor}")]
    StaleReading { sensor: SensorKind },

    /// 外设故障
    #[error("Device error on {sensor}: {message}")]
    Device { sensor: SensorKind, message: String },

    /// 配置无效（启动时检出，不会在运行中出现）
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 锁被毒化（线程 panic）
    #[error("Poisoned lock (thread panic)")]
    PoisonedLock,
}

impl DriverError {
    /// 是否为可在下一周期恢复的读数超时
    pub fn is_stale(&self) -> bool {
        matches!(self, DriverError::StaleReading { .. })
    }
}
