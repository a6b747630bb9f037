//! 控制层错误类型定义

use mouse_driver::DriverError;
use std::time::Duration;
use thiserror::Error;

/// 控制层错误类型
#[derive(Error, Debug)]
pub enum ControlError {
    /// 驱动层错误
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 控制循环与序列器之间的通道已关闭（控制线程退出）
    #[error("Control channel closed")]
    ChannelClosed,

    /// 锁被毒化（线程 panic）
    #[error("Poisoned lock (thread panic)")]
    PoisonedLock,

    /// 配置无效
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 等待完成信号超时
    #[error("Motion did not complete within {0:?}")]
    Timeout(Duration),

    /// 控制线程启动失败
    #[error("Failed to spawn control thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// 控制线程 panic
    #[error("Control thread panicked")]
    ThreadPanicked,
}
