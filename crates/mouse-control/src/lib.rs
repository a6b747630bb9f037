//! # Mouse Control
//!
//! 走行控制核心：梯形速度曲线、PID 反馈与固定周期控制循环
//!
//! ## 线程模型
//!
//! - 控制线程（[`ControlLoop`]）独占传感器、电机与控制器，以固定频率运行
//! - 序列器线程通过 [`Run`] 写入走行参数（邮箱，Last Write Wins），
//!   阻塞等待带序号的完成信号
//! - 任意线程可通过 [`LoopObserver`] 无锁读取最近的传感器快照与目标值
//!
//! ## 失效保护
//!
//! 任一传感器读数超时的周期输出零电压，不使用上一个周期的反馈。

pub mod channel;
mod error;
pub mod loop_runner;
pub mod metrics;
pub mod motion;
pub mod observer;
pub mod parameter;
pub mod pid;
pub mod run;

pub use channel::{Command, MotorPower, ParameterSlot};
pub use error::ControlError;
pub use loop_runner::{ControlLoop, LoopConfig, LoopHandle, TickOutcome};
pub use metrics::{LoopMetrics, LoopMetricsSnapshot};
pub use motion::{MachineParams, MotionConfig, MotionController, MotionOutput, side_wall_error};
pub use observer::LoopObserver;
pub use parameter::{MotionDirection, MotionParameter, MotionPattern, MotionTarget};
pub use pid::{Pid, PidGains};
pub use run::Run;
