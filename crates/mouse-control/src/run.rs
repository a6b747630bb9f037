//! 序列器句柄
//!
//! 在控制线程之外（序列器线程）调用：写入走行参数后阻塞，
//! 直到控制循环发回同一序号的完成信号。

use crate::channel::{MotorPower, ParameterSlot};
use crate::error::ControlError;
use crate::observer::LoopObserver;
use crate::parameter::{MotionDirection, MotionParameter, MotionTarget};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use mouse_driver::Sensed;
use std::time::Duration;
use tracing::{debug, trace};

/// 序列器句柄
///
/// ```rust,ignore
/// let (control, run) = ControlLoop::new(hub, motors, controller, LoopConfig::default())?;
/// let _handle = control.spawn()?;
///
/// run.straight(MotionDirection::Forward, 180.0, 1.0, 0.3, 0.0)?;
/// run.turn(90.0, 20.0, 3.0, MotionDirection::Right)?;
/// run.stop()?;
/// ```
#[derive(Debug)]
pub struct Run {
    slot: ParameterSlot,
    pub(crate) completions: Receiver<u64>,
    power: MotorPower,
    observer: LoopObserver,
    timeout: Option<Duration>,
}

impl Run {
    pub(crate) fn new(
        slot: ParameterSlot,
        completions: Receiver<u64>,
        power: MotorPower,
        observer: LoopObserver,
    ) -> Self {
        Self {
            slot,
            completions,
            power,
            observer,
            timeout: None,
        }
    }

    /// 等待完成的超时时间（默认一直等待）
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 直线走行 `length` [mm]，到达时速度为 `end_velocity`
    pub fn straight(
        &self,
        direction: MotionDirection,
        length: f64,
        acceleration: f64,
        max_velocity: f64,
        end_velocity: f64,
    ) -> Result<(), ControlError> {
        self.execute(MotionParameter::straight(
            direction,
            length,
            acceleration,
            max_velocity,
            end_velocity,
        ))
    }

    /// 原地旋转 `angle` [deg]
    pub fn turn(
        &self,
        angle: f64,
        angular_acceleration: f64,
        max_angular_velocity: f64,
        direction: MotionDirection,
    ) -> Result<(), ControlError> {
        self.execute(MotionParameter::turn(
            angle,
            angular_acceleration,
            max_angular_velocity,
            direction,
        ))
    }

    /// 停止，等到速度低于阈值后禁用电机
    pub fn stop(&self) -> Result<(), ControlError> {
        self.execute(MotionParameter::stop())?;
        self.power.disable();
        Ok(())
    }

    /// 解除控制（不等待）
    pub fn free(&self) -> Result<(), ControlError> {
        self.power.disable();
        self.slot.send(MotionParameter::free())?;
        Ok(())
    }

    /// 写入走行参数并等待完成
    pub fn execute(&self, param: MotionParameter) -> Result<(), ControlError> {
        // 丢弃之前遗留的完成信号
        while let Ok(seq) = self.completions.try_recv() {
            trace!("Discarding stale completion #{}", seq);
        }

        self.power.enable();
        let seq = self.slot.send(param)?;
        debug!("Motion #{} ({:?}) sent, waiting for completion", seq, param.pattern);

        loop {
            let done = match self.timeout {
                Some(timeout) => self.completions.recv_timeout(timeout).map_err(|e| match e {
                    RecvTimeoutError::Timeout => ControlError::Timeout(timeout),
                    RecvTimeoutError::Disconnected => ControlError::ChannelClosed,
                })?,
                None => self.completions.recv().map_err(|_| ControlError::ChannelClosed)?,
            };
            if done == seq {
                return Ok(());
            }
            trace!("Ignoring completion #{} while waiting for #{}", done, seq);
        }
    }

    /// 最近一次的传感器快照
    pub fn sensed(&self) -> Sensed {
        self.observer.sensed()
    }

    /// 最近一次的目标值
    pub fn target(&self) -> MotionTarget {
        self.observer.target()
    }

    pub fn observer(&self) -> &LoopObserver {
        &self.observer
    }

    pub fn motor_power(&self) -> &MotorPower {
        &self.power
    }
}
