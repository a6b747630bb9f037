//! Builder 模式实现
//!
//! 由配置与硬件上下文构造控制循环与序列器句柄。

use crate::config::RobotConfig;
use crate::error::SdkError;
use mouse_control::{ControlLoop, LoopConfig, MotionController, Run};
use mouse_driver::{Hardware, SensorHub};

/// 控制循环 Builder（链式构造）
///
/// ```rust,ignore
/// use mouse_sdk::prelude::*;
///
/// let config = RobotConfig::load("mouse.toml")?;
/// let (control, run) = MouseBuilder::new(config).build(hardware)?;
/// let _handle = control.spawn()?;
/// run.straight(MotionDirection::Forward, 90.0, 1.0, 0.3, 0.0)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MouseBuilder {
    config: RobotConfig,
    max_iterations: Option<usize>,
}

impl MouseBuilder {
    pub fn new(config: RobotConfig) -> Self {
        Self {
            config,
            max_iterations: None,
        }
    }

    /// 控制循环最多运行的周期数（测试与仿真用）
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// 校验配置并构造
    ///
    /// 配置无效、传感器参数无效（如平均窗口不是 2 的幂）时返回错误，控制循环不会启动。
    pub fn build(self, hardware: Hardware) -> Result<(ControlLoop, Run), SdkError> {
        self.config.validate()?;

        let hub = SensorHub::new(self.config.sensor_params(), hardware.sensors)?;
        let controller =
            MotionController::new(self.config.machine_params(), self.config.motion_config())?;
        let loop_config = LoopConfig {
            max_iterations: self.max_iterations,
            ..self.config.loop_config()
        };
        Ok(ControlLoop::new(hub, hardware.motors, controller, loop_config)?)
    }
}
