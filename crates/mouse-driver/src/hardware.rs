//! 硬件上下文
//!
//! 外设驱动以 trait 的形式注入，控制核心只依赖「每个周期可以读到一次原始数据」
//! 与「每个周期可以写入一次电压」。所有外设在启动时构造一次，
//! 以 [`Hardware`] 的形式按所有权传入 [`SensorHub`](crate::SensorHub) 与控制循环。

use crate::error::DriverError;
use std::fmt;

/// 外设种类（用于错误与日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    LeftEncoder,
    RightEncoder,
    Imu,
    PhotoSensors,
    Battery,
    LeftMotor,
    RightMotor,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SensorKind::LeftEncoder => "left encoder",
            SensorKind::RightEncoder => "right encoder",
            SensorKind::Imu => "imu",
            SensorKind::PhotoSensors => "photo sensors",
            SensorKind::Battery => "battery",
            SensorKind::LeftMotor => "left motor",
            SensorKind::RightMotor => "right motor",
        };
        f.write_str(s)
    }
}

/// 磁编码器
pub trait Encoder: Send {
    /// 原始角度读数（`0..resolution`）
    fn read_raw(&mut self) -> Result<u32, DriverError>;
}

/// IMU 单次采样
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuSample {
    /// z 轴角速度 [mdps]
    pub gyro_z_mdps: f64,
    /// 三轴加速度 [g]
    pub accel_g: [f64; 3],
}

/// 陀螺仪 + 加速度计
pub trait Imu: Send {
    fn read(&mut self) -> Result<ImuSample, DriverError>;
}

/// 光电传感器的安装位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PhotoPosition {
    /// 左前方（朝前）
    Left90 = 0,
    /// 左侧（朝左墙）
    Left45 = 1,
    /// 右侧（朝右墙）
    Right45 = 2,
    /// 右前方（朝前）
    Right90 = 3,
}

impl PhotoPosition {
    pub const ALL: [PhotoPosition; 4] = [
        PhotoPosition::Left90,
        PhotoPosition::Left45,
        PhotoPosition::Right45,
        PhotoPosition::Right90,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// 单个光电传感器的一次读数（已分为环境光与发光时的强度）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotoSample {
    pub ambient: u16,
    pub flash: u16,
}

impl PhotoSample {
    pub const fn new(ambient: u16, flash: u16) -> Self {
        Self { ambient, flash }
    }
}

/// 四个反射式光电传感器（按 [`PhotoPosition`] 的顺序）
pub trait PhotoSensors: Send {
    fn read(&mut self) -> Result<[PhotoSample; 4], DriverError>;
}

/// 电源电压
pub trait BatteryMonitor: Send {
    /// 瞬时电压 [mV]
    fn read_millivolts(&mut self) -> Result<f64, DriverError>;
}

/// 电机输出级
pub trait Motor: Send {
    /// 设置端电压 [mV]；占空比 = `millivolts / battery_mv`
    fn set_voltage(&mut self, millivolts: f64, battery_mv: f64) -> Result<(), DriverError>;
}

/// 一个周期的电机指令
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorCommand {
    /// 左轮电压 [mV]
    pub left_mv: f64,
    /// 右轮电压 [mV]
    pub right_mv: f64,
    /// 当前电源电压 [mV]（占空比换算用）
    pub battery_mv: f64,
}

impl MotorCommand {
    /// 零电压
    pub const fn zero(battery_mv: f64) -> Self {
        Self {
            left_mv: 0.0,
            right_mv: 0.0,
            battery_mv,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.left_mv == 0.0 && self.right_mv == 0.0
    }
}

/// 传感器外设组
pub struct SensorDevices {
    pub left_encoder: Box<dyn Encoder>,
    pub right_encoder: Box<dyn Encoder>,
    pub imu: Box<dyn Imu>,
    pub photo: Box<dyn PhotoSensors>,
    pub battery: Box<dyn BatteryMonitor>,
}

/// 左右电机
pub struct Motors {
    pub left: Box<dyn Motor>,
    pub right: Box<dyn Motor>,
}

impl Motors {
    /// 写入一个周期的电压
    pub fn apply(&mut self, command: &MotorCommand) -> Result<(), DriverError> {
        self.left.set_voltage(command.left_mv, command.battery_mv)?;
        self.right.set_voltage(command.right_mv, command.battery_mv)?;
        Ok(())
    }
}

/// 硬件上下文：启动时构造一次，按所有权传递
pub struct Hardware {
    pub sensors: SensorDevices,
    pub motors: Motors,
}

impl fmt::Debug for Hardware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hardware").finish_non_exhaustive()
    }
}
