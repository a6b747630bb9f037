//! # Mouse Driver
//!
//! 驱动层：硬件上下文、里程计与墙壁传感器融合
//!
//! - 外设以 trait 注入（[`Encoder`]、[`Imu`]、[`PhotoSensors`]、[`BatteryMonitor`]、[`Motor`]），
//!   启动时构造一次 [`Hardware`]，按所有权传入，不使用全局单例
//! - [`SensorHub`] 每个控制周期读取一次全部外设，产出只读的 [`Sensed`] 快照
//! - 启用 `mock` feature 后可使用 [`mock::SimulatedPlant`] 在没有硬件的情况下运行

pub mod average;
mod error;
pub mod hardware;
#[cfg(feature = "mock")]
pub mod mock;
pub mod odometry;
pub mod sensed;
pub mod sensor;

pub use average::{MovingAverage, RingBuffer};
pub use error::DriverError;
pub use hardware::{
    BatteryMonitor, Encoder, Hardware, Imu, ImuSample, Motor, MotorCommand, Motors, PhotoPosition,
    PhotoSample, PhotoSensors, SensorDevices, SensorKind,
};
pub use odometry::{Odometry, OdometryInput, Wheel, WheelParams};
pub use sensed::{Sensed, WallReading, WallSensorParam, WallSensors};
pub use sensor::{STANDARD_GRAVITY, SensorHub, SensorParams, gyro_to_angular_velocity};
