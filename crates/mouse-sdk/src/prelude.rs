//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use mouse_sdk::prelude::*;
//! ```

// SDK
pub use crate::builder::MouseBuilder;
pub use crate::config::RobotConfig;
pub use crate::explorer::{ExploreReport, Explorer, ManeuverProfile};
pub use crate::{ConfigError, SdkError, init_logger};

// 地图层
pub use mouse_maze::{Cell, Heading, Maze, RelativeWalls, SearchPhase, SearchReport, Searcher};

// 驱动层（外设 trait 用于接入真实硬件）
pub use mouse_driver::{
    BatteryMonitor, Encoder, Hardware, Imu, Motor, PhotoSensors, Sensed, SensorDevices,
};

// 控制层
pub use mouse_control::{
    ControlLoop, LoopHandle, LoopObserver, MotionDirection, MotionParameter, MotionTarget, Run,
};

// 错误类型
pub use mouse_control::ControlError;
pub use mouse_driver::DriverError;
pub use mouse_maze::MazeError;
