//! Mouse SDK - 迷路探索机器人（micromouse）的导航与走行控制
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **地图层** (`mouse-maze`): 墙壁地图、洪水填充距离场、搜索状态机
//! - **驱动层** (`mouse-driver`): 外设 trait、里程计、墙壁传感器、传感器快照
//! - **控制层** (`mouse-control`): PID、梯形速度曲线、固定周期控制循环、序列器句柄
//! - **SDK** (本 crate): 配置、日志、搜索走行、统一导出
//!
//! # 快速开始
//!
//! ```rust
//! use mouse_sdk::prelude::*;
//!
//! let config = RobotConfig::default();
//! let mut searcher = config.maze.searcher().unwrap();
//! let maze = Maze::open(config.maze.width, config.maze.height).unwrap();
//! let report = searcher.run_simulated(&maze).unwrap();
//! assert_eq!(report.final_pose.cell, Cell::new(14, 14));
//! ```

pub mod builder;
pub mod config;
mod error;
pub mod explorer;
pub mod logging;
pub mod prelude;

pub use builder::MouseBuilder;
pub use config::RobotConfig;
pub use error::{ConfigError, SdkError};
pub use explorer::{ExploreReport, Explorer, ManeuverProfile, plan_move, relative_walls};
pub use logging::{init_logger, init_logger_with};

pub use mouse_control as control;
pub use mouse_driver as driver;
pub use mouse_maze as maze;
