//! 命令定义和实现

pub mod config;
pub mod drive;
pub mod search;

pub use config::ConfigCommand;
pub use drive::DriveCommand;
pub use search::SearchCommand;

use anyhow::{Context, Result};
use mouse_sdk::RobotConfig;
use std::path::Path;

/// 加载配置；未指定时使用默认值
pub fn load_config(path: Option<&Path>) -> Result<RobotConfig> {
    match path {
        Some(path) => RobotConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(RobotConfig::default()),
    }
}
