//! SDK 错误类型定义

use mouse_control::ControlError;
use mouse_driver::DriverError;
use mouse_maze::MazeError;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 参数无效
    #[error("Invalid config [{section}]: {reason}")]
    Validation { section: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(section: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Validation {
            section,
            reason: reason.into(),
        }
    }
}

/// SDK 顶层错误
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Maze error: {0}")]
    Maze(#[from] MazeError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
