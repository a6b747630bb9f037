//! 配置管理命令

use anyhow::{Context, Result};
use clap::Subcommand;
use mouse_sdk::RobotConfig;
use std::path::PathBuf;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 输出默认配置（TOML）
    Default,

    /// 检查配置文件
    Check {
        /// 配置文件路径
        path: PathBuf,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Default => {
                let text = RobotConfig::default()
                    .to_toml_string()
                    .context("Failed to serialize default config")?;
                print!("{}", text);
                Ok(())
            },

            ConfigCommand::Check { path } => {
                let config = super::load_config(Some(&path))?;
                println!("✅ {} is valid", path.display());
                println!(
                    "   maze {}x{}, {} goal cells, control loop {} Hz",
                    config.maze.width,
                    config.maze.height,
                    config.maze.goals.len(),
                    config.control_loop.frequency_hz
                );
                Ok(())
            },
        }
    }
}
