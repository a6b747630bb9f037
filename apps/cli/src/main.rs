//! # Mouse CLI
//!
//! 迷路搜索与走行控制的命令行工具（仿真外设）。
//!
//! ```bash
//! # 在 ASCII 迷路上执行完整搜索（探索 → 返回 → 最短）
//! mouse-cli search --maze maze.txt --config mouse.toml
//!
//! # 在仿真机体上走行：直线 90 mm 后左转 90°
//! mouse-cli drive --length 90 --turn 90
//!
//! # 输出默认配置 / 检查配置文件
//! mouse-cli config default > mouse.toml
//! mouse-cli config check mouse.toml
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制（默认 `info`）。

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCommand, DriveCommand, SearchCommand};

/// Mouse CLI - 迷路探索机器人命令行工具
#[derive(Parser, Debug)]
#[command(name = "mouse-cli")]
#[command(about = "Micromouse maze search and motion simulation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 在真值迷路上执行完整搜索
    Search {
        #[command(flatten)]
        args: SearchCommand,
    },

    /// 在仿真机体上执行走行序列
    Drive {
        #[command(flatten)]
        args: DriveCommand,
    },
}

fn main() -> Result<()> {
    mouse_sdk::init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Search { args } => args.execute(),
        Commands::Drive { args } => args.execute(),
    }
}
