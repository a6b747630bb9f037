//! 迷路搜索命令
//!
//! 在 ASCII 真值迷路上运行 探索 → 返回 → 最短 三个阶段，输出步数与最短路径。

use anyhow::{Context, Result};
use clap::Args;
use mouse_sdk::maze::{Maze, SearchReport};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// 搜索命令参数
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// ASCII 迷路文件（省略时使用无内部墙的迷路）
    #[arg(short, long)]
    pub maze: Option<PathBuf>,

    /// 配置文件（迷路尺寸、起点、目标）
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl SearchCommand {
    pub fn execute(&self) -> Result<()> {
        let config = super::load_config(self.config.as_deref())?;

        let maze = match &self.maze {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read maze {}", path.display()))?;
                Maze::from_ascii(&text)
                    .with_context(|| format!("Failed to parse maze {}", path.display()))?
            },
            None => Maze::open(config.maze.width, config.maze.height)?,
        };

        let mut searcher = config.maze.searcher().context("Invalid maze configuration")?;
        info!(
            "Searching {}x{} maze from {} to {} goal cells",
            maze.width(),
            maze.height(),
            searcher.start(),
            searcher.goals().len()
        );
        let report = searcher.run_simulated(&maze).context("Search failed")?;
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &SearchReport) {
    println!("to-goal steps : {}", report.to_goal_steps);
    println!("to-start steps: {}", report.to_start_steps);
    println!("shortest steps: {}", report.shortest_steps());
    let path: Vec<String> = report.shortest_path.iter().map(|cell| cell.to_string()).collect();
    println!("shortest path : {}", path.join(" -> "));
    println!("final pose    : {}", report.final_pose);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_open_maze_with_defaults() {
        let cmd = SearchCommand {
            maze: None,
            config: None,
        };
        assert!(cmd.execute().is_ok());
    }

    #[test]
    fn test_missing_maze_file() {
        let cmd = SearchCommand {
            maze: Some(PathBuf::from("/nonexistent/maze.txt")),
            config: None,
        };
        let err = cmd.execute().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read maze"));
    }
}
