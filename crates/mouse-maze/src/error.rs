//! 迷路层错误类型定义

use crate::cell::Cell;
use thiserror::Error;

/// 迷路层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MazeError {
    /// 迷路尺寸无效（必须在 1..=32 之间）
    #[error("Invalid maze size: {width}x{height} (each side must be 1..={max})")]
    InvalidSize { width: u8, height: u8, max: u8 },

    /// 坐标超出迷路范围
    #[error("Cell {cell} is out of bounds")]
    OutOfBounds { cell: Cell },

    /// 目标区画集合为空
    #[error("Target cell set is empty")]
    EmptyTargets,

    /// 当前区画无法到达目标（墙壁信息下不存在通路）
    #[error("No path from {cell} to the target set")]
    Unreachable { cell: Cell },

    /// 真值迷路与地图尺寸不一致
    #[error("Maze size mismatch: map is {expected:?}, maze is {actual:?}")]
    SizeMismatch { expected: (u8, u8), actual: (u8, u8) },

    /// ASCII 迷路解析失败
    #[error("Maze parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maze_error_display() {
        let err = MazeError::OutOfBounds {
            cell: Cell::new(32, 1),
        };
        assert_eq!(format!("{}", err), "Cell (32, 1) is out of bounds");

        let err = MazeError::InvalidSize {
            width: 0,
            height: 16,
            max: 32,
        };
        assert!(format!("{}", err).contains("0x16"));

        let err = MazeError::Parse {
            line: 3,
            reason: "bad corner".to_string(),
        };
        assert!(format!("{}", err).contains("line 3"));
    }
}
