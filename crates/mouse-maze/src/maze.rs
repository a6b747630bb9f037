//! ASCII 迷路（仿真用真值）
//!
//! 格式：北侧的行在上，每个区画占 4 列、2 行。
//!
//! ```text
//! +---+---+
//! |       |
//! +   +   +
//! |   |   |
//! +---+---+
//! ```
//!
//! 外周无论是否画出都视为有墙。

use crate::cell::{Cell, Heading};
use crate::error::MazeError;
use crate::map::MAX_MAZE_SIZE;
use crate::navigator::Pose;
use crate::wall::RelativeWalls;

/// 真值迷路
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    width: u8,
    height: u8,
    /// 每个区画 北 / 东 / 南 / 西 是否有墙
    walls: Vec<[bool; 4]>,
}

impl Maze {
    /// 无内部墙壁的迷路
    pub fn open(width: u8, height: u8) -> Result<Self, MazeError> {
        if width == 0 || height == 0 || width > MAX_MAZE_SIZE || height > MAX_MAZE_SIZE {
            return Err(MazeError::InvalidSize {
                width,
                height,
                max: MAX_MAZE_SIZE,
            });
        }
        Ok(Self {
            width,
            height,
            walls: vec![[false; 4]; usize::from(width) * usize::from(height)],
        })
    }

    /// 解析 ASCII 迷路
    pub fn from_ascii(text: &str) -> Result<Self, MazeError> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end()))
            .filter(|(_, line)| !line.trim().is_empty())
            .collect();

        let parse_err = |line: usize, reason: &str| MazeError::Parse {
            line,
            reason: reason.to_string(),
        };

        let Some(&(first_no, first)) = lines.first() else {
            return Err(parse_err(0, "empty maze"));
        };
        if lines.len() < 3 || lines.len() % 2 == 0 {
            return Err(parse_err(first_no, "expected an odd number of lines (2 * height + 1)"));
        }
        if !first.starts_with('+') || first.len() < 5 || (first.len() - 1) % 4 != 0 {
            return Err(parse_err(first_no, "top border must look like +---+---+"));
        }

        let width = u8::try_from((first.len() - 1) / 4)
            .map_err(|_| parse_err(first_no, "maze too wide"))?;
        let height = u8::try_from((lines.len() - 1) / 2)
            .map_err(|_| parse_err(first_no, "maze too tall"))?;
        let mut maze = Self::open(width, height)?;

        for (k, &(line_no, line)) in lines.iter().enumerate() {
            let bytes = line.as_bytes();
            let at = |i: usize| bytes.get(i).copied().unwrap_or(b' ');

            if k % 2 == 0 {
                if at(0) != b'+' {
                    return Err(parse_err(line_no, "horizontal line must start with '+'"));
                }
                // 第 k/2 条横线是 height - 1 - k/2 行的北墙（最后一条是外周）
                let Some(y) = usize::from(height).checked_sub(1 + k / 2) else {
                    continue;
                };
                for x in 0..width {
                    if at(4 * usize::from(x) + 1) == b'-' {
                        maze.set(Cell::new(x, y as u8), Heading::North, true);
                    }
                }
            } else {
                let y = (usize::from(height) - 1 - k / 2) as u8;
                for x in 0..width {
                    if at(4 * usize::from(x)) == b'|' {
                        maze.set(Cell::new(x, y), Heading::West, true);
                    }
                }
            }
        }

        Ok(maze)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        (cell.x < self.width && cell.y < self.height)
            .then(|| usize::from(cell.y) * usize::from(self.width) + usize::from(cell.x))
    }

    /// 设置一条内部边（两侧同时写入）；外周不可修改
    pub fn set(&mut self, cell: Cell, heading: Heading, exists: bool) {
        let Some(neighbor) = cell.neighbor(heading, self.width, self.height) else {
            return;
        };
        if let (Some(a), Some(b)) = (self.index(cell), self.index(neighbor)) {
            self.walls[a][heading.index()] = exists;
            self.walls[b][heading.opposite().index()] = exists;
        }
    }

    /// 区画 `cell` 的 `heading` 方位是否有墙（外周与范围外恒为 true）
    pub fn has_wall(&self, cell: Cell, heading: Heading) -> bool {
        if cell.neighbor(heading, self.width, self.height).is_none() {
            return true;
        }
        self.index(cell).is_none_or(|i| self.walls[i][heading.index()])
    }

    /// 以 `pose` 为基准的理想传感器观测
    pub fn relative_walls(&self, pose: Pose) -> RelativeWalls {
        let front = self.has_wall(pose.cell, pose.heading);
        RelativeWalls::new(
            front,
            self.has_wall(pose.cell, pose.heading.right()),
            self.has_wall(pose.cell, pose.heading.left()),
            front,
        )
    }
}
