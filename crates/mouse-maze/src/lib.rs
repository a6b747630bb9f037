//! # Mouse Maze
//!
//! 迷路地图与路径搜索（无硬件依赖）
//!
//! ## 模块
//!
//! - `cell`: 区画坐标与方位
//! - `wall`: 四态墙壁信息（`NotExists` / `Exists` / `NotVisited` / `Virtual`）
//! - `map`: 墙壁地图 + 洪水填充（BFS）距离场
//! - `navigator`: 当前位姿与下一步方向决策
//! - `search`: 探索 → 返回 → 最短 三阶段状态机
//! - `maze`: ASCII 迷路（仿真用真值）
//!
//! ## 坐标系
//!
//! 起点为 `(0, 0)`，`x` 向东增加，`y` 向北增加。

pub mod cell;
mod error;
pub mod map;
pub mod maze;
pub mod navigator;
pub mod search;
pub mod wall;

pub use cell::{Cell, Heading, Turn};
pub use error::MazeError;
pub use map::{MAX_MAZE_SIZE, UNREACHED, WallMap};
pub use maze::Maze;
pub use navigator::{Navigator, Pose};
pub use search::{SearchPhase, SearchReport, Searcher};
pub use wall::{FloodMode, RelativeWalls, WallState, Walls};
