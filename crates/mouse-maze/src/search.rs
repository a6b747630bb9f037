//! 搜索状态机
//!
//! ```text
//! ToGoal   : 观测 → flood_fill(Exploration, goals) → 移动   （到达目标区画为止）
//! ToStart  : 观测 → flood_fill(Exploration, {start}) → 移动 （到达起点为止）
//!            到达起点后原地旋转 180°
//! Shortest : flood_fill(Shortest, goals) → 移动              （到达目标区画为止）
//! Finished
//! ```
//!
//! 最短阶段不再观测墙壁，只走探索中确认无墙的边。

use crate::cell::{Cell, Heading};
use crate::error::MazeError;
use crate::map::{UNREACHED, WallMap};
use crate::maze::Maze;
use crate::navigator::{Navigator, Pose};
use crate::wall::{FloodMode, RelativeWalls};
use std::fmt;
use tracing::{debug, info};

/// 搜索阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchPhase {
    /// 探索前往目标区画
    ToGoal,
    /// 探索返回起点
    ToStart,
    /// 最短路径行走
    Shortest,
    /// 完成
    Finished,
}

impl SearchPhase {
    /// 该阶段使用的通行规则
    pub const fn mode(self) -> FloodMode {
        match self {
            SearchPhase::Shortest | SearchPhase::Finished => FloodMode::Shortest,
            SearchPhase::ToGoal | SearchPhase::ToStart => FloodMode::Exploration,
        }
    }

    /// 该阶段是否观测墙壁
    pub const fn observes_walls(self) -> bool {
        matches!(self, SearchPhase::ToGoal | SearchPhase::ToStart)
    }
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchPhase::ToGoal => "to-goal",
            SearchPhase::ToStart => "to-start",
            SearchPhase::Shortest => "shortest",
            SearchPhase::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// 仿真搜索结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    /// 探索前往目标的步数
    pub to_goal_steps: usize,
    /// 返回起点的步数
    pub to_start_steps: usize,
    /// 最短路径的区画序列（含起点与终点）
    pub shortest_path: Vec<Cell>,
    /// 最终位姿
    pub final_pose: Pose,
}

impl SearchReport {
    /// 最短路径的步数
    pub fn shortest_steps(&self) -> usize {
        self.shortest_path.len().saturating_sub(1)
    }
}

/// 搜索状态机
#[derive(Debug, Clone)]
pub struct Searcher {
    map: WallMap,
    navigator: Navigator,
    start: Cell,
    goals: Vec<Cell>,
    phase: SearchPhase,
    /// 当前阶段已移动的步数
    phase_steps: usize,
    /// 每个阶段的步数上限
    step_budget: usize,
}

impl Searcher {
    /// 创建搜索状态机，从 `start` 朝北出发
    ///
    /// # 错误
    ///
    /// - `MazeError::InvalidSize`: 迷路尺寸无效
    /// - `MazeError::EmptyTargets`: 目标区画为空
    /// - `MazeError::OutOfBounds`: 起点或目标超出范围
    pub fn new(width: u8, height: u8, start: Cell, goals: Vec<Cell>) -> Result<Self, MazeError> {
        let map = WallMap::new(width, height)?;
        if goals.is_empty() {
            return Err(MazeError::EmptyTargets);
        }
        if let Some(&cell) = std::iter::once(&start)
            .chain(goals.iter())
            .find(|&&cell| !map.contains(cell))
        {
            return Err(MazeError::OutOfBounds { cell });
        }

        Ok(Self {
            map,
            navigator: Navigator::new(Pose::new(start, Heading::North)),
            start,
            goals,
            phase: SearchPhase::ToGoal,
            phase_steps: 0,
            step_budget: usize::from(width) * usize::from(height) * 4,
        })
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn pose(&self) -> Pose {
        self.navigator.pose()
    }

    pub fn map(&self) -> &WallMap {
        &self.map
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn goals(&self) -> &[Cell] {
        &self.goals
    }

    /// 当前阶段的目标区画集合
    pub fn targets(&self) -> &[Cell] {
        match self.phase {
            SearchPhase::ToStart => std::slice::from_ref(&self.start),
            SearchPhase::ToGoal | SearchPhase::Shortest | SearchPhase::Finished => &self.goals,
        }
    }

    fn at_target(&self) -> bool {
        self.targets().contains(&self.navigator.pose().cell)
    }

    fn enter_next_phase(&mut self) {
        let next = match self.phase {
            SearchPhase::ToGoal => SearchPhase::ToStart,
            SearchPhase::ToStart => {
                self.navigator.rotate_back();
                SearchPhase::Shortest
            },
            SearchPhase::Shortest | SearchPhase::Finished => SearchPhase::Finished,
        };
        info!(
            "Search phase {} -> {} at {} after {} steps",
            self.phase,
            next,
            self.navigator.pose(),
            self.phase_steps
        );
        self.phase = next;
        self.phase_steps = 0;
        self.navigator.set_mode(next.mode());
    }

    /// 前进一格（`plan` + `commit`）
    ///
    /// `observation` 为当前区画的墙壁观测（最短阶段忽略）。
    /// 返回本步移动的绝对方位，位姿已更新；搜索完成时返回 `None`。
    ///
    /// # 错误
    ///
    /// 当前区画在已知墙壁下无法到达目标，或本阶段步数超过上限时返回
    /// `MazeError::Unreachable`。
    pub fn step(&mut self, observation: Option<RelativeWalls>) -> Result<Option<Heading>, MazeError> {
        let Some(heading) = self.plan(observation)? else {
            return Ok(None);
        };
        self.commit(heading)?;
        Ok(Some(heading))
    }

    /// 决定下一步的方位，位姿不变
    ///
    /// 写入观测、切换阶段、更新距离场。实际移动完成后调用 [`Searcher::commit`]；
    /// 移动失败时可以在同一区画再次调用。搜索完成时返回 `None`。
    pub fn plan(&mut self, observation: Option<RelativeWalls>) -> Result<Option<Heading>, MazeError> {
        if self.phase == SearchPhase::Finished {
            return Ok(None);
        }

        if let Some(walls) = observation.filter(|_| self.phase.observes_walls()) {
            self.navigator.observe(&mut self.map, walls)?;
        }

        while self.at_target() {
            self.enter_next_phase();
            if self.phase == SearchPhase::Finished {
                return Ok(None);
            }
        }

        let cell = self.navigator.pose().cell;
        let mode = self.phase.mode();
        let targets = self.targets().to_vec();
        self.map.update_distances(&targets, mode)?;

        if self.map.distance(cell) == UNREACHED || self.phase_steps >= self.step_budget {
            return Err(MazeError::Unreachable { cell });
        }

        self.navigator
            .next_direction(&self.map)
            .map(Some)
            .ok_or(MazeError::Unreachable { cell })
    }

    /// 确认向 `heading` 移动了一格
    pub fn commit(&mut self, heading: Heading) -> Result<(), MazeError> {
        self.navigator.advance(heading, &self.map)?;
        self.phase_steps += 1;
        debug!(
            "[{}] step {} -> {} (distance {})",
            self.phase,
            self.phase_steps,
            heading,
            self.map.distance(self.navigator.pose().cell)
        );
        Ok(())
    }

    /// 在真值迷路上执行完整搜索
    pub fn run_simulated(&mut self, maze: &Maze) -> Result<SearchReport, MazeError> {
        let expected = (self.map.width(), self.map.height());
        let actual = (maze.width(), maze.height());
        if expected != actual {
            return Err(MazeError::SizeMismatch { expected, actual });
        }

        let mut to_goal_steps = 0;
        let mut to_start_steps = 0;
        let mut shortest_path = Vec::new();

        loop {
            let observation = maze.relative_walls(self.navigator.pose());
            let before = self.navigator.pose();
            let Some(heading) = self.step(Some(observation))? else {
                break;
            };

            match self.phase {
                SearchPhase::ToGoal => to_goal_steps += 1,
                SearchPhase::ToStart => to_start_steps += 1,
                SearchPhase::Shortest => {
                    if shortest_path.is_empty() {
                        shortest_path.push(before.cell);
                    }
                    shortest_path.push(self.navigator.pose().cell);
                },
                SearchPhase::Finished => {},
            }

            debug_assert!(
                !maze.has_wall(before.cell, heading),
                "moved through a wall at {}",
                before.cell
            );
        }

        // 起点即目标时最短路径只有一个区画
        if shortest_path.is_empty() {
            shortest_path.push(self.navigator.pose().cell);
        }

        Ok(SearchReport {
            to_goal_steps,
            to_start_steps,
            shortest_path,
            final_pose: self.navigator.pose(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 只有一条通路的 4x4 迷路：(0,0) → 北 → 东 → 南 ... → (1,1)
    const TREE_4X4: &str = "
+---+---+---+---+
|               |
+   +---+---+   +
|   |       |   |
+   +   +   +   +
|   |   |       |
+   +   +---+---+
|   |           |
+---+---+---+---+
";

    /// 中心区画被四面墙封闭
    const ENCLOSED_3X3: &str = "
+---+---+---+
|           |
+   +---+   +
|   |   |   |
+   +---+   +
|   |       |
+---+---+---+
";

    #[test]
    fn test_new_validates_targets() {
        assert_eq!(
            Searcher::new(4, 4, Cell::new(0, 0), vec![]).unwrap_err(),
            MazeError::EmptyTargets
        );
        assert_eq!(
            Searcher::new(4, 4, Cell::new(0, 0), vec![Cell::new(4, 4)]).unwrap_err(),
            MazeError::OutOfBounds {
                cell: Cell::new(4, 4)
            }
        );
        assert!(Searcher::new(0, 4, Cell::new(0, 0), vec![Cell::new(0, 0)]).is_err());
    }

    #[test]
    fn test_first_step_goes_north() {
        let mut searcher = Searcher::new(16, 16, Cell::new(0, 0), vec![Cell::new(7, 7)]).unwrap();
        let step = searcher.step(Some(RelativeWalls::new(false, true, true, false))).unwrap();
        assert_eq!(step, Some(Heading::North));
        assert_eq!(searcher.pose().cell, Cell::new(0, 1));
        assert_eq!(searcher.phase(), SearchPhase::ToGoal);
    }

    #[test]
    fn test_plan_keeps_pose_until_commit() {
        let mut searcher = Searcher::new(1, 3, Cell::new(0, 0), vec![Cell::new(0, 2)]).unwrap();
        let walls = RelativeWalls::new(false, true, true, false);
        let before = searcher.pose();

        assert_eq!(searcher.plan(Some(walls)).unwrap(), Some(Heading::North));
        assert_eq!(searcher.pose(), before);
        // 移动失败后在同一区画重新规划，结果不变
        assert_eq!(searcher.plan(Some(walls)).unwrap(), Some(Heading::North));
        assert_eq!(searcher.pose(), before);

        searcher.commit(Heading::North).unwrap();
        assert_eq!(searcher.pose().cell, Cell::new(0, 1));
        assert_eq!(searcher.pose().heading, Heading::North);
    }

    #[test]
    fn test_run_simulated_tree_maze() {
        let maze = Maze::from_ascii(TREE_4X4).unwrap();
        let mut searcher = Searcher::new(4, 4, Cell::new(0, 0), vec![Cell::new(1, 1)]).unwrap();
        let report = searcher.run_simulated(&maze).unwrap();

        assert_eq!(searcher.phase(), SearchPhase::Finished);
        assert_eq!(report.final_pose.cell, Cell::new(1, 1));
        assert_eq!(report.shortest_steps(), 12);
        assert_eq!(report.shortest_path.first(), Some(&Cell::new(0, 0)));
        assert_eq!(report.shortest_path.last(), Some(&Cell::new(1, 1)));
        assert!(report.to_goal_steps >= 12);
        assert!(report.to_start_steps >= 12);
    }

    #[test]
    fn test_run_simulated_open_maze() {
        let maze = Maze::open(5, 5).unwrap();
        let mut searcher = Searcher::new(5, 5, Cell::new(0, 0), vec![Cell::new(2, 2)]).unwrap();
        // 真值迷路没有起点东墙，但地图默认认为有
        let report = searcher.run_simulated(&maze).unwrap();
        assert_eq!(report.final_pose.cell, Cell::new(2, 2));
        assert_eq!(report.shortest_steps(), 4);
    }

    #[test]
    fn test_unreachable_goal() {
        let maze = Maze::from_ascii(ENCLOSED_3X3).unwrap();
        let mut searcher = Searcher::new(3, 3, Cell::new(0, 0), vec![Cell::new(1, 1)]).unwrap();
        let err = searcher.run_simulated(&maze).unwrap_err();
        assert!(matches!(err, MazeError::Unreachable { .. }));
    }

    #[test]
    fn test_size_mismatch() {
        let maze = Maze::open(3, 3).unwrap();
        let mut searcher = Searcher::new(4, 4, Cell::new(0, 0), vec![Cell::new(1, 1)]).unwrap();
        assert!(matches!(
            searcher.run_simulated(&maze),
            Err(MazeError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_start_is_goal_finishes_immediately() {
        let mut searcher = Searcher::new(2, 2, Cell::new(0, 0), vec![Cell::new(0, 0)]).unwrap();
        assert_eq!(searcher.step(None).unwrap(), None);
        assert_eq!(searcher.phase(), SearchPhase::Finished);
    }
}
