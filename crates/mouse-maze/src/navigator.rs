//! 位姿与下一步方向决策

use crate::cell::{Cell, Heading};
use crate::error::MazeError;
use crate::map::{UNREACHED, WallMap};
use crate::wall::{FloodMode, RelativeWalls};
use std::fmt;
use tracing::debug;

/// 当前位姿（区画 + 朝向）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub cell: Cell,
    pub heading: Heading,
}

impl Pose {
    pub const fn new(cell: Cell, heading: Heading) -> Self {
        Self { cell, heading }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.cell, self.heading)
    }
}

/// 导航器
///
/// 持有位姿，根据 [`WallMap`] 的距离场决定下一步方向。
/// 位姿只在确认移动后（[`Navigator::advance`]）更新。
#[derive(Debug, Clone)]
pub struct Navigator {
    pose: Pose,
    mode: FloodMode,
}

impl Navigator {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            mode: FloodMode::Exploration,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn mode(&self) -> FloodMode {
        self.mode
    }

    /// 切换通行规则（探索 / 最短）
    pub fn set_mode(&mut self, mode: FloodMode) {
        self.mode = mode;
    }

    /// 方向优先级
    ///
    /// 直行 2，转弯 1，掉头 0；目标区画还有未观测的墙时 +4。
    pub fn priority(&self, map: &WallMap, heading: Heading) -> u8 {
        let base = if heading == self.pose.heading {
            2
        } else if heading == self.pose.heading.opposite() {
            0
        } else {
            1
        };

        let unvisited = self
            .pose
            .cell
            .neighbor(heading, map.width(), map.height())
            .is_some_and(|next| map.has_unvisited(next));

        if unvisited { base + 4 } else { base }
    }

    /// 选择下一步方向
    ///
    /// 距离最小者优先；距离相同时优先级高者优先；
    /// 仍然相同时按 北 → 东 → 南 → 西 的顺序取第一个。
    /// 四个方向都不可通行（或相邻区画都未到达）时返回 `None`。
    pub fn next_direction(&self, map: &WallMap) -> Option<Heading> {
        let cell = self.pose.cell;
        let mut best: Option<(Heading, u8, u8)> = None;

        for heading in Heading::ALL {
            if !map.is_passable(cell, heading, self.mode) {
                continue;
            }
            let Some(next) = cell.neighbor(heading, map.width(), map.height()) else {
                continue;
            };
            let step = map.distance(next);
            if step == UNREACHED {
                continue;
            }
            let priority = self.priority(map, heading);

            let better = match best {
                None => true,
                Some((_, min_step, max_priority)) => {
                    step < min_step || (step == min_step && priority > max_priority)
                },
            };
            if better {
                best = Some((heading, step, priority));
            }
        }

        best.map(|(heading, _, _)| heading)
    }

    /// 将当前位置的传感器观测写入地图
    pub fn observe(&self, map: &mut WallMap, walls: RelativeWalls) -> Result<(), MazeError> {
        map.set_wall_relative(self.pose.cell, self.pose.heading, walls)
    }

    /// 向 `heading` 前进一格，并朝向 `heading`
    ///
    /// 超出范围时位姿不变。
    pub fn advance(&mut self, heading: Heading, map: &WallMap) -> Result<(), MazeError> {
        let next = self
            .pose
            .cell
            .neighbor(heading, map.width(), map.height())
            .ok_or(MazeError::OutOfBounds {
                cell: self.pose.cell,
            })?;
        debug!("advance {} -> {} {}", self.pose, next, heading);
        self.pose = Pose::new(next, heading);
        Ok(())
    }

    /// 原地旋转 180°
    pub fn rotate_back(&mut self) {
        self.pose.heading = self.pose.heading.opposite();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wall::{WallState, Walls};

    fn goal_center() -> [Cell; 1] {
        [Cell::new(8, 8)]
    }

    #[test]
    fn test_prefers_straight_on_tie() {
        let mut map = WallMap::new(16, 16).unwrap();
        map.update_distances(&goal_center(), FloodMode::Exploration).unwrap();

        // (1,1) 朝北：北 (1,2) 与 东 (2,1) 距离相同
        let nav = Navigator::new(Pose::new(Cell::new(1, 1), Heading::North));
        assert_eq!(nav.next_direction(&map), Some(Heading::North));

        let nav = Navigator::new(Pose::new(Cell::new(1, 1), Heading::East));
        assert_eq!(nav.next_direction(&map), Some(Heading::East));
    }

    #[test]
    fn test_prefers_turn_over_reverse_on_tie() {
        // 目标在东北角之外的同一行：朝南时北 (掉头) 与东 (转弯) 距离相同
        let mut map = WallMap::new(5, 5).unwrap();
        map.update_distances(&[Cell::new(4, 4)], FloodMode::Exploration).unwrap();

        let nav = Navigator::new(Pose::new(Cell::new(2, 2), Heading::South));
        assert_eq!(nav.next_direction(&map), Some(Heading::East));

        let nav = Navigator::new(Pose::new(Cell::new(2, 2), Heading::West));
        assert_eq!(nav.next_direction(&map), Some(Heading::North));
    }

    #[test]
    fn test_unvisited_bonus_breaks_tie() {
        let mut map = WallMap::new(5, 5).unwrap();
        // 把 (3,2) 四面全部确认，使其没有未观测墙
        map.set_wall(Cell::new(3, 2), Walls::uniform(WallState::NotExists)).unwrap();
        map.update_distances(&[Cell::new(4, 4)], FloodMode::Exploration).unwrap();

        // 朝东：东 (3,2) 直行 2；北 (2,3) 转弯 1 + 4
        let nav = Navigator::new(Pose::new(Cell::new(2, 2), Heading::East));
        assert_eq!(nav.next_direction(&map), Some(Heading::North));
    }

    #[test]
    fn test_start_cell_only_north_open() {
        let mut map = WallMap::new(16, 16).unwrap();
        map.update_distances(&goal_center(), FloodMode::Exploration).unwrap();
        let nav = Navigator::new(Pose::default());
        assert_eq!(nav.next_direction(&map), Some(Heading::North));
    }

    #[test]
    fn test_no_direction_when_enclosed() {
        let mut map = WallMap::new(3, 3).unwrap();
        map.set_wall(Cell::new(1, 1), Walls::uniform(WallState::Exists)).unwrap();
        map.update_distances(&[Cell::new(2, 2)], FloodMode::Exploration).unwrap();
        let nav = Navigator::new(Pose::new(Cell::new(1, 1), Heading::North));
        assert_eq!(nav.next_direction(&map), None);
    }

    #[test]
    fn test_advance_and_rotate() {
        let map = WallMap::new(4, 4).unwrap();
        let mut nav = Navigator::new(Pose::default());
        nav.advance(Heading::North, &map).unwrap();
        assert_eq!(nav.pose(), Pose::new(Cell::new(0, 1), Heading::North));
        nav.advance(Heading::East, &map).unwrap();
        assert_eq!(nav.pose(), Pose::new(Cell::new(1, 1), Heading::East));
        nav.rotate_back();
        assert_eq!(nav.pose().heading, Heading::West);

        let mut nav = Navigator::new(Pose::default());
        assert!(nav.advance(Heading::South, &map).is_err());
        assert_eq!(nav.pose(), Pose::default());
    }

    #[test]
    fn test_observe_writes_relative_walls() {
        let mut map = WallMap::new(4, 4).unwrap();
        let nav = Navigator::new(Pose::new(Cell::new(1, 1), Heading::East));
        nav.observe(&mut map, RelativeWalls::new(true, false, true, true)).unwrap();
        assert_eq!(map.wall(Cell::new(1, 1), Heading::East), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(1, 1), Heading::North), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(1, 1), Heading::South), Ok(WallState::NotExists));
        assert_eq!(map.wall(Cell::new(2, 1), Heading::West), Ok(WallState::Exists));
    }
}
