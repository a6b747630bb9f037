//! 墙壁状态
//!
//! 每个区画的每个方位保存一个四态标记，而不是布尔值：
//! 「未知」必须与「确认无墙」区分开，最短路径只允许走确认过的边。

use crate::cell::Heading;

/// 单面墙壁的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WallState {
    /// 确认无墙
    NotExists,
    /// 确认有墙
    Exists,
    /// 尚未观测
    #[default]
    NotVisited,
    /// 虚拟墙（规划用，实际可能不存在）
    Virtual,
}

impl WallState {
    /// 从传感器的布尔结果构造
    pub const fn from_exists(exists: bool) -> Self {
        if exists {
            WallState::Exists
        } else {
            WallState::NotExists
        }
    }

    /// 在指定模式下是否可以通过
    ///
    /// - `Exploration`: `NotExists` 与 `NotVisited` 可通过
    /// - `Shortest`: 只有 `NotExists` 可通过
    /// - `Exists` / `Virtual` 在任何模式下都不可通过
    pub const fn is_passable(self, mode: FloodMode) -> bool {
        match self {
            WallState::NotExists => true,
            WallState::NotVisited => matches!(mode, FloodMode::Exploration),
            WallState::Exists | WallState::Virtual => false,
        }
    }
}

/// 洪水填充的通行规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FloodMode {
    /// 探索：未知的墙当作无墙
    #[default]
    Exploration,
    /// 最短：只走确认无墙的边
    Shortest,
}

/// 一个区画四个方位的墙壁
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Walls([WallState; 4]);

impl Walls {
    /// 四面相同
    pub const fn uniform(state: WallState) -> Self {
        Self([state; 4])
    }

    /// 按 北 / 东 / 南 / 西 的顺序构造
    pub const fn new(north: WallState, east: WallState, south: WallState, west: WallState) -> Self {
        Self([north, east, south, west])
    }

    /// 按 北 / 东 / 南 / 西 的布尔值构造
    pub const fn from_exists(north: bool, east: bool, south: bool, west: bool) -> Self {
        Self::new(
            WallState::from_exists(north),
            WallState::from_exists(east),
            WallState::from_exists(south),
            WallState::from_exists(west),
        )
    }

    pub const fn get(&self, heading: Heading) -> WallState {
        self.0[heading.index()]
    }

    pub fn set(&mut self, heading: Heading, state: WallState) {
        self.0[heading.index()] = state;
    }

    /// 是否仍有未观测的墙
    pub fn has_unvisited(&self) -> bool {
        self.0.contains(&WallState::NotVisited)
    }
}

/// 以车体朝向为基准的墙壁观测结果
///
/// 前方两个传感器间距很小，任意一个检测到墙都视为前方有墙。
/// 后方没有传感器：刚刚从后方区画进入，视为无墙。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelativeWalls {
    pub front_right: bool,
    pub right: bool,
    pub left: bool,
    pub front_left: bool,
}

impl RelativeWalls {
    pub const fn new(front_right: bool, right: bool, left: bool, front_left: bool) -> Self {
        Self {
            front_right,
            right,
            left,
            front_left,
        }
    }

    /// 前方是否有墙
    pub const fn front(&self) -> bool {
        self.front_right || self.front_left
    }

    /// 按 `heading` 映射到绝对方位
    pub fn to_absolute(&self, heading: Heading) -> Walls {
        let mut walls = Walls::uniform(WallState::NotExists);
        walls.set(heading, WallState::from_exists(self.front()));
        walls.set(heading.right(), WallState::from_exists(self.right));
        walls.set(heading.left(), WallState::from_exists(self.left));
        walls.set(heading.opposite(), WallState::NotExists);
        walls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passability() {
        use FloodMode::*;
        assert!(WallState::NotExists.is_passable(Exploration));
        assert!(WallState::NotExists.is_passable(Shortest));
        assert!(WallState::NotVisited.is_passable(Exploration));
        assert!(!WallState::NotVisited.is_passable(Shortest));
        assert!(!WallState::Exists.is_passable(Exploration));
        assert!(!WallState::Virtual.is_passable(Exploration));
        assert!(!WallState::Virtual.is_passable(Shortest));
    }

    #[test]
    fn test_relative_to_absolute_facing_east() {
        // 朝东：前 = 东，右 = 南，左 = 北，后 = 西
        let rel = RelativeWalls::new(false, true, false, true);
        let walls = rel.to_absolute(Heading::East);
        assert_eq!(walls.get(Heading::East), WallState::Exists);
        assert_eq!(walls.get(Heading::South), WallState::Exists);
        assert_eq!(walls.get(Heading::North), WallState::NotExists);
        assert_eq!(walls.get(Heading::West), WallState::NotExists);
    }

    #[test]
    fn test_relative_to_absolute_facing_west() {
        let rel = RelativeWalls::new(false, true, true, false);
        let walls = rel.to_absolute(Heading::West);
        assert_eq!(walls.get(Heading::West), WallState::NotExists);
        assert_eq!(walls.get(Heading::North), WallState::Exists);
        assert_eq!(walls.get(Heading::South), WallState::Exists);
        assert_eq!(walls.get(Heading::East), WallState::NotExists);
    }

    #[test]
    fn test_has_unvisited() {
        let mut walls = Walls::uniform(WallState::NotExists);
        assert!(!walls.has_unvisited());
        walls.set(Heading::South, WallState::NotVisited);
        assert!(walls.has_unvisited());
    }
}
