//! 区画坐标与方位

use std::fmt;

/// 迷路中的区画坐标
///
/// `(0, 0)` 为起点，`x` 向东、`y` 向北增加。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub x: u8,
    pub y: u8,
}

impl Cell {
    /// 创建区画坐标
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// 获取 `heading` 方向的相邻区画
    ///
    /// 超出 `width` x `height` 的范围时返回 `None`。
    pub fn neighbor(self, heading: Heading, width: u8, height: u8) -> Option<Cell> {
        let (x, y) = (self.x, self.y);
        let next = match heading {
            Heading::North => Cell::new(x, y.checked_add(1)?),
            Heading::East => Cell::new(x.checked_add(1)?, y),
            Heading::South => Cell::new(x, y.checked_sub(1)?),
            Heading::West => Cell::new(x.checked_sub(1)?, y),
        };
        (next.x < width && next.y < height).then_some(next)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 绝对方位
///
/// 判定顺序固定为 北 → 东 → 南 → 西（`Heading::ALL`），
/// 导航的平局裁决依赖这个顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Heading {
    #[default]
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Heading {
    /// 判定顺序
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    /// 数组下标（0..4）
    pub const fn index(self) -> usize {
        self as usize
    }

    const fn from_index(index: usize) -> Self {
        match index & 0x03 {
            0 => Heading::North,
            1 => Heading::East,
            2 => Heading::South,
            _ => Heading::West,
        }
    }

    /// 旋转 180°
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// 右手方向（顺时针 90°）
    pub const fn right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// 左手方向（逆时针 90°）
    pub const fn left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// 从 `self` 转向 `target` 需要的动作
    pub const fn turn_to(self, target: Heading) -> Turn {
        match (target.index() + 4 - self.index()) & 0x03 {
            0 => Turn::Straight,
            1 => Turn::Right,
            2 => Turn::Back,
            _ => Turn::Left,
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Heading::North => "N",
            Heading::East => "E",
            Heading::South => "S",
            Heading::West => "W",
        };
        f.write_str(s)
    }
}

/// 相对当前朝向的转向动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    Straight,
    Right,
    Back,
    Left,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_rotation() {
        for heading in Heading::ALL {
            assert_eq!(heading.opposite().opposite(), heading);
            assert_eq!(heading.right().left(), heading);
            assert_eq!(heading.right().right(), heading.opposite());
        }
        assert_eq!(Heading::North.right(), Heading::East);
        assert_eq!(Heading::North.left(), Heading::West);
        assert_eq!(Heading::West.right(), Heading::North);
    }

    #[test]
    fn test_turn_to() {
        assert_eq!(Heading::North.turn_to(Heading::North), Turn::Straight);
        assert_eq!(Heading::North.turn_to(Heading::East), Turn::Right);
        assert_eq!(Heading::North.turn_to(Heading::South), Turn::Back);
        assert_eq!(Heading::North.turn_to(Heading::West), Turn::Left);
        assert_eq!(Heading::West.turn_to(Heading::North), Turn::Right);
        assert_eq!(Heading::East.turn_to(Heading::North), Turn::Left);
    }

    #[test]
    fn test_neighbor_bounds() {
        let origin = Cell::new(0, 0);
        assert_eq!(origin.neighbor(Heading::South, 4, 4), None);
        assert_eq!(origin.neighbor(Heading::West, 4, 4), None);
        assert_eq!(origin.neighbor(Heading::North, 4, 4), Some(Cell::new(0, 1)));
        assert_eq!(origin.neighbor(Heading::East, 4, 4), Some(Cell::new(1, 0)));

        let corner = Cell::new(3, 3);
        assert_eq!(corner.neighbor(Heading::North, 4, 4), None);
        assert_eq!(corner.neighbor(Heading::East, 4, 4), None);
    }
}
