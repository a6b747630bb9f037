//! 墙壁地图与距离场
//!
//! # 算法
//!
//! 距离场是从目标区画集合出发的 BFS（洪水填充）：
//!
//! ```text
//! reset_distances(targets)  // 目标 = 0，其余 = 255，目标入队
//! flood_fill(mode)          // 出队 → 可通行且未到达的邻居 = 当前 + 1 → 入队
//! ```
//!
//! 结果为在 `mode` 的通行假设下的最短步数。无法到达的区画保持 255。
//!
//! # 不变量
//!
//! - 区画 A 与相邻区画 B 之间的墙只有一个值：写 A 的北墙时同时写 B 的南墙
//! - 外周的墙永远是 `Exists`

use crate::cell::{Cell, Heading};
use crate::error::MazeError;
use crate::wall::{FloodMode, RelativeWalls, WallState, Walls};
use std::collections::VecDeque;
use tracing::trace;

/// 迷路单边最大区画数
pub const MAX_MAZE_SIZE: u8 = 32;

/// 距离场中「未到达」的哨兵值
pub const UNREACHED: u8 = 255;

/// 可记录的最大距离（超出部分饱和，避免与哨兵值混淆）
const MAX_DISTANCE: u8 = UNREACHED - 1;

/// 墙壁地图 + 距离场
#[derive(Debug, Clone)]
pub struct WallMap {
    width: u8,
    height: u8,
    walls: Vec<Walls>,
    distances: Vec<u8>,
    queue: VecDeque<Cell>,
}

impl WallMap {
    /// 创建地图并初始化墙壁信息
    ///
    /// # 错误
    ///
    /// 任意一边为 0 或超过 [`MAX_MAZE_SIZE`] 时返回 `MazeError::InvalidSize`。
    pub fn new(width: u8, height: u8) -> Result<Self, MazeError> {
        if width == 0 || height == 0 || width > MAX_MAZE_SIZE || height > MAX_MAZE_SIZE {
            return Err(MazeError::InvalidSize {
                width,
                height,
                max: MAX_MAZE_SIZE,
            });
        }

        let cells = usize::from(width) * usize::from(height);
        let mut map = Self {
            width,
            height,
            walls: vec![Walls::default(); cells],
            distances: vec![UNREACHED; cells],
            queue: VecDeque::with_capacity(cells),
        };
        map.reset_walls()?;
        Ok(map)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// 坐标是否在迷路范围内
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: Cell) -> Result<usize, MazeError> {
        if self.contains(cell) {
            Ok(usize::from(cell.y) * usize::from(self.width) + usize::from(cell.x))
        } else {
            Err(MazeError::OutOfBounds { cell })
        }
    }

    /// 将墙壁信息恢复为初始状态
    ///
    /// - 全部为 `NotVisited`
    /// - 外周为 `Exists`
    /// - 起点 `(0, 0)` 的东墙为 `Exists`（起点区画只向北开口）
    ///
    /// 距离场不变。
    pub fn reset_walls(&mut self) -> Result<(), MazeError> {
        self.walls.fill(Walls::uniform(WallState::NotVisited));

        for y in 0..self.height {
            for x in 0..self.width {
                let cell = Cell::new(x, y);
                let Ok(index) = self.index(cell) else {
                    continue;
                };
                for heading in Heading::ALL {
                    if cell.neighbor(heading, self.width, self.height).is_none() {
                        self.walls[index].set(heading, WallState::Exists);
                    }
                }
            }
        }

        // 只有一列时东墙本来就是外周，set_edge 不写入
        self.set_edge(Cell::new(0, 0), Heading::East, WallState::Exists)
    }

    /// 获取区画四面的墙
    pub fn walls(&self, cell: Cell) -> Result<Walls, MazeError> {
        Ok(self.walls[self.index(cell)?])
    }

    /// 获取区画某一方位的墙
    pub fn wall(&self, cell: Cell, heading: Heading) -> Result<WallState, MazeError> {
        Ok(self.walls(cell)?.get(heading))
    }

    /// 写入一条边（两侧同时写入）
    ///
    /// 外周的边保持 `Exists`，写入被忽略。
    fn set_edge(&mut self, cell: Cell, heading: Heading, state: WallState) -> Result<(), MazeError> {
        let index = self.index(cell)?;
        let Some(neighbor) = cell.neighbor(heading, self.width, self.height) else {
            return Ok(());
        };
        let neighbor_index = self.index(neighbor)?;

        self.walls[index].set(heading, state);
        self.walls[neighbor_index].set(heading.opposite(), state);
        Ok(())
    }

    /// 写入区画四面的墙，并镜像到相邻区画
    ///
    /// 幂等；对同一条边最后一次写入生效。
    pub fn set_wall(&mut self, cell: Cell, walls: Walls) -> Result<(), MazeError> {
        self.index(cell)?;
        for heading in Heading::ALL {
            self.set_edge(cell, heading, walls.get(heading))?;
        }
        trace!("set_wall {}: {:?}", cell, walls);
        Ok(())
    }

    /// 将相对朝向的传感器结果写入地图
    pub fn set_wall_relative(
        &mut self,
        cell: Cell,
        heading: Heading,
        relative: RelativeWalls,
    ) -> Result<(), MazeError> {
        self.set_wall(cell, relative.to_absolute(heading))
    }

    /// 区画是否仍有未观测的墙
    pub fn has_unvisited(&self, cell: Cell) -> bool {
        self.walls(cell).map(|walls| walls.has_unvisited()).unwrap_or(false)
    }

    /// 在 `mode` 下能否从 `cell` 向 `heading` 移动一格
    pub fn is_passable(&self, cell: Cell, heading: Heading, mode: FloodMode) -> bool {
        if cell.neighbor(heading, self.width, self.height).is_none() {
            return false;
        }
        self.wall(cell, heading).map(|state| state.is_passable(mode)).unwrap_or(false)
    }

    /// 初始化距离场：目标 = 0，其余 = 255，目标入队
    ///
    /// # 错误
    ///
    /// - `MazeError::EmptyTargets`: 目标为空
    /// - `MazeError::OutOfBounds`: 目标超出范围（此时距离场不变）
    pub fn reset_distances(&mut self, targets: &[Cell]) -> Result<(), MazeError> {
        if targets.is_empty() {
            return Err(MazeError::EmptyTargets);
        }
        let indices = targets.iter().map(|&cell| self.index(cell)).collect::<Result<Vec<_>, _>>()?;

        self.distances.fill(UNREACHED);
        self.queue.clear();
        for (&cell, index) in targets.iter().zip(indices) {
            if self.distances[index] != 0 {
                self.distances[index] = 0;
                self.queue.push_back(cell);
            }
        }
        Ok(())
    }

    /// 从队列中的目标出发进行 BFS，直到队列为空
    pub fn flood_fill(&mut self, mode: FloodMode) {
        while let Some(cell) = self.queue.pop_front() {
            let Ok(index) = self.index(cell) else {
                continue;
            };
            let step = self.distances[index];
            let walls = self.walls[index];

            for heading in Heading::ALL {
                if !walls.get(heading).is_passable(mode) {
                    continue;
                }
                let Some(neighbor) = cell.neighbor(heading, self.width, self.height) else {
                    continue;
                };
                let Ok(neighbor_index) = self.index(neighbor) else {
                    continue;
                };
                if self.distances[neighbor_index] == UNREACHED {
                    self.distances[neighbor_index] = step.saturating_add(1).min(MAX_DISTANCE);
                    self.queue.push_back(neighbor);
                }
            }
        }
    }

    /// `reset_distances` + `flood_fill`
    pub fn update_distances(&mut self, targets: &[Cell], mode: FloodMode) -> Result<(), MazeError> {
        self.reset_distances(targets)?;
        self.flood_fill(mode);
        Ok(())
    }

    /// 到目标集合的距离；范围外返回 [`UNREACHED`]
    pub fn distance(&self, cell: Cell) -> u8 {
        self.index(cell).map(|index| self.distances[index]).unwrap_or(UNREACHED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_size() {
        assert!(matches!(WallMap::new(0, 4), Err(MazeError::InvalidSize { .. })));
        assert!(matches!(WallMap::new(4, 33), Err(MazeError::InvalidSize { .. })));
        assert!(WallMap::new(32, 32).is_ok());
        assert!(WallMap::new(1, 1).is_ok());
    }

    #[test]
    fn test_boundary_walls_exist() {
        let map = WallMap::new(4, 4).unwrap();
        for i in 0..4 {
            assert_eq!(map.wall(Cell::new(i, 0), Heading::South), Ok(WallState::Exists));
            assert_eq!(map.wall(Cell::new(i, 3), Heading::North), Ok(WallState::Exists));
            assert_eq!(map.wall(Cell::new(0, i), Heading::West), Ok(WallState::Exists));
            assert_eq!(map.wall(Cell::new(3, i), Heading::East), Ok(WallState::Exists));
        }
        // 起点东墙及其镜像
        assert_eq!(map.wall(Cell::new(0, 0), Heading::East), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(1, 0), Heading::West), Ok(WallState::Exists));
        // 内部未知
        assert_eq!(map.wall(Cell::new(1, 1), Heading::North), Ok(WallState::NotVisited));
    }

    #[test]
    fn test_reset_walls_restores_initial_state() {
        let mut map = WallMap::new(4, 4).unwrap();
        map.set_wall(Cell::new(0, 0), Walls::uniform(WallState::NotExists)).unwrap();
        map.set_wall(Cell::new(2, 2), Walls::from_exists(true, true, true, true)).unwrap();
        assert_eq!(map.wall(Cell::new(0, 0), Heading::East), Ok(WallState::NotExists));

        map.reset_walls().unwrap();
        assert_eq!(map.wall(Cell::new(0, 0), Heading::East), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(1, 0), Heading::West), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(2, 2), Heading::North), Ok(WallState::NotVisited));
        assert_eq!(map.wall(Cell::new(0, 3), Heading::North), Ok(WallState::Exists));
    }

    #[test]
    fn test_single_column_start_wall_is_boundary() {
        let mut map = WallMap::new(1, 3).unwrap();
        assert_eq!(map.wall(Cell::new(0, 0), Heading::East), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(0, 0), Heading::North), Ok(WallState::NotVisited));
        assert!(map.reset_walls().is_ok());
        assert_eq!(map.wall(Cell::new(0, 0), Heading::East), Ok(WallState::Exists));
    }

    #[test]
    fn test_set_wall_mirrors_neighbors() {
        let mut map = WallMap::new(4, 4).unwrap();
        let walls = Walls::from_exists(true, false, true, false);
        map.set_wall(Cell::new(1, 1), walls).unwrap();

        assert_eq!(map.wall(Cell::new(1, 2), Heading::South), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(2, 1), Heading::West), Ok(WallState::NotExists));
        assert_eq!(map.wall(Cell::new(1, 0), Heading::North), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(0, 1), Heading::East), Ok(WallState::NotExists));
    }

    #[test]
    fn test_set_wall_keeps_boundary() {
        let mut map = WallMap::new(4, 4).unwrap();
        map.set_wall(Cell::new(0, 3), Walls::uniform(WallState::NotExists)).unwrap();
        assert_eq!(map.wall(Cell::new(0, 3), Heading::North), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(0, 3), Heading::West), Ok(WallState::Exists));
        assert_eq!(map.wall(Cell::new(0, 3), Heading::East), Ok(WallState::NotExists));
    }

    #[test]
    fn test_set_wall_out_of_bounds() {
        let mut map = WallMap::new(4, 4).unwrap();
        let err = map.set_wall(Cell::new(4, 0), Walls::default()).unwrap_err();
        assert_eq!(err, MazeError::OutOfBounds { cell: Cell::new(4, 0) });
    }

    #[test]
    fn test_reset_distances_errors() {
        let mut map = WallMap::new(4, 4).unwrap();
        assert_eq!(map.reset_distances(&[]), Err(MazeError::EmptyTargets));
        assert!(map.reset_distances(&[Cell::new(9, 9)]).is_err());
    }

    #[test]
    fn test_flood_fill_open_field() {
        // 内部全部未知，探索模式下等价于无墙
        let mut map = WallMap::new(5, 5).unwrap();
        map.update_distances(&[Cell::new(2, 2)], FloodMode::Exploration).unwrap();

        assert_eq!(map.distance(Cell::new(2, 2)), 0);
        assert_eq!(map.distance(Cell::new(2, 3)), 1);
        assert_eq!(map.distance(Cell::new(4, 4)), 4);
        // (0, 0) 东墙存在，但可以从北侧绕过，仍是曼哈顿距离
        assert_eq!(map.distance(Cell::new(0, 0)), 4);
        // (1, 0) 西侧被起点东墙挡住，不影响其到目标的距离
        assert_eq!(map.distance(Cell::new(1, 0)), 3);
    }

    #[test]
    fn test_flood_fill_shortest_requires_confirmed_edges() {
        let mut map = WallMap::new(4, 4).unwrap();
        map.update_distances(&[Cell::new(0, 3)], FloodMode::Shortest).unwrap();
        // 没有任何确认的边：只有目标自身可到达
        assert_eq!(map.distance(Cell::new(0, 3)), 0);
        assert_eq!(map.distance(Cell::new(0, 2)), UNREACHED);

        // 确认一条通路 (0,0) → (0,1) → (0,2) → (0,3)
        for y in 0..3 {
            let mut walls = map.walls(Cell::new(0, y)).unwrap();
            walls.set(Heading::North, WallState::NotExists);
            map.set_wall(Cell::new(0, y), walls).unwrap();
        }
        map.update_distances(&[Cell::new(0, 3)], FloodMode::Shortest).unwrap();
        assert_eq!(map.distance(Cell::new(0, 0)), 3);
        assert_eq!(map.distance(Cell::new(1, 1)), UNREACHED);
    }

    #[test]
    fn test_virtual_wall_blocks_exploration() {
        let mut map = WallMap::new(3, 1).unwrap();
        let mut walls = map.walls(Cell::new(1, 0)).unwrap();
        walls.set(Heading::East, WallState::Virtual);
        map.set_wall(Cell::new(1, 0), walls).unwrap();

        map.update_distances(&[Cell::new(2, 0)], FloodMode::Exploration).unwrap();
        assert_eq!(map.distance(Cell::new(1, 0)), UNREACHED);
    }

    #[test]
    fn test_multiple_targets() {
        let mut map = WallMap::new(6, 6).unwrap();
        let goals = [Cell::new(2, 2), Cell::new(3, 2), Cell::new(2, 3), Cell::new(3, 3)];
        map.update_distances(&goals, FloodMode::Exploration).unwrap();
        for goal in goals {
            assert_eq!(map.distance(goal), 0);
        }
        assert_eq!(map.distance(Cell::new(5, 5)), 4);
        assert_eq!(map.distance(Cell::new(0, 2)), 2);
    }

    #[test]
    fn test_distance_out_of_bounds_is_unreached() {
        let map = WallMap::new(4, 4).unwrap();
        assert_eq!(map.distance(Cell::new(10, 0)), UNREACHED);
    }
}
