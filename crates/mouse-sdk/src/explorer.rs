//! 搜索走行
//!
//! 把搜索状态机的每一步转换为走行指令，在序列器线程中阻塞执行：
//!
//! 1. 读取最近的墙壁传感器快照，转换为相对墙壁
//! 2. `Searcher::plan` 得到下一步的绝对方位
//! 3. 与当前朝向比较：直进 / 左右 90° / 180° 原地旋转后，直线走一个区画
//! 4. 全部动作完成后 `Searcher::commit`，走行失败时地图位姿不变
//!
//! 每个区画停在中央（终速 0），不做连续走行。

use crate::error::SdkError;
use mouse_control::{MotionDirection, MotionParameter, MotionPattern, Run};
use mouse_driver::WallSensors;
use mouse_maze::{Heading, Pose, RelativeWalls, SearchPhase, Searcher, Turn};
use tracing::{debug, info};

/// 一个区画的走行参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManeuverProfile {
    /// [mm]
    pub cell_size_mm: f64,
    /// [m/s^2]
    pub acceleration: f64,
    /// [m/s]
    pub velocity: f64,
    /// [rad/s^2]
    pub angular_acceleration: f64,
    /// [rad/s]
    pub angular_velocity: f64,
    pub side_wall_adjust: bool,
}

impl Default for ManeuverProfile {
    fn default() -> Self {
        Self {
            cell_size_mm: 45.0,
            acceleration: 1.0,
            velocity: 0.3,
            angular_acceleration: 20.0,
            angular_velocity: 3.0,
            side_wall_adjust: true,
        }
    }
}

/// 墙壁传感器读数 → 以车体为基准的墙壁
pub fn relative_walls(wall: &WallSensors) -> RelativeWalls {
    RelativeWalls::new(
        wall.front_right().exists,
        wall.right().exists,
        wall.left().exists,
        wall.front_left().exists,
    )
}

/// 一步的走行指令：需要时先原地旋转，再直线一个区画
pub fn plan_move(turn: Turn, profile: &ManeuverProfile) -> Vec<MotionParameter> {
    let rotate = |angle: f64, direction: MotionDirection| {
        MotionParameter::turn(
            angle,
            profile.angular_acceleration,
            profile.angular_velocity,
            direction,
        )
    };

    let mut plan = Vec::with_capacity(2);
    match turn {
        Turn::Straight => {},
        Turn::Right => plan.push(rotate(90.0, MotionDirection::Right)),
        Turn::Left => plan.push(rotate(90.0, MotionDirection::Left)),
        Turn::Back => plan.push(rotate(180.0, MotionDirection::Left)),
    }
    plan.push(
        MotionParameter::straight(
            MotionDirection::Forward,
            profile.cell_size_mm,
            profile.acceleration,
            profile.velocity,
            0.0,
        )
        .with_side_wall_adjust(profile.side_wall_adjust),
    );
    plan
}

/// 搜索走行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploreReport {
    /// 移动的区画数（全部阶段）
    pub steps: usize,
    /// 执行的走行指令数
    pub maneuvers: usize,
    pub final_pose: Pose,
    pub phase: SearchPhase,
}

/// 搜索走行
#[derive(Debug)]
pub struct Explorer<'a> {
    run: &'a Run,
    searcher: Searcher,
    profile: ManeuverProfile,
    /// 车体实际朝向
    heading: Heading,
    steps: usize,
    maneuvers: usize,
}

impl<'a> Explorer<'a> {
    pub fn new(run: &'a Run, searcher: Searcher, profile: ManeuverProfile) -> Self {
        let heading = searcher.pose().heading;
        Self {
            run,
            searcher,
            profile,
            heading,
            steps: 0,
            maneuvers: 0,
        }
    }

    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// 走一个区画；搜索完成时返回 `false`
    pub fn step(&mut self) -> Result<bool, SdkError> {
        let walls = relative_walls(&self.run.sensed().wall);
        let Some(heading) = self.searcher.plan(Some(walls))? else {
            return Ok(false);
        };

        let turn = self.heading.turn_to(heading);
        for param in plan_move(turn, &self.profile) {
            self.run.execute(param)?;
            self.maneuvers += 1;
            if param.pattern == MotionPattern::Turn {
                self.heading = heading;
            }
        }
        // 所有动作完成后才移动地图上的位姿
        self.searcher.commit(heading)?;
        self.steps += 1;
        debug!(
            "[{}] moved {} ({:?}) to {}",
            self.searcher.phase(),
            heading,
            turn,
            self.searcher.pose()
        );
        Ok(true)
    }

    /// 走完全部阶段后停止
    pub fn explore(&mut self) -> Result<ExploreReport, SdkError> {
        while self.step()? {}
        self.run.stop()?;

        let report = ExploreReport {
            steps: self.steps,
            maneuvers: self.maneuvers,
            final_pose: self.searcher.pose(),
            phase: self.searcher.phase(),
        };
        info!(
            "Exploration finished at {} after {} cells / {} maneuvers",
            report.final_pose, report.steps, report.maneuvers
        );
        Ok(report)
    }
}
