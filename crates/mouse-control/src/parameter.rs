//! 走行参数与目标值

/// 走行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotionPattern {
    /// 无控制（输出 0 V，不会完成）
    #[default]
    Free,
    /// 停止
    Stop,
    /// 直线
    Straight,
    /// 原地旋转
    Turn,
}

impl MotionPattern {
    /// 开始新的一段走行时是否需要清零里程计
    pub const fn starts_new_leg(self) -> bool {
        matches!(self, MotionPattern::Straight | MotionPattern::Turn)
    }
}

/// 走行方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotionDirection {
    #[default]
    Forward,
    Back,
    /// 逆时针（角速度为正）
    Left,
    /// 顺时针（角速度为负）
    Right,
}

impl MotionDirection {
    /// 线速度符号
    pub const fn linear_sign(self) -> f64 {
        match self {
            MotionDirection::Back => -1.0,
            _ => 1.0,
        }
    }

    /// 角速度符号
    pub const fn angular_sign(self) -> f64 {
        match self {
            MotionDirection::Right => -1.0,
            _ => 1.0,
        }
    }
}

/// 走行参数（由序列器生成，每次覆盖）
///
/// 速度、加速度、距离、角度都以大小给出，方向由 `direction` 决定。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionParameter {
    pub pattern: MotionPattern,
    pub direction: MotionDirection,
    /// [m/s^2]
    pub acceleration: f64,
    /// [m/s]
    pub max_velocity: f64,
    /// 到达距离时的速度 [m/s]
    pub end_velocity: f64,
    /// [mm]
    pub length: f64,
    /// [rad/s^2]
    pub angular_acceleration: f64,
    /// [rad/s]
    pub max_angular_velocity: f64,
    /// [deg]
    pub angle: f64,
    /// 侧墙修正
    pub enable_side_wall_adjust: bool,
}

impl MotionParameter {
    /// 直线
    pub fn straight(
        direction: MotionDirection,
        length: f64,
        acceleration: f64,
        max_velocity: f64,
        end_velocity: f64,
    ) -> Self {
        Self {
            pattern: MotionPattern::Straight,
            direction,
            acceleration: acceleration.abs(),
            max_velocity: max_velocity.abs(),
            end_velocity: end_velocity.abs(),
            length: length.abs(),
            ..Self::default()
        }
    }

    /// 原地旋转
    pub fn turn(
        angle: f64,
        angular_acceleration: f64,
        max_angular_velocity: f64,
        direction: MotionDirection,
    ) -> Self {
        Self {
            pattern: MotionPattern::Turn,
            direction,
            angular_acceleration: angular_acceleration.abs(),
            max_angular_velocity: max_angular_velocity.abs(),
            angle: angle.abs(),
            ..Self::default()
        }
    }

    pub fn stop() -> Self {
        Self {
            pattern: MotionPattern::Stop,
            ..Self::default()
        }
    }

    pub fn free() -> Self {
        Self::default()
    }

    /// 启用 / 禁用侧墙修正
    pub fn with_side_wall_adjust(mut self, enable: bool) -> Self {
        self.enable_side_wall_adjust = enable;
        self
    }
}

/// 控制器的积分目标值（跨周期保存）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionTarget {
    /// [m/s]
    pub velocity: f64,
    /// [rad/s]
    pub angular_velocity: f64,
    /// [deg]
    pub angle: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_store_magnitudes() {
        let p = MotionParameter::straight(MotionDirection::Back, -180.0, 1.0, -0.3, 0.0);
        assert_eq!(p.pattern, MotionPattern::Straight);
        assert_eq!(p.length, 180.0);
        assert_eq!(p.max_velocity, 0.3);
        assert!(!p.enable_side_wall_adjust);

        let p = MotionParameter::turn(-90.0, 20.0, 3.0, MotionDirection::Right);
        assert_eq!(p.angle, 90.0);
        assert_eq!(p.max_velocity, 0.0);
        assert_eq!(p.direction.angular_sign(), -1.0);
    }

    #[test]
    fn test_new_leg_patterns() {
        assert!(MotionPattern::Straight.starts_new_leg());
        assert!(MotionPattern::Turn.starts_new_leg());
        assert!(!MotionPattern::Stop.starts_new_leg());
        assert!(!MotionPattern::Free.starts_new_leg());
    }
}
