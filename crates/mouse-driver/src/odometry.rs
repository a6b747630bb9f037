//! 里程计
//!
//! # 车轮
//!
//! 编码器原始值 `0..resolution` 的差分（带回绕修正）换算为角度、角速度、角加速度。
//!
//! # 车体
//!
//! - 速度 = 左右车轮线速度的平均
//! - 角速度 = 陀螺仪 z 轴（低角速度时车轮差分噪声较大）
//! - 位置 = 等曲率圆弧（unicycle 模型）的精确积分
//!
//! ```text
//! Δθ = ω·dt
//! chord = 2·v/ω·sin(Δθ/2)
//! x += chord·cos(θ + Δθ/2)
//! y += chord·sin(θ + Δθ/2)
//! ```

use crate::error::DriverError;
use std::f64::consts::PI;

/// `|ω|` 低于该值时按直线积分 [rad/s]
const STRAIGHT_EPSILON: f64 = 1e-9;

/// 车轮参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelParams {
    /// 编码器分辨率（每转计数）
    pub resolution: u32,
    /// 轮胎直径 [mm]
    pub tire_diameter_mm: f64,
    /// 安装方向相反时为 true（读数取 `resolution - raw`）
    pub invert: bool,
}

/// 单个车轮的状态
#[derive(Debug, Clone)]
pub struct Wheel {
    params: WheelParams,
    previous: Option<u32>,
    /// 累计角度 [rad]
    angle: f64,
    angular_velocity: f64,
    angular_acceleration: f64,
}

impl Wheel {
    /// # 错误
    ///
    /// 分辨率为 0 或轮胎直径不为正时返回 `DriverError::InvalidConfig`。
    pub fn new(params: WheelParams) -> Result<Self, DriverError> {
        if params.resolution == 0 {
            return Err(DriverError::InvalidConfig(
                "encoder resolution must be non-zero".to_string(),
            ));
        }
        if params.tire_diameter_mm.is_nan() || params.tire_diameter_mm <= 0.0 {
            return Err(DriverError::InvalidConfig(format!(
                "tire diameter must be positive, got {}",
                params.tire_diameter_mm
            )));
        }
        Ok(Self {
            params,
            previous: None,
            angle: 0.0,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
        })
    }

    pub fn params(&self) -> &WheelParams {
        &self.params
    }

    /// 回绕修正后的计数差
    fn delta(&self, previous: u32, current: u32) -> i64 {
        let resolution = i64::from(self.params.resolution);
        let mut delta = i64::from(current) - i64::from(previous);
        if delta.abs() >= resolution / 2 {
            if i64::from(previous) >= resolution / 2 {
                delta += resolution;
            } else {
                delta -= resolution;
            }
        }
        delta
    }

    /// 以新的原始读数更新
    ///
    /// 构造或 `reset` 之后的第一个读数只作为基准，增量为 0。
    pub fn update(&mut self, raw: u32, dt_us: f64) {
        let resolution = self.params.resolution;
        let raw = raw % resolution;
        let raw = if self.params.invert {
            (resolution - raw) % resolution
        } else {
            raw
        };

        let delta = match self.previous {
            Some(previous) => self.delta(previous, raw),
            None => 0,
        };
        self.previous = Some(raw);

        let angle = delta as f64 * 2.0 * PI / f64::from(resolution);
        self.angle += angle;
        if dt_us > 0.0 {
            let angular_velocity = angle * 1e6 / dt_us;
            self.angular_acceleration = (angular_velocity - self.angular_velocity) * 1e6 / dt_us;
            self.angular_velocity = angular_velocity;
        }
    }

    /// 累计角度 [rad]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// 角速度 [rad/s]
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// 角加速度 [rad/s^2]
    pub fn angular_acceleration(&self) -> f64 {
        self.angular_acceleration
    }

    /// 线速度 [m/s]
    pub fn velocity(&self) -> f64 {
        self.angular_velocity * self.params.tire_diameter_mm / 2.0 / 1000.0
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.angle = 0.0;
        self.angular_velocity = 0.0;
        self.angular_acceleration = 0.0;
    }
}

/// 一个周期的里程计输入
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OdometryInput {
    pub left_raw: u32,
    pub right_raw: u32,
    /// 车体角速度 [rad/s]，逆时针为正
    pub angular_velocity: f64,
    /// 车体前后方向加速度 [m/s^2]
    pub acceleration: f64,
}

/// 车体里程计
#[derive(Debug, Clone)]
pub struct Odometry {
    left: Wheel,
    right: Wheel,
    velocity: f64,
    angular_velocity: f64,
    acceleration: f64,
    angular_acceleration: f64,
    /// [mm]
    length: f64,
    /// [rad]
    theta: f64,
    /// [mm]
    x: f64,
    /// [mm]
    y: f64,
}

impl Odometry {
    pub fn new(left: WheelParams, right: WheelParams) -> Result<Self, DriverError> {
        Ok(Self {
            left: Wheel::new(left)?,
            right: Wheel::new(right)?,
            velocity: 0.0,
            angular_velocity: 0.0,
            acceleration: 0.0,
            angular_acceleration: 0.0,
            length: 0.0,
            theta: 0.0,
            x: 0.0,
            y: 0.0,
        })
    }

    pub fn update(&mut self, input: OdometryInput, dt_us: f64) {
        self.left.update(input.left_raw, dt_us);
        self.right.update(input.right_raw, dt_us);

        let dt = dt_us / 1e6;
        let velocity = (self.left.velocity() + self.right.velocity()) / 2.0;
        if dt > 0.0 {
            self.angular_acceleration = (input.angular_velocity - self.angular_velocity) / dt;
        }
        self.velocity = velocity;
        self.angular_velocity = input.angular_velocity;
        self.acceleration = input.acceleration;

        self.integrate(velocity, input.angular_velocity, dt);
    }

    /// 以恒定 `v` [m/s]、`ω` [rad/s] 积分 `dt` [s]
    fn integrate(&mut self, velocity: f64, angular_velocity: f64, dt: f64) {
        let distance = velocity * dt * 1000.0;
        let d_theta = angular_velocity * dt;
        self.length += distance;

        if angular_velocity.abs() < STRAIGHT_EPSILON {
            self.x += distance * self.theta.cos();
            self.y += distance * self.theta.sin();
        } else {
            let half = d_theta / 2.0;
            let chord = 2.0 * (velocity * 1000.0) / angular_velocity * half.sin();
            self.x += chord * (self.theta + half).cos();
            self.y += chord * (self.theta + half).sin();
        }
        self.theta += d_theta;
    }

    /// 清零车轮状态与位姿累计；车轮参数保留
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.velocity = 0.0;
        self.angular_velocity = 0.0;
        self.acceleration = 0.0;
        self.angular_acceleration = 0.0;
        self.length = 0.0;
        self.theta = 0.0;
        self.x = 0.0;
        self.y = 0.0;
    }

    pub fn left(&self) -> &Wheel {
        &self.left
    }

    pub fn right(&self) -> &Wheel {
        &self.right
    }

    /// [m/s]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// [rad/s]
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// [m/s^2]
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// [rad/s^2]
    pub fn angular_acceleration(&self) -> f64 {
        self.angular_acceleration
    }

    /// 走行距离 [mm]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// 车体角度 [deg]
    pub fn angle(&self) -> f64 {
        self.theta.to_degrees()
    }

    /// [mm]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// [mm]
    pub fn y(&self) -> f64 {
        self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(invert: bool) -> WheelParams {
        WheelParams {
            resolution: 1024,
            tire_diameter_mm: 12.8,
            invert,
        }
    }

    #[test]
    fn test_wheel_rejects_invalid_params() {
        let mut p = params(false);
        p.resolution = 0;
        assert!(Wheel::new(p).is_err());
        let mut p = params(false);
        p.tire_diameter_mm = 0.0;
        assert!(Wheel::new(p).is_err());
    }

    #[test]
    fn test_first_reading_is_reference() {
        let mut wheel = Wheel::new(params(false)).unwrap();
        wheel.update(700, 1000.0);
        assert_eq!(wheel.angle(), 0.0);
        assert_eq!(wheel.angular_velocity(), 0.0);
    }

    #[test]
    fn test_wraparound_forward_and_backward() {
        let mut wheel = Wheel::new(params(false)).unwrap();
        wheel.update(1020, 1000.0);
        // 1020 -> 4：前进 8 计数
        wheel.update(4, 1000.0);
        let tick = 2.0 * PI / 1024.0;
        assert!((wheel.angle() - 8.0 * tick).abs() < 1e-12);

        // 4 -> 1020：后退 8 计数
        wheel.update(1020, 1000.0);
        assert!(wheel.angle().abs() < 1e-12);
        assert!((wheel.angular_velocity() + 8.0 * tick * 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_wheel() {
        let mut wheel = Wheel::new(params(true)).unwrap();
        wheel.update(0, 1000.0);
        // 原始值减少 = 前进
        wheel.update(1014, 1000.0);
        let tick = 2.0 * PI / 1024.0;
        assert!((wheel.angle() - 10.0 * tick).abs() < 1e-12);
    }

    #[test]
    fn test_wheel_velocity_and_acceleration() {
        let mut wheel = Wheel::new(params(false)).unwrap();
        wheel.update(0, 1000.0);
        wheel.update(16, 1000.0);
        let omega = 16.0 * 2.0 * PI / 1024.0 * 1000.0;
        assert!((wheel.angular_velocity() - omega).abs() < 1e-9);
        assert!((wheel.velocity() - omega * 0.0064).abs() < 1e-9);
        assert!((wheel.angular_acceleration() - omega * 1000.0).abs() < 1e-6);
    }

    /// 恒定 v、ω 下一个周期的位移与闭式解一致
    #[test]
    fn test_arc_integration_matches_closed_form() {
        let mut odom = Odometry::new(params(false), params(false)).unwrap();
        let (v, w, dt) = (0.4_f64, 2.5_f64, 0.01_f64);
        odom.theta = 0.3;
        let theta0 = odom.theta;

        odom.integrate(v, w, dt);

        let r = v * 1000.0 / w;
        let x = r * ((theta0 + w * dt).sin() - theta0.sin());
        let y = -r * ((theta0 + w * dt).cos() - theta0.cos());
        assert!((odom.x() - x).abs() <= 1e-5 * x.abs());
        assert!((odom.y() - y).abs() <= 1e-5 * y.abs());
        assert!((odom.length() - v * dt * 1000.0).abs() < 1e-12);
    }

    #[test]
    fn test_straight_integration() {
        let mut odom = Odometry::new(params(false), params(false)).unwrap();
        odom.integrate(0.5, 0.0, 0.002);
        assert!((odom.x() - 1.0).abs() < 1e-12);
        assert_eq!(odom.y(), 0.0);
    }

    #[test]
    fn test_body_update_and_reset() {
        let mut odom = Odometry::new(params(true), params(false)).unwrap();
        let mut input = OdometryInput {
            left_raw: 0,
            right_raw: 0,
            angular_velocity: 0.0,
            acceleration: 0.0,
        };
        odom.update(input, 1000.0);

        // 左轮反装：原始值减少表示前进
        input.left_raw = 1024 - 10;
        input.right_raw = 10;
        input.angular_velocity = 0.5;
        input.acceleration = 1.2;
        odom.update(input, 1000.0);

        let expected_v = 10.0 * 2.0 * PI / 1024.0 * 1000.0 * 0.0064;
        assert!((odom.velocity() - expected_v).abs() < 1e-9);
        assert_eq!(odom.angular_velocity(), 0.5);
        assert!((odom.angular_acceleration() - 500.0).abs() < 1e-9);
        assert_eq!(odom.acceleration(), 1.2);
        assert!(odom.length() > 0.0);

        odom.reset();
        assert_eq!(odom.length(), 0.0);
        assert_eq!(odom.angle(), 0.0);
        assert_eq!(odom.x(), 0.0);
        assert_eq!(odom.left().params().resolution, 1024);
        assert_eq!(odom.velocity(), 0.0);

        // reset 之后的第一个读数重新作为基准
        input.left_raw = 1024 - 20;
        input.right_raw = 20;
        odom.update(input, 1000.0);
        assert_eq!(odom.length(), 0.0);
    }
}
