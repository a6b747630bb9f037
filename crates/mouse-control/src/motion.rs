//! 走行控制
//!
//! 每个控制周期：
//!
//! 1. 目标值生成：梯形速度曲线（旋转 = 角速度曲线 + 直线的线速度处理）
//! 2. 侧墙修正（仅直线且启用时）
//! 3. 反馈：`v = v_t + PID_v`、`ω = ω_t + PID_ω`
//! 4. 车轮角速度 → 端电压 `e = Ke · rpm`，限幅
//! 5. 完成判定：到达减速距离后反转加速度，到达距离后等待停止
//!
//! 完成信号每个走行参数只产生一次。

use crate::error::ControlError;
use crate::parameter::{MotionParameter, MotionPattern, MotionTarget};
use crate::pid::{Pid, PidGains};
use mouse_driver::{MotorCommand, Sensed, WallSensors};
use std::f64::consts::PI;
use tracing::{debug, trace};

/// 机体参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineParams {
    /// [mm]
    pub tire_diameter_mm: f64,
    /// 左右车轮间距 [mm]
    pub tread_mm: f64,
    /// 反电动势常数 [V/rpm]
    pub motor_ke: f64,
    /// 电机电压上限 [V]
    pub voltage_motor_limit: f64,
}

impl Default for MachineParams {
    fn default() -> Self {
        Self {
            tire_diameter_mm: 12.8,
            tread_mm: 38.0,
            motor_ke: 0.0013,
            voltage_motor_limit: 3.0,
        }
    }
}

impl MachineParams {
    pub fn validate(&self) -> Result<(), ControlError> {
        let checks = [
            ("tire_diameter_mm", self.tire_diameter_mm),
            ("tread_mm", self.tread_mm),
            ("motor_ke", self.motor_ke),
            ("voltage_motor_limit", self.voltage_motor_limit),
        ];
        for (name, value) in checks {
            if value.is_nan() || value <= 0.0 {
                return Err(ControlError::InvalidConfig(format!(
                    "{} must be > 0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// 车体速度 [m/s] 与角速度 [rad/s] 换算为左右电机电压 [V]（已限幅）
    pub fn wheel_voltages(&self, velocity: f64, angular_velocity: f64) -> (f64, f64) {
        let radius_m = self.tire_diameter_mm / 2.0 / 1000.0;
        let ratio = self.tread_mm / self.tire_diameter_mm;
        let right = velocity / radius_m + ratio * angular_velocity;
        let left = velocity / radius_m - ratio * angular_velocity;

        let to_voltage = |omega: f64| {
            let rpm = omega * 60.0 / (2.0 * PI);
            (self.motor_ke * rpm).clamp(-self.voltage_motor_limit, self.voltage_motor_limit)
        };
        (to_voltage(left), to_voltage(right))
    }
}

/// 控制参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    pub velocity: PidGains,
    pub angular_velocity: PidGains,
    pub side_wall: PidGains,
    /// 减速时的最低速度 [m/s]
    pub velocity_min: f64,
    /// 减速时的最低角速度 [rad/s]
    pub angular_velocity_min: f64,
    /// 停止判定阈值 [m/s]
    pub stop_velocity_threshold: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            velocity: PidGains::new(0.4, 2.0, 0.0),
            angular_velocity: PidGains::new(0.4, 2.0, 0.0),
            side_wall: PidGains::new(0.002, 0.0, 0.0),
            velocity_min: 0.05,
            angular_velocity_min: 0.5,
            stop_velocity_threshold: 0.01,
        }
    }
}

/// 一个周期的输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionOutput {
    pub command: MotorCommand,
    /// 本周期走行完成（每个走行参数只为 true 一次）
    pub completed: bool,
}

/// 梯形曲线的状态（以大小表示）
#[derive(Debug, Clone, Copy, Default)]
struct Profile {
    /// 当前加速度，减速时为负
    acceleration: f64,
    /// 减速时的下限
    floor: f64,
    /// 到达后保持的值
    hold: Option<f64>,
}

impl Profile {
    fn accelerating(acceleration: f64) -> Self {
        Self {
            acceleration: acceleration.abs(),
            floor: 0.0,
            hold: None,
        }
    }

    fn is_decelerating(&self) -> bool {
        self.acceleration < 0.0
    }

    fn step(&self, magnitude: f64, max: f64, dt: f64) -> f64 {
        if let Some(hold) = self.hold {
            return hold;
        }
        let next = magnitude + self.acceleration * dt;
        if self.is_decelerating() {
            next.max(self.floor)
        } else {
            next.min(max)
        }
    }
}

/// 从 `velocity` 以 `acceleration` 减速到 `end_velocity` 所需的距离（`v^2 / a` 的单位）
fn braking_distance(velocity: f64, end_velocity: f64, acceleration: f64) -> f64 {
    if acceleration <= 0.0 || velocity <= end_velocity {
        return 0.0;
    }
    (velocity * velocity - end_velocity * end_velocity) / (2.0 * acceleration)
}

/// 侧墙误差
///
/// - 两侧都有墙：`left.error - right.error`
/// - 只有一侧：该侧误差的 2 倍（右侧取负）
/// - 都没有：`None`
///
/// 正值表示偏向左墙。
pub fn side_wall_error(wall: &WallSensors) -> Option<f64> {
    let left = wall.left();
    let right = wall.right();
    match (left.exists, right.exists) {
        (true, true) => Some(f64::from(left.error - right.error)),
        (true, false) => Some(2.0 * f64::from(left.error)),
        (false, true) => Some(-2.0 * f64::from(right.error)),
        (false, false) => None,
    }
}

/// 走行控制器
#[derive(Debug, Clone)]
pub struct MotionController {
    machine: MachineParams,
    config: MotionConfig,
    param: MotionParameter,
    target: MotionTarget,
    velocity_pid: Pid,
    angular_velocity_pid: Pid,
    side_wall_pid: Pid,
    linear: Profile,
    angular: Profile,
    completed: bool,
    last_wall_error: Option<f64>,
}

impl MotionController {
    pub fn new(machine: MachineParams, config: MotionConfig) -> Result<Self, ControlError> {
        machine.validate()?;
        if config.velocity_min < 0.0
            || config.angular_velocity_min < 0.0
            || config.stop_velocity_threshold < 0.0
        {
            return Err(ControlError::InvalidConfig(
                "minimum velocities and stop threshold must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            machine,
            config,
            param: MotionParameter::free(),
            target: MotionTarget::default(),
            velocity_pid: Pid::new(config.velocity),
            angular_velocity_pid: Pid::new(config.angular_velocity),
            side_wall_pid: Pid::new(config.side_wall),
            linear: Profile::default(),
            angular: Profile::default(),
            completed: false,
            last_wall_error: None,
        })
    }

    pub fn parameter(&self) -> &MotionParameter {
        &self.param
    }

    pub fn target(&self) -> &MotionTarget {
        &self.target
    }

    pub fn machine(&self) -> &MachineParams {
        &self.machine
    }

    /// 当前走行是否已经发出完成信号
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// 当前线速度曲线的加速度（减速时为负）
    pub fn profile_acceleration(&self) -> f64 {
        self.linear.acceleration
    }

    /// 当前角速度曲线的角加速度（减速时为负）
    pub fn profile_angular_acceleration(&self) -> f64 {
        self.angular.acceleration
    }

    /// 最近一个周期送入侧墙 PID 的误差
    pub fn last_wall_error(&self) -> Option<f64> {
        self.last_wall_error
    }

    fn reset_pids(&mut self) {
        self.velocity_pid.reset();
        self.angular_velocity_pid.reset();
        self.side_wall_pid.reset();
    }

    /// 切换到新的走行参数
    ///
    /// 清零全部 PID；模式改变时清零速度目标。
    /// 返回 true 表示新的一段走行开始，调用方应清零里程计。
    pub fn set_parameter(&mut self, param: MotionParameter) -> bool {
        if param.pattern != self.param.pattern {
            self.target.velocity = 0.0;
            self.target.angular_velocity = 0.0;
        }
        self.reset_pids();

        let new_leg = param.pattern.starts_new_leg();
        if new_leg {
            self.target.angle = 0.0;
        }
        self.linear = Profile::accelerating(param.acceleration);
        self.angular = Profile::accelerating(param.angular_acceleration);
        self.completed = false;
        self.last_wall_error = None;
        self.param = param;

        debug!("New motion parameter: {:?}", param);
        new_leg
    }

    /// 读数超时时的输出：零电压，清零 PID（目标值保留）
    pub fn fail_safe(&mut self, battery_mv: f64) -> MotorCommand {
        self.reset_pids();
        MotorCommand::zero(battery_mv)
    }

    /// 控制一个周期
    pub fn update(&mut self, sensed: &Sensed, dt: f64) -> MotionOutput {
        let battery_mv = sensed.battery_mv;

        match self.param.pattern {
            MotionPattern::Free => {
                self.reset_pids();
                return MotionOutput {
                    command: MotorCommand::zero(battery_mv),
                    completed: false,
                };
            },
            MotionPattern::Stop => {
                self.target.velocity = 0.0;
                self.target.angular_velocity = 0.0;
                self.reset_pids();
                let completed =
                    sensed.velocity.abs() <= self.config.stop_velocity_threshold && self.complete();
                return MotionOutput {
                    command: MotorCommand::zero(battery_mv),
                    completed,
                };
            },
            MotionPattern::Straight => {
                self.calc_straight_target(dt);
                if self.param.enable_side_wall_adjust {
                    self.side_wall_adjust(sensed, dt);
                }
            },
            MotionPattern::Turn => self.calc_turn_target(dt),
        }

        let command = self.feedback(sensed, dt);
        let completed = match self.param.pattern {
            MotionPattern::Straight => self.check_straight(sensed),
            MotionPattern::Turn => self.check_turn(sensed),
            MotionPattern::Free | MotionPattern::Stop => false,
        };

        trace!(
            "target v={:.3} w={:.3} -> L={:.0}mV R={:.0}mV",
            self.target.velocity, self.target.angular_velocity, command.left_mv, command.right_mv
        );
        MotionOutput { command, completed }
    }

    /// 线速度目标（直线与旋转共用）
    fn calc_linear_target(&mut self, dt: f64) {
        let sign = self.param.direction.linear_sign();
        let magnitude = self.linear.step(sign * self.target.velocity, self.param.max_velocity, dt);
        self.target.velocity = sign * magnitude;
    }

    fn calc_straight_target(&mut self, dt: f64) {
        self.calc_linear_target(dt);
        self.target.angular_velocity = 0.0;
    }

    fn calc_turn_target(&mut self, dt: f64) {
        let sign = self.param.direction.angular_sign();
        let magnitude = self.angular.step(
            sign * self.target.angular_velocity,
            self.param.max_angular_velocity,
            dt,
        );
        self.target.angular_velocity = sign * magnitude;
        self.target.angle = (self.target.angle + (sign * magnitude * dt).to_degrees())
            .clamp(-self.param.angle, self.param.angle);

        self.calc_linear_target(dt);
    }

    fn side_wall_adjust(&mut self, sensed: &Sensed, dt: f64) {
        let error = side_wall_error(&sensed.wall);
        match error {
            Some(error) => {
                let correction = self.side_wall_pid.update(error, 0.0, dt);
                self.target.angular_velocity -= correction;
            },
            None => self.side_wall_pid.reset(),
        }
        self.last_wall_error = error;
    }

    fn feedback(&mut self, sensed: &Sensed, dt: f64) -> MotorCommand {
        let velocity = self.target.velocity
            + self.velocity_pid.update(self.target.velocity, sensed.velocity, dt);
        let angular_velocity = self.target.angular_velocity
            + self.angular_velocity_pid.update(
                self.target.angular_velocity,
                sensed.angular_velocity,
                dt,
            );

        let (left, right) = self.machine.wheel_voltages(velocity, angular_velocity);
        MotorCommand {
            left_mv: left * 1000.0,
            right_mv: right * 1000.0,
            battery_mv: sensed.battery_mv,
        }
    }

    fn complete(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        debug!("Motion {:?} completed", self.param.pattern);
        true
    }

    fn check_straight(&mut self, sensed: &Sensed) -> bool {
        if self.completed {
            return false;
        }
        let sign = self.param.direction.linear_sign();
        let traveled = sign * sensed.length;
        let length = self.param.length;
        let end_velocity = self.param.end_velocity;

        if traveled < length {
            if !self.linear.is_decelerating() {
                let velocity = sign * self.target.velocity;
                let braking =
                    braking_distance(velocity, end_velocity, self.param.acceleration) * 1000.0;
                if length - traveled <= braking {
                    self.linear.acceleration = -self.param.acceleration;
                    self.linear.floor = end_velocity.max(self.config.velocity_min);
                    debug!(
                        "Decelerate at {:.1}mm (remaining {:.1}mm, braking {:.1}mm)",
                        traveled,
                        length - traveled,
                        braking
                    );
                }
            }
            return false;
        }

        if end_velocity > 0.0 {
            self.linear.hold = Some(end_velocity);
            self.target.velocity = sign * end_velocity;
            return self.complete();
        }

        self.linear.hold = Some(0.0);
        self.target.velocity = 0.0;
        sign * sensed.velocity <= 0.0 && self.complete()
    }

    fn check_turn(&mut self, sensed: &Sensed) -> bool {
        if self.completed {
            return false;
        }
        let sign = self.param.direction.angular_sign();
        let turned = sign * sensed.angle;
        let angle = self.param.angle;

        if turned < angle {
            if !self.angular.is_decelerating() {
                let angular_velocity = sign * self.target.angular_velocity;
                let braking =
                    braking_distance(angular_velocity, 0.0, self.param.angular_acceleration)
                        .to_degrees();
                if angle - turned <= braking {
                    self.angular.acceleration = -self.param.angular_acceleration;
                    self.angular.floor = self.config.angular_velocity_min;
                    debug!(
                        "Decelerate turn at {:.1}deg (remaining {:.1}deg)",
                        turned,
                        angle - turned
                    );
                }
            }
            return false;
        }

        self.angular.hold = Some(0.0);
        self.target.angular_velocity = 0.0;
        sign * sensed.angular_velocity <= 0.0 && self.complete()
    }
}
