//! 机体配置（TOML）
//!
//! 所有段都可以省略，省略的字段取默认值：
//!
//! ```toml
//! [maze]
//! width = 16
//! height = 16
//! goals = [[7, 7], [7, 8], [8, 7], [8, 8]]
//!
//! [motion.velocity]
//! kp = 0.5
//! ki = 2.0
//!
//! [control_loop]
//! frequency_hz = 1000.0
//! ```
//!
//! 下层 crate 不依赖 TOML，这里只负责解析、校验并转换为各自的参数结构。

use crate::error::ConfigError;
use crate::explorer::ManeuverProfile;
use mouse_control::{LoopConfig, MachineParams, MotionConfig, PidGains};
use mouse_driver::{SensorParams, WallSensorParam, WheelParams};
use mouse_maze::{Cell, MAX_MAZE_SIZE, MazeError, Searcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// 迷路
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub width: u8,
    pub height: u8,
    /// 起点 `[x, y]`
    pub start: [u8; 2],
    /// 目标区画 `[[x, y], ...]`
    pub goals: Vec<[u8; 2]>,
    /// 区画一边的长度 [mm]
    pub cell_size_mm: f64,
}

impl Default for MazeConfig {
    fn default() -> Self {
        let mut goals = Vec::with_capacity(9);
        for x in 14..=16 {
            for y in 14..=16 {
                goals.push([x, y]);
            }
        }
        Self {
            width: 32,
            height: 32,
            start: [0, 0],
            goals,
            cell_size_mm: 45.0,
        }
    }
}

impl MazeConfig {
    pub fn start_cell(&self) -> Cell {
        Cell::new(self.start[0], self.start[1])
    }

    pub fn goal_cells(&self) -> Vec<Cell> {
        self.goals.iter().map(|[x, y]| Cell::new(*x, *y)).collect()
    }

    /// 按本配置构造搜索状态机
    pub fn searcher(&self) -> Result<Searcher, MazeError> {
        Searcher::new(self.width, self.height, self.start_cell(), self.goal_cells())
    }
}

/// 机体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub tire_diameter_mm: f64,
    pub tread_mm: f64,
    pub encoder_resolution: u32,
    /// [V/rpm]
    pub motor_ke: f64,
    /// [V]
    pub voltage_motor_limit: f64,
    /// 电源电压移动平均窗口（2 的幂）
    pub battery_average_window: usize,
    pub sensor_warm_up_counts: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tire_diameter_mm: 12.8,
            tread_mm: 38.0,
            encoder_resolution: 1024,
            motor_ke: 0.0013,
            voltage_motor_limit: 3.0,
            battery_average_window: 512,
            sensor_warm_up_counts: 10,
        }
    }
}

/// PID 增益
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GainsConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl From<GainsConfig> for PidGains {
    fn from(gains: GainsConfig) -> Self {
        PidGains::new(gains.kp, gains.ki, gains.kd)
    }
}

/// 走行控制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSection {
    /// [m/s^2]
    pub acceleration_default: f64,
    /// [m/s]
    pub velocity_default: f64,
    /// [m/s]
    pub velocity_min: f64,
    /// [rad/s^2]
    pub angular_acceleration_default: f64,
    /// [rad/s]
    pub angular_velocity_default: f64,
    /// [rad/s]
    pub angular_velocity_min: f64,
    /// [m/s]
    pub stop_velocity_threshold: f64,
    pub velocity: GainsConfig,
    pub angular_velocity: GainsConfig,
    pub side_wall: GainsConfig,
}

impl Default for MotionSection {
    fn default() -> Self {
        Self {
            acceleration_default: 1.0,
            velocity_default: 0.3,
            velocity_min: 0.05,
            angular_acceleration_default: 20.0,
            angular_velocity_default: 3.0,
            angular_velocity_min: 0.5,
            stop_velocity_threshold: 0.01,
            velocity: GainsConfig {
                kp: 0.4,
                ki: 2.0,
                kd: 0.0,
            },
            angular_velocity: GainsConfig {
                kp: 0.4,
                ki: 2.0,
                kd: 0.0,
            },
            side_wall: GainsConfig {
                kp: 0.002,
                ki: 0.0,
                kd: 0.0,
            },
        }
    }
}

/// 单个墙壁传感器
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallSensorConfig {
    pub reference: i32,
    pub threshold: i32,
}

impl Default for WallSensorConfig {
    fn default() -> Self {
        Self {
            reference: 300,
            threshold: 150,
        }
    }
}

impl From<WallSensorConfig> for WallSensorParam {
    fn from(config: WallSensorConfig) -> Self {
        WallSensorParam {
            reference: config.reference,
            threshold: config.threshold,
        }
    }
}

/// 四个墙壁传感器
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WallSensorsSection {
    pub left90: WallSensorConfig,
    pub left45: WallSensorConfig,
    pub right45: WallSensorConfig,
    pub right90: WallSensorConfig,
}

/// 控制循环
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLoopSection {
    pub frequency_hz: f64,
    pub dt_clamp_multiplier: f64,
}

impl Default for ControlLoopSection {
    fn default() -> Self {
        Self {
            frequency_hz: 1000.0,
            dt_clamp_multiplier: 2.0,
        }
    }
}

/// 机体配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub maze: MazeConfig,
    pub machine: MachineConfig,
    pub motion: MotionSection,
    pub wall_sensors: WallSensorsSection,
    pub control_loop: ControlLoopSection,
}

fn positive(section: &'static str, name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value <= 0.0 {
        return Err(ConfigError::invalid(section, format!("{} must be > 0, got {}", name, value)));
    }
    Ok(())
}

fn non_negative(section: &'static str, name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value < 0.0 {
        return Err(ConfigError::invalid(section, format!("{} must be >= 0, got {}", name, value)));
    }
    Ok(())
}

impl RobotConfig {
    /// 解析并校验
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RobotConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_maze()?;
        self.validate_machine()?;
        self.validate_motion()?;

        let lp = &self.control_loop;
        positive("control_loop", "frequency_hz", lp.frequency_hz)?;
        positive("control_loop", "dt_clamp_multiplier", lp.dt_clamp_multiplier)?;
        Ok(())
    }

    fn validate_maze(&self) -> Result<(), ConfigError> {
        let maze = &self.maze;
        for (name, size) in [("width", maze.width), ("height", maze.height)] {
            if size == 0 || size > MAX_MAZE_SIZE {
                return Err(ConfigError::invalid(
                    "maze",
                    format!("{} must be 1..={}, got {}", name, MAX_MAZE_SIZE, size),
                ));
            }
        }
        let inside = |[x, y]: [u8; 2]| x < maze.width && y < maze.height;
        if !inside(maze.start) {
            return Err(ConfigError::invalid(
                "maze",
                format!("start {:?} is outside the maze", maze.start),
            ));
        }
        if maze.goals.is_empty() {
            return Err(ConfigError::invalid("maze", "goals must not be empty"));
        }
        if let Some(goal) = maze.goals.iter().find(|goal| !inside(**goal)) {
            return Err(ConfigError::invalid("maze", format!("goal {:?} is outside the maze", goal)));
        }
        positive("maze", "cell_size_mm", maze.cell_size_mm)
    }

    fn validate_machine(&self) -> Result<(), ConfigError> {
        let m = &self.machine;
        positive("machine", "tire_diameter_mm", m.tire_diameter_mm)?;
        positive("machine", "tread_mm", m.tread_mm)?;
        positive("machine", "motor_ke", m.motor_ke)?;
        positive("machine", "voltage_motor_limit", m.voltage_motor_limit)?;
        if m.encoder_resolution == 0 {
            return Err(ConfigError::invalid("machine", "encoder_resolution must be > 0"));
        }
        if !m.battery_average_window.is_power_of_two() {
            return Err(ConfigError::invalid(
                "machine",
                format!(
                    "battery_average_window must be a power of two, got {}",
                    m.battery_average_window
                ),
            ));
        }
        Ok(())
    }

    fn validate_motion(&self) -> Result<(), ConfigError> {
        let m = &self.motion;
        positive("motion", "acceleration_default", m.acceleration_default)?;
        positive("motion", "velocity_default", m.velocity_default)?;
        positive("motion", "angular_acceleration_default", m.angular_acceleration_default)?;
        positive("motion", "angular_velocity_default", m.angular_velocity_default)?;
        non_negative("motion", "velocity_min", m.velocity_min)?;
        non_negative("motion", "angular_velocity_min", m.angular_velocity_min)?;
        non_negative("motion", "stop_velocity_threshold", m.stop_velocity_threshold)?;
        if m.velocity_min > m.velocity_default {
            return Err(ConfigError::invalid(
                "motion",
                format!(
                    "velocity_min ({}) exceeds velocity_default ({})",
                    m.velocity_min, m.velocity_default
                ),
            ));
        }
        if m.angular_velocity_min > m.angular_velocity_default {
            return Err(ConfigError::invalid(
                "motion",
                format!(
                    "angular_velocity_min ({}) exceeds angular_velocity_default ({})",
                    m.angular_velocity_min, m.angular_velocity_default
                ),
            ));
        }
        Ok(())
    }

    pub fn machine_params(&self) -> MachineParams {
        MachineParams {
            tire_diameter_mm: self.machine.tire_diameter_mm,
            tread_mm: self.machine.tread_mm,
            motor_ke: self.machine.motor_ke,
            voltage_motor_limit: self.machine.voltage_motor_limit,
        }
    }

    pub fn motion_config(&self) -> MotionConfig {
        let m = &self.motion;
        MotionConfig {
            velocity: m.velocity.into(),
            angular_velocity: m.angular_velocity.into(),
            side_wall: m.side_wall.into(),
            velocity_min: m.velocity_min,
            angular_velocity_min: m.angular_velocity_min,
            stop_velocity_threshold: m.stop_velocity_threshold,
        }
    }

    /// 左轮反装
    pub fn sensor_params(&self) -> SensorParams {
        let wheel = WheelParams {
            resolution: self.machine.encoder_resolution,
            tire_diameter_mm: self.machine.tire_diameter_mm,
            invert: false,
        };
        let walls = &self.wall_sensors;
        SensorParams {
            left_wheel: WheelParams {
                invert: true,
                ..wheel
            },
            right_wheel: wheel,
            battery_window: self.machine.battery_average_window,
            warm_up_counts: self.machine.sensor_warm_up_counts,
            wall: [
                walls.left90.into(),
                walls.left45.into(),
                walls.right45.into(),
                walls.right90.into(),
            ],
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            frequency_hz: self.control_loop.frequency_hz,
            dt_clamp_multiplier: self.control_loop.dt_clamp_multiplier,
            max_iterations: None,
        }
    }

    /// 一个区画的走行参数
    pub fn maneuver_profile(&self) -> ManeuverProfile {
        let m = &self.motion;
        ManeuverProfile {
            cell_size_mm: self.maze.cell_size_mm,
            acceleration: m.acceleration_default,
            velocity: m.velocity_default,
            angular_acceleration: m.angular_acceleration_default,
            angular_velocity: m.angular_velocity_default,
            side_wall_adjust: true,
        }
    }

    /// 与本配置一致的仿真机体参数
    #[cfg(feature = "mock")]
    pub fn plant_params(&self) -> mouse_driver::mock::PlantParams {
        mouse_driver::mock::PlantParams {
            tire_diameter_mm: self.machine.tire_diameter_mm,
            tread_mm: self.machine.tread_mm,
            encoder_resolution: self.machine.encoder_resolution,
            motor_ke: self.machine.motor_ke,
            step_s: 1.0 / self.control_loop.frequency_hz,
            ..mouse_driver::mock::PlantParams::default()
        }
    }
}
