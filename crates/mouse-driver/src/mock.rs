//! 仿真外设
//!
//! 一个理想化的差动驱动模型：电机电压经反电动势常数直接换算为车轮转速，
//! 每次写入电压时把对应车轮按固定步长积分。编码器与陀螺仪从同一个共享状态读取。
//!
//! ```text
//! rpm = V / Ke
//! ω_wheel = rpm · 2π / 60
//! ω_body = (v_r - v_l) / tread
//! ```
//!
//! 用于 CLI 的仿真与测试，不依赖真实时间。

use crate::error::DriverError;
use crate::hardware::{
    BatteryMonitor, Encoder, Hardware, Imu, ImuSample, Motor, Motors, PhotoSample, PhotoSensors,
    SensorDevices, SensorKind,
};
use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

/// 仿真参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantParams {
    pub tire_diameter_mm: f64,
    pub tread_mm: f64,
    pub encoder_resolution: u32,
    /// 反电动势常数 [V/rpm]
    pub motor_ke: f64,
    /// 每次写入电压时推进的时间 [s]
    pub step_s: f64,
    /// 电源电压 [mV]
    pub battery_mv: f64,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            tire_diameter_mm: 12.8,
            tread_mm: 38.0,
            encoder_resolution: 1024,
            motor_ke: 0.0013,
            step_s: 0.001,
            battery_mv: 4000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct WheelState {
    /// 累计角度 [rad]
    angle: f64,
    /// [rad/s]
    angular_velocity: f64,
}

#[derive(Debug)]
struct PlantState {
    params: PlantParams,
    left: WheelState,
    right: WheelState,
    photo: [PhotoSample; 4],
    stale: Option<SensorKind>,
    last_command: (f64, f64),
}

impl PlantState {
    fn encoder_raw(&self, wheel: &WheelState, invert: bool) -> u32 {
        let resolution = f64::from(self.params.encoder_resolution);
        let ticks = (wheel.angle / (2.0 * PI) * resolution).round();
        let raw = ticks.rem_euclid(resolution) as u32 % self.params.encoder_resolution;
        if invert {
            (self.params.encoder_resolution - raw) % self.params.encoder_resolution
        } else {
            raw
        }
    }

    fn body_angular_velocity(&self) -> f64 {
        let radius_m = self.params.tire_diameter_mm / 2.0 / 1000.0;
        let v_l = self.left.angular_velocity * radius_m;
        let v_r = self.right.angular_velocity * radius_m;
        (v_r - v_l) / (self.params.tread_mm / 1000.0)
    }

    fn check(&self, sensor: SensorKind) -> Result<(), DriverError> {
        match self.stale {
            Some(stale) if stale == sensor => Err(DriverError::StaleReading { sensor }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// 仿真机体的共享句柄
///
/// 克隆后共享同一个状态，可在测试中修改光电读数或注入读数超时。
#[derive(Debug, Clone)]
pub struct SimulatedPlant {
    state: Arc<Mutex<PlantState>>,
}

impl SimulatedPlant {
    pub fn new(params: PlantParams) -> Result<Self, DriverError> {
        if params.encoder_resolution == 0
            || params.motor_ke <= 0.0
            || params.tread_mm <= 0.0
            || params.tire_diameter_mm <= 0.0
        {
            return Err(DriverError::InvalidConfig(format!(
                "invalid plant parameters: {:?}",
                params
            )));
        }
        Ok(Self {
            state: Arc::new(Mutex::new(PlantState {
                params,
                left: WheelState::default(),
                right: WheelState::default(),
                photo: [PhotoSample::default(); 4],
                stale: None,
                last_command: (0.0, 0.0),
            })),
        })
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut PlantState) -> R) -> Result<R, DriverError> {
        let mut state = self.state.lock().map_err(|_| DriverError::PoisonedLock)?;
        Ok(f(&mut state))
    }

    /// 构造硬件上下文（左编码器反装）
    pub fn hardware(&self) -> Hardware {
        Hardware {
            sensors: SensorDevices {
                left_encoder: Box::new(SimEncoder {
                    plant: self.clone(),
                    side: Side::Left,
                }),
                right_encoder: Box::new(SimEncoder {
                    plant: self.clone(),
                    side: Side::Right,
                }),
                imu: Box::new(SimImu { plant: self.clone() }),
                photo: Box::new(SimPhoto { plant: self.clone() }),
                battery: Box::new(SimBattery { plant: self.clone() }),
            },
            motors: Motors {
                left: Box::new(SimMotor {
                    plant: self.clone(),
                    side: Side::Left,
                }),
                right: Box::new(SimMotor {
                    plant: self.clone(),
                    side: Side::Right,
                }),
            },
        }
    }

    /// 设置光电传感器读数
    pub fn set_photo(&self, photo: [PhotoSample; 4]) -> Result<(), DriverError> {
        self.with_state(|state| state.photo = photo)
    }

    /// 让某个外设的读数超时（`None` 恢复）
    pub fn set_stale(&self, sensor: Option<SensorKind>) -> Result<(), DriverError> {
        self.with_state(|state| state.stale = sensor)
    }

    /// 最后一次写入的电压 [mV]（左, 右）
    pub fn last_command(&self) -> Result<(f64, f64), DriverError> {
        self.with_state(|state| state.last_command)
    }

    /// 车体实际走行距离 [mm]（左右车轮的平均）
    pub fn traveled_mm(&self) -> Result<f64, DriverError> {
        self.with_state(|state| {
            let radius_mm = state.params.tire_diameter_mm / 2.0;
            (state.left.angle + state.right.angle) / 2.0 * radius_mm
        })
    }

    /// 车体实际转过的角度 [deg]
    pub fn rotated_deg(&self) -> Result<f64, DriverError> {
        self.with_state(|state| {
            let radius_mm = state.params.tire_diameter_mm / 2.0;
            let diff = (state.right.angle - state.left.angle) * radius_mm;
            (diff / state.params.tread_mm).to_degrees()
        })
    }
}

struct SimEncoder {
    plant: SimulatedPlant,
    side: Side,
}

impl Encoder for SimEncoder {
    fn read_raw(&mut self) -> Result<u32, DriverError> {
        let side = self.side;
        self.plant.with_state(|state| -> Result<u32, DriverError> {
            let sensor = match side {
                Side::Left => SensorKind::LeftEncoder,
                Side::Right => SensorKind::RightEncoder,
            };
            state.check(sensor)?;
            Ok(match side {
                Side::Left => state.encoder_raw(&state.left, true),
                Side::Right => state.encoder_raw(&state.right, false),
            })
        })?
    }
}

struct SimImu {
    plant: SimulatedPlant,
}

impl Imu for SimImu {
    fn read(&mut self) -> Result<ImuSample, DriverError> {
        self.plant.with_state(|state| -> Result<ImuSample, DriverError> {
            state.check(SensorKind::Imu)?;
            // 陀螺仪 z 轴与车体逆时针方向相反
            let gyro_z_mdps = -state.body_angular_velocity().to_degrees() * 1000.0;
            Ok(ImuSample {
                gyro_z_mdps,
                accel_g: [0.0, 0.0, 1.0],
            })
        })?
    }
}

struct SimPhoto {
    plant: SimulatedPlant,
}

impl PhotoSensors for SimPhoto {
    fn read(&mut self) -> Result<[PhotoSample; 4], DriverError> {
        self.plant.with_state(|state| -> Result<[PhotoSample; 4], DriverError> {
            state.check(SensorKind::PhotoSensors)?;
            Ok(state.photo)
        })?
    }
}

struct SimBattery {
    plant: SimulatedPlant,
}

impl BatteryMonitor for SimBattery {
    fn read_millivolts(&mut self) -> Result<f64, DriverError> {
        self.plant.with_state(|state| -> Result<f64, DriverError> {
            state.check(SensorKind::Battery)?;
            Ok(state.params.battery_mv)
        })?
    }
}

struct SimMotor {
    plant: SimulatedPlant,
    side: Side,
}

impl Motor for SimMotor {
    fn set_voltage(&mut self, millivolts: f64, battery_mv: f64) -> Result<(), DriverError> {
        let side = self.side;
        self.plant.with_state(|state| {
            // 占空比饱和
            let millivolts = millivolts.clamp(-battery_mv.abs(), battery_mv.abs());
            let rpm = millivolts / 1000.0 / state.params.motor_ke;
            let angular_velocity = rpm * 2.0 * PI / 60.0;
            let step = state.params.step_s;
            let wheel = match side {
                Side::Left => {
                    state.last_command.0 = millivolts;
                    &mut state.left
                },
                Side::Right => {
                    state.last_command.1 = millivolts;
                    &mut state.right
                },
            };
            wheel.angular_velocity = angular_velocity;
            wheel.angle += angular_velocity * step;
        })
    }
}
