//! 传感器汇总
//!
//! 每个控制周期读取一次全部外设，更新里程计与墙壁传感器，产出一个 [`Sensed`]。
//! 任意一个外设读取失败时本周期的快照不更新，错误原样返回给控制循环。

use crate::average::MovingAverage;
use crate::error::DriverError;
use crate::hardware::SensorDevices;
use crate::odometry::{Odometry, OdometryInput, WheelParams};
use crate::sensed::{Sensed, WallSensorParam, WallSensors};
use std::f64::consts::PI;
use std::fmt;
use tracing::{debug, trace};

/// 标准重力加速度 [m/s^2]
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// 传感器参数
#[derive(Debug, Clone, PartialEq)]
pub struct SensorParams {
    pub left_wheel: WheelParams,
    pub right_wheel: WheelParams,
    /// 电源电压移动平均窗口（2 的幂）
    pub battery_window: usize,
    /// 启动时丢弃的周期数
    pub warm_up_counts: u32,
    /// 按 left90 / left45 / right45 / right90 的顺序
    pub wall: [WallSensorParam; 4],
}

impl Default for SensorParams {
    fn default() -> Self {
        let wheel = WheelParams {
            resolution: 1024,
            tire_diameter_mm: 12.8,
            invert: false,
        };
        Self {
            // 左轮与右轮镜像安装
            left_wheel: WheelParams {
                invert: true,
                ..wheel
            },
            right_wheel: wheel,
            battery_window: 512,
            warm_up_counts: 10,
            wall: [WallSensorParam {
                reference: 300,
                threshold: 150,
            }; 4],
        }
    }
}

/// 陀螺仪读数 [mdps] 换算为车体角速度 [rad/s]（逆时针为正）
pub fn gyro_to_angular_velocity(gyro_z_mdps: f64) -> f64 {
    -gyro_z_mdps / 1000.0 * PI / 180.0
}

/// 传感器汇总
pub struct SensorHub {
    devices: SensorDevices,
    odometry: Odometry,
    battery: MovingAverage,
    params: SensorParams,
    sensed: Sensed,
    ticks: u64,
}

impl fmt::Debug for SensorHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorHub")
            .field("params", &self.params)
            .field("sensed", &self.sensed)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl SensorHub {
    /// # 错误
    ///
    /// 车轮参数无效或平均窗口不是 2 的幂时返回 `DriverError::InvalidConfig`。
    pub fn new(params: SensorParams, devices: SensorDevices) -> Result<Self, DriverError> {
        Ok(Self {
            devices,
            odometry: Odometry::new(params.left_wheel, params.right_wheel)?,
            battery: MovingAverage::with_window(params.battery_window)?,
            params,
            sensed: Sensed::default(),
            ticks: 0,
        })
    }

    pub fn params(&self) -> &SensorParams {
        &self.params
    }

    /// 最近一次成功更新的快照
    pub fn sensed(&self) -> &Sensed {
        &self.sensed
    }

    /// 读取全部外设并更新快照
    ///
    /// 先读取全部外设，全部成功后才修改内部状态。
    pub fn update(&mut self, dt_us: f64) -> Result<&Sensed, DriverError> {
        let left_raw = self.devices.left_encoder.read_raw()?;
        let right_raw = self.devices.right_encoder.read_raw()?;
        let imu = self.devices.imu.read()?;
        let photo = self.devices.photo.read()?;
        let battery_mv = self.devices.battery.read_millivolts()?;

        self.odometry.update(
            OdometryInput {
                left_raw,
                right_raw,
                angular_velocity: gyro_to_angular_velocity(imu.gyro_z_mdps),
                acceleration: imu.accel_g[1] * STANDARD_GRAVITY,
            },
            dt_us,
        );
        let battery_average_mv = self.battery.push(battery_mv);
        self.ticks += 1;

        let odom = &self.odometry;
        self.sensed = Sensed {
            velocity: odom.velocity(),
            angular_velocity: odom.angular_velocity(),
            acceleration: odom.acceleration(),
            angular_acceleration: odom.angular_acceleration(),
            angle: odom.angle(),
            length: odom.length(),
            x: odom.x(),
            y: odom.y(),
            battery_mv,
            battery_average_mv,
            wall: WallSensors::from_samples(&photo, &self.params.wall),
            tick: self.ticks,
        };
        trace!(
            "sensed #{}: v={:.3} w={:.3} len={:.1}",
            self.ticks, self.sensed.velocity, self.sensed.angular_velocity, self.sensed.length
        );
        Ok(&self.sensed)
    }

    /// 启动前丢弃若干周期的读数，然后清零里程计
    pub fn warm_up(&mut self, dt_us: f64) -> Result<(), DriverError> {
        for _ in 0..self.params.warm_up_counts {
            self.update(dt_us)?;
        }
        self.reset_odometry();
        debug!("Sensor warm-up done after {} updates", self.params.warm_up_counts);
        Ok(())
    }

    /// 清零里程计累计（距离、角度、位置），同步清零快照中的对应字段
    pub fn reset_odometry(&mut self) {
        self.odometry.reset();
        self.sensed.velocity = 0.0;
        self.sensed.angular_velocity = 0.0;
        self.sensed.acceleration = 0.0;
        self.sensed.angular_acceleration = 0.0;
        self.sensed.length = 0.0;
        self.sensed.angle = 0.0;
        self.sensed.x = 0.0;
        self.sensed.y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{
        BatteryMonitor, Encoder, Imu, ImuSample, PhotoSample, PhotoSensors, SensorKind,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct CountingEncoder {
        value: Arc<AtomicU32>,
    }

    impl Encoder for CountingEncoder {
        fn read_raw(&mut self) -> Result<u32, DriverError> {
            Ok(self.value.load(Ordering::Relaxed))
        }
    }

    struct FixedImu {
        stale: Arc<AtomicBool>,
    }

    impl Imu for FixedImu {
        fn read(&mut self) -> Result<ImuSample, DriverError> {
            if self.stale.load(Ordering::Relaxed) {
                return Err(DriverError::StaleReading {
                    sensor: SensorKind::Imu,
                });
            }
            Ok(ImuSample {
                gyro_z_mdps: -90_000.0,
                accel_g: [0.0, 0.1, 1.0],
            })
        }
    }

    struct FixedPhoto;

    impl PhotoSensors for FixedPhoto {
        fn read(&mut self) -> Result<[PhotoSample; 4], DriverError> {
            Ok([PhotoSample::new(50, 500); 4])
        }
    }

    struct FixedBattery;

    impl BatteryMonitor for FixedBattery {
        fn read_millivolts(&mut self) -> Result<f64, DriverError> {
            Ok(4000.0)
        }
    }

    fn hub(encoder: Arc<AtomicU32>, stale: Arc<AtomicBool>) -> SensorHub {
        let params = SensorParams {
            left_wheel: WheelParams {
                resolution: 1024,
                tire_diameter_mm: 12.8,
                invert: false,
            },
            right_wheel: WheelParams {
                resolution: 1024,
                tire_diameter_mm: 12.8,
                invert: false,
            },
            battery_window: 8,
            warm_up_counts: 10,
            ..SensorParams::default()
        };
        let devices = SensorDevices {
            left_encoder: Box::new(CountingEncoder {
                value: encoder.clone(),
            }),
            right_encoder: Box::new(CountingEncoder { value: encoder }),
            imu: Box::new(FixedImu { stale }),
            photo: Box::new(FixedPhoto),
            battery: Box::new(FixedBattery),
        };
        SensorHub::new(params, devices).unwrap()
    }

    #[test]
    fn test_gyro_conversion() {
        // -90 dps（顺时针读数）= 逆时针 π/2 rad/s
        assert!((gyro_to_angular_velocity(-90_000.0) - PI / 2.0).abs() < 1e-12);
        assert_eq!(gyro_to_angular_velocity(0.0), 0.0);
    }

    #[test]
    fn test_invalid_window_is_rejected() {
        let params = SensorParams {
            battery_window: 100,
            ..SensorParams::default()
        };
        let devices = SensorDevices {
            left_encoder: Box::new(CountingEncoder {
                value: Arc::new(AtomicU32::new(0)),
            }),
            right_encoder: Box::new(CountingEncoder {
                value: Arc::new(AtomicU32::new(0)),
            }),
            imu: Box::new(FixedImu {
                stale: Arc::new(AtomicBool::new(false)),
            }),
            photo: Box::new(FixedPhoto),
            battery: Box::new(FixedBattery),
        };
        assert!(matches!(
            SensorHub::new(params, devices),
            Err(DriverError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_update_builds_snapshot() {
        let encoder = Arc::new(AtomicU32::new(0));
        let mut hub = hub(encoder.clone(), Arc::new(AtomicBool::new(false)));
        hub.update(1000.0).unwrap();
        encoder.store(16, Ordering::Relaxed);
        let sensed = *hub.update(1000.0).unwrap();

        let expected_v = 16.0 * 2.0 * PI / 1024.0 * 1000.0 * 0.0064;
        assert!((sensed.velocity - expected_v).abs() < 1e-9);
        assert!((sensed.angular_velocity - PI / 2.0).abs() < 1e-12);
        assert!((sensed.acceleration - 0.980665).abs() < 1e-9);
        assert_eq!(sensed.battery_mv, 4000.0);
        assert_eq!(sensed.battery_average_mv, 4000.0);
        assert_eq!(sensed.wall.left90.raw, 450);
        assert!(sensed.wall.left45.exists);
        assert_eq!(sensed.tick, 2);
    }

    #[test]
    fn test_stale_reading_keeps_previous_snapshot() {
        let encoder = Arc::new(AtomicU32::new(0));
        let stale = Arc::new(AtomicBool::new(false));
        let mut hub = hub(encoder, stale.clone());
        hub.update(1000.0).unwrap();

        stale.store(true, Ordering::Relaxed);
        let err = hub.update(1000.0).unwrap_err();
        assert!(err.is_stale());
        assert_eq!(hub.sensed().tick, 1);
    }

    #[test]
    fn test_warm_up_resets_odometry() {
        let encoder = Arc::new(AtomicU32::new(0));
        let mut hub = hub(encoder.clone(), Arc::new(AtomicBool::new(false)));
        encoder.store(100, Ordering::Relaxed);
        hub.update(1000.0).unwrap();
        encoder.store(200, Ordering::Relaxed);
        hub.warm_up(1000.0).unwrap();

        assert_eq!(hub.sensed().length, 0.0);
        assert_eq!(hub.sensed().angle, 0.0);
        assert_eq!(hub.sensed().tick, 11);
    }
}
