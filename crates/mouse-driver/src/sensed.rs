//! 每周期的传感器快照

use crate::hardware::{PhotoPosition, PhotoSample};

/// 单个墙壁传感器的判定参数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallSensorParam {
    /// 机体位于区画中央时的读数
    pub reference: i32,
    /// 超过该值视为有墙
    pub threshold: i32,
}

/// 单个墙壁传感器的读数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallReading {
    /// 发光时强度 - 环境光强度
    pub raw: i32,
    /// `raw - reference`
    pub error: i32,
    /// `raw > threshold`
    pub exists: bool,
}

impl WallReading {
    pub fn from_sample(sample: PhotoSample, param: WallSensorParam) -> Self {
        let raw = i32::from(sample.flash) - i32::from(sample.ambient);
        Self {
            raw,
            error: raw - param.reference,
            exists: raw > param.threshold,
        }
    }
}

/// 四个墙壁传感器
///
/// 90° 的两个朝前，45° 的两个朝向左右侧墙。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallSensors {
    pub left90: WallReading,
    pub left45: WallReading,
    pub right45: WallReading,
    pub right90: WallReading,
}

impl WallSensors {
    pub fn from_samples(samples: &[PhotoSample; 4], params: &[WallSensorParam; 4]) -> Self {
        let read = |position: PhotoPosition| {
            let i = position.index();
            WallReading::from_sample(samples[i], params[i])
        };
        Self {
            left90: read(PhotoPosition::Left90),
            left45: read(PhotoPosition::Left45),
            right45: read(PhotoPosition::Right45),
            right90: read(PhotoPosition::Right90),
        }
    }

    /// 左前方
    pub fn front_left(&self) -> &WallReading {
        &self.left90
    }

    /// 右前方
    pub fn front_right(&self) -> &WallReading {
        &self.right90
    }

    /// 左侧墙
    pub fn left(&self) -> &WallReading {
        &self.left45
    }

    /// 右侧墙
    pub fn right(&self) -> &WallReading {
        &self.right45
    }
}

/// 一个控制周期的传感器快照（只读）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sensed {
    /// 车体速度 [m/s]
    pub velocity: f64,
    /// 车体角速度 [rad/s]，逆时针为正
    pub angular_velocity: f64,
    /// [m/s^2]
    pub acceleration: f64,
    /// [rad/s^2]
    pub angular_acceleration: f64,
    /// 车体角度 [deg]
    pub angle: f64,
    /// 走行距离 [mm]
    pub length: f64,
    /// [mm]
    pub x: f64,
    /// [mm]
    pub y: f64,
    /// 电源电压 [mV]
    pub battery_mv: f64,
    /// 电源电压移动平均 [mV]
    pub battery_average_mv: f64,
    pub wall: WallSensors,
    /// 产生该快照的周期序号
    pub tick: u64,
}
