//! PID 控制器
//!
//! # 算法
//!
//! ```text
//! e      = target - current
//! sum   += (e + e_prev) * dt / 2        // 梯形积分
//! output = Kp * e + Ki * sum + Kd * (e - e_prev) / dt
//! e_prev = e
//! ```
//!
//! 无微分滤波，无积分限幅。同一个实现用于速度、角速度、侧墙三个回路。

/// PID 增益
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// PID 控制器（只保存误差历史）
#[derive(Debug, Clone, Default)]
pub struct Pid {
    gains: PidGains,
    /// 上一次的误差
    prev_error: f64,
    /// 误差的梯形积分
    sum: f64,
}

impl Pid {
    /// 创建 PID 控制器
    ///
    /// ```rust
    /// # use mouse_control::{Pid, PidGains};
    /// let mut pid = Pid::new(PidGains::new(2.0, 0.0, 0.0));
    /// assert_eq!(pid.update(1.0, 0.5, 0.001), 1.0);
    /// ```
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            prev_error: 0.0,
            sum: 0.0,
        }
    }

    /// 设置增益（builder）
    pub fn with_gains(mut self, kp: f64, ki: f64, kd: f64) -> Self {
        self.gains = PidGains::new(kp, ki, kd);
        self
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// 更新一步
    ///
    /// `dt` [s] 必须为正；`dt <= 0`（或 NaN）时只输出比例项，历史不变。
    pub fn update(&mut self, target: f64, current: f64, dt: f64) -> f64 {
        let error = target - current;
        if dt.is_nan() || dt <= 0.0 {
            return self.gains.kp * error;
        }

        self.sum += (error + self.prev_error) * dt / 2.0;
        let derivative = (error - self.prev_error) / dt;
        self.prev_error = error;

        self.gains.kp * error + self.gains.ki * self.sum + self.gains.kd * derivative
    }

    /// 清零误差历史
    pub fn reset(&mut self) {
        self.prev_error = 0.0;
        self.sum = 0.0;
    }

    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }

    /// 积分项累积值
    pub fn sum(&self) -> f64 {
        self.sum
    }
}
