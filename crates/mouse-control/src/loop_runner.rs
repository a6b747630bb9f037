//! 固定周期控制循环
//!
//! 每个周期的顺序固定：
//!
//! 1. 取走新的走行参数（直线/旋转开始时清零里程计）
//! 2. 读取全部传感器；读数超时则输出零电压并结束本周期
//! 3. 发布传感器快照
//! 4. 走行控制；完成时发送带序号的完成信号
//! 5. 写入电机电压，发布目标值
//!
//! # 定时
//!
//! - `spin_sleep` 低抖动延时
//! - 实际周期超过 `dt_clamp_multiplier` 倍标称周期时钳位 dt（计入 `dt_clamps`）
//! - 读数超时的周期，其时间累加到下一个成功的周期

use crate::channel::{COMPLETION_CAPACITY, MotorPower, ParameterSlot};
use crate::error::ControlError;
use crate::metrics::LoopMetrics;
use crate::motion::MotionController;
use crate::observer::LoopObserver;
use crate::run::Run;
use crossbeam_channel::{Sender, TrySendError, bounded};
use mouse_driver::{DriverError, MotorCommand, Motors, SensorHub};
use spin_sleep::SpinSleeper;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 控制循环配置
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopConfig {
    /// 控制频率（Hz）
    pub frequency_hz: f64,

    /// dt 钳位倍数
    ///
    /// 例如：2.0 表示 dt 最大为 2 * (1 / frequency_hz)
    pub dt_clamp_multiplier: f64,

    /// 最大迭代次数（None 表示一直运行到停止）
    pub max_iterations: Option<usize>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            frequency_hz: 1000.0,
            dt_clamp_multiplier: 2.0,
            max_iterations: None,
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.frequency_hz.is_nan() || self.frequency_hz <= 0.0 {
            return Err(ControlError::InvalidConfig(format!(
                "Invalid frequency_hz: {} (must be > 0)",
                self.frequency_hz
            )));
        }
        if self.frequency_hz > 10000.0 {
            warn!(
                "Very high control frequency: {} Hz. This may cause timing overruns.",
                self.frequency_hz
            );
        }
        if self.dt_clamp_multiplier.is_nan() || self.dt_clamp_multiplier <= 0.0 {
            return Err(ControlError::InvalidConfig(format!(
                "Invalid dt_clamp_multiplier: {} (must be > 0)",
                self.dt_clamp_multiplier
            )));
        }
        Ok(())
    }

    /// 标称周期
    pub fn nominal_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frequency_hz)
    }

    /// 钳位后的最大 dt
    pub fn max_dt(&self) -> Duration {
        self.nominal_period().mul_f64(self.dt_clamp_multiplier)
    }
}

/// 一个周期的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 正常控制
    Controlled,
    /// 电机未使能，输出零电压
    Disabled,
    /// 传感器读取失败，输出零电压
    FailSafe,
}

/// 控制循环
///
/// 拥有传感器、电机与控制器；[`ControlLoop::spawn`] 之后在独立线程中运行。
pub struct ControlLoop {
    hub: SensorHub,
    motors: Motors,
    controller: MotionController,
    config: LoopConfig,
    slot: ParameterSlot,
    completion_tx: Sender<u64>,
    power: MotorPower,
    observer: LoopObserver,
    metrics: Arc<LoopMetrics>,
    active_seq: Option<u64>,
    /// 读数失败的周期累计的时间 [us]
    pending_dt_us: f64,
    stale_streak: u64,
}

impl fmt::Debug for ControlLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlLoop")
            .field("config", &self.config)
            .field("controller", &self.controller)
            .field("active_seq", &self.active_seq)
            .finish_non_exhaustive()
    }
}

impl ControlLoop {
    /// 创建控制循环与对应的序列器句柄
    pub fn new(
        hub: SensorHub,
        motors: Motors,
        controller: MotionController,
        config: LoopConfig,
    ) -> Result<(Self, Run), ControlError> {
        config.validate()?;

        let metrics = Arc::new(LoopMetrics::new());
        let observer = LoopObserver::new(metrics.clone(), *hub.sensed(), *controller.target());
        let slot = ParameterSlot::new(metrics.clone());
        let (completion_tx, completion_rx) = bounded(COMPLETION_CAPACITY);
        let power = MotorPower::new();

        let run = Run::new(slot.clone(), completion_rx, power.clone(), observer.clone());
        let control_loop = Self {
            hub,
            motors,
            controller,
            config,
            slot,
            completion_tx,
            power,
            observer,
            metrics,
            active_seq: None,
            pending_dt_us: 0.0,
            stale_streak: 0,
        };
        Ok((control_loop, run))
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn observer(&self) -> &LoopObserver {
        &self.observer
    }

    pub fn controller(&self) -> &MotionController {
        &self.controller
    }

    /// 传感器预热（丢弃启动时的读数并清零里程计）
    pub fn warm_up(&mut self) -> Result<(), ControlError> {
        let dt_us = self.config.nominal_period().as_secs_f64() * 1e6;
        self.hub.warm_up(dt_us)?;
        self.observer.publish_sensed(*self.hub.sensed());
        Ok(())
    }

    /// 执行一个周期
    pub fn tick(&mut self, dt: Duration) -> TickOutcome {
        self.metrics.ticks.fetch_add(1, Ordering::Relaxed);

        if let Some(command) = self.slot.take() {
            if self.controller.set_parameter(command.param) {
                self.hub.reset_odometry();
            }
            self.active_seq = Some(command.seq);
        }

        let dt_us = self.pending_dt_us + dt.as_secs_f64() * 1e6;
        let sensed = match self.hub.update(dt_us) {
            Ok(sensed) => *sensed,
            Err(e) => {
                self.pending_dt_us = dt_us;
                self.on_sensor_error(&e);
                let command = self.controller.fail_safe(self.hub.sensed().battery_mv);
                self.apply(&command);
                return TickOutcome::FailSafe;
            },
        };
        if self.stale_streak > 0 {
            info!("Sensor readings recovered after {} ticks", self.stale_streak);
            self.stale_streak = 0;
        }
        self.pending_dt_us = 0.0;
        self.observer.publish_sensed(sensed);

        let outcome = if self.power.is_enabled() {
            let output = self.controller.update(&sensed, dt_us / 1e6);
            if output.completed
                && let Some(seq) = self.active_seq
            {
                self.signal_completion(seq);
            }
            self.apply(&output.command);
            TickOutcome::Controlled
        } else {
            let command = self.controller.fail_safe(sensed.battery_mv);
            self.apply(&command);
            TickOutcome::Disabled
        };

        self.observer.publish_target(*self.controller.target());
        outcome
    }

    fn on_sensor_error(&mut self, e: &DriverError) {
        if e.is_stale() {
            self.metrics.stale_ticks.fetch_add(1, Ordering::Relaxed);
            self.stale_streak += 1;
            if self.stale_streak == 1 {
                warn!("{}, commanding zero voltage", e);
            } else {
                debug!("{} ({} ticks in a row)", e, self.stale_streak);
            }
        } else {
            self.metrics.device_errors.fetch_add(1, Ordering::Relaxed);
            error!("Sensor read failed: {}", e);
        }
    }

    fn signal_completion(&mut self, seq: u64) {
        match self.completion_tx.try_send(seq) {
            Ok(()) => {
                self.metrics.completions.fetch_add(1, Ordering::Relaxed);
                debug!("Motion #{} completed", seq);
            },
            Err(TrySendError::Full(_)) => {
                warn!("Completion queue full, dropping completion of #{}", seq);
            },
            Err(TrySendError::Disconnected(_)) => {
                debug!("No sequencer waiting for completion of #{}", seq);
            },
        }
    }

    fn apply(&mut self, command: &MotorCommand) {
        if let Err(e) = self.motors.apply(command) {
            self.metrics.device_errors.fetch_add(1, Ordering::Relaxed);
            error!("Motor write failed: {}", e);
        }
    }

    /// 预热后在独立线程中运行
    pub fn spawn(mut self) -> Result<LoopHandle, ControlError> {
        self.warm_up()?;

        let is_running = Arc::new(AtomicBool::new(true));
        let running = is_running.clone();
        let observer = self.observer.clone();
        let thread = thread::Builder::new()
            .name("mouse-control".to_string())
            .spawn(move || self.run(&running))
            .map_err(ControlError::ThreadSpawn)?;

        Ok(LoopHandle {
            is_running,
            thread: Some(thread),
            observer,
        })
    }

    fn run(mut self, is_running: &AtomicBool) {
        let nominal_period = self.config.nominal_period();
        let max_dt = self.config.max_dt();
        let sleeper = SpinSleeper::default();

        info!("Control loop started at {} Hz", self.config.frequency_hz);

        let mut last_time = Instant::now().checked_sub(nominal_period).unwrap_or_else(Instant::now);
        let mut iteration = 0;

        // Acquire: 看到 false 时，停止方之前的写入全部可见
        while is_running.load(Ordering::Acquire) {
            if let Some(max_iter) = self.config.max_iterations
                && iteration >= max_iter
            {
                break;
            }

            let now = Instant::now();
            let real_dt = now - last_time;
            let mut dt = real_dt;
            if real_dt > max_dt {
                self.metrics.dt_clamps.fetch_add(1, Ordering::Relaxed);
                debug!("Tick overrun: {:?} (clamped to {:?})", real_dt, max_dt);
                dt = max_dt;
            }

            self.tick(dt);

            last_time = now;
            iteration += 1;

            let elapsed = now.elapsed();
            if elapsed < nominal_period {
                sleeper.sleep(nominal_period - elapsed);
            }
        }

        let command = MotorCommand::zero(self.hub.sensed().battery_mv);
        self.apply(&command);
        is_running.store(false, Ordering::Release);
        info!("Control loop stopped after {} ticks", iteration);
    }
}

/// 运行中的控制线程
///
/// Drop 时停止并等待线程退出。
#[derive(Debug)]
pub struct LoopHandle {
    is_running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    observer: LoopObserver,
}

impl LoopHandle {
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    pub fn observer(&self) -> &LoopObserver {
        &self.observer
    }

    /// 停止控制线程（电机输出零电压后退出）
    pub fn stop(mut self) -> Result<(), ControlError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), ControlError> {
        self.is_running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| ControlError::ThreadPanicked)?;
        }
        Ok(())
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Control loop shutdown failed: {}", e);
        }
    }
}
