//! 走行命令
//!
//! 在仿真机体上启动控制线程，执行 直线 →（旋转）→ 停止 的序列。

use anyhow::{Context, Result};
use clap::Args;
use mouse_sdk::MouseBuilder;
use mouse_sdk::control::MotionDirection;
use mouse_sdk::driver::mock::SimulatedPlant;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// 走行命令参数
#[derive(Args, Debug)]
pub struct DriveCommand {
    /// 直线距离 [mm]
    #[arg(short, long, default_value_t = 90.0)]
    pub length: f64,

    /// 最高速度 [m/s]（省略时使用配置）
    #[arg(short, long)]
    pub velocity: Option<f64>,

    /// 直线之后的旋转角度 [deg]，正值左转，负值右转
    #[arg(short, long, allow_hyphen_values = true)]
    pub turn: Option<f64>,

    /// 每个动作的超时 [s]
    #[arg(long, default_value_t = 10.0)]
    pub timeout: f64,

    /// 配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl DriveCommand {
    pub fn execute(&self) -> Result<()> {
        let config = super::load_config(self.config.as_deref())?;
        let profile = config.maneuver_profile();
        let velocity = self.velocity.unwrap_or(profile.velocity);
        let timeout = Duration::try_from_secs_f64(self.timeout)
            .with_context(|| format!("Invalid timeout {}", self.timeout))?;

        let plant = SimulatedPlant::new(config.plant_params())?;
        let (control, run) = MouseBuilder::new(config).build(plant.hardware())?;
        let run = run.with_timeout(timeout);
        let handle = control.spawn()?;

        info!("Straight {} mm at {} m/s", self.length, velocity);
        run.straight(MotionDirection::Forward, self.length, profile.acceleration, velocity, 0.0)
            .context("Straight motion failed")?;
        println!("traveled : {:.1} mm", plant.traveled_mm()?);

        if let Some(angle) = self.turn.filter(|angle| *angle != 0.0) {
            let direction = if angle > 0.0 {
                MotionDirection::Left
            } else {
                MotionDirection::Right
            };
            info!("Turn {} deg", angle);
            run.turn(
                angle.abs(),
                profile.angular_acceleration,
                profile.angular_velocity,
                direction,
            )
            .context("Turn failed")?;
            println!("rotated  : {:.1} deg", plant.rotated_deg()?);
        }

        run.stop().context("Stop failed")?;
        handle.stop()?;

        let metrics = run.observer().metrics();
        println!(
            "ticks    : {} (stale {}, dt clamps {}, completions {})",
            metrics.ticks, metrics.stale_ticks, metrics.dt_clamps, metrics.completions
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_short_straight() {
        let cmd = DriveCommand {
            length: 20.0,
            velocity: Some(0.5),
            turn: None,
            timeout: 5.0,
            config: None,
        };
        assert!(cmd.execute().is_ok());
    }

    #[test]
    fn test_invalid_timeout() {
        let cmd = DriveCommand {
            length: 20.0,
            velocity: None,
            turn: None,
            timeout: -1.0,
            config: None,
        };
        assert!(cmd.execute().is_err());
    }
}
