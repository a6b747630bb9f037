//! PID 与电压换算的属性测试

use mouse_sdk::control::{MachineParams, Pid, PidGains};
use proptest::prelude::*;

proptest! {
    /// 误差恒定时，积分为梯形公式：第一步只有半个周期
    #[test]
    fn pid_integral_is_trapezoidal(
        error in -5.0..5.0f64,
        steps in 1usize..200,
        dt in 0.0005..0.01f64,
    ) {
        let mut pid = Pid::new(PidGains::new(0.0, 1.0, 0.0));
        let mut output = 0.0;
        for _ in 0..steps {
            output = pid.update(error, 0.0, dt);
        }
        let expected = error * dt * (steps as f64 - 0.5);
        prop_assert!((output - expected).abs() < 1e-9);
        prop_assert!((pid.sum() - expected).abs() < 1e-9);
        prop_assert_eq!(pid.prev_error(), error);
    }

    /// 比例项只与当前误差有关
    #[test]
    fn pid_proportional_only(kp in 0.0..10.0f64, target in -3.0..3.0f64, current in -3.0..3.0f64) {
        let mut pid = Pid::new(PidGains::new(kp, 0.0, 0.0));
        pid.update(1.0, 0.0, 0.001);
        let output = pid.update(target, current, 0.001);
        prop_assert!((output - kp * (target - current)).abs() < 1e-9);
    }

    /// reset 之后与新建的控制器行为一致
    #[test]
    fn pid_reset_matches_fresh(
        history in prop::collection::vec(-2.0..2.0f64, 1..20),
        target in -2.0..2.0f64,
    ) {
        let gains = PidGains::new(0.4, 2.0, 0.01);
        let mut used = Pid::new(gains);
        for error in history {
            used.update(error, 0.0, 0.001);
        }
        used.reset();
        let mut fresh = Pid::new(gains);
        prop_assert_eq!(used.update(target, 0.0, 0.001), fresh.update(target, 0.0, 0.001));
    }

    /// 电压不超过限幅；纯旋转时左右反号且大小相等
    #[test]
    fn wheel_voltages_are_limited(velocity in -2.0..2.0f64, angular in -20.0..20.0f64) {
        let machine = MachineParams::default();
        let (left, right) = machine.wheel_voltages(velocity, angular);
        prop_assert!(left.abs() <= machine.voltage_motor_limit);
        prop_assert!(right.abs() <= machine.voltage_motor_limit);

        let (left, right) = machine.wheel_voltages(0.0, angular);
        prop_assert!((left + right).abs() < 1e-12);
        if angular > 0.0 {
            prop_assert!(right >= 0.0);
        }
    }
}
