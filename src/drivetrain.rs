//! Differential drivetrain control.
//!
//! This module maps an arcade-style command, a forward/backward component `y`
//! and a rotational component `r`, onto the four wheels of a skid-steer
//! drivetrain. The left side receives `y + r` and the right side `-y + r`
//! (right motors are mounted mirrored, so they are not reversed in software).
//!
//! Two command spaces are supported:
//!
//! - **Velocity**: RPM, bounded by the green cartridge's 200 RPM.
//! - **Voltage**: millivolts, bounded by ±12000 mV, with optional slew limiting.
//!
//! When proportional scaling is enabled and `|y| + |r|` exceeds the mode's
//! bound, both components shrink by the same factor so the ratio between
//! driving and turning is kept. Clamping them independently would bend the
//! robot's path.
//!
//! # Example
//!
//! ```ignore
//! use punchbot::drivetrain::Differential;
//!
//! let mut drivetrain = Differential::new([front_left, back_left], [front_right, back_right]);
//! drivetrain.drive_voltage(6000.0, 1500.0, true);
//! ```

use std::{cell::RefCell, rc::Rc};

use log::warn;

use crate::{config::DriveConfig, peripherals::actuator::Actuator};

/// Command space of the drivetrain motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Velocity control in RPM.
    Velocity,
    /// Open-loop voltage control in millivolts.
    Voltage,
}

impl DriveMode {
    /// Largest magnitude a single wheel may be commanded in this mode.
    pub fn max_magnitude(self, config: &DriveConfig) -> f64 {
        match self {
            DriveMode::Velocity => config.max_rpm,
            DriveMode::Voltage => config.max_millivolts,
        }
    }
}

/// Per-wheel commands produced by [`mix`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelCommands {
    pub front_left:  f64,
    pub front_right: f64,
    pub back_left:   f64,
    pub back_right:  f64,
}

/// Mixes a forward and a rotational component into wheel commands.
pub fn mix(y: f64, r: f64) -> WheelCommands {
    WheelCommands {
        front_left:  y + r,
        front_right: -y + r,
        back_left:   y + r,
        back_right:  -y + r,
    }
}

/// Shrinks `y` and `r` by a common factor so that `|y| + |r| <= max`.
///
/// Inputs already within the bound are returned unchanged.
pub fn scale_proportional(y: f64, r: f64, max: f64) -> (f64, f64) {
    let sum = y.abs() + r.abs();
    if sum > max && sum > 0.0 {
        let factor = max / sum;
        (y * factor, r * factor)
    } else {
        (y, r)
    }
}

/// Limits how fast a commanded `y` and `r` may change between cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlewLimiter {
    /// Largest allowed change per cycle, in command units.
    pub rate: f64,
    last_y:   f64,
    last_r:   f64,
}

impl SlewLimiter {
    pub fn new(rate: f64) -> Self {
        SlewLimiter {
            rate:   rate.abs(),
            last_y: 0.0,
            last_r: 0.0,
        }
    }

    /// Moves the remembered command toward the requested one by at most `rate`.
    pub fn apply(&mut self, y: f64, r: f64) -> (f64, f64) {
        self.last_y = slew(self.last_y, y, self.rate);
        self.last_r = slew(self.last_r, r, self.rate);
        (self.last_y, self.last_r)
    }

    /// The last command handed out.
    pub fn last(&self) -> (f64, f64) { (self.last_y, self.last_r) }

    /// Forgets the previous command, e.g. after the motors were stopped.
    pub fn reset(&mut self) {
        self.last_y = 0.0;
        self.last_r = 0.0;
    }
}

fn slew(last: f64, requested: f64, rate: f64) -> f64 {
    if requested > last + rate {
        last + rate
    } else if requested < last - rate {
        last - rate
    } else {
        requested
    }
}

/// A differential drivetrain controller.
///
/// This struct manages a robot with separate left and right motor groups.
/// The motors are stored in reference-counted cells to allow shared
/// ownership with other systems.
#[derive(Clone)]
pub struct Differential<A: Actuator + 'static> {
    /// The left motor group.
    ///
    /// Contains all motors on the left side of the drivetrain.
    pub left:  Rc<RefCell<dyn AsMut<[A]>>>,

    /// The right motor group.
    ///
    /// Contains all motors on the right side of the drivetrain.
    pub right: Rc<RefCell<dyn AsMut<[A]>>>,

    config: DriveConfig,
    slew:   Option<SlewLimiter>,
}

impl<A: Actuator + 'static> Differential<A> {
    /// Creates a new drivetrain with the provided left/right motors and the
    /// default [`DriveConfig`].
    pub fn new<L: AsMut<[A]> + 'static, R: AsMut<[A]> + 'static>(left: L, right: R) -> Self {
        Self::from_shared(Rc::new(RefCell::new(left)), Rc::new(RefCell::new(right)))
    }

    /// Creates a new drivetrain with shared ownership of the left/right motors.
    pub fn from_shared<L: AsMut<[A]> + 'static, R: AsMut<[A]> + 'static>(
        left: Rc<RefCell<L>>,
        right: Rc<RefCell<R>>,
    ) -> Self {
        Self::with_config(left, right, DriveConfig::default())
    }

    pub fn with_config<L: AsMut<[A]> + 'static, R: AsMut<[A]> + 'static>(
        left: Rc<RefCell<L>>,
        right: Rc<RefCell<R>>,
        config: DriveConfig,
    ) -> Self {
        let slew = config.slew_rate.map(SlewLimiter::new);
        Self {
            left,
            right,
            config,
            slew,
        }
    }

    pub fn config(&self) -> &DriveConfig { &self.config }

    /// Sets drivetrain velocity.
    ///
    /// `y` and `r` are in RPM, nominally within ±200.
    pub fn drive_rpm(&mut self, y: f64, r: f64, scaling_enabled: bool) -> WheelCommands {
        let (y, r) = if scaling_enabled {
            scale_proportional(y, r, DriveMode::Velocity.max_magnitude(&self.config))
        } else {
            (y, r)
        };
        let wheels = mix(y, r);
        self.apply(wheels, |motor, rpm| motor.set_velocity(rpm.round() as i32));
        wheels
    }

    /// Sets drivetrain speed using voltage control.
    ///
    /// `y` and `r` are in millivolts, nominally within ±12000. The slew
    /// limiter, when configured, runs before proportional scaling.
    pub fn drive_voltage(&mut self, y: f64, r: f64, scaling_enabled: bool) -> WheelCommands {
        let (y, r) = match self.slew.as_mut() {
            Some(limiter) => limiter.apply(y, r),
            None => (y, r),
        };
        let (y, r) = if scaling_enabled {
            scale_proportional(y, r, DriveMode::Voltage.max_magnitude(&self.config))
        } else {
            (y, r)
        };
        let wheels = mix(y, r);
        self.apply(wheels, |motor, mv| motor.set_voltage(mv));
        wheels
    }

    /// Cuts power to every drivetrain motor and clears the slew history.
    pub fn stop(&mut self) {
        if let Some(limiter) = self.slew.as_mut() {
            limiter.reset();
        }
        self.apply(mix(0.0, 0.0), |motor, mv| motor.set_voltage(mv));
    }

    /// Holds every drivetrain motor at its current position.
    pub fn hold(&mut self) { self.apply(mix(0.0, 0.0), |motor, _| motor.set_velocity(0)); }

    fn apply<F>(&self, wheels: WheelCommands, mut command: F)
    where
        F: FnMut(&mut A, f64) -> Result<(), crate::error::DeviceError>,
    {
        // Left motors take the front-left value; front and back share a side.
        if let Ok(mut left_motors) = self.left.try_borrow_mut() {
            for motor in left_motors.as_mut() {
                command(motor, wheels.front_left).unwrap_or_else(|e| {
                    warn!("Drivetrain Motor Error: {}", e);
                });
            }
        } else {
            warn!("Error Borrowing Left Drivetrain Motors");
        }

        if let Ok(mut right_motors) = self.right.try_borrow_mut() {
            for motor in right_motors.as_mut() {
                command(motor, wheels.front_right).unwrap_or_else(|e| {
                    warn!("Drivetrain Motor Error: {}", e);
                });
            }
        } else {
            warn!("Error Borrowing Right Drivetrain Motors");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimCommand, SimMotor};

    fn drivetrain(clock: &SimClock, config: DriveConfig) -> Differential<SimMotor> {
        let left = [clock.motor("front_left"), clock.motor("back_left")];
        let right = [clock.motor("front_right"), clock.motor("back_right")];
        Differential::with_config(
            Rc::new(RefCell::new(left)),
            Rc::new(RefCell::new(right)),
            config,
        )
    }

    #[test]
    fn scaling_preserves_ratio() {
        let cases = [
            (150.0, 150.0, 200.0),
            (200.0, -100.0, 200.0),
            (-12000.0, 6000.0, 12000.0),
            (7.0, 400.0, 200.0),
        ];
        for (y, r, max) in cases {
            let (ys, rs) = scale_proportional(y, r, max);
            assert!(ys.abs() + rs.abs() <= max + 1e-9);
            assert!((ys / rs - y / r).abs() < 1e-9, "ratio changed for {y}, {r}");
        }
    }

    #[test]
    fn scaling_leaves_small_commands_alone() {
        assert_eq!(scale_proportional(50.0, -30.0, 200.0), (50.0, -30.0));
        assert_eq!(scale_proportional(0.0, 0.0, 200.0), (0.0, 0.0));
    }

    #[test]
    fn mix_layout() {
        let wheels = mix(100.0, 20.0);
        assert_eq!(wheels.front_left, 120.0);
        assert_eq!(wheels.back_left, 120.0);
        assert_eq!(wheels.front_right, -80.0);
        assert_eq!(wheels.back_right, -80.0);
    }

    #[test]
    fn slew_clamps_each_cycle() {
        let mut limiter = SlewLimiter::new(1000.0);
        assert_eq!(limiter.apply(12000.0, -300.0), (1000.0, -300.0));
        assert_eq!(limiter.apply(12000.0, -3000.0), (2000.0, -1300.0));
        assert_eq!(limiter.apply(1500.0, -1300.0), (1500.0, -1300.0));
        limiter.reset();
        assert_eq!(limiter.last(), (0.0, 0.0));
    }

    #[test]
    fn drive_rpm_commands_every_wheel() {
        let clock = SimClock::new();
        let mut dt = drivetrain(&clock, DriveConfig::default());
        let wheels = dt.drive_rpm(300.0, 100.0, true);
        assert_eq!(wheels.front_left, 200.0);
        assert_eq!(wheels.front_right, -100.0);

        let journal = clock.journal();
        assert_eq!(journal.len(), 4);
        assert!(journal.contains(&("front_left", SimCommand::Velocity(200))));
        assert!(journal.contains(&("back_left", SimCommand::Velocity(200))));
        assert!(journal.contains(&("front_right", SimCommand::Velocity(-100))));
        assert!(journal.contains(&("back_right", SimCommand::Velocity(-100))));
    }

    #[test]
    fn drive_voltage_slews_then_scales() {
        let clock = SimClock::new();
        let config = DriveConfig {
            slew_rate: Some(4000.0),
            ..DriveConfig::default()
        };
        let mut dt = drivetrain(&clock, config);

        let first = dt.drive_voltage(12000.0, 0.0, true);
        assert_eq!(first.front_left, 4000.0);
        let second = dt.drive_voltage(12000.0, 12000.0, true);
        // Slewed to (8000, 4000), which sits exactly on the 12000 mV bound.
        assert!((second.front_left - 12000.0).abs() < 1e-9);
        assert!((second.front_right - (-4000.0)).abs() < 1e-9);

        dt.stop();
        let third = dt.drive_voltage(12000.0, 0.0, false);
        assert_eq!(third.front_left, 4000.0);
    }

    #[test]
    fn unscaled_voltage_passes_through() {
        let clock = SimClock::new();
        let mut dt = drivetrain(&clock, DriveConfig::default());
        let wheels = dt.drive_voltage(10000.0, 10000.0, false);
        assert_eq!(wheels.front_left, 20000.0);
        assert_eq!(wheels.front_right, 0.0);
    }
}
