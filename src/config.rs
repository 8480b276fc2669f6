//! Robot constants.
//!
//! Every tunable lives in one of these plain structs. Each has a `Default`
//! matching the competition robot, and any field can be overridden with
//! struct update syntax:
//!
//! ```
//! use punchbot::config::DriveConfig;
//!
//! let config = DriveConfig {
//!     slew_rate: Some(1500.0),
//!     ..DriveConfig::default()
//! };
//! assert_eq!(config.max_rpm, 200.0);
//! ```

use std::time::Duration;

use crate::{
    error::DeviceError,
    puncher::angle::ShotPreset,
    settle::SettleConfig,
    time::{LOOP_INTERVAL, WaitPolicy},
};

/// Drivetrain limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveConfig {
    /// Velocity bound of the green cartridge, in RPM.
    pub max_rpm:         f64,
    /// Voltage bound, in millivolts.
    pub max_millivolts:  f64,
    /// Largest per-cycle change of a voltage command, or `None` to disable slewing.
    pub slew_rate:       Option<f64>,
    /// Whether driver commands are scaled proportionally into range.
    pub scaling_enabled: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            max_rpm:         200.0,
            max_millivolts:  12000.0,
            slew_rate:       None,
            scaling_enabled: true,
        }
    }
}

/// Stick response shaping used by the driver loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapingConfig {
    /// Deadband on the ±127 analog scale.
    pub deadband: f64,
    /// Exponent of the response curve.
    pub exponent: f64,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        ShapingConfig {
            deadband: 8.0,
            exponent: 1.5,
        }
    }
}

/// Puncher, angle adjuster and intake constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PuncherConfig {
    /// Speed limit of a launch or prime, in RPM.
    pub launch_speed:   i32,
    /// Default prime offset into the cycle, in degrees.
    pub prime_offset:   f64,
    /// Default speed of the angle adjuster, in RPM.
    pub angle_speed:    i32,
    /// Intake speed while a double shot feeds the second ball, in RPM.
    pub feed_speed:     i32,
    /// Settling criteria for the puncher.
    pub puncher_settle: SettleConfig,
    /// Settling criteria for the angle adjuster.
    pub angle_settle:   SettleConfig,
    /// Bound on every blocking wait.
    pub wait:           WaitPolicy,
    /// Polling period of blocking waits and of the puncher task.
    pub tick:           Duration,
    /// Angle preset selected at startup.
    pub initial_preset: ShotPreset,
}

impl Default for PuncherConfig {
    fn default() -> Self {
        PuncherConfig {
            launch_speed:   200,
            prime_offset:   90.0,
            angle_speed:    50,
            feed_speed:     200,
            puncher_settle: SettleConfig {
                tolerance:    5.0,
                min_samples:  3,
                min_duration: Duration::from_millis(40),
            },
            angle_settle:   SettleConfig {
                tolerance:    2.0,
                min_samples:  3,
                min_duration: Duration::from_millis(40),
            },
            wait:           WaitPolicy::INDEFINITE,
            tick:           LOOP_INTERVAL,
            initial_preset: ShotPreset::NearHighFlag,
        }
    }
}

/// Cap lift constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiftConfig {
    /// Lift arm degrees per motor shaft degree.
    pub gear_ratio:   f64,
    /// Speed used to leave an interference band, in RPM.
    pub clear_speed:  i32,
    /// Speed of the driver's lift buttons, in RPM.
    pub manual_speed: i32,
}

impl Default for LiftConfig {
    fn default() -> Self {
        LiftConfig {
            gear_ratio:   1.0 / 7.0,
            clear_speed:  100,
            manual_speed: 200,
        }
    }
}

/// Intake speeds for the driver's buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeConfig {
    /// Collecting balls, in RPM.
    pub intake_speed:  i32,
    /// Flipping caps or ejecting balls, in RPM.
    pub outtake_speed: i32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        IntakeConfig {
            intake_speed:  200,
            outtake_speed: -150,
        }
    }
}

/// Number of smart ports on the brain, numbered from 1.
pub const SMART_PORTS: u8 = 21;

/// Smart port assignments on the brain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ports {
    pub front_left:     u8,
    pub front_right:    u8,
    pub back_left:      u8,
    pub back_right:     u8,
    pub puncher:        u8,
    pub angle_adjuster: u8,
    pub intake:         u8,
    pub cap_lift:       u8,
}

impl Default for Ports {
    fn default() -> Self {
        Ports {
            front_left:     1,
            front_right:    2,
            back_left:      3,
            back_right:     4,
            puncher:        5,
            angle_adjuster: 6,
            intake:         7,
            cap_lift:       8,
        }
    }
}

impl Ports {
    /// Every assigned port, drivetrain first.
    pub fn all(&self) -> [u8; 8] {
        [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
            self.puncher,
            self.angle_adjuster,
            self.intake,
            self.cap_lift,
        ]
    }

    /// Checks that every port exists and drives exactly one device.
    ///
    /// # Errors
    ///
    /// [`DeviceError::InvalidPort`] for a number outside `1..=21`, and
    /// [`DeviceError::PortInUse`] for the second device on a shared port.
    pub fn validate(&self) -> Result<(), DeviceError> {
        let mut used = [false; SMART_PORTS as usize];
        for port in self.all() {
            let slot = port
                .checked_sub(1)
                .and_then(|index| used.get_mut(index as usize))
                .ok_or(DeviceError::InvalidPort { port })?;
            if *slot {
                return Err(DeviceError::PortInUse { port });
            }
            *slot = true;
        }
        Ok(())
    }
}

/// Everything the driver control period needs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RobotConfig {
    pub drive:   DriveConfig,
    pub shaping: ShapingConfig,
    pub puncher: PuncherConfig,
    pub lift:    LiftConfig,
    pub intake:  IntakeConfig,
    pub ports:   Ports,
}
