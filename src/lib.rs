//! # Punchbot
//!
//! Control core of a VEX V5 competition robot with a skid-steer drivetrain,
//! a puncher that launches balls at several angles, and a cap lift whose arc
//! crosses the puncher's path. Built on [vexide](https://vexide.dev).
//!
//! - **Drivetrain**: arcade mixing with proportional scaling in velocity or
//!   voltage space, joystick deadband and exponential response.
//! - **Puncher**: an absolute-position launch cycle (one full turn per ball),
//!   edge-triggered readiness, angle presets, and a two-angle double shot.
//! - **Cap lift**: detects when it is inside the puncher's interference band
//!   for the current angle and moves out before a launch.
//! - **Driver control**: one controller mapped onto all of the above, with a
//!   status readout on the brain screen.
//!
//! Everything that touches hardware sits behind the traits in
//! [`peripherals`] and [`time::Clock`], so the whole core also runs on a host
//! against simulated devices. Those live in `sim`, which is built for the
//! crate's own tests and, for downstream tests, behind the `sim` feature.
//!
//! ## Quick Start
//!
//! ```ignore
//! use log::LevelFilter;
//! use punchbot::{config::RobotConfig, fs::logger, hardware::Robot};
//! use vexide::prelude::*;
//!
//! #[vexide::main]
//! async fn main(peripherals: Peripherals) {
//!     logger::init(LevelFilter::Info).unwrap_or_else(|e| println!("Logger Error: {e}"));
//!     match Robot::new(peripherals, RobotConfig::default()) {
//!         Ok(robot) => robot.compete().await,
//!         Err(e) => log::error!("Robot Setup Error: {e}"),
//!     }
//! }
//! ```

/// Tunable constants.
///
/// Plain structs with competition defaults, including the smart port map.
pub mod config;

/// Brain screen status output.
///
/// Provides the [`StatusDisplay`](display::StatusDisplay) trait, the
/// [`StatusPanel`](display::StatusPanel) formatter and an
/// [`embedded-graphics`](https://crates.io/crates/embedded-graphics) text
/// renderer.
pub mod display;

/// Differential drivetrain control module.
///
/// Provides the [`Differential`](drivetrain::Differential) struct, which mixes
/// forward and turn commands onto left and right motor groups.
pub mod drivetrain;

/// Error types.
pub mod error;

/// Filesystem utilities module.
///
/// Contains the logger that records to the terminal and to `log.txt` on the
/// brain's SD card.
pub mod fs;

/// The driver control loop.
pub mod opcontrol;

/// Collaborator traits and their vexide implementations.
pub mod peripherals;

/// Puncher, angle adjuster and cap lift coordination.
///
/// The [`Puncher`](puncher::Puncher) state machine runs inside a
/// [`PuncherTask`](puncher::task::PuncherTask); the rest of the program talks
/// to it through a [`PuncherHandle`](puncher::task::PuncherHandle).
pub mod puncher;

/// Settling detection for position-controlled mechanisms.
pub mod settle;

/// Joystick deadband and response curves.
pub mod shaping;

/// Simulated clock, motors, controller and display.
#[cfg(any(test, feature = "sim"))]
pub mod sim;

/// The clock abstraction and the polling wait.
pub mod time;

/// Device construction and competition modes on the brain.
#[cfg(target_os = "vexos")]
pub mod hardware;
