//! Actuator collaborator.
//!
//! An actuator is a single smart motor. The core only ever asks it to hold a
//! position, spin at a velocity, or apply a voltage, and reads back where it
//! is and where it was told to go. Tuning of the motor's own control loop
//! stays inside the device.

use std::{cell::RefCell, rc::Rc};

use crate::error::DeviceError;

/// Maximum magnitude of a voltage command, in millivolts.
pub const MAX_MILLIVOLTS: f64 = 12000.0;

/// A motor that accepts position, velocity and voltage commands.
///
/// Positions are in degrees of the motor shaft, velocities in RPM and
/// voltages in millivolts.
pub trait Actuator {
    /// Moves to an absolute `position`, limited to `speed` RPM.
    fn set_position_target(&mut self, position: f64, speed: i32) -> Result<(), DeviceError>;

    /// Spins at `rpm`. A velocity of zero actively holds the current position.
    fn set_velocity(&mut self, rpm: i32) -> Result<(), DeviceError>;

    /// Applies `millivolts` open-loop.
    fn set_voltage(&mut self, millivolts: f64) -> Result<(), DeviceError>;

    /// Current shaft position relative to the last reset.
    fn position(&self) -> Result<f64, DeviceError>;

    /// Most recently commanded absolute position target.
    fn target_position(&self) -> Result<f64, DeviceError>;

    /// Whether the shaft has come to rest.
    fn is_stopped(&self) -> Result<bool, DeviceError>;

    /// Makes the current shaft position the zero reference.
    fn reset_position(&mut self) -> Result<(), DeviceError>;
}

/// A motor shared between the driver control loop and the puncher task.
pub type SharedActuator<A> = Rc<RefCell<A>>;
