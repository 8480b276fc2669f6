//! Error types shared by the control core.
//!
//! Physical faults (a stalled puncher, a lift that never clears) are not
//! errors by default: the blocking waits poll until the condition holds, and
//! the operator intervenes. Errors only surface for device failures, for a
//! precondition that does not hold, or when a [`WaitPolicy`](crate::time::WaitPolicy)
//! with a timeout is configured and the wait runs out.

use std::time::Duration;

use thiserror::Error;

use crate::puncher::angle::ShotPreset;

/// A failure reported by an actuator or input collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    /// Nothing is plugged into the port, or the device stopped responding.
    #[error("no device responding on port {port}")]
    Disconnected { port: u8 },

    /// The device on the port is not the kind that was expected.
    #[error("unexpected device on port {port}")]
    WrongDevice { port: u8 },

    /// The port number does not exist on the brain.
    #[error("smart port {port} does not exist")]
    InvalidPort { port: u8 },

    /// More than one device is assigned to the port.
    #[error("port {port} is assigned to more than one device")]
    PortInUse { port: u8 },

    /// The operator controller is not connected to the brain.
    #[error("controller is not connected")]
    ControllerDisconnected,

    /// Any other error reported by the device layer.
    #[error("device error: {0}")]
    Other(String),
}

/// A bounded wait ran out before its predicate held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("condition not met after {}", pretty(.waited))]
pub struct WaitError {
    /// How long the wait ran before giving up.
    pub waited: Duration,
}

/// Errors returned by puncher and cap lift operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PuncherError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A blocking stage did not settle within its configured timeout.
    #[error("{stage} did not settle after {}", pretty(.waited))]
    Timeout { stage: &'static str, waited: Duration },

    /// The puncher was still moving when a reset was requested.
    #[error("puncher must be stationary to reset its home position")]
    NotStationary,

    /// The angle table has no entry for the requested preset.
    #[error("no angle configured for preset {}", .0.label())]
    UnknownPreset(ShotPreset),
}

fn pretty(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}

impl PuncherError {
    pub(crate) fn timeout(stage: &'static str, err: WaitError) -> Self {
        PuncherError::Timeout {
            stage,
            waited: err.waited,
        }
    }
}
