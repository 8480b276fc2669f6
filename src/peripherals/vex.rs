//! vexide implementations of the collaborator traits.

use std::{fmt::Display, future::Future, time::Duration};

use vexide::{
    controller::{ButtonState as VexButton, ControllerState},
    math::Angle,
    prelude::{Controller, Motor},
    time::{sleep, user_uptime},
};

use super::{
    actuator::Actuator,
    controller::{ButtonState, ControllerAxis, ControllerButton, InputState, OperatorInput},
};
use crate::{error::DeviceError, time::Clock};

/// Motors stopped below this speed, in RPM.
const STOPPED_RPM: f64 = 1.0;

fn device_error(e: impl Display) -> DeviceError { DeviceError::Other(e.to_string()) }

/// A smart motor that remembers its last position target.
///
/// The brain does not report the target of a position move, so it is cached
/// here for settling checks.
pub struct SmartMotor {
    motor:  Motor,
    target: f64,
}

impl SmartMotor {
    pub fn new(motor: Motor) -> Self { SmartMotor { motor, target: 0.0 } }

    pub fn motor(&self) -> &Motor { &self.motor }
}

impl Actuator for SmartMotor {
    fn set_position_target(&mut self, position: f64, speed: i32) -> Result<(), DeviceError> {
        self.motor
            .set_position_target(Angle::from_degrees(position), speed)
            .map_err(device_error)?;
        self.target = position;
        Ok(())
    }

    fn set_velocity(&mut self, rpm: i32) -> Result<(), DeviceError> {
        self.motor.set_velocity(rpm).map_err(device_error)
    }

    fn set_voltage(&mut self, millivolts: f64) -> Result<(), DeviceError> {
        self.motor.set_voltage(millivolts / 1000.0).map_err(device_error)
    }

    fn position(&self) -> Result<f64, DeviceError> {
        Ok(self.motor.position().map_err(device_error)?.as_degrees())
    }

    fn target_position(&self) -> Result<f64, DeviceError> { Ok(self.target) }

    fn is_stopped(&self) -> Result<bool, DeviceError> {
        let velocity = self.motor.velocity().map_err(device_error)?;
        Ok(velocity.abs() < STOPPED_RPM)
    }

    fn reset_position(&mut self) -> Result<(), DeviceError> {
        let position = self.position()?;
        self.motor.reset_position().map_err(device_error)?;
        self.target -= position;
        Ok(())
    }
}

fn button(state: VexButton) -> ButtonState {
    let pressed = state.is_pressed();
    let prev_pressed = if pressed { !state.is_now_pressed() } else { state.is_now_released() };
    ButtonState::new(pressed, prev_pressed)
}

fn vex_button(state: &ControllerState, which: ControllerButton) -> VexButton {
    match which {
        ControllerButton::ButtonA => state.button_a,
        ControllerButton::ButtonB => state.button_b,
        ControllerButton::ButtonX => state.button_x,
        ControllerButton::ButtonY => state.button_y,
        ControllerButton::ButtonUp => state.button_up,
        ControllerButton::ButtonDown => state.button_down,
        ControllerButton::ButtonLeft => state.button_left,
        ControllerButton::ButtonRight => state.button_right,
        ControllerButton::ButtonL1 => state.button_l1,
        ControllerButton::ButtonL2 => state.button_l2,
        ControllerButton::ButtonR1 => state.button_r1,
        ControllerButton::ButtonR2 => state.button_r2,
    }
}

impl OperatorInput for Controller {
    fn state(&self) -> Result<InputState, DeviceError> {
        let state = Controller::state(self).map_err(|_| DeviceError::ControllerDisconnected)?;

        let mut input = InputState::default();
        input.set_axis(ControllerAxis::LeftX, state.left_stick.x());
        input.set_axis(ControllerAxis::LeftY, state.left_stick.y());
        input.set_axis(ControllerAxis::RightX, state.right_stick.x());
        input.set_axis(ControllerAxis::RightY, state.right_stick.y());
        for which in ControllerButton::ALL {
            input.set_button(which, button(vex_button(&state, which)));
        }
        Ok(input)
    }
}

/// The brain's user program timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrainClock;

impl Clock for BrainClock {
    fn now(&self) -> Duration { user_uptime() }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> { sleep(duration) }
}
