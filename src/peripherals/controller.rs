//! Operator controller input.
//!
//! The driver control loop reads one [`InputState`] per tick. Sticks are
//! normalized to `[-1.0, 1.0]` and each button carries both its level and
//! whether it changed since the previous read, so rising-edge triggers
//! ("new press") need no extra bookkeeping in the loop.
//!
//! # Example
//!
//! ```ignore
//! use punchbot::peripherals::controller::{read_state, ControllerButton};
//!
//! let state = read_state(&controller);
//! if state.button(ControllerButton::ButtonA).is_now_pressed() {
//!     // launch
//! }
//! ```

use log::warn;

use crate::error::DeviceError;

/// Something that can report the operator controller's state.
pub trait OperatorInput {
    /// Reads the current stick and button state.
    fn state(&self) -> Result<InputState, DeviceError>;
}

/// Level and edge information for one button.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    /// Whether the button is held right now.
    pub pressed:      bool,
    /// Whether the button was held on the previous read.
    pub prev_pressed: bool,
}

impl ButtonState {
    pub const fn new(pressed: bool, prev_pressed: bool) -> Self {
        ButtonState {
            pressed,
            prev_pressed,
        }
    }

    pub const fn is_pressed(&self) -> bool { self.pressed }

    /// Pressed now, released on the previous read.
    pub const fn is_now_pressed(&self) -> bool { self.pressed && !self.prev_pressed }

    /// Released now, pressed on the previous read.
    pub const fn is_now_released(&self) -> bool { !self.pressed && self.prev_pressed }
}

/// An analog stick axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// A list of Controller Buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerButton {
    ButtonA,
    ButtonB,
    ButtonX,
    ButtonY,
    ButtonUp,
    ButtonDown,
    ButtonLeft,
    ButtonRight,
    ButtonL1,
    ButtonL2,
    ButtonR1,
    ButtonR2,
}

impl ControllerButton {
    pub const ALL: [ControllerButton; 12] = [
        ControllerButton::ButtonA,
        ControllerButton::ButtonB,
        ControllerButton::ButtonX,
        ControllerButton::ButtonY,
        ControllerButton::ButtonUp,
        ControllerButton::ButtonDown,
        ControllerButton::ButtonLeft,
        ControllerButton::ButtonRight,
        ControllerButton::ButtonL1,
        ControllerButton::ButtonL2,
        ControllerButton::ButtonR1,
        ControllerButton::ButtonR2,
    ];

    const fn index(self) -> usize {
        match self {
            ControllerButton::ButtonA => 0,
            ControllerButton::ButtonB => 1,
            ControllerButton::ButtonX => 2,
            ControllerButton::ButtonY => 3,
            ControllerButton::ButtonUp => 4,
            ControllerButton::ButtonDown => 5,
            ControllerButton::ButtonLeft => 6,
            ControllerButton::ButtonRight => 7,
            ControllerButton::ButtonL1 => 8,
            ControllerButton::ButtonL2 => 9,
            ControllerButton::ButtonR1 => 10,
            ControllerButton::ButtonR2 => 11,
        }
    }
}

/// One snapshot of the operator controller.
///
/// The default value has centered sticks and nothing pressed, which is what
/// the loop falls back to when the controller cannot be read.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct InputState {
    pub left_x:  f64,
    pub left_y:  f64,
    pub right_x: f64,
    pub right_y: f64,
    buttons:     [ButtonState; 12],
}

impl InputState {
    pub fn axis(&self, axis: ControllerAxis) -> f64 {
        match axis {
            ControllerAxis::LeftX => self.left_x,
            ControllerAxis::LeftY => self.left_y,
            ControllerAxis::RightX => self.right_x,
            ControllerAxis::RightY => self.right_y,
        }
    }

    pub fn button(&self, button: ControllerButton) -> ButtonState { self.buttons[button.index()] }

    pub fn set_axis(&mut self, axis: ControllerAxis, value: f64) {
        let value = value.clamp(-1.0, 1.0);
        match axis {
            ControllerAxis::LeftX => self.left_x = value,
            ControllerAxis::LeftY => self.left_y = value,
            ControllerAxis::RightX => self.right_x = value,
            ControllerAxis::RightY => self.right_y = value,
        }
    }

    pub fn set_button(&mut self, button: ControllerButton, state: ButtonState) {
        self.buttons[button.index()] = state;
    }
}

/// Reads the controller, falling back to a neutral state on error.
pub fn read_state<I: OperatorInput + ?Sized>(input: &I) -> InputState {
    input.state().unwrap_or_else(|e| {
        warn!("Controller State Error: {}", e);
        InputState::default()
    })
}
