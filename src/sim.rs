//! Deterministic stand-ins for the robot's collaborators.
//!
//! [`SimClock`] is an injectable [`Clock`] whose `sleep` advances simulated
//! time and moves every [`SimMotor`] created from it, so blocking operations
//! can be driven to completion without real delays. Every command a motor
//! receives is appended to a shared journal, which lets tests assert on the
//! exact order of actuator calls across mechanisms.
//!
//! ```
//! use futures_lite::future::block_on;
//! use punchbot::{peripherals::actuator::Actuator, sim::SimClock, time::{Clock, LOOP_INTERVAL}};
//!
//! let clock = SimClock::new();
//! let mut motor = clock.motor("puncher");
//! motor.set_position_target(90.0, 200).unwrap();
//! for _ in 0..10 {
//!     block_on(clock.sleep(LOOP_INTERVAL));
//! }
//! assert_eq!(motor.position().unwrap(), 90.0);
//! ```

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    future::{self, Future},
    rc::Rc,
    time::Duration,
};

use crate::{
    display::StatusDisplay,
    error::DeviceError,
    peripherals::{
        actuator::{Actuator, MAX_MILLIVOLTS},
        controller::{ButtonState, ControllerAxis, ControllerButton, InputState, OperatorInput},
    },
    time::Clock,
};

/// Shaft degrees per second for each RPM.
const DEGREES_PER_SECOND_PER_RPM: f64 = 6.0;

/// A command as recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimCommand {
    Position { target: f64, speed: i32 },
    Velocity(i32),
    Voltage(f64),
    ResetPosition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Control {
    Idle,
    Position { target: f64, speed: i32 },
    Velocity(i32),
    Voltage(f64),
}

#[derive(Debug)]
struct MotorModel {
    position:     f64,
    velocity:     f64,
    target:       f64,
    control:      Control,
    max_rpm:      f64,
    stuck:        bool,
    disconnected: bool,
}

impl MotorModel {
    fn step(&mut self, dt: f64) {
        if self.stuck {
            self.velocity = 0.0;
            return;
        }
        match self.control {
            Control::Idle => self.velocity = 0.0,
            Control::Position { target, speed } => {
                let max_step = (speed.unsigned_abs() as f64).min(self.max_rpm) *
                    DEGREES_PER_SECOND_PER_RPM *
                    dt;
                let diff = target - self.position;
                if diff.abs() <= max_step {
                    self.position = target;
                    self.velocity = 0.0;
                } else {
                    self.position += diff.signum() * max_step;
                    self.velocity = diff.signum() * speed.unsigned_abs() as f64;
                }
            }
            Control::Velocity(rpm) => {
                self.velocity = (rpm as f64).clamp(-self.max_rpm, self.max_rpm);
                self.position += self.velocity * DEGREES_PER_SECOND_PER_RPM * dt;
            }
            Control::Voltage(mv) => {
                self.velocity = mv.clamp(-MAX_MILLIVOLTS, MAX_MILLIVOLTS) / MAX_MILLIVOLTS *
                    self.max_rpm;
                self.position += self.velocity * DEGREES_PER_SECOND_PER_RPM * dt;
            }
        }
    }
}

#[derive(Debug, Default)]
struct World {
    now:     Duration,
    motors:  Vec<Rc<RefCell<MotorModel>>>,
    journal: Vec<(&'static str, SimCommand)>,
}

/// Simulated time shared by a set of [`SimMotor`]s.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    world: Rc<RefCell<World>>,
}

impl SimClock {
    pub fn new() -> Self { Self::default() }

    /// Creates a green-cartridge motor at position zero.
    pub fn motor(&self, name: &'static str) -> SimMotor {
        let model = Rc::new(RefCell::new(MotorModel {
            position:     0.0,
            velocity:     0.0,
            target:       0.0,
            control:      Control::Idle,
            max_rpm:      200.0,
            stuck:        false,
            disconnected: false,
        }));
        self.world.borrow_mut().motors.push(model.clone());
        SimMotor {
            name,
            model,
            world: self.world.clone(),
        }
    }

    /// Moves time forward and steps every motor.
    pub fn advance(&self, duration: Duration) {
        let mut world = self.world.borrow_mut();
        world.now += duration;
        let dt = duration.as_secs_f64();
        for motor in &world.motors {
            motor.borrow_mut().step(dt);
        }
    }

    /// Every command issued so far, oldest first.
    pub fn journal(&self) -> Vec<(&'static str, SimCommand)> { self.world.borrow().journal.clone() }

    /// Commands issued to one motor, oldest first.
    pub fn journal_for(&self, name: &str) -> Vec<SimCommand> {
        self.world
            .borrow()
            .journal
            .iter()
            .filter(|(motor, _)| *motor == name)
            .map(|(_, command)| *command)
            .collect()
    }

    pub fn clear_journal(&self) { self.world.borrow_mut().journal.clear(); }
}

impl Clock for SimClock {
    fn now(&self) -> Duration { self.world.borrow().now }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        self.advance(duration);
        future::ready(())
    }
}

/// A simulated smart motor.
#[derive(Debug, Clone)]
pub struct SimMotor {
    name:  &'static str,
    model: Rc<RefCell<MotorModel>>,
    world: Rc<RefCell<World>>,
}

impl SimMotor {
    pub fn name(&self) -> &'static str { self.name }

    /// Places the shaft at `degrees` without recording a command.
    pub fn place(&self, degrees: f64) { self.model.borrow_mut().position = degrees; }

    /// A stuck motor accepts commands but never moves.
    pub fn set_stuck(&self, stuck: bool) { self.model.borrow_mut().stuck = stuck; }

    /// A disconnected motor fails every call.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.model.borrow_mut().disconnected = disconnected;
    }

    fn record(&self, command: SimCommand) -> Result<(), DeviceError> {
        self.check()?;
        self.world.borrow_mut().journal.push((self.name, command));
        Ok(())
    }

    fn check(&self) -> Result<(), DeviceError> {
        if self.model.borrow().disconnected {
            Err(DeviceError::Disconnected { port: 0 })
        } else {
            Ok(())
        }
    }
}

impl Actuator for SimMotor {
    fn set_position_target(&mut self, position: f64, speed: i32) -> Result<(), DeviceError> {
        self.record(SimCommand::Position {
            target: position,
            speed,
        })?;
        let mut model = self.model.borrow_mut();
        model.target = position;
        model.control = Control::Position {
            target: position,
            speed,
        };
        Ok(())
    }

    fn set_velocity(&mut self, rpm: i32) -> Result<(), DeviceError> {
        self.record(SimCommand::Velocity(rpm))?;
        self.model.borrow_mut().control = Control::Velocity(rpm);
        Ok(())
    }

    fn set_voltage(&mut self, millivolts: f64) -> Result<(), DeviceError> {
        self.record(SimCommand::Voltage(millivolts))?;
        self.model.borrow_mut().control = Control::Voltage(millivolts);
        Ok(())
    }

    fn position(&self) -> Result<f64, DeviceError> {
        self.check()?;
        Ok(self.model.borrow().position)
    }

    fn target_position(&self) -> Result<f64, DeviceError> {
        self.check()?;
        Ok(self.model.borrow().target)
    }

    fn is_stopped(&self) -> Result<bool, DeviceError> {
        self.check()?;
        Ok(self.model.borrow().velocity == 0.0)
    }

    fn reset_position(&mut self) -> Result<(), DeviceError> {
        self.record(SimCommand::ResetPosition)?;
        let mut model = self.model.borrow_mut();
        let offset = model.position;
        model.position = 0.0;
        model.target -= offset;
        if let Control::Position { target, speed } = model.control {
            model.control = Control::Position {
                target: target - offset,
                speed,
            };
        }
        Ok(())
    }
}

/// A controller whose sticks and buttons are set by the test.
///
/// Edges are computed per read: a button held across two reads of
/// [`state`](OperatorInput::state) is a new press only on the first.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    held:         RefCell<Vec<ControllerButton>>,
    previous:     RefCell<Vec<ControllerButton>>,
    axes:         Cell<[f64; 4]>,
    disconnected: Cell<bool>,
}

impl ScriptedInput {
    pub fn new() -> Self { Self::default() }

    pub fn press(&self, button: ControllerButton) {
        let mut held = self.held.borrow_mut();
        if !held.contains(&button) {
            held.push(button);
        }
    }

    pub fn release(&self, button: ControllerButton) {
        self.held.borrow_mut().retain(|b| *b != button);
    }

    pub fn set_axis(&self, axis: ControllerAxis, value: f64) {
        let mut axes = self.axes.get();
        let index = match axis {
            ControllerAxis::LeftX => 0,
            ControllerAxis::LeftY => 1,
            ControllerAxis::RightX => 2,
            ControllerAxis::RightY => 3,
        };
        axes[index] = value;
        self.axes.set(axes);
    }

    pub fn set_disconnected(&self, disconnected: bool) { self.disconnected.set(disconnected); }
}

impl OperatorInput for ScriptedInput {
    fn state(&self) -> Result<InputState, DeviceError> {
        if self.disconnected.get() {
            return Err(DeviceError::ControllerDisconnected);
        }

        let held = self.held.borrow().clone();
        let previous = self.previous.replace(held.clone());

        let mut state = InputState::default();
        let [left_x, left_y, right_x, right_y] = self.axes.get();
        state.set_axis(ControllerAxis::LeftX, left_x);
        state.set_axis(ControllerAxis::LeftY, left_y);
        state.set_axis(ControllerAxis::RightX, right_x);
        state.set_axis(ControllerAxis::RightY, right_y);
        for button in ControllerButton::ALL {
            state.set_button(
                button,
                ButtonState::new(held.contains(&button), previous.contains(&button)),
            );
        }
        Ok(state)
    }
}

/// A display that keeps the latest text of every line.
#[derive(Debug, Default, Clone)]
pub struct RecordingDisplay {
    pub lines: BTreeMap<u8, String>,
}

impl RecordingDisplay {
    pub fn line(&self, line: u8) -> Option<&str> { self.lines.get(&line).map(String::as_str) }
}

impl StatusDisplay for RecordingDisplay {
    fn print_line(&mut self, line: u8, text: &str) { self.lines.insert(line, text.to_owned()); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_control_reaches_target() {
        let clock = SimClock::new();
        let mut motor = clock.motor("m");
        motor.set_position_target(360.0, 200).unwrap();
        // 200 RPM is 1200 deg/s, so 12 degrees per 10ms.
        clock.advance(Duration::from_millis(10));
        assert!((motor.position().unwrap() - 12.0).abs() < 1e-9);
        assert!(!motor.is_stopped().unwrap());
        for _ in 0..40 {
            clock.advance(Duration::from_millis(10));
        }
        assert_eq!(motor.position().unwrap(), 360.0);
        assert!(motor.is_stopped().unwrap());
    }

    #[test]
    fn stuck_motor_never_moves() {
        let clock = SimClock::new();
        let mut motor = clock.motor("m");
        motor.set_stuck(true);
        motor.set_velocity(100).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(motor.position().unwrap(), 0.0);
    }

    #[test]
    fn reset_rebases_target() {
        let clock = SimClock::new();
        let mut motor = clock.motor("m");
        motor.place(50.0);
        motor.set_position_target(100.0, 100).unwrap();
        motor.reset_position().unwrap();
        assert_eq!(motor.position().unwrap(), 0.0);
        assert_eq!(motor.target_position().unwrap(), 50.0);
    }

    #[test]
    fn journal_keeps_order() {
        let clock = SimClock::new();
        let mut a = clock.motor("a");
        let mut b = clock.motor("b");
        a.set_voltage(1000.0).unwrap();
        b.set_velocity(5).unwrap();
        a.set_velocity(0).unwrap();
        assert_eq!(clock.journal(), vec![
            ("a", SimCommand::Voltage(1000.0)),
            ("b", SimCommand::Velocity(5)),
            ("a", SimCommand::Velocity(0)),
        ]);
        assert_eq!(clock.journal_for("b"), vec![SimCommand::Velocity(5)]);
    }

    #[test]
    fn disconnected_motor_errors() {
        let clock = SimClock::new();
        let mut motor = clock.motor("m");
        motor.set_disconnected(true);
        assert!(motor.set_velocity(10).is_err());
        assert!(motor.position().is_err());
        assert!(clock.journal().is_empty());
    }

    #[test]
    fn scripted_input_edges() {
        let input = ScriptedInput::new();
        input.press(ControllerButton::ButtonA);
        let first = input.state().unwrap();
        assert!(first.button(ControllerButton::ButtonA).is_now_pressed());
        let second = input.state().unwrap();
        assert!(second.button(ControllerButton::ButtonA).is_pressed());
        assert!(!second.button(ControllerButton::ButtonA).is_now_pressed());
        input.release(ControllerButton::ButtonA);
        assert!(input.state().unwrap().button(ControllerButton::ButtonA).is_now_released());
    }
}
