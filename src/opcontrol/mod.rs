//! Driver control loop.
//!
//! One [`DriverControl::tick`] reads the controller once and then, in a fixed
//! order, drives the chassis, forwards puncher requests to the puncher task,
//! runs the intake and the cap lift, and refreshes the brain screen.
//!
//! | Input            | Action                                   |
//! |------------------|------------------------------------------|
//! | Left stick Y     | forward / backward                       |
//! | Right stick X    | turn                                     |
//! | A                | launch (only when the puncher is ready)  |
//! | B                | double shot, near high then near mid     |
//! | X                | prime                                    |
//! | Y                | reset the puncher's home                 |
//! | Up/Right/Down/Left | near high / near mid / near low / far high |
//! | L1 / L2          | intake / outtake                         |
//! | R1 / R2          | cap lift up / down                       |
//!
//! While the puncher task reports itself busy it owns the intake and the cap
//! lift, so their buttons and any new puncher requests are ignored.

use std::time::Duration;

use log::{debug, info, warn};

use crate::{
    config::{IntakeConfig, ShapingConfig},
    display::{StatusDisplay, StatusPanel},
    drivetrain::Differential,
    peripherals::{
        actuator::{Actuator, SharedActuator},
        controller::{ControllerAxis, ControllerButton, InputState, OperatorInput, read_state},
    },
    puncher::{
        PuncherStatus,
        angle::ShotPreset,
        lift::CapLift,
        task::{PuncherCommand, PuncherHandle},
    },
    shaping::{ANALOG_MAX, exp_curve, scale_deadband},
    time::Clock,
};

/// Angle preset bound to each direction pad button.
const ANGLE_BUTTONS: [(ControllerButton, ShotPreset); 4] = [
    (ControllerButton::ButtonUp, ShotPreset::NearHighFlag),
    (ControllerButton::ButtonRight, ShotPreset::NearMidFlag),
    (ControllerButton::ButtonDown, ShotPreset::NearLowFlag),
    (ControllerButton::ButtonLeft, ShotPreset::FarHighFlag),
];

/// The mechanisms the driver loop commands directly.
pub struct DriverParts<A: Actuator + 'static> {
    pub drivetrain: Differential<A>,
    pub intake:     SharedActuator<A>,
    pub lift:       CapLift<A>,
    pub puncher:    PuncherHandle,
}

/// Maps one operator controller onto the robot.
pub struct DriverControl<A: Actuator + 'static, I: OperatorInput, D: StatusDisplay> {
    input:      I,
    display:    D,
    panel:      StatusPanel,
    drivetrain: Differential<A>,
    intake:     SharedActuator<A>,
    lift:       CapLift<A>,
    puncher:    PuncherHandle,
    shaping:    ShapingConfig,
    speeds:     IntakeConfig,
}

impl<A: Actuator + 'static, I: OperatorInput, D: StatusDisplay> DriverControl<A, I, D> {
    pub fn new(parts: DriverParts<A>, input: I, display: D, shaping: ShapingConfig, speeds: IntakeConfig) -> Self {
        DriverControl {
            input,
            display,
            panel: StatusPanel::new(),
            drivetrain: parts.drivetrain,
            intake: parts.intake,
            lift: parts.lift,
            puncher: parts.puncher,
            shaping,
            speeds,
        }
    }

    pub fn display(&self) -> &D { &self.display }

    pub fn drivetrain(&self) -> &Differential<A> { &self.drivetrain }

    /// Runs one control cycle.
    pub fn tick(&mut self) {
        let state = read_state(&self.input);
        let status = self.puncher.status();

        self.drive(&state);
        if status.busy {
            debug!("Puncher busy, holding driver requests");
        } else {
            self.request_puncher(&state, &status);
            self.run_intake(&state);
            self.run_lift(&state);
        }
        self.show(&status);
    }

    /// Ticks every `interval` until the surrounding competition mode ends.
    pub async fn run<C: Clock>(&mut self, clock: &C, interval: Duration) {
        info!("Driver Control Started");
        self.panel.invalidate();
        loop {
            self.tick();
            clock.sleep(interval).await;
        }
    }

    fn drive(&mut self, state: &InputState) {
        let shape = |axis| {
            let raw = ANALOG_MAX * state.axis(axis);
            exp_curve(scale_deadband(raw, self.shaping.deadband), self.shaping.exponent, ANALOG_MAX)
        };
        let y = shape(ControllerAxis::LeftY);
        let r = shape(ControllerAxis::RightX);

        let config = *self.drivetrain.config();
        self.drivetrain.drive_voltage(
            y * config.max_millivolts / ANALOG_MAX,
            r * config.max_millivolts / ANALOG_MAX,
            config.scaling_enabled,
        );
    }

    fn request_puncher(&self, state: &InputState, status: &PuncherStatus) {
        let pressed = |button| state.button(button).is_now_pressed();

        if pressed(ControllerButton::ButtonA) {
            if status.ready {
                self.puncher.request(PuncherCommand::Launch);
            } else {
                debug!("Launch Ignored: Puncher Not Ready");
            }
        }
        if pressed(ControllerButton::ButtonB) {
            self.puncher.request(PuncherCommand::DoubleShot {
                first:  ShotPreset::NearHighFlag,
                second: ShotPreset::NearMidFlag,
            });
        }
        if pressed(ControllerButton::ButtonX) {
            self.puncher.request(PuncherCommand::Prime { offset: None });
        }
        for (button, preset) in ANGLE_BUTTONS {
            if pressed(button) {
                self.puncher.request(PuncherCommand::SetAngle { preset, speed: None });
            }
        }
        if pressed(ControllerButton::ButtonY) {
            self.puncher.request(PuncherCommand::Reset);
        }
    }

    fn run_intake(&self, state: &InputState) {
        let rpm = if state.button(ControllerButton::ButtonL1).is_pressed() {
            self.speeds.intake_speed
        } else if state.button(ControllerButton::ButtonL2).is_pressed() {
            self.speeds.outtake_speed
        } else {
            0
        };
        self.intake.borrow_mut().set_velocity(rpm).unwrap_or_else(|e| {
            warn!("Intake Motor Error: {}", e);
        });
    }

    fn run_lift(&self, state: &InputState) {
        let speed = self.lift.config().manual_speed;
        let result = if state.button(ControllerButton::ButtonR1).is_pressed() {
            self.lift.drive(speed)
        } else if state.button(ControllerButton::ButtonR2).is_pressed() {
            self.lift.drive(-speed)
        } else {
            self.lift.hold()
        };
        result.unwrap_or_else(|e| {
            warn!("Cap Lift Motor Error: {}", e);
        });
    }

    fn show(&mut self, status: &PuncherStatus) {
        let lift = self
            .lift
            .position()
            .map_err(|e| warn!("Cap Lift Position Error: {}", e))
            .ok();
        self.panel.refresh(&mut self.display, status, lift);
    }
}
