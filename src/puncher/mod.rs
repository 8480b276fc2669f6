//! Puncher state machine.
//!
//! The puncher fires one ball per full revolution of its motor. Rather than
//! zeroing the encoder between shots, every launch commands the next multiple
//! of 360 degrees from home, so the motor's own position loop does the work
//! and a launch that is interrupted still resumes toward the same absolute
//! target.
//!
//! # States
//!
//! - **Ready**: settled at the current target.
//! - **Moving**: a target has been commanded and has not settled yet.
//! - **BlockedOnLift**: the cap lift is in the puncher's path at the current
//!   angle and is being moved clear before the launch is committed.
//!
//! # Launch counting
//!
//! The launch counter is advanced in exactly one place: the rising edge of
//! the puncher's [`Settler`] while a launch is pending and the target is not
//! home. Blocking operations wait on that same edge; non-blocking ones rely on
//! the owner calling [`Puncher::update_ready`] every tick.
//!
//! # Example
//!
//! ```ignore
//! use punchbot::puncher::{Puncher, angle::ShotPreset};
//!
//! puncher.set_puncher_angle(ShotPreset::NearHighFlag, 50, true).await?;
//! puncher.launch(true).await?;
//! puncher.double_shot(ShotPreset::NearHighFlag, ShotPreset::NearMidFlag).await?;
//! ```

/// Angle presets and the interference model.
pub mod angle;

/// Cap lift control and interference avoidance.
pub mod lift;

/// Puncher task and its command mailbox.
pub mod task;

use log::{debug, info, warn};

use self::{
    angle::{AngleConfig, AngleTable, ShotPreset},
    lift::CapLift,
};
use crate::{
    config::PuncherConfig,
    error::{PuncherError, WaitError},
    peripherals::actuator::{Actuator, SharedActuator},
    settle::{Settler, Settling},
    time::{Clock, wait_until},
};

/// Degrees the puncher motor turns per launch.
pub const DEGREES_PER_LAUNCH: f64 = 360.0;

/// Phase of the launch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PuncherState {
    #[default]
    Ready,
    Moving,
    BlockedOnLift,
}

/// Absolute-position bookkeeping of the launch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LaunchCycle {
    /// Reference position of the cycle, in motor degrees.
    pub home:     f64,
    /// Completed launches since the last reset.
    pub launches: u32,
    /// Most recently commanded target.
    pub target:   f64,
    pending:      bool,
}

impl LaunchCycle {
    /// Target of the next launch: one full turn past the last completed one.
    pub fn launch_target(&self) -> f64 { self.cycle_target(DEGREES_PER_LAUNCH) }

    /// A position `offset` degrees into the current cycle, with the offset
    /// wrapped into `[0, 360)`.
    pub fn prime_target(&self, offset: f64) -> f64 {
        self.cycle_target(offset.rem_euclid(DEGREES_PER_LAUNCH))
    }

    /// Whether a launch has been commanded and not yet counted.
    pub fn is_pending(&self) -> bool { self.pending }

    fn cycle_target(&self, offset: f64) -> f64 {
        self.home + self.launches as f64 * DEGREES_PER_LAUNCH + offset
    }
}

/// A snapshot of the puncher for the driver loop and the brain screen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PuncherStatus {
    pub state:    PuncherState,
    /// Settled at the current target.
    pub ready:    bool,
    /// A blocking macro is running and owns the intake and lift.
    pub busy:     bool,
    pub launches: u32,
    pub target:   f64,
    /// Angle adjuster position, in degrees. `None` if it could not be read.
    pub angle:    Option<f64>,
    pub preset:   Option<ShotPreset>,
}

/// The motors the puncher drives.
pub struct PuncherParts<A: Actuator> {
    pub puncher:  A,
    pub adjuster: A,
    pub intake:   SharedActuator<A>,
    pub lift:     CapLift<A>,
}

/// The puncher, its angle adjuster, and the mechanisms it coordinates with.
pub struct Puncher<A: Actuator, C: Clock + Clone> {
    puncher:      A,
    adjuster:     A,
    intake:       SharedActuator<A>,
    lift:         CapLift<A>,
    clock:        C,
    config:       PuncherConfig,
    angles:       AngleTable,
    current:      ShotPreset,
    cycle:        LaunchCycle,
    readiness:    Settler,
    angle_settle: Settler,
    state:        PuncherState,
}

impl<A: Actuator, C: Clock + Clone> Puncher<A, C> {
    pub fn new(parts: PuncherParts<A>, clock: C, config: PuncherConfig, angles: AngleTable) -> Self {
        Puncher {
            puncher: parts.puncher,
            adjuster: parts.adjuster,
            intake: parts.intake,
            lift: parts.lift,
            clock,
            current: config.initial_preset,
            readiness: Settler::new(config.puncher_settle),
            angle_settle: Settler::new(config.angle_settle),
            config,
            angles,
            cycle: LaunchCycle::default(),
            state: PuncherState::Ready,
        }
    }

    pub fn config(&self) -> &PuncherConfig { &self.config }

    pub fn clock(&self) -> &C { &self.clock }

    pub fn lift(&self) -> &CapLift<A> { &self.lift }

    pub fn state(&self) -> PuncherState { self.state }

    pub fn cycle(&self) -> &LaunchCycle { &self.cycle }

    pub fn launches(&self) -> u32 { self.cycle.launches }

    /// Settled at the current target.
    pub fn is_ready(&self) -> bool { self.readiness.is_settled() }

    /// Whether the angle adjuster has settled at its target.
    pub fn is_angle_settled(&self) -> bool { self.angle_settle.is_settled() }

    pub fn current_preset(&self) -> ShotPreset { self.current }

    /// The configuration of the current preset.
    pub fn current_config(&self) -> Result<AngleConfig, PuncherError> {
        self.angles
            .get(self.current)
            .ok_or(PuncherError::UnknownPreset(self.current))
    }

    pub fn status(&self) -> PuncherStatus {
        PuncherStatus {
            state:    self.state,
            ready:    self.is_ready(),
            busy:     false,
            launches: self.cycle.launches,
            target:   self.cycle.target,
            angle:    self
                .adjuster
                .position()
                .map_err(|e| warn!("Angle Adjuster Position Error: {}", e))
                .ok(),
            preset:   Some(self.current),
        }
    }

    /// Zeroes the launch counter and makes the current position home.
    ///
    /// # Errors
    ///
    /// Returns [`PuncherError::NotStationary`] if the puncher is still turning.
    pub fn reset_puncher(&mut self) -> Result<(), PuncherError> {
        if !self.puncher.is_stopped()? {
            return Err(PuncherError::NotStationary);
        }
        self.puncher.reset_position()?;
        self.puncher.set_position_target(0.0, self.config.launch_speed)?;
        self.cycle = LaunchCycle::default();
        self.readiness.reset();
        self.state = PuncherState::Ready;
        info!("Puncher Reset");
        Ok(())
    }

    /// Samples the puncher's position error and advances the launch count on
    /// a settling edge.
    ///
    /// Call once per control tick while a non-blocking launch is in flight.
    /// Read errors are logged and leave the readiness unchanged.
    pub fn update_ready(&mut self) -> Settling {
        let (target, position) = match (self.puncher.target_position(), self.puncher.position()) {
            (Ok(target), Ok(position)) => (target, position),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Puncher Position Error: {}", e);
                return Settling {
                    settled: self.readiness.is_settled(),
                    rising:  false,
                };
            }
        };

        let settling = self.readiness.sample(target - position, self.clock.now());
        if settling.rising {
            if self.cycle.pending && target != self.cycle.home {
                self.cycle.launches += 1;
                self.cycle.pending = false;
                debug!("Launch {} complete at {:.1}", self.cycle.launches, position);
            }
            self.state = PuncherState::Ready;
        }
        settling
    }

    /// Samples the angle adjuster's position error.
    pub fn update_angle(&mut self) -> Settling {
        match (self.adjuster.target_position(), self.adjuster.position()) {
            (Ok(target), Ok(position)) => {
                self.angle_settle.sample(target - position, self.clock.now())
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Angle Adjuster Position Error: {}", e);
                Settling {
                    settled: self.angle_settle.is_settled(),
                    rising:  false,
                }
            }
        }
    }

    /// Fires one ball.
    ///
    /// Clears the cap lift first if it sits in the interference band of the
    /// current preset, then commands the next full turn. When `blocking`, waits
    /// until the launch has settled and been counted.
    pub async fn launch(&mut self, blocking: bool) -> Result<(), PuncherError> {
        self.readiness.reset();

        let band = self.current_config()?;
        if self.lift.interfering(&band)? {
            self.state = PuncherState::BlockedOnLift;
            self.lift
                .unobstruct(&band, &self.clock, self.config.tick, self.config.wait)
                .await?;
        }

        let target = self.cycle.launch_target();
        self.puncher.set_position_target(target, self.config.launch_speed)?;
        self.cycle.target = target;
        self.cycle.pending = true;
        self.state = PuncherState::Moving;
        debug!("Launching to {:.1}", target);

        if blocking {
            self.wait_for_launch("launch").await?;
        }
        Ok(())
    }

    /// Moves the puncher `offset` degrees into the current cycle without
    /// counting a launch. Supersedes a launch that has not been counted yet.
    pub async fn prime_puncher(&mut self, offset: f64, blocking: bool) -> Result<(), PuncherError> {
        self.readiness.reset();
        if self.cycle.pending {
            debug!("Prime supersedes pending launch");
        }

        let target = self.cycle.prime_target(offset);
        self.puncher.set_position_target(target, self.config.launch_speed)?;
        self.cycle.target = target;
        self.cycle.pending = false;
        self.state = PuncherState::Moving;
        debug!("Priming to {:.1}", target);

        if blocking {
            self.wait_for_launch("prime").await?;
        }
        Ok(())
    }

    /// Makes `preset` current and moves the angle adjuster to its angle.
    pub async fn set_puncher_angle(
        &mut self,
        preset: ShotPreset,
        speed: i32,
        blocking: bool,
    ) -> Result<(), PuncherError> {
        let config = self
            .angles
            .get(preset)
            .ok_or(PuncherError::UnknownPreset(preset))?;
        self.current = preset;
        self.angle_settle.reset();
        self.adjuster.set_position_target(config.angle, speed)?;
        debug!("Angle set to {} ({:.1})", preset.label(), config.angle);

        if blocking {
            let clock = self.clock.clone();
            let (tick, policy) = (self.config.tick, self.config.wait);
            wait_until(&clock, tick, policy, || {
                self.update_ready();
                self.update_angle().settled
            })
            .await
            .map_err(|e| self.timed_out("angle adjuster", e))?;
        }
        Ok(())
    }

    /// Sets the intake velocity in RPM.
    pub fn set_intake(&mut self, rpm: i32) -> Result<(), PuncherError> {
        self.intake.borrow_mut().set_velocity(rpm)?;
        Ok(())
    }

    /// Fires two balls at two angles in one sequence.
    ///
    /// The second ball is fed while the first launch's motion finishes and
    /// the adjuster swings to the second angle, so loading overlaps motion.
    /// A launch still in flight is waited out first. The intake is stopped
    /// even if a stage fails.
    pub async fn double_shot(&mut self, first: ShotPreset, second: ShotPreset) -> Result<(), PuncherError> {
        info!("Double Shot {} -> {}", first.label(), second.label());
        let result = self.double_shot_stages(first, second).await;
        if result.is_err() {
            self.set_intake(0).unwrap_or_else(|e| {
                warn!("Intake Stop Error: {}", e);
            });
        }
        result
    }

    async fn double_shot_stages(&mut self, first: ShotPreset, second: ShotPreset) -> Result<(), PuncherError> {
        let speed = self.config.angle_speed;
        if self.cycle.is_pending() {
            // Both shots are placed after any launch still in flight.
            self.wait_for_launch("pending launch").await?;
        }
        self.set_puncher_angle(first, speed, true).await?;
        self.launch(true).await?;
        self.set_intake(self.config.feed_speed)?;
        self.launch(false).await?;
        self.set_puncher_angle(second, speed, true).await?;
        self.wait_for_launch("second launch").await?;
        self.set_intake(0)
    }

    async fn wait_for_launch(&mut self, stage: &'static str) -> Result<(), PuncherError> {
        let clock = self.clock.clone();
        let (tick, policy) = (self.config.tick, self.config.wait);
        wait_until(&clock, tick, policy, || {
            self.update_ready();
            self.readiness.is_settled() && !self.cycle.pending
        })
        .await
        .map_err(|e| self.timed_out(stage, e))
    }

    fn timed_out(&self, stage: &'static str, err: WaitError) -> PuncherError {
        let err = PuncherError::timeout(stage, err);
        warn!("{}", err);
        err
    }
}
