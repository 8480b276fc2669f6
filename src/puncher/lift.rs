//! Cap lift and interference avoidance.
//!
//! The cap lift is driven by the operator independently of the puncher, but
//! at some adjuster angles its arc crosses the puncher arm. Before a launch
//! the puncher asks the lift to leave the interference band toward whichever
//! edge is nearer and hold there.

use std::time::Duration;

use log::{info, warn};

use super::angle::AngleConfig;
use crate::{
    config::LiftConfig,
    error::{DeviceError, PuncherError},
    peripherals::actuator::{Actuator, SharedActuator},
    time::{Clock, WaitPolicy, wait_until},
};

/// Which edge of the band the lift left through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clearance {
    Below,
    Above,
}

impl Clearance {
    fn is_clear(self, position: f64, band: &AngleConfig) -> bool {
        match self {
            Clearance::Below => position < band.lower,
            Clearance::Above => position > band.upper,
        }
    }
}

/// The cap lift motor and its gearing.
pub struct CapLift<A: Actuator> {
    motor:  SharedActuator<A>,
    config: LiftConfig,
}

impl<A: Actuator> Clone for CapLift<A> {
    fn clone(&self) -> Self {
        CapLift {
            motor:  self.motor.clone(),
            config: self.config,
        }
    }
}

impl<A: Actuator> CapLift<A> {
    pub fn new(motor: SharedActuator<A>, config: LiftConfig) -> Self { CapLift { motor, config } }

    pub fn config(&self) -> &LiftConfig { &self.config }

    /// Lift arm position in degrees: motor position times the gear ratio.
    pub fn position(&self) -> Result<f64, DeviceError> {
        Ok(self.motor.borrow().position()? * self.config.gear_ratio)
    }

    /// Whether the lift currently sits inside `band`.
    pub fn interfering(&self, band: &AngleConfig) -> Result<bool, DeviceError> {
        Ok(band.interferes(self.position()?))
    }

    /// Spins the lift motor at `rpm`; positive raises the lift.
    pub fn drive(&self, rpm: i32) -> Result<(), DeviceError> { self.motor.borrow_mut().set_velocity(rpm) }

    /// Holds the lift where it is.
    pub fn hold(&self) -> Result<(), DeviceError> { self.motor.borrow_mut().set_velocity(0) }

    /// Drives the lift out of `band` and holds it there.
    ///
    /// A lift below the band's midpoint is lowered until it is under the lower
    /// bound; otherwise it is raised until it is over the upper bound. The
    /// position is polled once per `tick`. With
    /// [`WaitPolicy::INDEFINITE`](crate::time::WaitPolicy::INDEFINITE) this
    /// only returns once the lift is clear.
    ///
    /// # Errors
    ///
    /// Returns a device error if the lift cannot be commanded, or
    /// [`PuncherError::Timeout`] if `policy` runs out; the lift is held in
    /// place before the timeout is reported.
    pub async fn unobstruct<C: Clock>(
        &self,
        band: &AngleConfig,
        clock: &C,
        tick: Duration,
        policy: WaitPolicy,
    ) -> Result<Clearance, PuncherError> {
        let start = self.position()?;
        let (side, rpm) = if start < band.midpoint() {
            (Clearance::Below, -self.config.clear_speed.abs())
        } else {
            (Clearance::Above, self.config.clear_speed.abs())
        };
        info!("Clearing cap lift {:?} band [{:.1}, {:.1}] from {:.1}", side, band.lower, band.upper, start);

        self.drive(rpm)?;
        let waited = wait_until(clock, tick, policy, || match self.position() {
            Ok(position) => side.is_clear(position, band),
            Err(e) => {
                warn!("Cap Lift Position Error: {}", e);
                false
            }
        })
        .await;
        self.hold()?;

        match waited {
            Ok(()) => Ok(side),
            Err(e) => {
                let err = PuncherError::timeout("cap lift clearance", e);
                warn!("{}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_lite::future::block_on;

    use super::*;
    use crate::{
        peripherals::make_cloneable,
        sim::{SimClock, SimCommand, SimMotor},
        time::LOOP_INTERVAL,
    };

    fn lift(clock: &SimClock) -> (SimMotor, CapLift<SimMotor>) {
        let motor = clock.motor("cap_lift");
        let config = LiftConfig {
            gear_ratio: 0.5,
            ..LiftConfig::default()
        };
        (motor.clone(), CapLift::new(make_cloneable(motor), config))
    }

    #[test]
    fn position_applies_gear_ratio() {
        let clock = SimClock::new();
        let (motor, lift) = lift(&clock);
        motor.place(100.0);
        assert_eq!(lift.position().unwrap(), 50.0);
    }

    #[test]
    fn lower_half_clears_downward() {
        let clock = SimClock::new();
        let (motor, lift) = lift(&clock);
        let band = AngleConfig::new(50.0, 10.0, 30.0);
        motor.place(30.0); // lift at 15
        assert!(lift.interfering(&band).unwrap());

        let side = block_on(lift.unobstruct(&band, &clock, LOOP_INTERVAL, WaitPolicy::INDEFINITE))
            .unwrap();
        assert_eq!(side, Clearance::Below);
        assert!(lift.position().unwrap() < band.lower);
        assert!(!lift.interfering(&band).unwrap());
        assert_eq!(clock.journal_for("cap_lift"), vec![
            SimCommand::Velocity(-100),
            SimCommand::Velocity(0),
        ]);
    }

    #[test]
    fn upper_half_clears_upward() {
        let clock = SimClock::new();
        let (motor, lift) = lift(&clock);
        let band = AngleConfig::new(50.0, 10.0, 30.0);
        motor.place(50.0); // lift at 25
        let side = block_on(lift.unobstruct(&band, &clock, LOOP_INTERVAL, WaitPolicy::INDEFINITE))
            .unwrap();
        assert_eq!(side, Clearance::Above);
        assert!(lift.position().unwrap() > band.upper);
    }

    #[test]
    fn exact_bound_still_needs_to_move() {
        let clock = SimClock::new();
        let (motor, lift) = lift(&clock);
        let band = AngleConfig::new(50.0, 10.0, 30.0);
        motor.place(60.0); // lift exactly at the upper bound
        block_on(lift.unobstruct(&band, &clock, LOOP_INTERVAL, WaitPolicy::INDEFINITE)).unwrap();
        assert!(lift.position().unwrap() > 30.0);
    }

    #[test]
    fn stuck_lift_times_out_and_holds() {
        let clock = SimClock::new();
        let (motor, lift) = lift(&clock);
        motor.place(40.0);
        motor.set_stuck(true);
        let band = AngleConfig::new(50.0, 10.0, 30.0);
        let policy = WaitPolicy::bounded(Duration::from_millis(500));
        let err = block_on(lift.unobstruct(&band, &clock, LOOP_INTERVAL, policy)).unwrap_err();
        assert!(matches!(err, PuncherError::Timeout { stage: "cap lift clearance", .. }));
        assert_eq!(clock.journal_for("cap_lift").last(), Some(&SimCommand::Velocity(0)));
    }
}
