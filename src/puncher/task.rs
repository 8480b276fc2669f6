//! The puncher task.
//!
//! One task owns the [`Puncher`] and is the only code that mutates its launch
//! count and readiness. Everything else holds a [`PuncherHandle`]: it can read
//! the last published [`PuncherStatus`] and queue [`PuncherCommand`]s into a
//! small bounded mailbox, which the task drains one command per tick.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use heapless::Deque;
use log::{info, warn};

use super::{Puncher, PuncherStatus, angle::ShotPreset};
use crate::{peripherals::actuator::Actuator, time::Clock};

/// Commands that can be queued before the task drops new requests.
pub const MAILBOX_CAPACITY: usize = 8;

/// A request for the puncher task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PuncherCommand {
    /// Fire one ball. Ignored unless the puncher is ready.
    Launch,
    /// Prime to `offset` degrees into the cycle, or the configured default.
    Prime { offset: Option<f64> },
    /// Move the angle adjuster, at `speed` RPM or the configured default.
    SetAngle { preset: ShotPreset, speed: Option<i32> },
    /// Fire twice, the second ball at a different angle.
    DoubleShot { first: ShotPreset, second: ShotPreset },
    /// Make the current position home and zero the launch count.
    Reset,
}

/// Mailbox and status shared between the task and its clients.
#[derive(Debug, Clone, Default)]
pub struct PuncherHandle {
    mailbox: Rc<RefCell<Deque<PuncherCommand, MAILBOX_CAPACITY>>>,
    status:  Rc<Cell<PuncherStatus>>,
}

impl PuncherHandle {
    pub fn new() -> Self { Self::default() }

    /// Queues `command`, returning `false` if the mailbox is full.
    pub fn request(&self, command: PuncherCommand) -> bool {
        match self.mailbox.borrow_mut().push_back(command) {
            Ok(()) => true,
            Err(command) => {
                warn!("Puncher mailbox full, dropping {:?}", command);
                false
            }
        }
    }

    /// The status published at the end of the task's last tick.
    pub fn status(&self) -> PuncherStatus { self.status.get() }

    /// Commands waiting to be executed.
    pub fn pending(&self) -> usize { self.mailbox.borrow().len() }

    pub(crate) fn next(&self) -> Option<PuncherCommand> { self.mailbox.borrow_mut().pop_front() }

    pub(crate) fn publish(&self, status: PuncherStatus) { self.status.set(status); }
}

/// Owns the puncher and executes queued commands.
pub struct PuncherTask<A: Actuator, C: Clock + Clone> {
    puncher: Puncher<A, C>,
    handle:  PuncherHandle,
}

impl<A: Actuator, C: Clock + Clone> PuncherTask<A, C> {
    pub fn new(puncher: Puncher<A, C>, handle: PuncherHandle) -> Self {
        handle.publish(puncher.status());
        PuncherTask { puncher, handle }
    }

    pub fn handle(&self) -> &PuncherHandle { &self.handle }

    pub fn puncher(&self) -> &Puncher<A, C> { &self.puncher }

    /// Samples readiness, runs at most one queued command, and publishes status.
    pub async fn tick(&mut self) {
        self.puncher.update_ready();
        self.puncher.update_angle();

        if let Some(command) = self.handle.next() {
            self.execute(command).await;
        }
        self.publish(false);
    }

    /// Ticks forever at the configured period.
    pub async fn run(mut self) {
        info!("Puncher Task Started");
        let clock = self.puncher.clock().clone();
        let period = self.puncher.config().tick;
        loop {
            self.tick().await;
            clock.sleep(period).await;
        }
    }

    async fn execute(&mut self, command: PuncherCommand) {
        let result = match command {
            PuncherCommand::Launch => {
                if self.puncher.is_ready() {
                    // May have to wait on the cap lift.
                    self.publish(true);
                    self.puncher.launch(false).await
                } else {
                    warn!("Launch Ignored: Puncher Not Ready");
                    Ok(())
                }
            }
            PuncherCommand::Prime { offset } => {
                let offset = offset.unwrap_or(self.puncher.config().prime_offset);
                self.puncher.prime_puncher(offset, false).await
            }
            PuncherCommand::SetAngle { preset, speed } => {
                let speed = speed.unwrap_or(self.puncher.config().angle_speed);
                self.puncher.set_puncher_angle(preset, speed, false).await
            }
            PuncherCommand::DoubleShot { first, second } => {
                self.publish(true);
                self.puncher.double_shot(first, second).await
            }
            PuncherCommand::Reset => self.puncher.reset_puncher(),
        };

        if let Err(e) = result {
            warn!("Puncher {:?} Error: {}", command, e);
        }
    }

    fn publish(&self, busy: bool) {
        self.handle.publish(PuncherStatus {
            busy,
            ..self.puncher.status()
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{future::Future, time::Duration};

    use futures_lite::future::block_on;

    use super::*;
    use crate::{
        config::{LiftConfig, PuncherConfig},
        peripherals::make_cloneable,
        puncher::{PuncherParts, PuncherState, angle::AngleTable, lift::CapLift},
        sim::{SimClock, SimCommand, SimMotor},
    };

    /// Records whether the task reported itself busy while it was waiting.
    #[derive(Clone)]
    struct Watcher {
        inner:     SimClock,
        handle:    PuncherHandle,
        seen_busy: Rc<Cell<bool>>,
    }

    impl Clock for Watcher {
        fn now(&self) -> Duration { self.inner.now() }

        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
            if self.handle.status().busy {
                self.seen_busy.set(true);
            }
            self.inner.sleep(duration)
        }
    }

    fn task() -> (SimClock, Watcher, PuncherTask<SimMotor, Watcher>) {
        let clock = SimClock::new();
        let handle = PuncherHandle::new();
        let watcher = Watcher {
            inner: clock.clone(),
            handle: handle.clone(),
            seen_busy: Rc::new(Cell::new(false)),
        };
        let parts = PuncherParts {
            puncher:  clock.motor("puncher"),
            adjuster: clock.motor("adjuster"),
            intake:   make_cloneable(clock.motor("intake")),
            lift:     CapLift::new(make_cloneable(clock.motor("cap_lift")), LiftConfig::default()),
        };
        let puncher = Puncher::new(parts, watcher.clone(), PuncherConfig::default(), AngleTable::default());
        (clock, watcher, PuncherTask::new(puncher, handle))
    }

    fn run_ticks(clock: &SimClock, task: &mut PuncherTask<SimMotor, Watcher>, n: usize) {
        for _ in 0..n {
            block_on(task.tick());
            clock.advance(task.puncher().config().tick);
        }
    }

    #[test]
    fn mailbox_refuses_when_full() {
        let handle = PuncherHandle::new();
        for _ in 0..MAILBOX_CAPACITY {
            assert!(handle.request(PuncherCommand::Launch));
        }
        assert!(!handle.request(PuncherCommand::Reset));
        assert_eq!(handle.pending(), MAILBOX_CAPACITY);
    }

    #[test]
    fn one_command_per_tick() {
        let (clock, _, mut task) = task();
        let handle = task.handle().clone();
        handle.request(PuncherCommand::Prime { offset: Some(10.0) });
        handle.request(PuncherCommand::Prime { offset: Some(20.0) });
        run_ticks(&clock, &mut task, 1);
        assert_eq!(handle.pending(), 1);
        assert_eq!(handle.status().target, 10.0);
        run_ticks(&clock, &mut task, 1);
        assert_eq!(handle.pending(), 0);
        assert_eq!(handle.status().target, 20.0);
    }

    #[test]
    fn launch_ignored_until_ready() {
        let (clock, _, mut task) = task();
        let handle = task.handle().clone();

        // Readiness needs a few samples after startup.
        handle.request(PuncherCommand::Launch);
        run_ticks(&clock, &mut task, 1);
        assert!(clock.journal_for("puncher").is_empty());

        run_ticks(&clock, &mut task, 5);
        assert!(handle.status().ready);
        handle.request(PuncherCommand::Launch);
        run_ticks(&clock, &mut task, 1);
        assert_eq!(handle.status().state, PuncherState::Moving);
        // A second press while the first is in flight is ignored.
        handle.request(PuncherCommand::Launch);
        run_ticks(&clock, &mut task, 40);

        let status = handle.status();
        assert_eq!(status.launches, 1);
        assert!(status.ready);
        assert!(!status.busy);
        assert_eq!(clock.journal_for("puncher"), vec![SimCommand::Position {
            target: 360.0,
            speed:  200,
        }]);
    }

    #[test]
    fn double_shot_reports_busy_while_running() {
        let (clock, watcher, mut task) = task();
        let handle = task.handle().clone();
        handle.request(PuncherCommand::DoubleShot {
            first:  ShotPreset::NearHighFlag,
            second: ShotPreset::NearMidFlag,
        });
        run_ticks(&clock, &mut task, 1);

        assert!(watcher.seen_busy.get());
        let status = handle.status();
        assert!(!status.busy);
        assert_eq!(status.launches, 2);
        assert_eq!(status.preset, Some(ShotPreset::NearMidFlag));
    }

    #[test]
    fn double_shot_queued_behind_launch_fires_two_more() {
        let (clock, _, mut task) = task();
        let handle = task.handle().clone();
        run_ticks(&clock, &mut task, 6);
        handle.request(PuncherCommand::Launch);
        run_ticks(&clock, &mut task, 1);
        handle.request(PuncherCommand::DoubleShot {
            first:  ShotPreset::NearHighFlag,
            second: ShotPreset::NearMidFlag,
        });
        run_ticks(&clock, &mut task, 60);

        assert_eq!(handle.status().launches, 3);
        let targets: Vec<_> = clock
            .journal_for("puncher")
            .into_iter()
            .map(|command| match command {
                SimCommand::Position { target, .. } => target,
                other => panic!("unexpected puncher command {other:?}"),
            })
            .collect();
        assert_eq!(targets, vec![360.0, 720.0, 1080.0]);
    }

    #[test]
    fn set_angle_uses_default_speed() {
        let (clock, _, mut task) = task();
        task.handle().request(PuncherCommand::SetAngle {
            preset: ShotPreset::NearLowFlag,
            speed:  None,
        });
        run_ticks(&clock, &mut task, 1);
        assert_eq!(clock.journal_for("adjuster"), vec![SimCommand::Position {
            target: 75.0,
            speed:  50,
        }]);
        assert_eq!(task.handle().status().preset, Some(ShotPreset::NearLowFlag));
    }
}
