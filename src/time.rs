//! Cooperative timing primitives.
//!
//! Every blocking operation in the control core is a busy-poll that yields
//! once per control tick. The [`Clock`] trait makes both the time source and
//! the yield injectable, so the same waits run against the brain's uptime
//! timer on a robot and against [`SimClock`](crate::sim::SimClock) in tests.

use std::{future::Future, time::Duration};

use crate::error::WaitError;

/// Default control loop period.
pub const LOOP_INTERVAL: Duration = Duration::from_millis(20);

/// A monotonic time source that can suspend the current task.
pub trait Clock {
    /// Time elapsed since the program started.
    fn now(&self) -> Duration;

    /// Suspends the caller for `duration`, yielding to other tasks.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// How long a blocking wait may run before reporting a diagnostic.
///
/// The default waits forever: a stuck mechanism hangs the operation in plain
/// sight of the operator rather than being silently skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Upper bound on the wait, or `None` to poll indefinitely.
    pub timeout: Option<Duration>,
}

impl WaitPolicy {
    /// Poll until the condition holds, however long that takes.
    pub const INDEFINITE: WaitPolicy = WaitPolicy { timeout: None };

    /// Give up after `limit`.
    pub const fn bounded(limit: Duration) -> Self {
        WaitPolicy {
            timeout: Some(limit),
        }
    }
}

/// Polls `done` once per `interval` until it returns `true`.
///
/// The predicate is checked before the first sleep, so a condition that
/// already holds returns without yielding.
///
/// # Errors
///
/// Returns [`WaitError`] if `policy` carries a timeout and it elapses first.
pub async fn wait_until<C, F>(
    clock: &C,
    interval: Duration,
    policy: WaitPolicy,
    mut done: F,
) -> Result<(), WaitError>
where
    C: Clock,
    F: FnMut() -> bool,
{
    let start = clock.now();
    loop {
        if done() {
            return Ok(());
        }

        let waited = clock.now().saturating_sub(start);
        if let Some(limit) = policy.timeout {
            if waited >= limit {
                return Err(WaitError { waited });
            }
        }

        clock.sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use futures_lite::future::block_on;

    use super::*;
    use crate::sim::SimClock;

    #[test]
    fn returns_immediately_when_already_done() {
        let clock = SimClock::new();
        block_on(wait_until(&clock, LOOP_INTERVAL, WaitPolicy::INDEFINITE, || true)).unwrap();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn polls_once_per_interval() {
        let clock = SimClock::new();
        let mut polls = 0;
        block_on(wait_until(&clock, Duration::from_millis(10), WaitPolicy::INDEFINITE, || {
            polls += 1;
            polls == 5
        }))
        .unwrap();
        assert_eq!(polls, 5);
        assert_eq!(clock.now(), Duration::from_millis(40));
    }

    #[test]
    fn bounded_wait_gives_up() {
        let clock = SimClock::new();
        let err = block_on(wait_until(
            &clock,
            Duration::from_millis(10),
            WaitPolicy::bounded(Duration::from_millis(100)),
            || false,
        ))
        .unwrap_err();
        assert_eq!(err.waited, Duration::from_millis(100));
    }
}
