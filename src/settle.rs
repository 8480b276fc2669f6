//! Settling detection.
//!
//! A position-controlled mechanism is considered settled once its error has
//! stayed inside a tolerance for a minimum number of consecutive samples
//! *and* for a minimum span of time. A single sample that happens to pass
//! through the target on the way somewhere else is not enough.
//!
//! The evaluator is edge-triggered: [`Settling::rising`] is `true` on exactly
//! one sample per false→true transition, which is what launch counting and
//! macro sequencing key off.

use std::time::Duration;

/// Convergence criteria for one mechanism.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleConfig {
    /// Largest absolute error still counted as on target.
    pub tolerance:    f64,
    /// Consecutive in-tolerance samples required.
    pub min_samples:  u32,
    /// Time the error must stay in tolerance, measured from the first sample of the run.
    pub min_duration: Duration,
}

/// Result of feeding one sample to a [`Settler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settling {
    /// The mechanism is settled as of this sample.
    pub settled: bool,
    /// This sample is the one where `settled` became true.
    pub rising:  bool,
}

/// Tracks a run of in-tolerance samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Settler {
    config:      SettleConfig,
    run_length:  u32,
    run_start:   Option<Duration>,
    settled:     bool,
    was_settled: bool,
}

impl Settler {
    pub fn new(config: SettleConfig) -> Self {
        Settler {
            config,
            run_length: 0,
            run_start: None,
            settled: false,
            was_settled: false,
        }
    }

    pub fn config(&self) -> &SettleConfig { &self.config }

    /// Feeds one error sample taken at `now`.
    pub fn sample(&mut self, error: f64, now: Duration) -> Settling {
        self.was_settled = self.settled;

        if error.abs() <= self.config.tolerance {
            self.run_length = self.run_length.saturating_add(1);
            let start = *self.run_start.get_or_insert(now);
            self.settled = self.run_length >= self.config.min_samples &&
                now.saturating_sub(start) >= self.config.min_duration;
        } else {
            self.run_length = 0;
            self.run_start = None;
            self.settled = false;
        }

        Settling {
            settled: self.settled,
            rising:  self.settled && !self.was_settled,
        }
    }

    /// Whether the last sample left the mechanism settled.
    pub fn is_settled(&self) -> bool { self.settled }

    /// Forgets the current run, e.g. when a new target is commanded.
    pub fn reset(&mut self) {
        self.run_length = 0;
        self.run_start = None;
        self.settled = false;
        self.was_settled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: SettleConfig = SettleConfig {
        tolerance:    2.0,
        min_samples:  3,
        min_duration: Duration::from_millis(40),
    };

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    #[test]
    fn too_few_samples_never_settle() {
        let mut settler = Settler::new(SettleConfig {
            min_samples: 5,
            min_duration: Duration::ZERO,
            ..CONFIG
        });
        for i in 0..4 {
            assert!(!settler.sample(0.5, ms(i * 20)).settled);
        }
    }

    #[test]
    fn needs_the_time_span_too() {
        let mut settler = Settler::new(CONFIG);
        // Three samples 10ms apart only span 20ms.
        assert!(!settler.sample(1.0, ms(0)).settled);
        assert!(!settler.sample(1.0, ms(10)).settled);
        assert!(!settler.sample(1.0, ms(20)).settled);
        assert!(!settler.sample(1.0, ms(30)).settled);
        assert!(settler.sample(1.0, ms(40)).settled);
    }

    #[test]
    fn rising_edge_fires_once() {
        let mut settler = Settler::new(CONFIG);
        let mut rises = 0;
        for i in 0..20 {
            if settler.sample(0.0, ms(i * 20)).rising {
                rises += 1;
            }
        }
        assert_eq!(rises, 1);
        assert!(settler.is_settled());
    }

    #[test]
    fn transient_resets_the_run() {
        let mut settler = Settler::new(CONFIG);
        settler.sample(0.0, ms(0));
        settler.sample(0.0, ms(20));
        assert!(!settler.sample(5.0, ms(40)).settled);
        assert!(!settler.sample(0.0, ms(60)).settled);
        assert!(!settler.sample(0.0, ms(80)).settled);
        let result = settler.sample(0.0, ms(100));
        assert!(result.settled && result.rising);
    }

    #[test]
    fn settles_again_after_leaving() {
        let mut settler = Settler::new(CONFIG);
        let mut rises = 0;
        let errors = [0.0, 0.0, 0.0, 0.0, 30.0, 10.0, 1.0, 1.0, 1.0, 1.0];
        for (i, error) in errors.into_iter().enumerate() {
            if settler.sample(error, ms(i as u64 * 20)).rising {
                rises += 1;
            }
        }
        assert_eq!(rises, 2);
    }

    #[test]
    fn reset_clears_the_run() {
        let mut settler = Settler::new(CONFIG);
        for i in 0..5 {
            settler.sample(0.0, ms(i * 20));
        }
        assert!(settler.is_settled());
        settler.reset();
        assert!(!settler.is_settled());
        assert!(!settler.sample(0.0, ms(200)).settled);
    }
}
