//! Joystick response shaping.
//!
//! Raw stick values are noisy around center and too sensitive for fine
//! control. The usual chain is a scaled deadband followed by an exponential
//! curve, both working on the controller's native ±127 scale:
//!
//! ```
//! use punchbot::shaping::{exp_curve, scale_deadband};
//!
//! let raw = 127.0 * 0.5;
//! let shaped = exp_curve(scale_deadband(raw, 8.0), 1.5, 127.0);
//! assert!(shaped > 0.0 && shaped < raw);
//! ```

/// Full-scale magnitude of a controller analog axis.
pub const ANALOG_MAX: f64 = 127.0;

/// Applies a deadband of `threshold` on the ±127 analog scale.
///
/// See [`scale_deadband_with_max`].
pub fn scale_deadband(input: f64, threshold: f64) -> f64 {
    scale_deadband_with_max(input, threshold, ANALOG_MAX)
}

/// Zeroes inputs within `threshold` of center and rescales the rest.
///
/// The part of `|input|` above the threshold is stretched linearly so that an
/// input of `±max` still produces `±max`. Sign is preserved. A threshold at or
/// above `max` leaves nothing outside the deadband and always yields zero.
pub fn scale_deadband_with_max(input: f64, threshold: f64, max: f64) -> f64 {
    let threshold = threshold.abs();
    let max = max.abs();
    if threshold >= max || input.abs() <= threshold {
        return 0.0;
    }
    input.signum() * (input.abs() - threshold) * max / (max - threshold)
}

/// Raises the normalized magnitude of `input` to `power`.
///
/// Returns `max_value * sign(input) * (|input| / |max_value|)^power`. Powers
/// above one flatten the response near center; powers below one sharpen it.
/// Zero and `±max_value` are fixed points for every power.
pub fn exp_curve(input: f64, power: f64, max_value: f64) -> f64 {
    if max_value == 0.0 || input == 0.0 {
        return 0.0;
    }
    max_value * input.signum() * (input.abs() / max_value.abs()).powf(power)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadband_zeroes_center() {
        for i in -80..=80 {
            let x = i as f64 / 10.0;
            assert_eq!(scale_deadband(x, 8.0), 0.0, "input {x}");
        }
    }

    #[test]
    fn deadband_is_odd() {
        for i in 0..=127 {
            let x = i as f64;
            assert_eq!(scale_deadband(-x, 8.0), -scale_deadband(x, 8.0));
            assert_eq!(scale_deadband(-x, 20.0), -scale_deadband(x, 20.0));
        }
    }

    #[test]
    fn deadband_spans_full_range() {
        assert!((scale_deadband(127.0, 8.0) - 127.0).abs() < 1e-9);
        assert!((scale_deadband(-127.0, 8.0) + 127.0).abs() < 1e-9);
        // Just outside the band the output starts from zero, not from the threshold.
        assert!(scale_deadband(9.0, 8.0) < 1.1);
    }

    #[test]
    fn deadband_never_amplifies() {
        for i in 0..=127 {
            let x = i as f64;
            assert!(scale_deadband(x, 8.0).abs() <= x.abs() + 1e-9);
            assert_eq!(scale_deadband(x, 0.0), x);
        }
    }

    #[test]
    fn deadband_wider_than_range() {
        assert_eq!(scale_deadband(127.0, 127.0), 0.0);
        assert_eq!(scale_deadband_with_max(5.0, 10.0, 4.0), 0.0);
    }

    #[test]
    fn exp_curve_fixed_points() {
        for power in [0.5, 1.0, 1.5, 2.0, 3.0] {
            assert_eq!(exp_curve(0.0, power, 127.0), 0.0);
            assert!((exp_curve(127.0, power, 127.0) - 127.0).abs() < 1e-9);
            assert!((exp_curve(-127.0, power, 127.0) + 127.0).abs() < 1e-9);
        }
    }

    #[test]
    fn exp_curve_compresses_and_expands() {
        assert!(exp_curve(30.0, 1.5, 127.0) < 30.0);
        assert!(exp_curve(30.0, 0.5, 127.0) > 30.0);
        assert!((exp_curve(30.0, 1.0, 127.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn exp_curve_is_monotonic() {
        let mut last = 0.0;
        for i in 1..=127 {
            let y = exp_curve(i as f64, 1.5, 127.0);
            assert!(y > last);
            last = y;
        }
    }

    #[test]
    fn exp_curve_zero_max() {
        assert_eq!(exp_curve(50.0, 2.0, 0.0), 0.0);
    }
}
