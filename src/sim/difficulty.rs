//! Time-based difficulty ramp

use serde::{Deserialize, Serialize};

use crate::config::DifficultyConfig;

/// Parameters derived from elapsed run time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub spawn_interval_ms: f64,
    pub speed_multiplier: f64,
    /// Progress through the ramp, 0..=1
    pub fraction: f64,
}

/// Maps elapsed time to spawn cadence and entity speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCurve {
    pub ramp_window_secs: f64,
    pub max_speed_gain: f64,
    pub interval_max_ms: f64,
    pub interval_min_ms: f64,
}

impl DifficultyCurve {
    pub fn from_config(config: &DifficultyConfig) -> Self {
        Self {
            ramp_window_secs: config.ramp_window_secs,
            max_speed_gain: config.max_speed_gain,
            interval_max_ms: config.interval_max_ms,
            interval_min_ms: config.interval_min_ms,
        }
    }

    /// Evaluate the curve at `elapsed_secs` into the run
    pub fn evaluate(&self, elapsed_secs: f64) -> Difficulty {
        let fraction = ramp_fraction(elapsed_secs, self.ramp_window_secs);
        Difficulty {
            spawn_interval_ms: lerp_interval(fraction, self.interval_max_ms, self.interval_min_ms),
            speed_multiplier: 1.0 + fraction * self.max_speed_gain,
            fraction,
        }
    }
}

/// `clamp(elapsed / window, 0, 1)`; a non-positive window counts as fully ramped
pub fn ramp_fraction(elapsed_secs: f64, window_secs: f64) -> f64 {
    if !(window_secs > 0.0) {
        return 1.0;
    }
    let fraction = elapsed_secs / window_secs;
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

/// Linear from `ceiling` at fraction 0 down to `floor` at fraction 1, never
/// leaving `[floor, ceiling]`
pub fn lerp_interval(fraction: f64, ceiling: f64, floor: f64) -> f64 {
    let f = fraction.clamp(0.0, 1.0);
    let value = ceiling - f * (ceiling - floor);
    value.clamp(floor.min(ceiling), ceiling.max(floor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> DifficultyCurve {
        DifficultyCurve {
            ramp_window_secs: 45.0,
            max_speed_gain: 2.2,
            interval_max_ms: 2200.0,
            interval_min_ms: 700.0,
        }
    }

    #[test]
    fn test_start_of_run() {
        let d = curve().evaluate(0.0);
        assert_eq!(d.fraction, 0.0);
        assert_eq!(d.speed_multiplier, 1.0);
        assert_eq!(d.spawn_interval_ms, 2200.0);
    }

    #[test]
    fn test_halfway() {
        let d = curve().evaluate(22.5);
        assert!((d.fraction - 0.5).abs() < 1e-12);
        assert!((d.speed_multiplier - 2.1).abs() < 1e-12);
        assert!((d.spawn_interval_ms - 1450.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_past_window() {
        let d = curve().evaluate(10_000.0);
        assert_eq!(d.fraction, 1.0);
        assert!((d.speed_multiplier - 3.2).abs() < 1e-12);
        assert_eq!(d.spawn_interval_ms, 700.0);
    }

    #[test]
    fn test_negative_elapsed_clamped() {
        let d = curve().evaluate(-5.0);
        assert_eq!(d.fraction, 0.0);
        assert_eq!(d.spawn_interval_ms, 2200.0);
    }

    #[test]
    fn test_zero_window_is_fully_ramped() {
        assert_eq!(ramp_fraction(0.0, 0.0), 1.0);
    }
}
