//! Autoplay: een periodieke morph-factor zonder handinvoer.

use std::f64::consts::{FRAC_PI_2, TAU};

use super::ControlConfig;

/// Golf die in één periode van 0 naar 1 en terug gaat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleDriver {
    duration_ms: f64,
    exponent: f64,
}

impl CycleDriver {
    #[must_use]
    pub fn new(duration_ms: f64, exponent: f64) -> Self {
        Self {
            duration_ms,
            exponent,
        }
    }

    #[must_use]
    pub fn from_config(config: &ControlConfig) -> Self {
        Self::new(config.cycle_duration_ms, config.cycle_exponent)
    }

    /// Factor op tijdstip `elapsed_ms`: 0 bij de start van elke periode,
    /// 1 halverwege.
    #[must_use]
    pub fn factor_at(&self, elapsed_ms: f64) -> f64 {
        if !elapsed_ms.is_finite() || self.duration_ms <= 0.0 {
            return 0.0;
        }
        let phase = (elapsed_ms / self.duration_ms) * TAU - FRAC_PI_2;
        let raw = (phase.sin() + 1.0) / 2.0;
        raw.clamp(0.0, 1.0).powf(self.exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_endpoints() {
        let driver = CycleDriver::new(2000.0, 1.2);
        assert!(driver.factor_at(0.0).abs() < 1e-12);
        assert!((driver.factor_at(1000.0) - 1.0).abs() < 1e-12);
        assert!(driver.factor_at(2000.0).abs() < 1e-12);
    }

    #[test]
    fn test_cycle_rising_half_is_monotone() {
        let driver = CycleDriver::new(2000.0, 1.2);
        let mut prev = -1.0;
        for step in 0..=100 {
            let f = driver.factor_at(f64::from(step) * 10.0);
            assert!(f >= prev);
            prev = f;
        }
    }

    #[test]
    fn test_non_finite_time_is_rest() {
        let driver = CycleDriver::new(2000.0, 1.2);
        assert_eq!(driver.factor_at(f64::NAN), 0.0);
    }
}
