//! Integratie van handafstanden tot een [`ControlState`].

use super::{ControlConfig, ControlCue, ControlInput, ControlState, CycleDriver};

/// Houdt de besturingstoestand bij over opeenvolgende ticks.
#[derive(Debug, Clone)]
pub struct ControlIntegrator {
    config: ControlConfig,
    cycle: CycleDriver,
    state: ControlState,
    target: f64,
    prev_left: f64,
    morph_active: bool,
    peaked: bool,
    cues: Vec<ControlCue>,
}

impl ControlIntegrator {
    #[must_use]
    pub fn new(config: ControlConfig) -> Self {
        Self {
            cycle: CycleDriver::from_config(&config),
            config,
            state: ControlState::default(),
            target: 0.0,
            prev_left: 0.0,
            morph_active: false,
            peaked: false,
            cues: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Doel waar de factor naartoe filtert.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[must_use]
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ControlConfig) {
        self.cycle = CycleDriver::from_config(&config);
        self.config = config;
    }

    /// Haal de sinds de vorige aanroep verzamelde cues op.
    pub fn take_cues(&mut self) -> Vec<ControlCue> {
        std::mem::take(&mut self.cues)
    }

    /// Verwerk één tick. `now_ms` is de verstreken tijd sinds de start van
    /// de animatie; een waarde die niet groter is dan de vorige geeft `dt = 0`.
    pub fn update(&mut self, input: ControlInput, now_ms: f64) -> &ControlState {
        let now_ms = if now_ms.is_finite() {
            now_ms
        } else {
            log::warn!("niet-eindige tijdstempel genegeerd: {now_ms}");
            self.state.elapsed_ms
        };
        let dt = (now_ms - self.state.elapsed_ms).max(0.0) / 1000.0;
        self.state.elapsed_ms = self.state.elapsed_ms.max(now_ms);

        match input {
            ControlInput::Hands { left, right } => {
                let left = sanitize_distance(left, "links");
                let right = sanitize_distance(right, "rechts");

                self.target = self.morph_target(right);
                // Eerste-orde filter; de stap wordt begrensd zodat de factor
                // nooit voorbij het doel schiet.
                let k = (self.config.morph_rate * dt).clamp(0.0, 1.0);
                self.state.factor += (self.target - self.state.factor) * k;
                self.state.factor = self.state.factor.clamp(0.0, 1.0);

                self.apply_pinch(left);
            }
            ControlInput::Autoplay => {
                self.target = self.cycle.factor_at(self.state.elapsed_ms).clamp(0.0, 1.0);
                self.state.factor = self.target;
            }
        }

        self.integrate_rotation(dt);
        self.update_cues();
        &self.state
    }

    fn morph_target(&self, right: f64) -> f64 {
        let min = self.config.morph_min_dist;
        if right <= min {
            return 0.0;
        }
        ((right - min) / (self.config.morph_max_dist - min)).clamp(0.0, 1.0)
    }

    fn apply_pinch(&mut self, left: f64) {
        let prev = self.prev_left;
        if left < prev && left < self.config.pinch_threshold {
            let pulse = ((prev - left).abs() * self.config.pulse_gain_degrees).to_radians();
            self.state.rotation_velocity += pulse;
            self.cues.push(ControlCue::SpinPulse { strength: pulse });
        } else if left > prev {
            self.state.rotation_velocity *= self.config.release_decay;
        }
        self.prev_left = left;
    }

    fn integrate_rotation(&mut self, dt: f64) {
        self.state.rotation += self.state.rotation_velocity * dt;
        self.state.rotation_velocity *= self.config.spin_decay;
        if self.state.factor > self.config.active_threshold {
            self.state.rotation_velocity *= self.config.morph_spin_damping;
        }
    }

    fn update_cues(&mut self) {
        let factor = self.state.factor;
        if factor > self.config.active_threshold && !self.morph_active {
            self.morph_active = true;
            self.cues.push(ControlCue::MorphStarted);
        }
        if factor >= self.config.peak_threshold && !self.peaked && self.target > self.config.peak_target
        {
            self.peaked = true;
            self.cues.push(ControlCue::MorphPeaked);
        }
        if factor <= self.config.active_threshold && self.morph_active {
            self.morph_active = false;
            self.peaked = false;
            self.cues.push(ControlCue::MorphSettled);
        }
    }
}

fn sanitize_distance(value: f64, hand: &str) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        log::warn!("niet-eindige handafstand ({hand}) behandeld als 0");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hands(left: f64, right: f64) -> ControlInput {
        ControlInput::Hands { left, right }
    }

    #[test]
    fn test_dead_zone_keeps_factor_at_rest() {
        let mut ctl = ControlIntegrator::new(ControlConfig::default());
        for tick in 1..=30 {
            ctl.update(hands(0.0, 0.04), f64::from(tick) * 16.0);
        }
        assert_eq!(ctl.state().factor, 0.0);
        assert_eq!(ctl.target(), 0.0);
    }

    #[test]
    fn test_factor_approaches_target_without_overshoot() {
        let mut ctl = ControlIntegrator::new(ControlConfig::default());
        let mut prev = 0.0;
        for tick in 1..=240 {
            let factor = ctl.update(hands(0.0, 0.3), f64::from(tick) * 16.0).factor;
            assert!(factor >= prev);
            assert!(factor <= 1.0);
            prev = factor;
        }
        assert!(prev > 0.99);
    }

    #[test]
    fn test_large_dt_does_not_jump_past_target() {
        let mut ctl = ControlIntegrator::new(ControlConfig::default());
        let state = ctl.update(hands(0.0, 0.085), 60_000.0);
        let expected = (0.085 - 0.05) / (0.12 - 0.05);
        assert!((state.factor - expected).abs() < 1e-12);
    }

    #[test]
    fn test_elapsed_time_is_monotone() {
        let mut ctl = ControlIntegrator::new(ControlConfig::default());
        ctl.update(hands(0.0, 0.0), 500.0);
        ctl.update(hands(0.0, 0.0), 200.0);
        assert_eq!(ctl.state().elapsed_ms, 500.0);
        ctl.update(hands(0.0, 0.0), f64::NAN);
        assert_eq!(ctl.state().elapsed_ms, 500.0);
        ctl.update(hands(0.0, 0.0), 700.0);
        assert_eq!(ctl.state().elapsed_ms, 700.0);
    }

    #[test]
    fn test_pinch_adds_spin_impulse() {
        let mut ctl = ControlIntegrator::new(ControlConfig::default());
        ctl.update(hands(0.07, 0.0), 16.0);
        let _ = ctl.take_cues();
        ctl.update(hands(0.02, 0.0), 32.0);

        assert!(ctl.state().rotation_velocity > 0.0);
        let cues = ctl.take_cues();
        assert!(matches!(cues.as_slice(), [ControlCue::SpinPulse { strength }] if *strength > 0.0));
    }

    #[test]
    fn test_spin_decays_and_rotation_advances() {
        let mut ctl = ControlIntegrator::new(ControlConfig::default());
        ctl.update(hands(0.07, 0.0), 16.0);
        ctl.update(hands(0.02, 0.0), 32.0);
        let v0 = ctl.state().rotation_velocity;
        let r0 = ctl.state().rotation;
        ctl.update(hands(0.02, 0.0), 48.0);
        assert!(ctl.state().rotation_velocity < v0);
        assert!(ctl.state().rotation > r0);
    }

    #[test]
    fn test_non_finite_distance_is_ignored() {
        let mut ctl = ControlIntegrator::new(ControlConfig::default());
        let state = ctl.update(hands(f64::NAN, f64::INFINITY), 16.0);
        assert_eq!(state.factor, 0.0);
        assert!(state.rotation_velocity.is_finite());
    }

    #[test]
    fn test_cue_sequence_for_full_gesture() {
        let mut ctl = ControlIntegrator::new(ControlConfig::default());
        let mut cues = Vec::new();
        let mut now = 0.0;
        for _ in 0..300 {
            now += 16.0;
            ctl.update(hands(0.0, 0.3), now);
            cues.extend(ctl.take_cues());
        }
        for _ in 0..300 {
            now += 16.0;
            ctl.update(hands(0.0, 0.0), now);
            cues.extend(ctl.take_cues());
        }
        assert_eq!(
            cues,
            vec![
                ControlCue::MorphStarted,
                ControlCue::MorphPeaked,
                ControlCue::MorphSettled
            ]
        );
    }

    #[test]
    fn test_autoplay_follows_cycle() {
        let mut ctl = ControlIntegrator::new(ControlConfig::default());
        let state = ctl.update(ControlInput::Autoplay, 1000.0);
        assert!((state.factor - 1.0).abs() < 1e-12);
        let state = ctl.update(ControlInput::Autoplay, 2000.0);
        assert!(state.factor < 1e-9);
    }

    #[test]
    fn test_autoplay_factor_stays_in_unit_range() {
        let config = ControlConfig {
            cycle_exponent: -1.0,
            ..ControlConfig::default()
        };
        let mut ctl = ControlIntegrator::new(config);
        for tick in 0..=20 {
            let factor = ctl.update(ControlInput::Autoplay, f64::from(tick) * 100.0).factor;
            assert!((0.0..=1.0).contains(&factor), "factor {factor}");
        }
    }
}
