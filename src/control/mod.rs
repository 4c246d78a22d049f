//! Besturingstoestand: van twee handafstanden (of autoplay) naar een
//! morph-factor, een rotatie en de verstreken tijd.

use serde::{Deserialize, Serialize};

pub mod cycle;
pub mod hands;

pub use cycle::CycleDriver;
pub use hands::ControlIntegrator;

/// Toestand die de deformatie-engine per tick leest (nooit schrijft).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlState {
    /// Morph/expansiefactor in `[0, 1]`.
    pub factor: f64,
    /// Verstreken tijd in milliseconden sinds de start, monotoon stijgend.
    pub elapsed_ms: f64,
    /// Huidige rotatie rond de centrale as, in radialen.
    pub rotation: f64,
    /// Rotatiesnelheid in radialen per seconde.
    pub rotation_velocity: f64,
}

impl ControlState {
    /// Vaste toestand voor tests en offline rendering.
    #[must_use]
    pub const fn at(factor: f64, elapsed_ms: f64) -> Self {
        Self {
            factor,
            elapsed_ms,
            rotation: 0.0,
            rotation_velocity: 0.0,
        }
    }
}

/// Invoer voor één tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlInput {
    /// Duim-wijsvinger afstanden per hand, genormaliseerd op beeldbreedte.
    Hands { left: f64, right: f64 },
    /// Geen handen: de factor volgt een vaste golf.
    Autoplay,
}

/// Overgangen in de besturing waar audio of UI op kan reageren.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlCue {
    /// De factor stijgt boven de actieve drempel.
    MorphStarted,
    /// De factor bereikt zijn piek (eenmaal per gebaar).
    MorphPeaked,
    /// De factor valt terug onder de actieve drempel.
    MorphSettled,
    /// Een knijpbeweging van de linkerhand gaf de rotatie een impuls.
    SpinPulse { strength: f64 },
}

/// Afstellingen van de besturing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlConfig {
    /// Afstand waaronder de rechterhand genegeerd wordt.
    pub morph_min_dist: f64,
    /// Afstand waarop de doel-factor 1 bereikt.
    pub morph_max_dist: f64,
    /// Snelheid van het eerste-orde filter, per seconde.
    pub morph_rate: f64,
    /// Linkerhandafstand waaronder een knijpbeweging telt.
    pub pinch_threshold: f64,
    /// Impuls in graden per seconde per eenheid afstandsafname.
    pub pulse_gain_degrees: f64,
    /// Demping per tick wanneer de linkerhand weer opent, in `[0, 1]`.
    pub release_decay: f64,
    /// Demping van de rotatiesnelheid per tick.
    pub spin_decay: f64,
    /// Extra demping per tick zolang de factor actief is.
    pub morph_spin_damping: f64,
    pub active_threshold: f64,
    pub peak_threshold: f64,
    /// Minimale doel-factor om een piek te melden.
    pub peak_target: f64,
    /// Periode van de autoplay-golf in milliseconden.
    pub cycle_duration_ms: f64,
    /// Exponent op de autoplay-golf; moet positief zijn.
    pub cycle_exponent: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            morph_min_dist: 0.05,
            morph_max_dist: 0.12,
            morph_rate: 4.0,
            pinch_threshold: 0.08,
            pulse_gain_degrees: 5000.0,
            release_decay: 0.95,
            spin_decay: 0.98,
            morph_spin_damping: 0.95,
            active_threshold: 0.1,
            peak_threshold: 0.85,
            peak_target: 0.8,
            cycle_duration_ms: 2000.0,
            cycle_exponent: 1.2,
        }
    }
}

impl ControlConfig {
    /// Naam van de eerste ongeldige waarde, als die er is.
    pub(crate) fn first_invalid(&self) -> Option<&'static str> {
        let fields = [
            ("morphMinDist", self.morph_min_dist),
            ("morphMaxDist", self.morph_max_dist),
            ("morphRate", self.morph_rate),
            ("pinchThreshold", self.pinch_threshold),
            ("pulseGainDegrees", self.pulse_gain_degrees),
            ("releaseDecay", self.release_decay),
            ("spinDecay", self.spin_decay),
            ("morphSpinDamping", self.morph_spin_damping),
            ("activeThreshold", self.active_threshold),
            ("peakThreshold", self.peak_threshold),
            ("peakTarget", self.peak_target),
            ("cycleDurationMs", self.cycle_duration_ms),
            ("cycleExponent", self.cycle_exponent),
        ];
        if let Some((name, _)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Some(name);
        }
        if self.morph_max_dist <= self.morph_min_dist {
            return Some("morphMaxDist");
        }
        if self.cycle_duration_ms <= 0.0 {
            return Some("cycleDurationMs");
        }
        if self.cycle_exponent <= 0.0 {
            return Some("cycleExponent");
        }
        let decays = [
            ("releaseDecay", self.release_decay),
            ("spinDecay", self.spin_decay),
            ("morphSpinDamping", self.morph_spin_damping),
        ];
        decays
            .into_iter()
            .find(|(_, v)| !(0.0..=1.0).contains(v))
            .map(|(name, _)| name)
    }
}
