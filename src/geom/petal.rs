//! Parametric dahlia shape.
//!
//! The flower is a single continuous sheet parameterised by a normalised
//! radius `r ∈ [0, 1]` and a spiral angle `theta` in degrees. The angle keeps
//! growing past 360° (the reference shapes run to 45 half-turns), so all trig
//! is evaluated on the raw angle without wrapping.
//!
//! Terms, in evaluation order:
//! - `phi`: opening angle that decays exponentially with `theta`, closing the
//!   spiral towards its inner turns.
//! - petal cut: folded sine plus a steep sine, carving discrete lobes.
//! - hang-down: quartic envelope in `r`, drooping each ring out of plane.
//! - taper and ripple: overall scale that shrinks along the spiral with a
//!   small organic wobble.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Tunable constants of the petal formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PetalShape {
    /// Total spiral angle covered by the angle steps, in degrees.
    pub angular_span_degrees: f64,
    /// `K1`: opening angle at `theta = 0`, in degrees.
    pub spiral_amplitude: f64,
    /// `K2`: angular decay length of the opening angle, in degrees.
    pub spiral_decay: f64,
    /// Lobes per degree of spiral angle.
    pub petal_frequency: f64,
    /// Constant floor of the petal cut.
    pub petal_base: f64,
    /// Weight of the steep sine term of the petal cut.
    pub petal_steepness: f64,
    /// Divisor applied to the combined petal cut wave.
    pub petal_divisor: f64,
    /// `C`: strength of the hang-down envelope.
    pub droop_strength: f64,
    /// `D`: the envelope's second zero sits at `r = 1 / D`.
    pub droop_falloff: f64,
    /// `S`: overall size.
    pub scale: f64,
    /// `T`: angle at which the taper reaches zero.
    pub taper_length: f64,
    /// `A`: amplitude of the organic ripple.
    pub ripple: f64,
    /// Multiplier on the droop (Y) axis.
    pub height_scale: f64,
}

impl Default for PetalShape {
    fn default() -> Self {
        Self {
            angular_span_degrees: 180.0 * 45.0,
            spiral_amplitude: 180.0 / 1.75,
            spiral_decay: 11.0 * 180.0,
            petal_frequency: 9.75,
            petal_base: 0.6,
            petal_steepness: 420.0,
            petal_divisor: 3000.0,
            droop_strength: 3.5,
            droop_falloff: 0.9,
            scale: 300.0,
            taper_length: 20000.0,
            ripple: 0.025,
            height_scale: 1.0,
        }
    }
}

impl PetalShape {
    /// Dense dahlia with a squashed droop axis.
    #[must_use]
    pub fn dense_dahlia() -> Self {
        Self {
            height_scale: 0.4,
            ..Self::default()
        }
    }

    /// Loosely wound spiral with fewer, wider lobes.
    #[must_use]
    pub fn open_spiral() -> Self {
        Self {
            spiral_decay: 30.0 * 180.0,
            petal_frequency: 4.75,
            ..Self::default()
        }
    }

    /// Returns the name of the first constant that would poison every vertex.
    pub(crate) fn first_invalid(&self) -> Option<&'static str> {
        let fields = [
            ("angularSpanDegrees", self.angular_span_degrees),
            ("spiralAmplitude", self.spiral_amplitude),
            ("spiralDecay", self.spiral_decay),
            ("petalFrequency", self.petal_frequency),
            ("petalBase", self.petal_base),
            ("petalSteepness", self.petal_steepness),
            ("petalDivisor", self.petal_divisor),
            ("droopStrength", self.droop_strength),
            ("droopFalloff", self.droop_falloff),
            ("scale", self.scale),
            ("taperLength", self.taper_length),
            ("ripple", self.ripple),
            ("heightScale", self.height_scale),
        ];
        if let Some((name, _)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Some(name);
        }
        // Divisors must be non-zero, the span strictly positive.
        if self.angular_span_degrees <= 0.0 {
            return Some("angularSpanDegrees");
        }
        [
            ("spiralDecay", self.spiral_decay),
            ("petalDivisor", self.petal_divisor),
            ("taperLength", self.taper_length),
        ]
        .into_iter()
        .find(|(_, v)| *v == 0.0)
        .map(|(name, _)| name)
    }
}

/// Opening angle `phi` in degrees for a spiral angle `theta` in degrees.
#[must_use]
pub fn opening_angle(theta: f64, shape: &PetalShape) -> f64 {
    shape.spiral_amplitude * (-theta / shape.spiral_decay).exp()
}

/// Jagged, periodic envelope that separates the petals.
#[must_use]
pub fn petal_cut(theta: f64, shape: &PetalShape) -> f64 {
    let wave = (shape.petal_frequency * theta).to_radians().sin();
    shape.petal_base + (wave.asin() + shape.petal_steepness * wave).abs() / shape.petal_divisor
}

/// Quartic droop envelope, zero at `r = 0` and `r = 1 / D`.
#[must_use]
pub fn hang_down(r: f64, phi_rad: f64, shape: &PetalShape) -> f64 {
    let inner = shape.droop_falloff * r - 1.0;
    shape.droop_strength * r * r * inner * inner * phi_rad.sin()
}

/// Position on the petal sheet for normalised radius `r` and spiral angle
/// `theta` (degrees).
#[must_use]
pub fn petal_position(r: f64, theta: f64, shape: &PetalShape) -> Vec3 {
    let theta_rad = theta.to_radians();
    let phi_rad = opening_angle(theta, shape).to_radians();
    let (sin_phi, cos_phi) = phi_rad.sin_cos();

    let droop = hang_down(r, phi_rad, shape);
    let petal_radius = r * sin_phi + droop * cos_phi;

    // The ripple takes the angle in degrees as a plain number.
    let ripple = 1.0 + (theta * 0.5).sin() * shape.ripple;
    let scale = shape.scale * (1.0 - theta / shape.taper_length) * petal_cut(theta, shape) * ripple;

    Vec3::new(
        scale * petal_radius * theta_rad.sin(),
        -scale * shape.height_scale * (r * cos_phi - droop * sin_phi),
        scale * petal_radius * theta_rad.cos(),
    )
}
