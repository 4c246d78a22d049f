//! Radius-banded vertex coloring.

use serde::{Deserialize, Serialize};

use super::Rgb;

/// Hue oscillator value above which the hot color is used unblended.
const HUE_BAND: f64 = 0.3;

/// Colors and blend constants for the petal gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Palette {
    /// Deep center color.
    pub core: Rgb,
    pub hot: Rgb,
    pub warm: Rgb,
    pub cool: Rgb,
    /// Color the petal tips fade towards.
    pub tip: Rgb,
    /// Radius below which the core gradient is used.
    pub core_radius: f64,
    /// How fast the core blends into the hot color per unit radius.
    pub core_blend_rate: f64,
    /// Maximum tip whitening at `r = 1`.
    pub tip_whiten: f64,
    /// Peak-to-peak width of the per-channel grain noise.
    pub grain: f64,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            core: Rgb::from_hex(0x0a3d1a),
            hot: Rgb::from_hex(0xff4d6d),
            warm: Rgb::from_hex(0xffb703),
            cool: Rgb::from_hex(0x8ecae6),
            tip: Rgb::WHITE,
            core_radius: 0.12,
            core_blend_rate: 5.0,
            tip_whiten: 0.7,
            grain: 0.15,
        }
    }
}

impl Palette {
    pub(crate) fn first_invalid(&self) -> Option<&'static str> {
        let colors = [
            ("core", self.core),
            ("hot", self.hot),
            ("warm", self.warm),
            ("cool", self.cool),
            ("tip", self.tip),
        ];
        if let Some((name, _)) = colors.into_iter().find(|(_, c)| !(c.r.is_finite() && c.g.is_finite() && c.b.is_finite())) {
            return Some(name);
        }
        [
            ("coreRadius", self.core_radius),
            ("coreBlendRate", self.core_blend_rate),
            ("tipWhiten", self.tip_whiten),
            ("grain", self.grain),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

/// Noise-free base color for normalised radius `r` and spiral angle
/// `theta_rad`.
#[must_use]
pub fn base_color(r: f64, theta_rad: f64, palette: &Palette) -> Rgb {
    if r < palette.core_radius {
        return palette.core.lerp(palette.hot, r * palette.core_blend_rate);
    }

    let hue = (theta_rad * 0.1 + r * 2.0).sin();
    let banded = if hue > HUE_BAND {
        palette.hot
    } else if hue > -HUE_BAND {
        palette
            .hot
            .lerp(palette.warm, (hue + HUE_BAND) / (2.0 * HUE_BAND))
    } else {
        palette.warm.lerp(palette.cool, hue.abs())
    };

    banded.lerp(palette.tip, r.powf(1.5) * palette.tip_whiten)
}

/// Final vertex color. `grain` holds one uniform sample in `[0, 1)` per
/// channel; each is re-centred and scaled by `palette.grain`.
#[must_use]
pub fn petal_color(r: f64, theta_rad: f64, grain: [f64; 3], palette: &Palette) -> Rgb {
    let base = base_color(r, theta_rad, palette);
    let jitter = |u: f64| (u - 0.5) * palette.grain;
    Rgb::new(
        base.r + jitter(grain[0]),
        base.g + jitter(grain[1]),
        base.b + jitter(grain[2]),
    )
    .clamped()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEUTRAL: [f64; 3] = [0.5, 0.5, 0.5];

    #[test]
    fn test_core_starts_at_core_color() {
        let palette = Palette::default();
        let c = petal_color(0.0, 0.0, NEUTRAL, &palette);
        assert!((c.r - palette.core.r).abs() < 1e-12);
        assert!((c.g - palette.core.g).abs() < 1e-12);
        assert!((c.b - palette.core.b).abs() < 1e-12);
    }

    #[test]
    fn test_tip_is_lightened() {
        let palette = Palette::default();
        // theta chosen so the hue oscillator sits in the hot band.
        let theta_rad = (std::f64::consts::FRAC_PI_2 - 2.0) / 0.1;
        let tip = base_color(1.0, theta_rad, &palette);
        let expected = palette.hot.lerp(palette.tip, palette.tip_whiten);
        assert!((tip.g - expected.g).abs() < 1e-9);
        assert!(tip.g > palette.hot.g);
    }

    #[test]
    fn test_grain_is_clamped() {
        let palette = Palette {
            grain: 10.0,
            ..Palette::default()
        };
        let bright = petal_color(0.5, 0.0, [1.0, 1.0, 1.0], &palette);
        let dark = petal_color(0.5, 0.0, [0.0, 0.0, 0.0], &palette);
        assert_eq!(bright, Rgb::WHITE);
        assert_eq!(dark, Rgb::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_every_band_stays_in_unit_range() {
        let palette = Palette::default();
        for i in 0..=20 {
            let r = f64::from(i) / 20.0;
            for j in 0..200 {
                let c = petal_color(r, f64::from(j) * 0.37, NEUTRAL, &palette);
                for ch in c.to_array() {
                    assert!((0.0..=1.0).contains(&ch));
                }
            }
        }
    }
}
