//! Per-vertex "sand grain" attributes: a random drift direction and speed.

use rand::Rng;

use super::{Tolerance, Vec3};

/// Lower bound of the dispersion speed band.
pub const MIN_SAND_SPEED: f64 = 0.5;
/// Upper bound (exclusive) of the dispersion speed band.
pub const MAX_SAND_SPEED: f64 = 2.0;

/// Direction used whenever a vector cannot be normalised.
pub const FALLBACK_DIRECTION: Vec3 = Vec3::Y;

/// Normalise `v`, falling back to [`FALLBACK_DIRECTION`] for zero-length or
/// non-finite input.
#[must_use]
pub fn normalize_or_fallback(v: Vec3) -> Vec3 {
    if Tolerance::ZERO_LENGTH.is_zero_length(v.length()) {
        return FALLBACK_DIRECTION;
    }
    v.normalized().unwrap_or(FALLBACK_DIRECTION)
}

/// Draw a direction uniformly distributed over the unit sphere.
///
/// Inverse-transform sampling: azimuth uniform in `[0, 2π)`, polar angle
/// `acos(2u - 1)`.
pub fn sample_direction(rng: &mut impl Rng) -> Vec3 {
    let azimuth = rng.random::<f64>() * std::f64::consts::TAU;
    let polar = (rng.random::<f64>() * 2.0 - 1.0).acos();
    let (sin_polar, cos_polar) = polar.sin_cos();
    normalize_or_fallback(Vec3::new(
        sin_polar * azimuth.cos(),
        sin_polar * azimuth.sin(),
        cos_polar,
    ))
}

/// Draw a dispersion speed in `[MIN_SAND_SPEED, MAX_SAND_SPEED)`.
pub fn sample_speed(rng: &mut impl Rng) -> f64 {
    rng.random_range(MIN_SAND_SPEED..MAX_SAND_SPEED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_directions_are_unit_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let d = sample_direction(&mut rng);
            assert!((d.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_directions_cover_both_hemispheres() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut mean = Vec3::ZERO;
        for _ in 0..4000 {
            mean = mean + sample_direction(&mut rng);
        }
        mean = mean * (1.0 / 4000.0);
        // A uniform sphere averages out near the origin.
        assert!(mean.length() < 0.1, "{mean:?}");
    }

    #[test]
    fn test_speed_band() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let s = sample_speed(&mut rng);
            assert!((MIN_SAND_SPEED..MAX_SAND_SPEED).contains(&s));
        }
    }

    #[test]
    fn test_fallback_for_degenerate_vectors() {
        assert_eq!(normalize_or_fallback(Vec3::ZERO), FALLBACK_DIRECTION);
        assert_eq!(
            normalize_or_fallback(Vec3::new(f64::NAN, 1.0, 0.0)),
            FALLBACK_DIRECTION
        );
        let n = normalize_or_fallback(Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(n, Vec3::Z);
    }
}
