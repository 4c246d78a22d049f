//! Per-tick deformation of a [`PetalSurface`] into a [`LiveFrame`].
//!
//! Two styles share one entry point:
//!
//! - [`DispersionStyle::Whip`]: radial expansion, layered periodic noise and a
//!   per-vertex drift along the random dispersion direction.
//! - [`DispersionStyle::SandFall`]: grains leave the surface top-down, each at
//!   its own speed, under gravity and a slow swirl.
//!
//! Both are driven by the morph factor. The whip noise reads the latched
//! noise clock ([`NoiseClock`]), which stops advancing while the factor is
//! held above the freeze threshold. The sand swirl keeps running on elapsed
//! time, so a fully dissolved cloud never stands still.

use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::diagnostics::FrameDiagnostics;
use super::frame::LiveFrame;
use super::metrics::{GeomMetrics, TimingBucket};
use super::surface::PetalSurface;
use super::Vec3;
use crate::control::ControlState;

/// Weight of the third harmonic in the layered noise.
const HARMONIC_WEIGHT: f64 = 0.3;
const HARMONIC_SCALE: f64 = 3.0;

/// Base height (and span) used to stagger sand release from top to bottom.
const SAND_RELEASE_OFFSET: f64 = 200.0;
const SAND_RELEASE_SPAN: f64 = 400.0;

/// Errors reported by the deformation pass.
#[derive(Debug, thiserror::Error)]
pub enum DispersionError {
    #[error("dispersion parameter `{0}` must be finite (and positive where it divides)")]
    InvalidParameter(&'static str),
    #[error("live frame holds {got} vertices, surface has {expected}")]
    FrameSizeMismatch { expected: usize, got: usize },
}

/// How vertices leave their base position as the factor grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DispersionStyle {
    #[default]
    Whip,
    SandFall,
}

/// Tunables of the deformation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DispersionParams {
    /// Outward radial growth at `factor = 1`, scaled by radial power.
    pub expansion_force: f64,
    /// Drift along the per-vertex dispersion direction at `factor = 1`.
    pub shred_drift: f64,
    pub noise_frequency: f64,
    pub noise_amplitude: f64,
    /// Noise phase per latched millisecond.
    pub chaos_speed: f64,
    /// Opacity of the solid surface at `factor = 1`.
    pub min_mesh_opacity: f64,
    /// Point sprite size; passed through to the renderer.
    pub point_size: f64,
    /// Opacity of the point cloud at `factor = 1`.
    pub point_opacity_max: f64,
    /// Factor at or above which the noise clock holds.
    pub freeze_threshold: f64,
    /// Planar distance at which radial power reaches 1.
    pub radial_reference: f64,
    /// Vertical whip amplitude of the noise product.
    pub vertical_whip: f64,
    pub style: DispersionStyle,
    pub sand_travel: f64,
    pub sand_gravity: f64,
    pub sand_swirl: f64,
    /// How much later the lowest grains leave compared to the highest.
    pub height_delay: f64,
}

impl Default for DispersionParams {
    fn default() -> Self {
        Self {
            expansion_force: 0.5,
            shred_drift: 8.0,
            noise_frequency: 0.1,
            noise_amplitude: 90.0,
            chaos_speed: 0.002,
            min_mesh_opacity: 0.15,
            point_size: 3.0,
            point_opacity_max: 0.9,
            freeze_threshold: 0.85,
            radial_reference: 220.0,
            vertical_whip: 120.0,
            style: DispersionStyle::Whip,
            sand_travel: 20.0,
            sand_gravity: 50.0,
            sand_swirl: 15.0,
            height_delay: 0.2,
        }
    }
}

impl DispersionParams {
    /// Checks that every tunable is usable.
    ///
    /// # Errors
    /// Returns [`DispersionError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<(), DispersionError> {
        let fields = [
            ("expansionForce", self.expansion_force),
            ("shredDrift", self.shred_drift),
            ("noiseFrequency", self.noise_frequency),
            ("noiseAmplitude", self.noise_amplitude),
            ("chaosSpeed", self.chaos_speed),
            ("minMeshOpacity", self.min_mesh_opacity),
            ("pointSize", self.point_size),
            ("pointOpacityMax", self.point_opacity_max),
            ("freezeThreshold", self.freeze_threshold),
            ("radialReference", self.radial_reference),
            ("verticalWhip", self.vertical_whip),
            ("sandTravel", self.sand_travel),
            ("sandGravity", self.sand_gravity),
            ("sandSwirl", self.sand_swirl),
            ("heightDelay", self.height_delay),
        ];
        if let Some((name, _)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(DispersionError::InvalidParameter(name));
        }
        if self.radial_reference <= 0.0 {
            return Err(DispersionError::InvalidParameter("radialReference"));
        }
        if !(0.0..=1.0).contains(&self.min_mesh_opacity) {
            return Err(DispersionError::InvalidParameter("minMeshOpacity"));
        }
        if !(0.0..=1.0).contains(&self.point_opacity_max) {
            return Err(DispersionError::InvalidParameter("pointOpacityMax"));
        }
        Ok(())
    }

    /// Solid surface opacity: 1 at rest, `min_mesh_opacity` fully open.
    #[must_use]
    pub fn mesh_opacity(&self, factor: f64) -> f64 {
        lerp(1.0, self.min_mesh_opacity, factor)
    }

    /// Point cloud opacity: 0 at rest, `point_opacity_max` fully open.
    #[must_use]
    pub fn point_opacity(&self, factor: f64) -> f64 {
        lerp(0.0, self.point_opacity_max, factor)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Latched time for the noise field.
///
/// Every sample taken with the factor below the threshold jumps the latch to
/// that sample's elapsed time; samples at or above it leave the latch alone.
/// Paused durations are not accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoiseClock {
    latched_ms: f64,
}

impl NoiseClock {
    #[must_use]
    pub const fn new() -> Self {
        Self { latched_ms: 0.0 }
    }

    #[must_use]
    pub fn latched_ms(&self) -> f64 {
        self.latched_ms
    }

    /// Feed one sample; returns whether the clock is holding.
    pub fn sample(&mut self, factor: f64, elapsed_ms: f64, threshold: f64) -> bool {
        if factor < threshold {
            self.latched_ms = elapsed_ms;
            false
        } else {
            true
        }
    }
}

/// Sanitised per-tick inputs shared by every layer stepped in that tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePhase {
    pub factor: f64,
    pub elapsed_ms: f64,
    /// `latched_ms * chaos_speed`.
    pub noise_phase: f64,
    pub frozen: bool,
    pub sanitized_inputs: usize,
}

/// Owns the dispersion parameters and the noise clock.
#[derive(Debug, Clone)]
pub struct DispersionEngine {
    params: DispersionParams,
    clock: NoiseClock,
}

impl DispersionEngine {
    /// # Errors
    /// Rejects parameters that fail [`DispersionParams::validate`].
    pub fn new(params: DispersionParams) -> Result<Self, DispersionError> {
        params.validate()?;
        Ok(Self {
            params,
            clock: NoiseClock::new(),
        })
    }

    #[must_use]
    pub fn params(&self) -> &DispersionParams {
        &self.params
    }

    /// Replace the parameters; the clock keeps its latched time.
    ///
    /// # Errors
    /// Rejects parameters that fail [`DispersionParams::validate`].
    pub fn set_params(&mut self, params: DispersionParams) -> Result<(), DispersionError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    #[must_use]
    pub fn clock(&self) -> &NoiseClock {
        &self.clock
    }

    /// Sanitise the control sample and advance the noise clock once.
    pub fn advance(&mut self, control: &ControlState) -> FramePhase {
        let mut sanitized_inputs = 0;

        let mut factor = control.factor;
        if !factor.is_finite() {
            log::warn!("non-finite morph factor {factor} replaced by 0");
            factor = 0.0;
            sanitized_inputs += 1;
        }
        if !(0.0..=1.0).contains(&factor) {
            log::warn!("morph factor {factor} clamped to [0, 1]");
            factor = factor.clamp(0.0, 1.0);
            sanitized_inputs += 1;
        }

        let mut elapsed_ms = control.elapsed_ms;
        if !elapsed_ms.is_finite() || elapsed_ms < 0.0 {
            log::warn!("elapsed time {elapsed_ms} replaced by 0");
            elapsed_ms = 0.0;
            sanitized_inputs += 1;
        }

        let frozen = self
            .clock
            .sample(factor, elapsed_ms, self.params.freeze_threshold);

        FramePhase {
            factor,
            elapsed_ms,
            noise_phase: self.clock.latched_ms() * self.params.chaos_speed,
            frozen,
            sanitized_inputs,
        }
    }

    /// Deform `surface` into `frame` for an already advanced phase.
    ///
    /// # Errors
    /// Returns [`DispersionError::FrameSizeMismatch`] when `frame` was sized
    /// for a different surface; the frame is left untouched.
    pub fn apply(
        &self,
        surface: &PetalSurface,
        phase: &FramePhase,
        frame: &mut LiveFrame,
    ) -> Result<FrameDiagnostics, DispersionError> {
        let expected = surface.vertex_count();
        if frame.vertex_count() != expected {
            return Err(DispersionError::FrameSizeMismatch {
                expected,
                got: frame.vertex_count(),
            });
        }

        let mut metrics = GeomMetrics::default();
        metrics.begin();

        let params = &self.params;
        let base = surface.base_positions();
        let directions = surface.dispersion_directions();
        let speeds = surface.dispersion_speeds();
        let factor = phase.factor;
        let t = phase.noise_phase;
        let swirl_phase = phase.elapsed_ms * params.chaos_speed;

        metrics.time(TimingBucket::Deformation, || match params.style {
            DispersionStyle::Whip => deform_vertices(frame.positions_mut(), |i| {
                whip_vertex(base[i], directions[i], factor, t, params)
            }),
            DispersionStyle::SandFall => deform_vertices(frame.positions_mut(), |i| {
                sand_vertex(base[i], directions[i], speeds[i], i, factor, swirl_phase, params)
            }),
        });

        frame.mesh_opacity = params.mesh_opacity(factor);
        frame.point_opacity = params.point_opacity(factor);

        let max_displacement = frame
            .positions()
            .iter()
            .zip(base)
            .map(|(p, b)| {
                let d = [p[0] - b[0], p[1] - b[1], p[2] - b[2]];
                (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
            })
            .fold(0.0_f64, f64::max);

        Ok(FrameDiagnostics {
            factor,
            noise_phase: t,
            frozen: phase.frozen,
            max_displacement,
            sanitized_inputs: phase.sanitized_inputs,
            timing: metrics.end(),
        })
    }

    /// [`advance`](Self::advance) followed by [`apply`](Self::apply).
    ///
    /// # Errors
    /// See [`apply`](Self::apply).
    pub fn step(
        &mut self,
        surface: &PetalSurface,
        control: &ControlState,
        frame: &mut LiveFrame,
    ) -> Result<FrameDiagnostics, DispersionError> {
        let phase = self.advance(control);
        self.apply(surface, &phase, frame)
    }
}

#[cfg(feature = "parallel")]
fn deform_vertices(out: &mut [[f64; 3]], kernel: impl Fn(usize) -> [f64; 3] + Sync + Send) {
    out.par_iter_mut()
        .enumerate()
        .for_each(|(i, p)| *p = kernel(i));
}

#[cfg(not(feature = "parallel"))]
fn deform_vertices(out: &mut [[f64; 3]], kernel: impl Fn(usize) -> [f64; 3]) {
    for (i, p) in out.iter_mut().enumerate() {
        *p = kernel(i);
    }
}

/// `(dist / radial_reference)^2` for the vertex's planar distance.
#[must_use]
pub fn radial_power(base: [f64; 3], radial_reference: f64) -> f64 {
    let ratio = Vec3::from_array(base).planar_length() / radial_reference;
    ratio * ratio
}

/// Layered noise pair `(noise_x, noise_z)` at a base position and phase.
#[must_use]
pub fn layered_noise(bx: f64, bz: f64, frequency: f64, t: f64) -> (f64, f64) {
    let fx = bx * frequency;
    let fz = bz * frequency;
    let noise_x = (fx + t).sin() * (fz + t).cos()
        + HARMONIC_WEIGHT * (fx * HARMONIC_SCALE + t).sin();
    let noise_z = (fx - t).cos() * (fz + t).sin()
        + HARMONIC_WEIGHT * (fz * HARMONIC_SCALE + t).cos();
    (noise_x, noise_z)
}

fn whip_vertex(
    base: [f64; 3],
    direction: [f64; 3],
    factor: f64,
    t: f64,
    params: &DispersionParams,
) -> [f64; 3] {
    let [bx, by, bz] = base;
    let power = radial_power(base, params.radial_reference);
    let (noise_x, noise_z) = layered_noise(bx, bz, params.noise_frequency, t);
    let expansion = 1.0 + factor * params.expansion_force * power;
    let swing = params.noise_amplitude * factor * power;
    let drift = params.shred_drift * factor;

    [
        bx * expansion + noise_x * swing + direction[0] * drift,
        by + noise_x * noise_z * params.vertical_whip * factor * power,
        bz * expansion + noise_z * swing + direction[2] * drift,
    ]
}

fn sand_vertex(
    base: [f64; 3],
    direction: [f64; 3],
    speed: f64,
    index: usize,
    factor: f64,
    swirl_phase: f64,
    params: &DispersionParams,
) -> [f64; 3] {
    let [bx, by, bz] = base;
    let release = ((by + SAND_RELEASE_OFFSET) / SAND_RELEASE_SPAN).clamp(0.0, 1.0);
    let individual = (factor * speed - release * params.height_delay).max(0.0);
    if individual == 0.0 {
        return base;
    }
    let travel = individual * params.sand_travel;
    let swirl = (swirl_phase + index as f64).sin() * params.sand_swirl * individual;

    [
        bx + direction[0] * travel + swirl,
        by + direction[1] * travel - individual * individual * params.sand_gravity,
        bz + direction[2] * travel + swirl,
    ]
}
