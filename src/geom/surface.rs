//! Petal surface generation.
//!
//! A [`PetalSurface`] is the immutable template every animation frame is
//! derived from: base positions, colors, the fixed grid triangulation and the
//! per-vertex sand attributes. It is built once from a `(radius, angle)` grid.
//!
//! # Example
//!
//! ```ignore
//! use dahlia_engine::geom::{generate_petal_surface, SurfaceOptions};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let (surface, diag) = generate_petal_surface(&SurfaceOptions::new(90, 1200), &mut rng)?;
//! assert_eq!(surface.vertex_count(), 91 * 1201);
//! ```

use rand::Rng;

use super::diagnostics::SurfaceDiagnostics;
use super::metrics::{GeomMetrics, TimingBucket};
use super::palette::{Palette, petal_color};
use super::petal::{PetalShape, petal_position};
use super::sand::{sample_direction, sample_speed};
use super::triangulation::triangulate_grid;
use super::Vec3;

/// Errors reported while building a surface. Fatal to that call only.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("grid resolution must be at least 1x1, got {rows}x{cols}")]
    InvalidResolution { rows: usize, cols: usize },
    #[error("{rows}x{cols} grid needs more vertices than a u32 index can address")]
    TooManyVertices { rows: usize, cols: usize },
    #[error("shape parameter `{0}` must be finite (and non-zero where it divides)")]
    InvalidShapeParameter(&'static str),
    #[error("palette parameter `{0}` must be finite")]
    InvalidPaletteParameter(&'static str),
}

/// Options for [`generate_petal_surface`].
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    /// Radius steps.
    pub rows: usize,
    /// Angle steps.
    pub cols: usize,
    pub shape: PetalShape,
    pub palette: Palette,
    /// Whether to accumulate smooth vertex normals (only the solid mesh
    /// layer needs them).
    pub compute_normals: bool,
}

impl SurfaceOptions {
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            shape: PetalShape::default(),
            palette: Palette::default(),
            compute_normals: true,
        }
    }

    #[must_use]
    pub const fn shape(mut self, shape: PetalShape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub const fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    #[must_use]
    pub const fn angular_span_degrees(mut self, degrees: f64) -> Self {
        self.shape.angular_span_degrees = degrees;
        self
    }

    #[must_use]
    pub const fn compute_normals(mut self, compute: bool) -> Self {
        self.compute_normals = compute;
        self
    }

    /// Checks resolution and parameters without generating anything.
    ///
    /// # Errors
    /// See [`SurfaceError`].
    pub fn validate(&self) -> Result<(), SurfaceError> {
        let (rows, cols) = (self.rows, self.cols);
        if rows == 0 || cols == 0 {
            return Err(SurfaceError::InvalidResolution { rows, cols });
        }
        let vertex_count = (rows + 1)
            .checked_mul(cols + 1)
            .ok_or(SurfaceError::TooManyVertices { rows, cols })?;
        if u32::try_from(vertex_count).is_err() {
            return Err(SurfaceError::TooManyVertices { rows, cols });
        }
        if let Some(name) = self.shape.first_invalid() {
            return Err(SurfaceError::InvalidShapeParameter(name));
        }
        if let Some(name) = self.palette.first_invalid() {
            return Err(SurfaceError::InvalidPaletteParameter(name));
        }
        Ok(())
    }
}

/// Immutable geometric template of the flower.
///
/// Vertex `(i, j)` (radius step `i`, angle step `j`) lives at index
/// `i * (cols + 1) + j`; the triangulation depends on that order.
#[derive(Debug, Clone, PartialEq)]
pub struct PetalSurface {
    rows: usize,
    cols: usize,
    positions: Vec<[f64; 3]>,
    colors: Vec<[f64; 3]>,
    directions: Vec<[f64; 3]>,
    speeds: Vec<f64>,
    indices: Vec<u32>,
    normals: Option<Vec<[f64; 3]>>,
}

impl PetalSurface {
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Index of grid vertex `(i, j)`, or `None` outside the grid.
    #[must_use]
    pub fn vertex_index(&self, i: usize, j: usize) -> Option<usize> {
        (i <= self.rows && j <= self.cols).then(|| i * (self.cols + 1) + j)
    }

    #[must_use]
    pub fn base_positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    #[must_use]
    pub fn colors(&self) -> &[[f64; 3]] {
        &self.colors
    }

    #[must_use]
    pub fn dispersion_directions(&self) -> &[[f64; 3]] {
        &self.directions
    }

    #[must_use]
    pub fn dispersion_speeds(&self) -> &[f64] {
        &self.speeds
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn normals(&self) -> Option<&[[f64; 3]]> {
        self.normals.as_deref()
    }

    /// Returns the base positions as `[x0, y0, z0, x1, ...]`.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        flatten_f64_array_slice::<3>(&self.positions)
    }

    /// Returns the colors as `[r0, g0, b0, r1, ...]`.
    #[must_use]
    pub fn colors_flat(&self) -> &[f64] {
        flatten_f64_array_slice::<3>(&self.colors)
    }

    #[must_use]
    pub fn normals_flat(&self) -> Option<&[f64]> {
        self.normals.as_deref().map(flatten_f64_array_slice::<3>)
    }

    /// Single-precision color buffer for GPU upload.
    #[must_use]
    pub fn colors_f32(&self) -> Vec<f32> {
        self.colors_flat().iter().map(|&c| c as f32).collect()
    }

    /// Single-precision normal buffer, empty when normals were skipped.
    #[must_use]
    pub fn normals_f32(&self) -> Vec<f32> {
        self.normals_flat()
            .map(|n| n.iter().map(|&v| v as f32).collect())
            .unwrap_or_default()
    }

    /// Checks the buffer invariants the deformation pass relies on.
    ///
    /// # Errors
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        let n = (self.rows + 1) * (self.cols + 1);
        if self.positions.len() != n {
            return Err(format!("expected {n} vertices, found {}", self.positions.len()));
        }
        let attribute_lengths = [
            self.colors.len(),
            self.directions.len(),
            self.speeds.len(),
            self.normals.as_ref().map_or(n, Vec::len),
        ];
        if attribute_lengths.iter().any(|&len| len != n) {
            return Err("surface attribute buffers do not match vertex count".to_string());
        }
        if self.indices.len() != 6 * self.rows * self.cols {
            return Err("triangle list does not cover the grid".to_string());
        }
        if self.indices.iter().any(|&i| i as usize >= n) {
            return Err("surface has out-of-bounds vertex indices".to_string());
        }
        if self
            .positions
            .iter()
            .any(|p| !p.iter().all(|c| c.is_finite()))
        {
            return Err("surface has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        Ok(())
    }
}

fn flatten_f64_array_slice<const N: usize>(data: &[[f64; N]]) -> &[f64] {
    let count = data.len().checked_mul(N).unwrap_or(0);
    let ptr = data.as_ptr().cast::<f64>();
    // SAFETY: `[[f64; N]]` is stored contiguously, and we compute the element count as `len * N`.
    unsafe { std::slice::from_raw_parts(ptr, count) }
}

/// Generate a petal surface.
///
/// Positions and colors are a pure function of `options` and the sequence of
/// values drawn from `rng`; a seeded generator reproduces them exactly. The
/// grain noise is drawn first (three samples per vertex, in index order),
/// then the sand attributes (three samples per vertex).
///
/// # Errors
/// Returns [`SurfaceError`] for an empty grid, an index overflow or a
/// non-finite parameter.
pub fn generate_petal_surface(
    options: &SurfaceOptions,
    rng: &mut impl Rng,
) -> Result<(PetalSurface, SurfaceDiagnostics), SurfaceError> {
    options.validate()?;

    let (rows, cols) = (options.rows, options.cols);
    let vertex_count = (rows + 1) * (cols + 1);
    let shape = &options.shape;

    let mut metrics = GeomMetrics::default();
    metrics.begin();

    let (positions, radii, angles) = metrics.time(TimingBucket::SurfacePositions, || {
        let mut positions = Vec::with_capacity(vertex_count);
        let mut radii = Vec::with_capacity(vertex_count);
        let mut angles = Vec::with_capacity(vertex_count);
        for i in 0..=rows {
            let r = i as f64 / rows as f64;
            for j in 0..=cols {
                let theta = (j as f64 / cols as f64) * shape.angular_span_degrees;
                positions.push(petal_position(r, theta, shape).to_array());
                radii.push(r);
                angles.push(theta.to_radians());
            }
        }
        (positions, radii, angles)
    });

    let colors = metrics.time(TimingBucket::SurfaceColors, || {
        radii
            .iter()
            .zip(&angles)
            .map(|(&r, &theta_rad)| {
                let grain = [rng.random(), rng.random(), rng.random()];
                petal_color(r, theta_rad, grain, &options.palette).to_array()
            })
            .collect::<Vec<_>>()
    });

    let mut directions = Vec::with_capacity(vertex_count);
    let mut speeds = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        directions.push(sample_direction(rng).to_array());
        speeds.push(sample_speed(rng));
    }

    let indices = metrics.time(TimingBucket::Triangulation, || triangulate_grid(rows, cols));

    let (normals, degenerate_normal_count) = if options.compute_normals {
        let (normals, degenerate) = metrics.time(TimingBucket::Normals, || {
            compute_smooth_normals(&positions, &indices)
        });
        (Some(normals), degenerate)
    } else {
        (None, 0)
    };

    let surface = PetalSurface {
        rows,
        cols,
        positions,
        colors,
        directions,
        speeds,
        indices,
        normals,
    };

    let diagnostics = summarize(&surface, degenerate_normal_count, metrics.end());
    log::debug!("generated petal surface: {diagnostics}");

    Ok((surface, diagnostics))
}

/// Generate with the default shape and palette.
///
/// # Errors
/// See [`generate_petal_surface`].
pub fn generate(
    rows: usize,
    cols: usize,
    angular_span_degrees: f64,
    rng: &mut impl Rng,
) -> Result<PetalSurface, SurfaceError> {
    let options = SurfaceOptions::new(rows, cols).angular_span_degrees(angular_span_degrees);
    generate_petal_surface(&options, rng).map(|(surface, _)| surface)
}

fn summarize(
    surface: &PetalSurface,
    degenerate_normal_count: usize,
    timing: Option<super::metrics::GeomTimingReport>,
) -> SurfaceDiagnostics {
    let mut max_planar_radius = 0.0_f64;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in &surface.positions {
        max_planar_radius = max_planar_radius.max(Vec3::from_array(*p).planar_length());
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }

    let mut warnings = Vec::new();
    if degenerate_normal_count > 0 {
        warnings.push(format!(
            "{degenerate_normal_count} vertices had no usable face area; normal set to +Y"
        ));
    }

    SurfaceDiagnostics {
        rows: surface.rows,
        cols: surface.cols,
        vertex_count: surface.vertex_count(),
        triangle_count: surface.triangle_count(),
        max_planar_radius,
        height_span: max_y - min_y,
        degenerate_normal_count,
        timing,
        warnings,
    }
}

/// Area-weighted vertex normals. Vertices without usable face area (the
/// collapsed center ring) fall back to `+Y`.
fn compute_smooth_normals(points: &[[f64; 3]], indices: &[u32]) -> (Vec<[f64; 3]>, usize) {
    let mut sums = vec![Vec3::ZERO; points.len()];

    for tri in indices.chunks_exact(3) {
        let i0 = tri[0] as usize;
        let i1 = tri[1] as usize;
        let i2 = tri[2] as usize;

        let (Some(&a), Some(&b), Some(&c)) = (points.get(i0), points.get(i1), points.get(i2)) else {
            continue;
        };
        let a = Vec3::from_array(a);
        // Unnormalised cross product: larger faces weigh more.
        let n = (Vec3::from_array(b) - a).cross(Vec3::from_array(c) - a);

        for idx in [i0, i1, i2] {
            sums[idx] = sums[idx] + n;
        }
    }

    let mut degenerate = 0;
    let normals: Vec<[f64; 3]> = sums
        .into_iter()
        .map(|sum| {
            sum.normalized().unwrap_or_else(|| {
                degenerate += 1;
                Vec3::Y
            })
        })
        .map(Vec3::to_array)
        .collect();

    (normals, degenerate)
}
