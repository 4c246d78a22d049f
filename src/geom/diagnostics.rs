//! Diagnostics returned alongside generated surfaces and deformed frames.
//!
//! Nothing here changes results; the structs exist so callers (the CLI
//! snapshot writer, tests, debug overlays) can see what a call did without
//! re-deriving it from the buffers.

use std::fmt;

use super::metrics::GeomTimingReport;

/// Summary of one [`generate_petal_surface`](super::generate_petal_surface) call.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SurfaceDiagnostics {
    pub rows: usize,
    pub cols: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Largest planar distance of any base vertex from the central axis.
    pub max_planar_radius: f64,
    /// Vertical extent of the base shape (`max_y - min_y`).
    pub height_span: f64,
    /// Vertices whose normal fell back to `+Y`.
    pub degenerate_normal_count: usize,
    /// Timing breakdown when `engine_metrics` is enabled.
    pub timing: Option<GeomTimingReport>,
    pub warnings: Vec<String>,
}

impl fmt::Display for SurfaceDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} grid: {} vertices, {} triangles, radius {:.3}, height {:.3}",
            self.rows,
            self.cols,
            self.vertex_count,
            self.triangle_count,
            self.max_planar_radius,
            self.height_span
        )
    }
}

/// Summary of one deformation step.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameDiagnostics {
    /// Morph factor actually used after sanitising.
    pub factor: f64,
    /// Noise phase `t` fed into the periodic noise.
    pub noise_phase: f64,
    /// Whether the noise clock held its latched time this tick.
    pub frozen: bool,
    /// Largest distance between a live vertex and its base position.
    pub max_displacement: f64,
    /// Number of control inputs that were non-finite or out of range.
    pub sanitized_inputs: usize,
    pub timing: Option<GeomTimingReport>,
}

impl fmt::Display for FrameDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "factor {:.3}, phase {:.4}{}, max displacement {:.3}",
            self.factor,
            self.noise_phase,
            if self.frozen { " (frozen)" } else { "" },
            self.max_displacement
        )
    }
}
