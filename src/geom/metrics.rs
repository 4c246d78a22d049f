//! Opt-in timing hooks for surface generation and deformation.
//!
//! Timing is only collected when the `engine_metrics` feature is enabled and
//! the target is not WASM (`std::time::Instant` is unavailable there). When
//! disabled, every call compiles down to running the closure.
//!
//! # Usage
//!
//! ```ignore
//! use dahlia_engine::geom::{GeomMetrics, TimingBucket};
//!
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let indices = metrics.time(TimingBucket::Triangulation, || triangulate_grid(90, 1200));
//! if let Some(report) = metrics.end() {
//!     println!("triangulation: {} ns", report.triangulation_ns);
//! }
//! ```

/// Phases of building and animating a petal surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Parametric position evaluation.
    SurfacePositions,
    /// Palette evaluation and grain noise.
    SurfaceColors,
    /// Grid triangulation.
    Triangulation,
    /// Smooth vertex normal accumulation.
    Normals,
    /// Per-tick deformation pass.
    Deformation,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeomTimingReport {
    pub surface_positions_ns: u64,
    pub surface_colors_ns: u64,
    pub triangulation_ns: u64,
    pub normals_ns: u64,
    pub deformation_ns: u64,
}

impl GeomTimingReport {
    /// Returns the total time across all buckets in nanoseconds.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.surface_positions_ns
            .saturating_add(self.surface_colors_ns)
            .saturating_add(self.triangulation_ns)
            .saturating_add(self.normals_ns)
            .saturating_add(self.deformation_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing geometry operations.
///
/// When the `engine_metrics` feature is disabled (or on WASM), all methods
/// are no-ops and [`end`](Self::end) returns `None`.
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    /// Resets all timing counters to zero.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    /// Returns the accumulated timing report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times the execution of `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::SurfacePositions => &mut self.report.surface_positions_ns,
            TimingBucket::SurfaceColors => &mut self.report.surface_colors_ns,
            TimingBucket::Triangulation => &mut self.report.triangulation_ns,
            TimingBucket::Normals => &mut self.report.normals_ns,
            TimingBucket::Deformation => &mut self.report.deformation_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_report_total() {
        let report = GeomTimingReport {
            triangulation_ns: 2000,
            deformation_ns: 1000,
            surface_positions_ns: 3000,
            ..GeomTimingReport::default()
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut metrics = GeomMetrics::default();
        metrics.begin();
        let result = metrics.time(TimingBucket::Normals, || 42);
        assert_eq!(result, 42);
        let _ = metrics.end();
    }
}
