mod core;
mod diagnostics;
mod dispersion;
mod frame;
mod metrics;
mod palette;
mod petal;
mod sand;
mod surface;
mod triangulation;

pub use core::{Rgb, Tolerance, Vec3};
pub use diagnostics::{FrameDiagnostics, SurfaceDiagnostics};
pub use dispersion::{
    DispersionEngine, DispersionError, DispersionParams, DispersionStyle, FramePhase, NoiseClock,
    layered_noise, radial_power,
};
pub use frame::{FrameBuffers, LiveFrame};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use palette::{Palette, base_color, petal_color};
pub use petal::{PetalShape, hang_down, opening_angle, petal_cut, petal_position};
pub use sand::{
    FALLBACK_DIRECTION, MAX_SAND_SPEED, MIN_SAND_SPEED, normalize_or_fallback, sample_direction,
    sample_speed,
};
pub use surface::{PetalSurface, SurfaceError, SurfaceOptions, generate, generate_petal_surface};
pub use triangulation::{grid_index_count, triangulate_grid};

#[cfg(test)]
mod tests;
