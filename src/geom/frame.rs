//! Live (per-tick) vertex buffers.

/// Positions and opacities produced by one deformation step.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveFrame {
    positions: Vec<[f64; 3]>,
    /// Opacity of the solid surface.
    pub mesh_opacity: f64,
    /// Opacity of the point-cloud representation.
    pub point_opacity: f64,
}

impl LiveFrame {
    /// A frame for `vertex_count` vertices, all at the origin, fully solid.
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; vertex_count],
            mesh_opacity: 1.0,
            point_opacity: 0.0,
        }
    }

    /// A frame whose positions start at the given base positions.
    #[must_use]
    pub fn from_positions(positions: &[[f64; 3]]) -> Self {
        Self {
            positions: positions.to_vec(),
            mesh_opacity: 1.0,
            point_opacity: 0.0,
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    pub(crate) fn positions_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.positions
    }

    /// Copy positions into a packed `f32` buffer of length `3 * vertex_count`.
    ///
    /// Returns `false` (and writes nothing) when `out` has the wrong length.
    pub fn write_positions_f32(&self, out: &mut [f32]) -> bool {
        if out.len() != self.positions.len() * 3 {
            return false;
        }
        for (dst, src) in out.chunks_exact_mut(3).zip(&self.positions) {
            dst[0] = src[0] as f32;
            dst[1] = src[1] as f32;
            dst[2] = src[2] as f32;
        }
        true
    }

    #[must_use]
    pub fn positions_f32(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.positions.len() * 3];
        self.write_positions_f32(&mut out);
        out
    }
}

/// Double buffer of [`LiveFrame`]s.
///
/// The tick loop writes [`back_mut`](Self::back_mut) completely and then calls
/// [`swap`](Self::swap); readers only ever see [`front`](Self::front), so a
/// half-written frame is never observable. Both frames are allocated once.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    frames: [LiveFrame; 2],
    front: usize,
}

impl FrameBuffers {
    /// Both frames start at `base`, fully solid.
    #[must_use]
    pub fn new(base: &[[f64; 3]]) -> Self {
        Self {
            frames: [LiveFrame::from_positions(base), LiveFrame::from_positions(base)],
            front: 0,
        }
    }

    #[must_use]
    pub fn front(&self) -> &LiveFrame {
        &self.frames[self.front]
    }

    pub fn back_mut(&mut self) -> &mut LiveFrame {
        &mut self.frames[1 - self.front]
    }

    /// Publish the back frame.
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }
}
