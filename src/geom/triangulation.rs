/// Triangle list for a `(rows + 1) × (cols + 1)` vertex grid laid out
/// row-major (`index = i * (cols + 1) + j`).
///
/// Each cell `(i, j)` contributes `(a, b, d)` and `(b, c, d)` with
/// `a = i*(cols+1)+j`, `b = a+1`, `c = a+cols+2`, `d = a+cols+1`.
/// Returns an empty list when either dimension is zero.
#[must_use]
pub fn triangulate_grid(rows: usize, cols: usize) -> Vec<u32> {
    let stride = cols + 1;
    let mut indices = Vec::with_capacity(rows * cols * 6);

    for i in 0..rows {
        for j in 0..cols {
            let a = (i * stride + j) as u32;
            let b = a + 1;
            let c = a + stride as u32 + 1;
            let d = a + stride as u32;

            indices.extend_from_slice(&[a, b, d]);
            indices.extend_from_slice(&[b, c, d]);
        }
    }

    indices
}

/// Number of indices [`triangulate_grid`] produces.
#[must_use]
pub const fn grid_index_count(rows: usize, cols: usize) -> usize {
    rows * cols * 6
}
