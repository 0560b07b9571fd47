//! Stored sixel images.
//!
//! The decoded raster lives here (ARGB32, stride == width); the grid
//! owns a per-grid list sorted by end row descending. Placement,
//! splitting and eviction are driven by the semantics layer — this
//! type only knows its own geometry.
//!
//! Invariants (maintained by the placement code, checked in debug):
//! * `pos.row` is an absolute ring row and `pos.row + rows - 1` never
//!   crosses the ring wrap-around.
//! * `rows`/`cols` are `ceil(height / cell_h)` / `ceil(width / cell_w)`
//!   for the cell geometry at placement time.

/// Placement in grid space: absolute ring row, cell column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SixelPos {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct SixelImage {
    /// ARGB32 pixels, row-major, stride == `width`.
    pub data: Vec<u32>,
    pub width: usize,
    pub height: usize,
    pub pos: SixelPos,
    /// Cell-space footprint.
    pub rows: usize,
    pub cols: usize,
    /// Fully opaque images let the renderer skip the cells they cover;
    /// translucent ones are composited over the grid.
    pub opaque: bool,
}

impl SixelImage {
    pub fn new(
        data: Vec<u32>,
        width: usize,
        height: usize,
        pos: SixelPos,
        cell_width: usize,
        cell_height: usize,
        opaque: bool,
    ) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
            pos,
            rows: height.div_ceil(cell_height),
            cols: width.div_ceil(cell_width),
            opaque,
        }
    }

    /// Absolute ring row of the image's last cell row.
    pub fn end_row(&self) -> usize {
        self.pos.row + self.rows - 1
    }

    /// Column range `[start, end)` in cells.
    pub fn col_range(&self) -> std::ops::Range<usize> {
        self.pos.col..self.pos.col + self.cols
    }

    /// Copy a pixel sub-rectangle (clamped to the image).
    pub fn copy_rect(&self, x: usize, y: usize, w: usize, h: usize) -> Vec<u32> {
        let x1 = (x + w).min(self.width);
        let y1 = (y + h).min(self.height);
        let (x, y) = (x.min(x1), y.min(y1));
        let mut out = Vec::with_capacity((x1 - x) * (y1 - y));
        for row in y..y1 {
            out.extend_from_slice(&self.data[row * self.width + x..row * self.width + x1]);
        }
        out
    }
}
