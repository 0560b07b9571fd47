//! The character grid: a power-of-two ring of lazily allocated rows.
//!
//! Logical row `r` (0 at the top of the screen) lives in ring slot
//! `(offset + r) & (num_rows - 1)`. Scrollback extends upward from
//! `offset`; the viewport top is `view`, equal to `offset` whenever
//! the user is not scrolled back. Scrolling the full screen on the
//! primary grid is a pointer move: `offset` advances and the newly
//! exposed slots are (re)initialized, no cell copying.
//!
//! Invariants (hold after every public call, `debug_assert`ed):
//! * `num_rows` is a power of two; `offset` and `view` are in
//!   `[0, num_rows)`.
//! * `None` slots have never been written since the last reset.
//! * The sixel list is sorted by end row (scrollback-relative)
//!   descending; images never overlap nor cross the ring wrap-around
//!   (maintained by the placement layer, verified here in debug).

pub mod cell;
pub mod composed;
pub mod damage;
pub mod row;
pub mod sixel;

pub use cell::{AttrFlags, Attrs, Cell, Color, COMB_BASE, COMB_MAX, SPACER};
pub use composed::ComposedTable;
pub use damage::{Damage, ScrollRegion};
pub use row::Row;
pub use sixel::{SixelImage, SixelPos};

/// Ring size for `screen_rows` visible rows plus the configured
/// scrollback: the next power of two that fits both.
pub fn ring_size(screen_rows: usize, scrollback_lines: usize) -> usize {
    (screen_rows + scrollback_lines).next_power_of_two()
}

#[derive(Debug)]
pub struct Grid {
    rows: Vec<Option<Row>>,
    num_cols: usize,
    offset: usize,
    view: usize,
    damage: Vec<Damage>,
    pub sixels: Vec<SixelImage>,
}

impl Grid {
    pub fn new(num_cols: usize, screen_rows: usize, scrollback_lines: usize) -> Self {
        let n = ring_size(screen_rows, scrollback_lines);
        Grid {
            rows: (0..n).map(|_| None).collect(),
            num_cols,
            offset: 0,
            view: 0,
            damage: Vec::new(),
            sixels: Vec::new(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn view(&self) -> usize {
        self.view
    }

    pub fn view_follows_offset(&self) -> bool {
        self.view == self.offset
    }

    /// Scroll the viewport: absolute ring slot for the new top.
    pub fn set_view(&mut self, view: usize) {
        debug_assert!(view < self.num_rows());
        self.view = view;
    }

    fn mask(&self) -> usize {
        self.num_rows() - 1
    }

    /// Ring slot of logical row `r`.
    #[inline]
    pub fn absolute(&self, r: usize) -> usize {
        (self.offset + r) & self.mask()
    }

    /// Ring slot of viewport row `r`.
    #[inline]
    pub fn absolute_in_view(&self, r: usize) -> usize {
        (self.view + r) & self.mask()
    }

    /// Scrollback-relative row for an absolute slot: 0 is the oldest
    /// possible scrollback row, higher is further down, the bottom of
    /// the screen is highest. Used for sixel ordering and eviction.
    pub fn rebase_row(&self, abs: usize, screen_rows: usize) -> usize {
        let scrollback_start = self.offset + screen_rows;
        (abs + self.num_rows() - (scrollback_start & self.mask())) & self.mask()
    }

    // --- row access --------------------------------------------------

    pub fn row(&self, r: usize) -> Option<&Row> {
        self.rows[self.absolute(r)].as_ref()
    }

    pub fn row_mut(&mut self, r: usize) -> Option<&mut Row> {
        let abs = self.absolute(r);
        self.rows[abs].as_mut()
    }

    /// Logical row `r`, allocated on first touch.
    pub fn row_alloc(&mut self, r: usize) -> &mut Row {
        let abs = self.absolute(r);
        self.row_abs_alloc(abs)
    }

    pub fn row_abs(&self, abs: usize) -> Option<&Row> {
        self.rows[abs & self.mask()].as_ref()
    }

    pub fn row_abs_mut(&mut self, abs: usize) -> Option<&mut Row> {
        let mask = self.mask();
        self.rows[abs & mask].as_mut()
    }

    pub fn row_abs_alloc(&mut self, abs: usize) -> &mut Row {
        let mask = self.mask();
        let cols = self.num_cols;
        self.rows[abs & mask].get_or_insert_with(|| Row::new(cols))
    }

    pub fn row_in_view(&self, r: usize) -> Option<&Row> {
        self.rows[self.absolute_in_view(r)].as_ref()
    }

    pub fn row_in_view_alloc(&mut self, r: usize) -> &mut Row {
        let abs = self.absolute_in_view(r);
        self.row_abs_alloc(abs)
    }

    /// Swap two logical rows' storage (IL/DL rotate in terms of this).
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        debug_assert_ne!(a, b);
        let (a, b) = (self.absolute(a), self.absolute(b));
        self.rows.swap(a, b);
    }

    // --- scrolling ---------------------------------------------------

    /// Full-screen scroll up on the primary grid: advance `offset` by
    /// `n`, dragging `view` along when it was following, and reset the
    /// `n` slots that become the new bottom rows. No cell copying.
    pub fn advance_offset(&mut self, n: usize, screen_rows: usize, erase_attrs: Attrs) {
        debug_assert!(n <= screen_rows, "scroll clamped by the caller");
        let follow = self.view_follows_offset();
        self.offset = (self.offset + n) & self.mask();
        if follow {
            self.view = self.offset;
        }
        for r in screen_rows - n..screen_rows {
            let abs = self.absolute(r);
            let cols = self.num_cols;
            match &mut self.rows[abs] {
                Some(row) => row.reset(erase_attrs),
                slot @ None => {
                    let mut row = Row::new(cols);
                    row.blank_range(0..cols, erase_attrs);
                    *slot = Some(row);
                }
            }
        }
    }

    /// Full-screen reverse scroll: back `offset` up by `n` and reset
    /// the slots that become the new top rows.
    pub fn retreat_offset(&mut self, n: usize, erase_attrs: Attrs) {
        let follow = self.view_follows_offset();
        self.offset = (self.offset + self.num_rows() - n) & self.mask();
        if follow {
            self.view = self.offset;
        }
        for r in 0..n {
            let abs = self.absolute(r);
            let cols = self.num_cols;
            match &mut self.rows[abs] {
                Some(row) => row.reset(erase_attrs),
                slot @ None => {
                    let mut row = Row::new(cols);
                    row.blank_range(0..cols, erase_attrs);
                    *slot = Some(row);
                }
            }
        }
    }

    /// Place `offset` (and `view`) at an arbitrary slot. Reflow
    /// assembles a new ring in slot space and then anchors it here;
    /// nothing is cleared.
    pub fn force_origin(&mut self, slot: usize) {
        debug_assert!(slot < self.num_rows());
        self.offset = slot;
        self.view = slot;
    }

    // --- damage ------------------------------------------------------

    pub fn push_damage(&mut self, damage: Damage) {
        self.damage.push(damage);
    }

    pub fn take_damage(&mut self) -> Vec<Damage> {
        std::mem::take(&mut self.damage)
    }

    pub fn clear_damage(&mut self) {
        self.damage.clear();
    }

    pub fn has_damage(&self) -> bool {
        !self.damage.is_empty()
    }

    /// Mark every allocated cell in the viewport not-clean.
    pub fn damage_view(&mut self, screen_rows: usize) {
        for r in 0..screen_rows {
            let abs = self.absolute_in_view(r);
            if let Some(row) = self.rows[abs].as_mut() {
                row.dirty = true;
                for cell in row.cells_mut() {
                    cell.set_clean(false);
                }
            }
        }
    }

    /// Mark logical rows `[start, end)` fully damaged.
    pub fn damage_rows(&mut self, range: std::ops::Range<usize>) {
        for r in range {
            let abs = self.absolute(r);
            if let Some(row) = self.rows[abs].as_mut() {
                row.dirty = true;
                for cell in row.cells_mut() {
                    cell.set_clean(false);
                }
            }
        }
    }

    // --- maintenance -------------------------------------------------

    /// Drop all rows, scrollback and sixels (RIS).
    pub fn reset(&mut self) {
        for slot in &mut self.rows {
            *slot = None;
        }
        self.offset = 0;
        self.view = 0;
        self.damage.clear();
        self.sixels.clear();
    }

    /// Drop scrollback rows only (ED 3): every allocated slot outside
    /// the current screen.
    pub fn clear_scrollback(&mut self, screen_rows: usize) {
        let screen: Vec<usize> = (0..screen_rows).map(|r| self.absolute(r)).collect();
        for abs in 0..self.num_rows() {
            if !screen.contains(&abs) {
                self.rows[abs] = None;
            }
        }
        self.view = self.offset;
        let mask = self.num_rows() - 1;
        self.sixels.retain(|s| {
            screen.contains(&(s.pos.row & mask)) || screen.contains(&(s.end_row() & mask))
        });
    }

    /// Debug-only structural verification of the sixel list: sorted by
    /// scrollback-relative end row descending, no overlaps, no image
    /// crossing the ring wrap-around.
    pub fn verify_sixels(&self, screen_rows: usize) {
        #[cfg(debug_assertions)]
        {
            let mut prev_end = usize::MAX;
            let mut prev_cols = 0..0;
            for s in &self.sixels {
                let end_abs = s.end_row();
                assert!(end_abs < self.num_rows(), "sixel crosses ring wrap");
                let end = self.rebase_row(end_abs, screen_rows);
                assert!(end <= prev_end, "sixel list not end-row descending");
                if end == prev_end {
                    let c = s.col_range();
                    assert!(
                        c.end <= prev_cols.start || prev_cols.end <= c.start,
                        "same-end-row sixels overlap in columns"
                    );
                }
                prev_end = end;
                prev_cols = s.col_range();
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = screen_rows;
    }
}
