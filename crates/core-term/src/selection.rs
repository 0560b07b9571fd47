//! Selection tracking.
//!
//! Endpoints live in scrollback-absolute coordinates (ring row + cell
//! column) so a selection survives viewport scrolling. Cells inside
//! the selection carry the `SELECTED` attribute bit; because client
//! output can overwrite those cells at any time, the renderer calls
//! [`Term::selection_sync`] once per frame to re-assert the bit over
//! the current range before painting.
//!
//! Kinds: character (exact endpoints), word (endpoints snap outward to
//! word-delimiter boundaries), line (whole logical lines, following
//! soft wraps), block (rectangular).

use crate::{extract, Term, TermEvent};
use core_grid::AttrFlags;

/// Delimiters for word-kind snapping.
const WORD_DELIMITERS: &str = " \t,│`|:\"'()[]{}<>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionKind {
    #[default]
    Character,
    Word,
    Line,
    Block,
}

#[derive(Debug, Default)]
pub struct Selection {
    pub kind: SelectionKind,
    pub(crate) start: Option<(usize, usize)>,
    pub(crate) end: Option<(usize, usize)>,
    /// Absolute rows currently carrying `SELECTED` bits, for cheap
    /// clearing.
    marked_rows: Vec<usize>,
}

impl Selection {
    pub fn is_active(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

/// Multi-click detection: consecutive clicks of the same button on the
/// same cell within the window escalate character → word → line
/// selection, then wrap around. Owned by the host (which sees raw
/// button events) and consulted when starting a selection.
#[derive(Debug)]
pub struct ClickTracker {
    window: std::time::Duration,
    count: u8,
    last_button: u8,
    last_cell: (usize, usize),
    last_time: Option<std::time::Instant>,
}

impl ClickTracker {
    pub fn new(window: std::time::Duration) -> Self {
        Self {
            window,
            count: 0,
            last_button: 0,
            last_cell: (0, 0),
            last_time: None,
        }
    }

    /// Register a press; returns the selection kind it should start.
    pub fn click(
        &mut self,
        button: u8,
        cell: (usize, usize),
        now: std::time::Instant,
    ) -> SelectionKind {
        let chained = self.last_time.is_some_and(|t| {
            now.duration_since(t) <= self.window
                && self.last_button == button
                && self.last_cell == cell
        });
        self.count = if chained { (self.count % 3) + 1 } else { 1 };
        self.last_button = button;
        self.last_cell = cell;
        self.last_time = Some(now);

        match self.count {
            1 => SelectionKind::Character,
            2 => SelectionKind::Word,
            _ => SelectionKind::Line,
        }
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(std::time::Duration::from_millis(300))
    }
}

/// Drop the selection (used by scrolling, resize, new output under the
/// selection region is handled by sync instead).
pub(crate) fn cancel(term: &mut Term) {
    if term.selection.start.is_none() && term.selection.marked_rows.is_empty() {
        return;
    }
    clear_marks(term);
    term.selection.start = None;
    term.selection.end = None;
}

fn clear_marks(term: &mut Term) {
    let rows = std::mem::take(&mut term.selection.marked_rows);
    for abs in rows {
        if let Some(row) = term.grid_mut().row_abs_mut(abs) {
            let mut changed = false;
            for cell in row.cells_mut() {
                if cell.flags.contains(AttrFlags::SELECTED) {
                    cell.flags.remove(AttrFlags::SELECTED);
                    cell.set_clean(false);
                    changed = true;
                }
            }
            row.dirty |= changed;
        }
    }
}

impl Term {
    /// Begin a selection at a viewport coordinate.
    pub fn selection_start(&mut self, view_row: usize, col: usize, kind: SelectionKind) {
        cancel(self);
        let abs = self.grid().absolute_in_view(view_row.min(self.rows - 1));
        self.selection.kind = kind;
        self.selection.start = Some((abs, col.min(self.cols - 1)));
        self.selection.end = None;
    }

    /// Extend to a new endpoint.
    pub fn selection_update(&mut self, view_row: usize, col: usize) {
        if self.selection.start.is_none() {
            return;
        }
        let abs = self.grid().absolute_in_view(view_row.min(self.rows - 1));
        self.selection.end = Some((abs, col.min(self.cols - 1)));
        self.selection_sync();
    }

    pub fn selection_cancel(&mut self) {
        cancel(self);
    }

    /// Extract the selected text and publish it as the primary
    /// selection.
    pub fn selection_finalize(&mut self) -> Option<String> {
        let text = self.selection_text()?;
        self.event(TermEvent::ClipboardSet {
            primary: true,
            data: text.clone().into_bytes(),
        });
        Some(text)
    }

    pub fn selection_text(&self) -> Option<String> {
        let (start, end) = self.selection_range()?;
        Some(extract::extract_range(
            self,
            start,
            end,
            self.selection.kind,
        ))
    }

    /// Ordered, kind-expanded endpoints (both inclusive).
    pub(crate) fn selection_range(&self) -> Option<((usize, usize), (usize, usize))> {
        let a = self.selection.start?;
        let b = self.selection.end?;
        let rows = self.rows;
        let grid = self.grid();

        let key = |(abs, col): (usize, usize)| (grid.rebase_row(abs, rows), col);
        let (mut start, mut end) = if key(a) <= key(b) { (a, b) } else { (b, a) };

        match self.selection.kind {
            SelectionKind::Character | SelectionKind::Block => {}
            SelectionKind::Word => {
                start.1 = self.snap_word_left(start);
                end.1 = self.snap_word_right(end);
            }
            SelectionKind::Line => {
                // Follow soft wraps outward.
                let mask = grid.num_rows() - 1;
                let mut top = start.0;
                loop {
                    let prev = (top + mask) & mask; // top - 1
                    match grid.row_abs(prev) {
                        Some(r) if !r.linebreak && grid.rebase_row(prev, rows) < grid.rebase_row(top, rows) => {
                            top = prev;
                        }
                        _ => break,
                    }
                }
                let mut bottom = end.0;
                loop {
                    match grid.row_abs(bottom) {
                        Some(r) if !r.linebreak => {
                            let next = (bottom + 1) & mask;
                            if grid.row_abs(next).is_some()
                                && grid.rebase_row(next, rows) > grid.rebase_row(bottom, rows)
                            {
                                bottom = next;
                            } else {
                                break;
                            }
                        }
                        _ => break,
                    }
                }
                start = (top, 0);
                end = (bottom, self.cols - 1);
            }
        }
        Some((start, end))
    }

    fn is_delimiter(&self, abs: usize, col: usize) -> bool {
        match self.grid().row_abs(abs) {
            Some(row) => match row.cell(col).codepoint() {
                Some(c) => WORD_DELIMITERS.contains(c),
                None => !row.cell(col).is_spacer() && !row.cell(col).is_composed(),
            },
            None => true,
        }
    }

    fn snap_word_left(&self, (abs, col): (usize, usize)) -> usize {
        if self.is_delimiter(abs, col) {
            return col;
        }
        let mut c = col;
        while c > 0 && !self.is_delimiter(abs, c - 1) {
            c -= 1;
        }
        c
    }

    fn snap_word_right(&self, (abs, col): (usize, usize)) -> usize {
        if self.is_delimiter(abs, col) {
            return col;
        }
        let mut c = col;
        while c + 1 < self.cols && !self.is_delimiter(abs, c + 1) {
            c += 1;
        }
        c
    }

    /// Re-assert `SELECTED` bits over the current range. Runs every
    /// frame before rendering so cells overwritten since the last
    /// frame re-acquire the bit.
    pub fn selection_sync(&mut self) {
        clear_marks(self);
        let Some((start, end)) = self.selection_range() else {
            return;
        };

        let rows = self.rows;
        let cols = self.cols;
        let block = self.selection.kind == SelectionKind::Block;
        let mask = self.grid().num_rows() - 1;

        let rel_start = self.grid().rebase_row(start.0, rows);
        let rel_end = self.grid().rebase_row(end.0, rows);

        let mut marked = Vec::with_capacity(rel_end - rel_start + 1);
        for rel in rel_start..=rel_end {
            let abs = (start.0 + (rel - rel_start)) & mask;
            let (from, to) = if block {
                (start.1.min(end.1), start.1.max(end.1))
            } else {
                let from = if rel == rel_start { start.1 } else { 0 };
                let to = if rel == rel_end { end.1 } else { cols - 1 };
                (from, to)
            };
            if let Some(row) = self.grid_mut().row_abs_mut(abs) {
                let mut changed = false;
                for col in from..=to {
                    let cell = row.cell_mut(col);
                    if !cell.flags.contains(AttrFlags::SELECTED) {
                        cell.flags.insert(AttrFlags::SELECTED);
                        cell.set_clean(false);
                        changed = true;
                    }
                }
                row.dirty |= changed;
                marked.push(abs);
            }
        }
        self.selection.marked_rows = marked;
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::{SelectionKind, Term};
    use core_grid::AttrFlags;

    #[test]
    fn char_selection_marks_cells() {
        let mut t = Term::new(10, 3, 0);
        feed(&mut t, b"hello there");
        t.selection_start(0, 1, SelectionKind::Character);
        t.selection_update(0, 3);
        let row = t.grid().row(0).unwrap();
        assert!(!row.cell(0).flags.contains(AttrFlags::SELECTED));
        for c in 1..=3 {
            assert!(row.cell(c).flags.contains(AttrFlags::SELECTED));
        }
        assert!(!row.cell(4).flags.contains(AttrFlags::SELECTED));
    }

    #[test]
    fn reversed_endpoints_normalize() {
        let mut t = Term::new(10, 3, 0);
        feed(&mut t, b"abcdef");
        t.selection_start(0, 4, SelectionKind::Character);
        t.selection_update(0, 1);
        assert_eq!(t.selection_text().unwrap(), "bcde");
    }

    #[test]
    fn word_selection_snaps() {
        let mut t = Term::new(20, 3, 0);
        feed(&mut t, b"foo bar-baz qux");
        t.selection_start(0, 5, SelectionKind::Word);
        t.selection_update(0, 5);
        assert_eq!(t.selection_text().unwrap(), "bar-baz");
    }

    #[test]
    fn overwritten_cells_reacquire_bit_on_sync() {
        let mut t = Term::new(10, 3, 0);
        feed(&mut t, b"aaaa");
        t.selection_start(0, 0, SelectionKind::Character);
        t.selection_update(0, 3);
        feed(&mut t, b"\x1b[1;2Hbb");
        let row = t.grid().row(0).unwrap();
        assert!(!row.cell(1).flags.contains(AttrFlags::SELECTED));
        t.selection_sync();
        let row = t.grid().row(0).unwrap();
        assert!(row.cell(1).flags.contains(AttrFlags::SELECTED));
    }

    #[test]
    fn cancel_clears_bits() {
        let mut t = Term::new(10, 3, 0);
        feed(&mut t, b"xyz");
        t.selection_start(0, 0, SelectionKind::Character);
        t.selection_update(0, 2);
        t.selection_cancel();
        let row = t.grid().row(0).unwrap();
        for c in 0..3 {
            assert!(!row.cell(c).flags.contains(AttrFlags::SELECTED));
        }
        assert!(t.selection_text().is_none());
    }

    #[test]
    fn click_tracker_escalates_and_resets() {
        use super::ClickTracker;
        use std::time::{Duration, Instant};
        let mut t = ClickTracker::new(Duration::from_millis(300));
        let now = Instant::now();
        assert_eq!(t.click(1, (0, 0), now), SelectionKind::Character);
        assert_eq!(
            t.click(1, (0, 0), now + Duration::from_millis(100)),
            SelectionKind::Word
        );
        assert_eq!(
            t.click(1, (0, 0), now + Duration::from_millis(200)),
            SelectionKind::Line
        );
        // Fourth quick click wraps back to character.
        assert_eq!(
            t.click(1, (0, 0), now + Duration::from_millis(250)),
            SelectionKind::Character
        );
        // Too slow, different cell, or different button resets.
        assert_eq!(
            t.click(1, (0, 0), now + Duration::from_secs(2)),
            SelectionKind::Character
        );
        assert_eq!(
            t.click(1, (3, 3), now + Duration::from_secs(2)),
            SelectionKind::Character
        );
    }

    #[test]
    fn finalize_publishes_primary() {
        let mut t = Term::new(10, 3, 0);
        feed(&mut t, b"copy me");
        t.selection_start(0, 0, SelectionKind::Character);
        t.selection_update(0, 6);
        assert_eq!(t.selection_finalize().unwrap(), "copy me");
        assert!(matches!(
            t.take_events().as_slice(),
            [crate::TermEvent::ClipboardSet { primary: true, .. }]
        ));
    }
}
