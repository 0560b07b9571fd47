//! Resize and reflow.
//!
//! The primary grid reflows: soft-wrapped rows are joined back into
//! logical lines (via the `linebreak` bit), then re-split at the new
//! width, with the cursor carried through as a (line, offset) marker.
//! The alternate grid never reflows; it is truncated or padded.
//!
//! Sixels are remapped when their anchor row survives the rebuild and
//! the image still fits (no ring crossing, no horizontal overflow, no
//! overlap with an already-remapped image); otherwise they are
//! dropped.

use crate::{selection, Term};
use core_grid::{Cell, Grid, Row, ScrollRegion, SixelImage};
use std::collections::HashMap;

/// One joined logical line plus provenance for cursor/sixel remapping.
struct LogicalLine {
    cells: Vec<Cell>,
    /// Ends in a hard newline.
    hard: bool,
}

impl Term {
    pub fn resize(&mut self, new_cols: usize, new_rows: usize) {
        let new_cols = new_cols.max(1);
        let new_rows = new_rows.max(1);
        if new_cols == self.cols && new_rows == self.rows {
            return;
        }
        tracing::debug!(
            target: "term.resize",
            from = ?(self.cols, self.rows),
            to = ?(new_cols, new_rows),
            "resizing"
        );

        selection::cancel(self);
        self.search_cancel();

        resize_alt(self, new_cols, new_rows);
        reflow_primary(self, new_cols, new_rows);

        self.cols = new_cols;
        self.rows = new_rows;
        self.scroll_region = ScrollRegion::new(0, new_rows);
        self.tab_stops = crate::default_tab_stops(new_cols, 8);
        self.cursor.row = self.cursor.row.min(new_rows - 1);
        self.cursor.col = self.cursor.col.min(new_cols - 1);
        self.cursor.pending_wrap = false;
        self.damage_all();
    }
}

/// Alternate grid: truncate or pad, no reflow, drop all images that no
/// longer fit.
fn resize_alt(term: &mut Term, new_cols: usize, new_rows: usize) {
    let mut fresh = Grid::new(new_cols, new_rows, 0);
    let keep = new_rows.min(term.rows);
    for r in 0..keep {
        if let Some(old) = term.alt.row(r) {
            let mut row = old.clone();
            row.resize(new_cols);
            *fresh.row_alloc(r) = row;
        }
    }
    fresh.sixels = std::mem::take(&mut term.alt.sixels)
        .into_iter()
        .filter(|s| {
            s.pos.col + s.cols <= new_cols
                && s.end_row() < fresh.num_rows()
                && s.rows <= new_rows
        })
        .collect();
    term.alt = fresh;

    if term.alt_active {
        term.cursor.row = term.cursor.row.min(new_rows - 1);
        term.cursor.col = term.cursor.col.min(new_cols - 1);
    }
}

fn reflow_primary(term: &mut Term, new_cols: usize, new_rows: usize) {
    let grid = &term.normal;
    let mask = grid.num_rows() - 1;
    let rows = term.rows;
    let scrollback_start = (grid.offset() + rows) & mask;

    // Make sure the cursor row exists so it yields a marker.
    let cursor_abs = grid.absolute(term.cursor.row);
    term.normal.row_abs_alloc(cursor_abs);
    let grid = &term.normal;

    // --- join rows into logical lines --------------------------------
    let mut lines: Vec<LogicalLine> = Vec::new();
    let mut current: Vec<Cell> = Vec::new();
    let mut current_open = false;
    // abs source row -> (line index, cell offset of the row's start).
    let mut provenance: HashMap<usize, (usize, usize)> = HashMap::new();

    // Walk up to the last populated row (or the cursor row, whichever
    // is later in scrollback order).
    let mut last_rel = grid.rebase_row(cursor_abs, rows);
    for rel in 0..grid.num_rows() {
        let abs = (scrollback_start + rel) & mask;
        if grid.row_abs(abs).is_some() {
            last_rel = last_rel.max(rel);
        }
    }

    let mut seen_content = false;
    for rel in 0..=last_rel {
        let abs = (scrollback_start + rel) & mask;
        match grid.row_abs(abs) {
            None => {
                if seen_content {
                    // A gap inside history: preserve vertical shape as
                    // an empty hard line.
                    if current_open {
                        lines.push(LogicalLine {
                            cells: std::mem::take(&mut current),
                            hard: true,
                        });
                        current_open = false;
                    }
                    lines.push(LogicalLine {
                        cells: Vec::new(),
                        hard: true,
                    });
                }
            }
            Some(row) => {
                seen_content = true;
                if !current_open {
                    current_open = true;
                }
                provenance.insert(abs, (lines.len(), current.len()));
                let used = row.used_cols();
                current.extend_from_slice(&row.cells()[..used]);
                if row.linebreak {
                    lines.push(LogicalLine {
                        cells: std::mem::take(&mut current),
                        hard: true,
                    });
                    current_open = false;
                } else {
                    // Soft wrap: pad to the full old width so offsets
                    // stay column-accurate for the cursor marker.
                    let base = provenance[&abs].1;
                    current.resize(base + term.cols, Cell::default());
                }
            }
        }
    }
    if current_open {
        lines.push(LogicalLine {
            cells: std::mem::take(&mut current),
            hard: false,
        });
    }
    if lines.is_empty() {
        lines.push(LogicalLine {
            cells: Vec::new(),
            hard: true,
        });
    }

    // Cursor marker.
    let (cursor_line, cursor_offset) = match provenance.get(&cursor_abs) {
        Some(&(line, base)) => (line, base + term.cursor.col),
        None => (lines.len() - 1, 0),
    };

    // --- re-split at the new width -----------------------------------
    let mut fresh = Grid::new(new_cols, new_rows, term.scrollback_lines);
    let new_ring = fresh.num_rows();

    // Global row streams per line, for cursor & sixel remapping.
    let mut chunk_rows: Vec<Vec<usize>> = Vec::with_capacity(lines.len());
    let mut total: usize = 0;

    struct PendingRow {
        cells: Vec<Cell>,
        linebreak: bool,
    }
    let mut out_rows: Vec<PendingRow> = Vec::new();

    for line in &lines {
        let mut starts = Vec::new();
        let mut i = 0;
        loop {
            starts.push(total);
            let mut row_cells: Vec<Cell> = Vec::with_capacity(new_cols);
            while i < line.cells.len() && row_cells.len() < new_cols {
                let cell = line.cells[i];
                // Never split a wide leader from its spacer.
                let wide = i + 1 < line.cells.len() && line.cells[i + 1].is_spacer();
                if wide && row_cells.len() + 2 > new_cols {
                    if row_cells.is_empty() {
                        // A wide glyph cannot fit a one-column grid at
                        // all; drop the pair so the split progresses.
                        i += 2;
                        continue;
                    }
                    break;
                }
                row_cells.push(cell);
                i += 1;
            }
            let done = i >= line.cells.len();
            out_rows.push(PendingRow {
                cells: row_cells,
                linebreak: done && line.hard,
            });
            total += 1;
            if done {
                break;
            }
        }
        chunk_rows.push(starts);
    }

    // Keep at most the ring's worth of rows.
    let dropped = total.saturating_sub(new_ring);

    let cursor_global = {
        let starts = &chunk_rows[cursor_line];
        let chunk = (cursor_offset / new_cols).min(starts.len() - 1);
        starts[chunk]
    };
    let cursor_col_new = (cursor_offset % new_cols).min(new_cols - 1);

    // Bottom-align content; keep the cursor on screen.
    let last_global = total - 1;
    let bottom = last_global.max(cursor_global);
    let mut offset_idx = (bottom + 1).saturating_sub(new_rows);
    if cursor_global < offset_idx {
        offset_idx = cursor_global;
    }
    offset_idx = offset_idx.max(dropped);

    for (global, pending) in out_rows.into_iter().enumerate().skip(dropped) {
        let slot = global % new_ring;
        let row = fresh.row_abs_alloc(slot);
        let mut cells = pending.cells;
        cells.resize(new_cols, Cell::default());
        *row = Row::new(new_cols);
        for (i, c) in cells.into_iter().enumerate() {
            *row.cell_mut(i) = c;
        }
        row.linebreak = pending.linebreak;
        row.dirty = true;
    }

    // Point offset/view at the right slot without touching rows.
    let offset_slot = offset_idx % new_ring;
    fresh.force_origin(offset_slot);

    // --- remap sixels -------------------------------------------------
    let old_sixels = std::mem::take(&mut term.normal.sixels);
    let mut kept: Vec<SixelImage> = Vec::new();
    for six in old_sixels {
        let Some(&(line, base)) = provenance.get(&six.pos.row) else {
            continue;
        };
        let offset = base + six.pos.col;
        let starts = &chunk_rows[line];
        let chunk = offset / new_cols;
        if chunk >= starts.len() {
            continue;
        }
        let new_global = starts[chunk];
        if new_global < dropped {
            continue;
        }
        let new_abs = new_global % new_ring;
        let fits_ring = new_abs + six.rows <= new_ring;
        let fits_cols = six.pos.col + six.cols <= new_cols;
        let fits_rows = six.rows <= new_rows;
        if !(fits_ring && fits_cols && fits_rows) {
            continue;
        }
        let overlaps = kept.iter().any(|k: &SixelImage| {
            let rows_overlap = new_abs <= k.end_row() && k.pos.row <= new_abs + six.rows - 1;
            let cols_overlap =
                six.pos.col < k.pos.col + k.cols && k.pos.col < six.pos.col + six.cols;
            rows_overlap && cols_overlap
        });
        if overlaps {
            continue;
        }
        let mut six = six;
        six.pos.row = new_abs;
        kept.push(six);
    }
    // Restore end-row-descending order in the new ring.
    let scrollback_start = (offset_slot + new_rows) % new_ring;
    kept.sort_by_key(|s| {
        std::cmp::Reverse((s.end_row() + new_ring - scrollback_start) % new_ring)
    });
    fresh.sixels = kept;

    term.normal = fresh;

    if !term.alt_active {
        term.cursor.row = cursor_global.saturating_sub(offset_idx).min(new_rows - 1);
        term.cursor.col = cursor_col_new;
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::Term;

    #[test]
    fn widen_rejoins_wrapped_lines() {
        let mut t = Term::new(4, 3, 8);
        feed(&mut t, b"abcdefg\r\nxy");
        assert_eq!(screen_text(&t), vec!["abcd", "efg", "xy"]);
        t.resize(10, 3);
        assert_eq!(screen_text(&t), vec!["abcdefg", "xy", ""]);
    }

    #[test]
    fn narrow_rewraps() {
        let mut t = Term::new(10, 4, 8);
        feed(&mut t, b"abcdefg\r\nxy");
        t.resize(4, 4);
        assert_eq!(screen_text(&t), vec!["abcd", "efg", "xy", ""]);
    }

    #[test]
    fn cursor_follows_its_character() {
        let mut t = Term::new(10, 4, 8);
        feed(&mut t, b"hello");
        // Cursor sits after 'o' at col 5.
        t.resize(4, 4);
        // "hello" wraps to "hell" / "o"; the cursor lands after 'o'.
        assert_eq!(screen_text(&t)[0], "hell");
        assert_eq!(screen_text(&t)[1], "o");
        assert_eq!(t.cursor().row, 1);
        assert_eq!(t.cursor().col, 1);
    }

    #[test]
    fn hard_lines_never_join() {
        let mut t = Term::new(10, 4, 8);
        feed(&mut t, b"ab\r\ncd");
        t.resize(20, 4);
        assert_eq!(screen_text(&t), vec!["ab", "cd", "", ""]);
    }

    #[test]
    fn shrink_rows_pushes_into_scrollback() {
        let mut t = Term::new(10, 4, 8);
        feed(&mut t, b"1\r\n2\r\n3\r\n4");
        t.resize(10, 2);
        assert_eq!(screen_text(&t), vec!["3", "4"]);
        // The earlier lines are reachable as scrollback.
        let g = t.grid();
        let above = (g.view() + g.num_rows() - 1) & (g.num_rows() - 1);
        assert!(g.row_abs(above).is_some());
    }

    #[test]
    fn grow_rows_reveals_scrollback_bottom_aligned() {
        let mut t = Term::new(10, 2, 8);
        feed(&mut t, b"1\r\n2\r\n3\r\n4");
        assert_eq!(screen_text(&t), vec!["3", "4"]);
        t.resize(10, 4);
        let text = screen_text(&t);
        assert!(text.contains(&"4".to_string()));
        assert!(text.contains(&"3".to_string()));
    }

    #[test]
    fn wide_char_not_split_on_rewrap() {
        let mut t = Term::new(6, 3, 8);
        feed(&mut t, "ab你cd".as_bytes());
        t.resize(3, 3);
        let text = screen_text(&t);
        // The wide glyph moved wholly onto one row.
        assert!(text.iter().any(|l| l.contains('你')));
        for line in &text {
            assert!(!line.contains('\u{fffd}'));
        }
    }

    #[test]
    fn alt_screen_truncates_not_reflows() {
        let mut t = Term::new(8, 4, 8);
        feed(&mut t, b"\x1b[?1049habcdefgh12");
        assert_eq!(screen_text(&t)[0], "abcdefgh");
        t.resize(4, 4);
        // No reflow: row 0 truncated, wrapped tail kept on row 1.
        assert_eq!(screen_text(&t)[0], "abcd");
        assert_eq!(screen_text(&t)[1], "12");
    }

    #[test]
    fn sixel_dropped_when_too_wide() {
        let mut t = Term::new(20, 6, 8);
        t.set_cell_metrics(2, 6);
        feed(&mut t, b"\x1bPq#1!20~\x1b\\");
        assert_eq!(t.grid().sixels.len(), 1);
        t.resize(4, 6);
        assert!(t.grid().sixels.is_empty());
    }

    #[test]
    fn resize_is_noop_for_same_geometry() {
        let mut t = Term::new(10, 4, 8);
        feed(&mut t, b"stable");
        let before = screen_text(&t);
        t.resize(10, 4);
        assert_eq!(screen_text(&t), before);
    }
}
