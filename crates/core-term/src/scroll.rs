//! Scrolling, erasing and line/character insertion.
//!
//! The fast path: a full-screen scroll on the primary grid advances
//! the ring offset (rows glide into scrollback untouched, no copying).
//! Every other case rotates row storage within the region and clears
//! the rows that scrolled in. Both paths queue a scroll-damage record
//! so the renderer can blit instead of repainting.

use crate::{sixel_ops, Term};
use core_grid::{Attrs, Cell, Damage, ScrollRegion};

/// Attributes used for cells scrolled/erased in: current background,
/// no flags.
fn erase_attrs(term: &Term) -> Attrs {
    Attrs {
        bg: term.attrs.bg,
        ..Attrs::default()
    }
}

/// Scroll `region` up by `n` (content moves up; blank rows appear at
/// the bottom of the region).
pub(crate) fn scroll_up(term: &mut Term, region: ScrollRegion, n: usize) {
    let n = n.min(region.len());
    if n == 0 {
        return;
    }

    let attrs = erase_attrs(term);
    let full_screen = region.top == 0 && region.bottom == term.rows;

    if full_screen && !term.alt_active {
        sixel_ops::scroll_up_evict(term, n);
        term.normal.advance_offset(n, term.rows, attrs);
    } else {
        sixel_ops::evict_region(term, region);
        let grid = term.grid_mut();
        for r in region.top + n..region.bottom {
            grid.swap_rows(r - n, r);
        }
        for r in region.bottom - n..region.bottom {
            grid.row_alloc(r).reset(attrs);
        }
    }

    term.grid_mut().push_damage(Damage::Scroll { region, lines: n });
    crate::selection::cancel(term);
}

/// Scroll `region` down by `n` (blank rows appear at the top).
pub(crate) fn scroll_down(term: &mut Term, region: ScrollRegion, n: usize) {
    let n = n.min(region.len());
    if n == 0 {
        return;
    }

    let attrs = erase_attrs(term);
    let full_screen = region.top == 0 && region.bottom == term.rows;

    if full_screen && !term.alt_active {
        sixel_ops::scroll_down_evict(term, n);
        term.normal.retreat_offset(n, attrs);
    } else {
        sixel_ops::evict_region(term, region);
        let grid = term.grid_mut();
        for r in (region.top..region.bottom - n).rev() {
            grid.swap_rows(r, r + n);
        }
        for r in region.top..region.top + n {
            grid.row_alloc(r).reset(attrs);
        }
    }

    term.grid_mut()
        .push_damage(Damage::ScrollReverse { region, lines: n });
    crate::selection::cancel(term);
}

/// Erase cells from `start` to `end`, both inclusive, in logical
/// coordinates. Fills with the current background and invalidates any
/// sixel the rectangle touches.
pub(crate) fn erase(term: &mut Term, start: (usize, usize), end: (usize, usize)) {
    debug_assert!(start <= end);
    let attrs = erase_attrs(term);
    let cols = term.cols;

    for row_no in start.0..=end.0 {
        let from = if row_no == start.0 { start.1 } else { 0 };
        let to = if row_no == end.0 { end.1 + 1 } else { cols };
        sixel_ops::overwrite_by_row(term, row_no, from, to - from);
        let row = term.grid_mut().row_alloc(row_no);
        row.blank_range(from..to, attrs);
    }
}

/// IL: insert `n` blank lines at the cursor, pushing lines below down
/// within the scroll region. No-op outside the region.
pub(crate) fn insert_lines(term: &mut Term, n: usize) {
    if !term.scroll_region.contains(term.cursor.row) {
        return;
    }
    let region = ScrollRegion::new(term.cursor.row, term.scroll_region.bottom);
    scroll_down(term, region, n.max(1));
    term.cursor.col = 0;
    term.cursor.pending_wrap = false;
}

/// DL: delete `n` lines at the cursor within the scroll region.
pub(crate) fn delete_lines(term: &mut Term, n: usize) {
    if !term.scroll_region.contains(term.cursor.row) {
        return;
    }
    let region = ScrollRegion::new(term.cursor.row, term.scroll_region.bottom);
    scroll_up(term, region, n.max(1));
    term.cursor.col = 0;
    term.cursor.pending_wrap = false;
}

/// ICH: shift the rest of the row right, dropping cells off the end.
pub(crate) fn insert_chars(term: &mut Term, n: usize) {
    let n = n.max(1).min(term.cols - term.cursor.col);
    let (row_no, col) = (term.cursor.row, term.cursor.col);
    let cols = term.cols;
    let attrs = erase_attrs(term);

    sixel_ops::overwrite_by_row(term, row_no, col, cols - col);
    let row = term.grid_mut().row_alloc(row_no);
    let cells = row.cells_mut();
    for i in (col + n..cols).rev() {
        cells[i] = cells[i - n];
        cells[i].set_clean(false);
    }
    row.blank_range(col..col + n, attrs);
    term.cursor.pending_wrap = false;
}

/// DCH: shift the rest of the row left, blanking the tail.
pub(crate) fn delete_chars(term: &mut Term, n: usize) {
    let n = n.max(1).min(term.cols - term.cursor.col);
    let (row_no, col) = (term.cursor.row, term.cursor.col);
    let cols = term.cols;
    let attrs = erase_attrs(term);

    sixel_ops::overwrite_by_row(term, row_no, col, cols - col);
    let row = term.grid_mut().row_alloc(row_no);
    let cells = row.cells_mut();
    for i in col..cols - n {
        cells[i] = cells[i + n];
        cells[i].set_clean(false);
    }
    row.blank_range(cols - n..cols, attrs);
    term.cursor.pending_wrap = false;
}

/// ECH: blank `n` cells at the cursor; the cursor stays.
pub(crate) fn erase_chars(term: &mut Term, n: usize) {
    let n = n.max(1).min(term.cols - term.cursor.col);
    let (row_no, col) = (term.cursor.row, term.cursor.col);
    let attrs = erase_attrs(term);
    sixel_ops::overwrite_by_row(term, row_no, col, n);
    let row = term.grid_mut().row_alloc(row_no);
    row.blank_range(col..col + n, attrs);
    term.cursor.pending_wrap = false;
}

/// ED.
pub(crate) fn erase_display(term: &mut Term, mode: u16) {
    let (rows, cols) = (term.rows, term.cols);
    let (r, c) = (term.cursor.row, term.cursor.col);
    match mode {
        0 => erase(term, (r, c), (rows - 1, cols - 1)),
        1 => erase(term, (0, 0), (r, c)),
        2 => erase(term, (0, 0), (rows - 1, cols - 1)),
        3 => {
            if !term.alt_active {
                term.normal.clear_scrollback(rows);
            }
        }
        other => {
            tracing::debug!(target: "term.csi", mode = other, "unknown ED parameter");
        }
    }
}

/// EL.
pub(crate) fn erase_line(term: &mut Term, mode: u16) {
    let cols = term.cols;
    let (r, c) = (term.cursor.row, term.cursor.col);
    match mode {
        0 => erase(term, (r, c), (r, cols - 1)),
        1 => erase(term, (r, 0), (r, c)),
        2 => erase(term, (r, 0), (r, cols - 1)),
        other => {
            tracing::debug!(target: "term.csi", mode = other, "unknown EL parameter");
        }
    }
}

/// DECALN: fill the screen with `E` (alignment pattern), reset the
/// scroll region and home the cursor.
pub(crate) fn screen_alignment(term: &mut Term) {
    term.scroll_region = ScrollRegion::new(0, term.rows);
    term.cursor_to(0, 0);
    let attrs = Attrs::default();
    for r in 0..term.rows {
        let row = term.grid_mut().row_alloc(r);
        for cell in row.cells_mut() {
            *cell = Cell::blank(attrs);
            cell.write('E' as u32, attrs);
        }
        row.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::Term;

    #[test]
    fn scroll_region_confines_linefeed() {
        let mut t = Term::new(10, 5, 0);
        // Region rows 2-4 (1-based), write at the region bottom.
        feed(&mut t, b"top\x1b[2;4r\x1b[4;1Ha\nb\nc");
        // 'a' scrolled out of the region; 'top' untouched.
        assert_eq!(screen_text(&t)[0], "top");
        assert_eq!(screen_text(&t)[2], "b");
        assert_eq!(screen_text(&t)[3], "c");
    }

    #[test]
    fn one_row_region_scrolls_to_blank() {
        let mut t = Term::new(10, 4, 0);
        feed(&mut t, b"\x1b[2;2r\x1b[2;1Hxyz\x1b[2;1H\x1b[1S");
        assert_eq!(screen_text(&t)[1], "");
    }

    #[test]
    fn su_sd_respect_region() {
        let mut t = Term::new(10, 5, 0);
        feed(&mut t, b"aaa\x1b[2;1Hbbb\x1b[3;1Hccc\x1b[2;3r\x1b[1S");
        assert_eq!(screen_text(&t)[0], "aaa");
        assert_eq!(screen_text(&t)[1], "ccc");
        assert_eq!(screen_text(&t)[2], "");
        feed(&mut t, b"\x1b[1T");
        assert_eq!(screen_text(&t)[1], "");
        assert_eq!(screen_text(&t)[2], "ccc");
    }

    #[test]
    fn il_dl() {
        let mut t = Term::new(10, 4, 0);
        feed(&mut t, b"one\x1b[2;1Htwo\x1b[3;1Hthree\x1b[2;1H\x1b[L");
        assert_eq!(screen_text(&t), vec!["one", "", "two", "three"]);
        feed(&mut t, b"\x1b[2M");
        assert_eq!(screen_text(&t), vec!["one", "three", "", ""]);
    }

    #[test]
    fn ich_dch_ech() {
        let mut t = Term::new(8, 2, 0);
        feed(&mut t, b"abcdef\x1b[1;3H\x1b[2@");
        assert_eq!(screen_text(&t)[0], "ab  cdef");
        feed(&mut t, b"\x1b[2P");
        assert_eq!(screen_text(&t)[0], "abcdef");
        feed(&mut t, b"\x1b[2X");
        assert_eq!(screen_text(&t)[0], "ab  ef");
    }

    #[test]
    fn ed_variants() {
        let mut t = Term::new(6, 3, 0);
        feed(&mut t, b"aaaaaa\x1b[2;1Hbbbbbb\x1b[3;1Hcccccc\x1b[2;4H\x1b[0J");
        assert_eq!(screen_text(&t), vec!["aaaaaa", "bbb", ""]);

        let mut t = Term::new(6, 3, 0);
        feed(&mut t, b"aaaaaa\x1b[2;1Hbbbbbb\x1b[3;1Hcccccc\x1b[2;4H\x1b[1J");
        assert_eq!(screen_text(&t), vec!["", "    bb", "cccccc"]);

        let mut t = Term::new(6, 3, 0);
        feed(&mut t, b"aaaaaa\x1b[2J");
        assert_eq!(screen_text(&t), vec!["", "", ""]);
    }

    #[test]
    fn el_variants() {
        let mut t = Term::new(6, 2, 0);
        feed(&mut t, b"abcdef\x1b[1;4H\x1b[K");
        assert_eq!(screen_text(&t)[0], "abc");
        feed(&mut t, b"\x1b[1;6Hx\x1b[1;2H\x1b[1K");
        assert_eq!(screen_text(&t)[0], "  c  x");
    }

    #[test]
    fn ed3_clears_scrollback_only() {
        let mut t = Term::new(4, 2, 8);
        for _ in 0..6 {
            feed(&mut t, b"x\r\n");
        }
        feed(&mut t, b"vis");
        feed(&mut t, b"\x1b[3J");
        assert_eq!(screen_text(&t)[1], "vis");
        // All scrollback slots dropped.
        let g = t.grid();
        let screen: Vec<usize> = (0..2).map(|r| g.absolute(r)).collect();
        for abs in 0..g.num_rows() {
            if !screen.contains(&abs) {
                assert!(g.row_abs(abs).is_none());
            }
        }
    }

    #[test]
    fn decaln_fills_screen() {
        let mut t = Term::new(4, 2, 0);
        feed(&mut t, b"\x1b#8");
        assert_eq!(screen_text(&t), vec!["EEEE", "EEEE"]);
    }
}
