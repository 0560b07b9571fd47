//! Selection extraction: grid cells → text.
//!
//! Rules (per selection kind):
//! * Spacer cells (right half of wide glyphs) are skipped.
//! * Crossing into a new row emits a newline only when the previous
//!   row ended with a hard linebreak, trailed empty cells, or the new
//!   row starts empty — soft-wrapped text flows through. Block
//!   selections always break between rows.
//! * Empty cells are buffered and only materialize (as spaces) when
//!   non-empty content follows on the same line; trailing blanks
//!   vanish.
//! * A `\t` cell re-absorbs the spaces that were laid down after it,
//!   up to its tab stop, so round-tripped text keeps real tabs.

use crate::{SelectionKind, Term};

struct Extractor<'t> {
    term: &'t Term,
    out: String,
    empty_count: usize,
    newline_count: usize,
    tab_spaces_left: usize,
    first_cell_done: bool,
    prev_row_abs: Option<usize>,
    kind: SelectionKind,
}

impl<'t> Extractor<'t> {
    fn new(term: &'t Term, kind: SelectionKind) -> Self {
        Self {
            term,
            out: String::new(),
            empty_count: 0,
            newline_count: 0,
            tab_spaces_left: 0,
            first_cell_done: false,
            prev_row_abs: None,
            kind,
        }
    }

    fn flush_pending(&mut self) {
        for _ in 0..self.newline_count {
            self.out.push('\n');
        }
        for _ in 0..self.empty_count {
            self.out.push(' ');
        }
        self.newline_count = 0;
        self.empty_count = 0;
    }

    fn row_transition(&mut self, new_row_first_is_empty: bool) {
        let Some(prev_abs) = self.prev_row_abs else {
            return;
        };
        if self.kind == SelectionKind::Block {
            self.flush_pending_newlines_only();
            self.out.push('\n');
            self.empty_count = 0;
        } else {
            let prev_linebreak = self
                .term
                .grid()
                .row_abs(prev_abs)
                .map(|r| r.linebreak)
                .unwrap_or(true);
            if prev_linebreak || self.empty_count > 0 || new_row_first_is_empty {
                // Defer the newline until non-empty content follows;
                // the blanks before it are dropped.
                self.newline_count += 1;
                self.empty_count = 0;
            }
        }
        self.tab_spaces_left = 0;
    }

    fn flush_pending_newlines_only(&mut self) {
        for _ in 0..self.newline_count {
            self.out.push('\n');
        }
        self.newline_count = 0;
    }

    fn cell(&mut self, abs: usize, col: usize) {
        let Some(row) = self.term.grid().row_abs(abs) else {
            self.prev_row_abs = Some(abs);
            return;
        };
        let cell = row.cell(col);

        if cell.is_spacer() {
            return;
        }

        if self.first_cell_done && self.prev_row_abs != Some(abs) {
            self.row_transition(cell.is_empty());
        }
        self.prev_row_abs = Some(abs);
        self.first_cell_done = true;

        if cell.codepoint() == Some(' ') && self.tab_spaces_left > 0 {
            self.tab_spaces_left -= 1;
            return;
        }
        self.tab_spaces_left = 0;

        if cell.is_empty() {
            self.empty_count += 1;
            return;
        }

        self.flush_pending();

        if cell.is_composed() {
            if let Some(chars) = self.term.composed().lookup(cell.content) {
                self.out.extend(chars.iter());
            }
        } else if let Some(c) = cell.codepoint() {
            self.out.push(c);
            if c == '\t' {
                let next = self.term.next_tab_stop(col);
                self.tab_spaces_left = next.saturating_sub(col);
            }
        }
    }

    fn finish(mut self) -> String {
        if self.kind == SelectionKind::Line && !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }
}

/// Extract `[start, end]` (both inclusive, absolute coordinates).
pub(crate) fn extract_range(
    term: &Term,
    start: (usize, usize),
    end: (usize, usize),
    kind: SelectionKind,
) -> String {
    let grid = term.grid();
    let mask = grid.num_rows() - 1;
    let rows = term.rows;
    let cols = term.cols;

    let rel_start = grid.rebase_row(start.0, rows);
    let rel_end = grid.rebase_row(end.0, rows);
    debug_assert!(rel_start <= rel_end);

    let mut ex = Extractor::new(term, kind);

    for rel in rel_start..=rel_end {
        let abs = (start.0 + (rel - rel_start)) & mask;
        let (from, to) = match kind {
            SelectionKind::Block => (start.1.min(end.1), start.1.max(end.1)),
            _ => {
                let from = if rel == rel_start { start.1 } else { 0 };
                let to = if rel == rel_end { end.1 } else { cols - 1 };
                (from, to)
            }
        };
        for col in from..=to {
            ex.cell(abs, col);
        }
    }

    ex.finish()
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::{SelectionKind, Term};

    fn select_all_text(t: &mut Term, end_row: usize, kind: SelectionKind) -> String {
        t.selection_start(0, 0, kind);
        t.selection_update(end_row, t.cols() - 1);
        t.selection_text().unwrap()
    }

    #[test]
    fn trailing_blanks_dropped() {
        let mut t = Term::new(10, 2, 0);
        feed(&mut t, b"hi");
        assert_eq!(select_all_text(&mut t, 0, SelectionKind::Character), "hi");
    }

    #[test]
    fn hard_break_emits_newline() {
        let mut t = Term::new(10, 3, 0);
        feed(&mut t, b"one\r\ntwo");
        assert_eq!(
            select_all_text(&mut t, 1, SelectionKind::Character),
            "one\ntwo"
        );
    }

    #[test]
    fn soft_wrap_flows_through() {
        let mut t = Term::new(4, 3, 0);
        feed(&mut t, b"abcdefg");
        assert_eq!(
            select_all_text(&mut t, 1, SelectionKind::Character),
            "abcdefg"
        );
    }

    #[test]
    fn interior_blanks_become_spaces() {
        let mut t = Term::new(12, 2, 0);
        feed(&mut t, b"a\x1b[1;5Hb");
        assert_eq!(
            select_all_text(&mut t, 0, SelectionKind::Character),
            "a   b"
        );
    }

    #[test]
    fn wide_chars_round_trip() {
        let mut t = Term::new(8, 2, 0);
        feed(&mut t, "x你y".as_bytes());
        assert_eq!(
            select_all_text(&mut t, 0, SelectionKind::Character),
            "x你y"
        );
    }

    #[test]
    fn composed_graphemes_round_trip() {
        let mut t = Term::new(8, 2, 0);
        feed(&mut t, "e\u{301}!".as_bytes());
        assert_eq!(
            select_all_text(&mut t, 0, SelectionKind::Character),
            "e\u{301}!"
        );
    }

    #[test]
    fn tab_recollapses() {
        let mut t = Term::new(20, 2, 0);
        feed(&mut t, b"a\tb");
        assert_eq!(select_all_text(&mut t, 0, SelectionKind::Character), "a\tb");
    }

    #[test]
    fn block_selection_cuts_columns() {
        let mut t = Term::new(10, 3, 0);
        feed(&mut t, b"abcdef\r\nghijkl\r\nmnopqr");
        t.selection_start(0, 1, SelectionKind::Block);
        t.selection_update(2, 3);
        assert_eq!(t.selection_text().unwrap(), "bcd\nhij\nnop");
    }

    #[test]
    fn line_selection_appends_newline() {
        let mut t = Term::new(10, 2, 0);
        feed(&mut t, b"line here");
        assert_eq!(
            select_all_text(&mut t, 0, SelectionKind::Line),
            "line here\n"
        );
    }

    #[test]
    fn utf8_print_extract_round_trip() {
        let mut t = Term::new(24, 2, 0);
        let text = "héllo wörld ñ";
        feed(&mut t, text.as_bytes());
        assert_eq!(
            select_all_text(&mut t, 0, SelectionKind::Character),
            text
        );
    }
}
