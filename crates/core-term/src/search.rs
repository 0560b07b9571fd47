//! Incremental scrollback search.
//!
//! The query is a plain codepoint sequence. Matching scans backward
//! from the current match (or from the bottom of the screen) and walks
//! forward through row wraps to confirm a full match; the viewport
//! follows the match. Committing turns the match into a selection.

use crate::{SelectionKind, Term};

#[derive(Debug, Default)]
pub struct Search {
    pub active: bool,
    pub query: Vec<char>,
    /// Start of the current match: absolute row + column.
    pub match_pos: Option<(usize, usize)>,
    pub match_len: usize,
    original_view: usize,
    view_followed_offset: bool,
}

impl Term {
    pub fn search_is_active(&self) -> bool {
        self.search.active
    }

    pub fn search_query(&self) -> &[char] {
        &self.search.query
    }

    pub fn search_begin(&mut self) {
        self.search = Search {
            active: true,
            original_view: self.grid().view(),
            view_followed_offset: self.grid().view_follows_offset(),
            ..Search::default()
        };
        tracing::debug!(target: "term.search", "search started");
    }

    /// Abort: restore the viewport to where it was (or to the live
    /// bottom if it was following).
    pub fn search_cancel(&mut self) {
        if !self.search.active {
            return;
        }
        let view = if self.search.view_followed_offset {
            self.grid().offset()
        } else {
            self.search.original_view
        };
        self.grid_mut().set_view(view);
        self.selection_cancel();
        self.search = Search::default();
        self.damage_view();
    }

    /// Commit: the match becomes the selection (already is, by way of
    /// update) and search mode ends with the viewport left in place.
    pub fn search_commit(&mut self) -> Option<String> {
        if !self.search.active {
            return None;
        }
        let text = self.selection_finalize();
        self.search.active = false;
        text
    }

    pub fn search_push(&mut self, c: char) {
        if !self.search.active {
            return;
        }
        self.search.query.push(c);
        self.search_update();
    }

    pub fn search_pop(&mut self) {
        if !self.search.active {
            return;
        }
        self.search.query.pop();
        self.search_update();
    }

    /// Step to the previous (older) match of the current query.
    pub fn search_find_prev(&mut self) {
        if self.search.match_len == 0 {
            return;
        }
        if let Some((row, col)) = self.search.match_pos {
            let mask = self.grid().num_rows() - 1;
            let (row, col) = if col > 0 {
                (row, col - 1)
            } else {
                ((row + mask) & mask, self.cols - 1)
            };
            // Only step back if the new anchor is still in history.
            if self.grid().row_abs(row).is_some() {
                self.search.match_pos = Some((row, col));
                self.search_update();
            }
        }
    }

    fn search_update(&mut self) {
        if self.search.query.is_empty() {
            self.search.match_pos = None;
            self.search.match_len = 0;
            self.selection_cancel();
            return;
        }

        let anchor = self.search.match_pos.unwrap_or_else(|| {
            (
                self.grid().absolute(self.rows - 1),
                self.cols - 1,
            )
        });

        match self.scan_backward(anchor) {
            Some((start, end)) => {
                self.apply_match(start, end);
            }
            None => {
                self.search.match_pos = None;
                self.search.match_len = 0;
                self.selection_cancel();
            }
        }
    }

    /// Scan backward (in scrollback order) from `anchor` for the
    /// query, following soft wraps forward while matching. Returns the
    /// start and end cells of the match (both inclusive).
    fn scan_backward(&self, anchor: (usize, usize)) -> Option<((usize, usize), (usize, usize))> {
        let grid = self.grid();
        let rows = self.rows;
        let mask = grid.num_rows() - 1;
        let query = &self.search.query;

        let mut rel = grid.rebase_row(anchor.0, rows);
        let mut col = anchor.1;
        let scrollback_start = (grid.offset() + rows) & mask;

        loop {
            let abs = (scrollback_start + rel) & mask;
            if grid.row_abs(abs).is_some() {
                'cols: while col != usize::MAX {
                    if let Some(end) = self.matches_at(abs, col, query) {
                        return Some(((abs, col), end));
                    }
                    if col == 0 {
                        break 'cols;
                    }
                    col -= 1;
                }
            }
            if rel == 0 {
                return None;
            }
            rel -= 1;
            col = self.cols - 1;
        }
    }

    /// Match the query starting at `(abs, col)`, walking forward over
    /// wide-glyph spacers and soft wraps. Returns the cell of the last
    /// matched codepoint — the walk is the only place the true end is
    /// known, since wide glyphs consume two columns.
    fn matches_at(&self, abs: usize, col: usize, query: &[char]) -> Option<(usize, usize)> {
        let grid = self.grid();
        let mask = grid.num_rows() - 1;
        let rows = self.rows;

        let (mut r, mut c) = (abs, col);
        for (i, &q) in query.iter().enumerate() {
            let row = grid.row_abs(r)?;
            let cell = row.cell(c);
            // A spacer can't start a codepoint comparison.
            if cell.is_spacer() || cell.codepoint() != Some(q) {
                return None;
            }
            if i + 1 == query.len() {
                return Some((r, c));
            }
            // Advance; wide chars take two columns.
            let step = if c + 1 < self.cols && row.cell(c + 1).is_spacer() {
                2
            } else {
                1
            };
            c += step;
            if c >= self.cols {
                let next = (r + 1) & mask;
                // Wrapping past the bottom screen row lands back at
                // the scrollback start; rebase order detects it.
                if grid.rebase_row(next, rows) < grid.rebase_row(r, rows) {
                    return None;
                }
                r = next;
                c = 0;
            }
        }
        None // empty queries are rejected before scanning
    }

    fn apply_match(&mut self, start: (usize, usize), end: (usize, usize)) {
        self.search.match_pos = Some(start);
        self.search.match_len = self.search.query.len();

        // Scroll the viewport so the match is visible: at the match
        // row, moved down past never-written rows, and never below the
        // live screen position.
        let grid = self.grid();
        let rows = self.rows;
        let mask = grid.num_rows() - 1;
        let scrollback_start = (grid.offset() + rows) & mask;
        let rel_match = grid.rebase_row(start.0, rows);
        let rel_offset = grid.rebase_row(grid.offset(), rows);

        let mut rel_view = rel_match.min(rel_offset);
        while rel_view < rel_offset {
            let top = (scrollback_start + rel_view) & mask;
            let all_there = (0..rows).all(|i| grid.row_abs((top + i) & mask).is_some());
            if all_there {
                break;
            }
            rel_view += 1;
        }
        let view_abs = (scrollback_start + rel_view) & mask;

        self.grid_mut().set_view(view_abs);
        self.damage_view();

        // Mirror the match as a selection, using the end cell the
        // match walk produced (wide glyphs and wraps included). A wide
        // final glyph drags its spacer along so the highlight covers
        // the whole glyph.
        let mut sel_end = end;
        if let Some(row) = self.grid().row_abs(end.0) {
            if end.1 + 1 < self.cols && row.cell(end.1 + 1).is_spacer() {
                sel_end.1 += 1;
            }
        }
        self.selection.kind = SelectionKind::Character;
        self.selection.start = Some(start);
        self.selection.end = Some(sel_end);
        self.selection_sync();
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::Term;

    fn type_query(t: &mut Term, q: &str) {
        for c in q.chars() {
            t.search_push(c);
        }
    }

    #[test]
    fn finds_text_on_screen() {
        let mut t = Term::new(20, 4, 16);
        feed(&mut t, b"alpha\r\nbeta\r\ngamma");
        t.search_begin();
        type_query(&mut t, "beta");
        assert!(t.search.match_pos.is_some());
        assert_eq!(t.selection_text().unwrap(), "beta");
    }

    #[test]
    fn narrows_as_query_grows() {
        let mut t = Term::new(20, 4, 16);
        feed(&mut t, b"cat\r\ncatalog");
        t.search_begin();
        type_query(&mut t, "cata");
        // The later (lower) occurrence matches first.
        assert_eq!(t.selection_text().unwrap(), "cata");
        let (row, _) = t.search.match_pos.unwrap();
        assert_eq!(row, t.grid().absolute(1));
    }

    #[test]
    fn backspace_requeries() {
        let mut t = Term::new(20, 4, 16);
        feed(&mut t, b"foo\r\nfob");
        t.search_begin();
        type_query(&mut t, "fox");
        assert!(t.search.match_pos.is_none());
        t.search_pop();
        assert!(t.search.match_pos.is_some());
    }

    #[test]
    fn wide_chars_keep_the_match_end_honest() {
        let mut t = Term::new(20, 3, 8);
        feed(&mut t, "ab终端模x".as_bytes());
        t.search_begin();
        for c in "b终端模".chars() {
            t.search_push(c);
        }
        // Each CJK glyph spans two columns; the selection must still
        // cover the full match.
        assert_eq!(t.selection_text().unwrap(), "b终端模");
    }

    #[test]
    fn wide_match_end_survives_a_wrap() {
        // Two wide glyphs per 5-column row force the match across the
        // soft wrap with spacers in play.
        let mut t = Term::new(5, 3, 8);
        feed(&mut t, "x终端模".as_bytes());
        t.search_begin();
        for c in "终端模".chars() {
            t.search_push(c);
        }
        assert_eq!(t.selection_text().unwrap(), "终端模");
    }

    #[test]
    fn match_crosses_soft_wrap() {
        let mut t = Term::new(4, 3, 8);
        feed(&mut t, b"xxwrapped");
        t.search_begin();
        type_query(&mut t, "wrap");
        assert!(t.search.match_pos.is_some());
        assert_eq!(t.selection_text().unwrap(), "wrap");
    }

    #[test]
    fn finds_match_in_scrollback_and_follows_view() {
        let mut t = Term::new(10, 2, 16);
        feed(&mut t, b"needle\r\n");
        for _ in 0..6 {
            feed(&mut t, b"hay\r\n");
        }
        assert!(t.grid().view_follows_offset());
        t.search_begin();
        type_query(&mut t, "needle");
        assert!(t.search.match_pos.is_some());
        // Viewport scrolled up to show it.
        assert!(!t.grid().view_follows_offset());
    }

    #[test]
    fn cancel_restores_view() {
        let mut t = Term::new(10, 2, 16);
        feed(&mut t, b"needle\r\n");
        for _ in 0..6 {
            feed(&mut t, b"hay\r\n");
        }
        t.search_begin();
        type_query(&mut t, "needle");
        t.search_cancel();
        assert!(t.grid().view_follows_offset());
        assert!(!t.search_is_active());
    }

    #[test]
    fn find_prev_steps_to_older_match() {
        let mut t = Term::new(20, 4, 16);
        feed(&mut t, b"aaa\r\nbbb\r\naaa");
        t.search_begin();
        type_query(&mut t, "aaa");
        let first = t.search.match_pos.unwrap();
        assert_eq!(first.0, t.grid().absolute(2));
        t.search_find_prev();
        let second = t.search.match_pos.unwrap();
        assert_eq!(second.0, t.grid().absolute(0));
    }

    #[test]
    fn commit_yields_selection() {
        let mut t = Term::new(20, 3, 8);
        feed(&mut t, b"hello world");
        t.search_begin();
        type_query(&mut t, "world");
        assert_eq!(t.search_commit().unwrap(), "world");
        assert!(!t.search_is_active());
    }
}
