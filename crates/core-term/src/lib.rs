//! Terminal semantics: the layer between parsed control events and the
//! grid.
//!
//! [`Term`] owns both grids (primary with scrollback, alternate
//! without), cursor and saved-cursor state, the current SGR attributes,
//! charset slots, tab stops, mode flags, the sixel decoder, selection
//! and search state, and an output queue holding replies for the child
//! (DA, DSR, OSC queries). The host wires it to a `core_vt::Parser`:
//!
//! ```ignore
//! parser.advance(&mut term, &bytes_from_pty);
//! pty.write(&term.take_output())?;
//! ```
//!
//! Invariants (hold after consuming any byte stream):
//! * `0 <= cursor.row < rows` and `0 <= cursor.col < cols`.
//! * The scroll region satisfies `0 <= top < bottom <= rows`.
//! * The alternate grid never accumulates scrollback.
//! * Replies are queued in dispatch order.

pub mod base64;
pub mod charsets;
pub mod csi;
pub mod dcs;
pub mod esc;
pub mod extract;
pub mod modes;
pub mod osc;
pub mod resize;
pub mod scroll;
pub mod search;
pub mod selection;
pub mod sgr;
pub mod sixel_ops;
pub mod url;

pub use modes::TermModes;
pub use selection::{ClickTracker, Selection, SelectionKind};

use charsets::Charsets;
use core_color::palette::Palette;
use core_grid::{AttrFlags, Attrs, ComposedTable, Grid, ScrollRegion, SPACER};
use core_input::InputModes;
use core_sixel::SixelDecoder;
use core_vt::{Params, Perform};
use unicode_width::UnicodeWidthChar;

/// Cursor position in logical (screen) coordinates plus the
/// deferred-wrap latch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
    /// The next print wraps first (set when a print reached the right
    /// margin with auto-margin on).
    pub pending_wrap: bool,
}

/// DECSC/DECRC snapshot: cursor, SGR attributes, charsets, origin mode.
#[derive(Debug, Clone, Copy)]
pub struct SavedCursor {
    pub cursor: Cursor,
    pub attrs: Attrs,
    pub charsets: Charsets,
    pub origin: bool,
}

/// Cursor shapes selected by DECSCUSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Block,
    Underline,
    Bar,
}

/// Side effects the host must act on, drained once per wakeup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermEvent {
    Bell,
    TitleChanged(String),
    CwdChanged(String),
    ClipboardSet {
        primary: bool,
        data: Vec<u8>,
    },
    ClipboardRequest {
        primary: bool,
    },
}

/// Which DCS consumer is active between hook and unhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum DcsConsumer {
    #[default]
    None,
    Sixel,
    /// Recognized introducer but unimplemented body: swallow.
    Discard,
}

#[derive(Debug)]
pub struct Term {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) cell_width: usize,
    pub(crate) cell_height: usize,
    pub(crate) scrollback_lines: usize,

    pub(crate) normal: Grid,
    pub(crate) alt: Grid,
    pub(crate) alt_active: bool,

    pub(crate) cursor: Cursor,
    pub(crate) saved_cursor: Option<SavedCursor>,
    pub(crate) alt_saved_cursor: Option<SavedCursor>,
    pub(crate) attrs: Attrs,
    pub(crate) charsets: Charsets,
    pub(crate) scroll_region: ScrollRegion,
    pub(crate) tab_stops: Vec<usize>,
    pub(crate) modes: TermModes,
    pub(crate) cursor_style: CursorStyle,
    pub(crate) cursor_blink: bool,

    pub(crate) palette: Palette,
    pub(crate) composed: ComposedTable,
    pub(crate) sixel: SixelDecoder,
    pub(crate) dcs: DcsConsumer,

    pub(crate) selection: Selection,
    pub(crate) search: search::Search,

    pub(crate) title: String,
    pub(crate) title_stack: Vec<String>,
    pub(crate) cwd: Option<String>,
    /// URI of the OSC 8 hyperlink currently being printed, if any.
    pub(crate) hyperlink: Option<String>,
    /// Last printed codepoint, for REP.
    pub(crate) last_printed: Option<char>,

    output: Vec<u8>,
    events: Vec<TermEvent>,
}

impl Term {
    pub fn new(cols: usize, rows: usize, scrollback_lines: usize) -> Self {
        assert!(cols >= 1 && rows >= 1);
        Term {
            rows,
            cols,
            cell_width: 8,
            cell_height: 16,
            scrollback_lines,
            normal: Grid::new(cols, rows, scrollback_lines),
            alt: Grid::new(cols, rows, 0),
            alt_active: false,
            cursor: Cursor::default(),
            saved_cursor: None,
            alt_saved_cursor: None,
            attrs: Attrs::default(),
            charsets: Charsets::default(),
            scroll_region: ScrollRegion::new(0, rows),
            tab_stops: default_tab_stops(cols, 8),
            modes: TermModes::default(),
            cursor_style: CursorStyle::default(),
            cursor_blink: false,
            palette: Palette::default(),
            composed: ComposedTable::new(),
            sixel: SixelDecoder::new(),
            dcs: DcsConsumer::None,
            selection: Selection::default(),
            search: search::Search::default(),
            title: String::new(),
            title_stack: Vec::new(),
            cwd: None,
            hyperlink: None,
            last_printed: None,
            output: Vec::new(),
            events: Vec::new(),
        }
    }

    // --- geometry and accessors -------------------------------------

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn cursor_style(&self) -> (CursorStyle, bool) {
        (self.cursor_style, self.cursor_blink)
    }

    pub fn modes(&self) -> &TermModes {
        &self.modes
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn composed(&self) -> &ComposedTable {
        &self.composed
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn alt_screen_active(&self) -> bool {
        self.alt_active
    }

    pub fn grid(&self) -> &Grid {
        if self.alt_active { &self.alt } else { &self.normal }
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        if self.alt_active {
            &mut self.alt
        } else {
            &mut self.normal
        }
    }

    pub fn cell_metrics(&self) -> (usize, usize) {
        (self.cell_width, self.cell_height)
    }

    /// Host notification: the font changed, cells are now this size.
    pub fn set_cell_metrics(&mut self, cell_width: usize, cell_height: usize) {
        self.cell_width = cell_width.max(1);
        self.cell_height = cell_height.max(1);
        sixel_ops::cell_size_changed(self);
    }

    /// Mode snapshot for the input encoder.
    pub fn input_modes(&self) -> InputModes {
        InputModes {
            cursor_keys_application: self.modes.cursor_keys_application,
            keypad_application: self.modes.keypad_application,
            modify_other_keys: self.modes.modify_other_keys,
            bracketed_paste: self.modes.bracketed_paste,
            alt_esc_prefix: true,
            mouse_tracking: self.modes.mouse_tracking,
            mouse_encoding: self.modes.mouse_encoding,
            alternate_scroll: self.modes.alternate_scroll,
            focus_events: self.modes.focus_events,
        }
    }

    // --- host-facing queues ------------------------------------------

    pub(crate) fn reply(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    pub(crate) fn event(&mut self, ev: TermEvent) {
        self.events.push(ev);
    }

    /// Bytes queued for the child; the host writes these to the PTY.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    pub fn take_events(&mut self) -> Vec<TermEvent> {
        std::mem::take(&mut self.events)
    }

    // --- damage helpers ----------------------------------------------

    pub fn damage_all(&mut self) {
        let rows = self.rows;
        self.grid_mut().damage_rows(0..rows);
    }

    pub fn damage_view(&mut self) {
        let rows = self.rows;
        self.grid_mut().damage_view(rows);
    }

    pub(crate) fn damage_cursor_cell(&mut self) {
        let (row, col) = (self.cursor.row, self.cursor.col);
        let row = self.grid_mut().row_alloc(row);
        row.dirty = true;
        row.cell_mut(col).set_clean(false);
    }

    // --- cursor motion -----------------------------------------------

    /// Clamp to the screen (or the scroll region under origin mode)
    /// and clear the wrap latch.
    pub fn cursor_to(&mut self, row: isize, col: isize) {
        let (top, bottom) = if self.modes.origin {
            (self.scroll_region.top as isize, self.scroll_region.bottom as isize)
        } else {
            (0, self.rows as isize)
        };
        self.cursor.row = row.clamp(top, bottom - 1) as usize;
        self.cursor.col = col.clamp(0, self.cols as isize - 1) as usize;
        self.cursor.pending_wrap = false;
    }

    pub fn cursor_left(&mut self, n: usize) {
        self.cursor.col = self.cursor.col.saturating_sub(n.max(1));
        self.cursor.pending_wrap = false;
    }

    pub fn cursor_right(&mut self, n: usize) {
        self.cursor.col = (self.cursor.col + n.max(1)).min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    pub fn cursor_up(&mut self, n: usize) {
        // Stop at the scroll region top when starting inside it.
        let limit = if self.cursor.row >= self.scroll_region.top {
            self.scroll_region.top
        } else {
            0
        };
        self.cursor.row = self.cursor.row.saturating_sub(n.max(1)).max(limit);
        self.cursor.pending_wrap = false;
    }

    pub fn cursor_down(&mut self, n: usize) {
        let limit = if self.cursor.row < self.scroll_region.bottom {
            self.scroll_region.bottom - 1
        } else {
            self.rows - 1
        };
        self.cursor.row = (self.cursor.row + n.max(1)).min(limit);
        self.cursor.pending_wrap = false;
    }

    pub fn carriage_return(&mut self) {
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    /// LF semantics: scroll when on the region's last line, otherwise
    /// move down. Marks the departed row as hard-broken.
    pub fn linefeed(&mut self) {
        let row = self.cursor.row;
        if let Some(r) = self.grid_mut().row_mut(row) {
            r.linebreak = true;
        }
        self.cursor.pending_wrap = false;
        if row + 1 == self.scroll_region.bottom {
            let region = self.scroll_region;
            scroll::scroll_up(self, region, 1);
        } else if row + 1 < self.rows {
            self.cursor.row += 1;
        }
    }

    /// RI: symmetric to linefeed.
    pub fn reverse_index(&mut self) {
        self.cursor.pending_wrap = false;
        if self.cursor.row == self.scroll_region.top {
            let region = self.scroll_region;
            scroll::scroll_down(self, region, 1);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
    }

    // --- tab stops ---------------------------------------------------

    pub(crate) fn tab_forward(&mut self, n: usize) {
        for _ in 0..n.max(1) {
            let col = self.cursor.col;
            let next = self
                .tab_stops
                .iter()
                .copied()
                .find(|&t| t > col)
                .unwrap_or(self.cols - 1);
            // Lay a `\t` plus filler spaces over never-written cells so
            // extraction can collapse the run back into a real tab.
            // Content-only writes: visually these cells stay blank, so
            // the clean bits are left untouched.
            if next > col {
                let row_no = self.cursor.row;
                let all_empty = self
                    .grid()
                    .row(row_no)
                    .map(|r| r.cells()[col..next].iter().all(|c| c.is_empty()))
                    .unwrap_or(true);
                if all_empty {
                    let row = self.grid_mut().row_alloc(row_no);
                    row.cell_mut(col).content = '\t' as u32;
                    for c in col + 1..next {
                        row.cell_mut(c).content = ' ' as u32;
                    }
                }
            }
            self.cursor.col = next.min(self.cols - 1);
        }
        self.cursor.pending_wrap = false;
    }

    pub(crate) fn tab_backward(&mut self, n: usize) {
        let mut col = self.cursor.col;
        for _ in 0..n.max(1) {
            col = self
                .tab_stops
                .iter()
                .rev()
                .copied()
                .find(|&t| t < col)
                .unwrap_or(0);
        }
        self.cursor.col = col;
        self.cursor.pending_wrap = false;
    }

    pub(crate) fn set_tab_stop(&mut self) {
        let col = self.cursor.col;
        if let Err(pos) = self.tab_stops.binary_search(&col) {
            self.tab_stops.insert(pos, col);
        }
    }

    /// Tab stops visible to extraction (tab re-collapse).
    pub(crate) fn next_tab_stop(&self, col: usize) -> usize {
        self.tab_stops
            .iter()
            .copied()
            .find(|&t| t > col)
            .unwrap_or(self.cols - 1)
    }

    // --- saved cursor ------------------------------------------------

    pub fn save_cursor(&mut self) {
        let snap = SavedCursor {
            cursor: self.cursor,
            attrs: self.attrs,
            charsets: self.charsets,
            origin: self.modes.origin,
        };
        if self.alt_active {
            self.alt_saved_cursor = Some(snap);
        } else {
            self.saved_cursor = Some(snap);
        }
    }

    pub fn restore_cursor(&mut self) {
        let snap = if self.alt_active {
            self.alt_saved_cursor
        } else {
            self.saved_cursor
        };
        if let Some(s) = snap {
            self.cursor = s.cursor;
            self.cursor.row = self.cursor.row.min(self.rows - 1);
            self.cursor.col = self.cursor.col.min(self.cols - 1);
            self.attrs = s.attrs;
            self.charsets = s.charsets;
            self.modes.origin = s.origin;
            self.damage_cursor_cell();
        }
    }

    // --- printing ----------------------------------------------------

    fn print_impl(&mut self, c: char, from_rep: bool) {
        let set = self.charsets.active();
        let c = charsets::remap(set, c);

        let width = match c.width() {
            Some(0) => {
                self.print_combining(c);
                return;
            }
            Some(w) => w,
            None => return,
        };

        if !from_rep {
            self.last_printed = Some(c);
        }

        if self.cursor.pending_wrap && self.modes.auto_margin {
            self.linefeed();
            self.carriage_return();
            // The wrap was soft: un-mark the hard break linefeed() set.
            let prev = if self.cursor.row == 0 { 0 } else { self.cursor.row - 1 };
            if let Some(r) = self.grid_mut().row_mut(prev) {
                r.linebreak = false;
            }
        }
        self.cursor.pending_wrap = false;

        // A wide glyph that does not fit skips the final column and
        // wraps (the skipped cell is blanked).
        if width == 2 && self.cursor.col == self.cols - 1 {
            let (row, col, attrs) = (self.cursor.row, self.cursor.col, self.attrs);
            self.grid_mut().row_alloc(row).blank_range(col..col + 1, attrs);
            if self.modes.auto_margin {
                self.linefeed();
                self.carriage_return();
                let prev = if self.cursor.row == 0 { 0 } else { self.cursor.row - 1 };
                if let Some(r) = self.grid_mut().row_mut(prev) {
                    r.linebreak = false;
                }
            } else {
                // No wrap possible: overwrite the last cell instead.
                self.write_cell(c as u32, 1);
                return;
            }
        }

        if self.modes.insert {
            self.insert_blank_in_row(width);
        }

        sixel_ops::overwrite_at_cursor(self, width);
        self.write_cell(c as u32, width);
    }

    fn write_cell(&mut self, content: u32, width: usize) {
        let (row_no, col) = (self.cursor.row, self.cursor.col);
        let cols = self.cols;
        let mut attrs = self.attrs;
        if self.hyperlink.is_some() {
            attrs.flags.insert(AttrFlags::URL);
        }

        let row = self.grid_mut().row_alloc(row_no);
        row.dirty = true;
        row.cell_mut(col).write(content, attrs);
        if width == 2 && col + 1 < cols {
            row.cell_mut(col + 1).write(SPACER, attrs);
        }

        let new_col = col + width;
        if new_col >= cols {
            self.cursor.col = cols - 1;
            self.cursor.pending_wrap = true;
        } else {
            self.cursor.col = new_col;
        }
    }

    /// A zero-width codepoint composes onto the previously printed
    /// cell.
    fn print_combining(&mut self, c: char) {
        let (row_no, col) = if self.cursor.pending_wrap {
            (self.cursor.row, self.cols - 1)
        } else if self.cursor.col > 0 {
            (self.cursor.row, self.cursor.col - 1)
        } else {
            return;
        };

        // Combining onto a spacer means the base is one further left.
        let base_col = {
            let grid = self.grid();
            match grid.row(row_no) {
                Some(r) if r.cell(col).is_spacer() && col > 0 => col - 1,
                Some(_) => col,
                None => return,
            }
        };

        let existing = self.grid().row(row_no).unwrap().cell(base_col).content;
        let mut seq: Vec<char> = if let Some(chars) = self.composed.lookup(existing) {
            chars.to_vec()
        } else {
            match char::from_u32(existing) {
                Some(base) if existing != 0 => vec![base],
                _ => return,
            }
        };
        seq.push(c);

        if let Some(key) = self.composed.intern(&seq) {
            let row = self.grid_mut().row_alloc(row_no);
            row.dirty = true;
            let cell = row.cell_mut(base_col);
            cell.content = key;
            cell.set_clean(false);
        }
    }

    fn insert_blank_in_row(&mut self, n: usize) {
        let (row_no, col) = (self.cursor.row, self.cursor.col);
        let cols = self.cols;
        let attrs = self.attrs;
        let row = self.grid_mut().row_alloc(row_no);
        let cells = row.cells_mut();
        for i in (col + n..cols).rev() {
            cells[i] = cells[i - n];
            cells[i].set_clean(false);
        }
        row.blank_range(col..(col + n).min(cols), attrs);
    }

    /// CSI b: repeat the last printed character.
    pub(crate) fn repeat_last(&mut self, n: usize) {
        if let Some(c) = self.last_printed {
            for _ in 0..n.max(1).min(self.cols * self.rows) {
                self.print_impl(c, true);
            }
        }
    }

    // --- reset -------------------------------------------------------

    /// RIS (`hard`) or DECSTR (soft). DECSTR keeps the grids and
    /// title; RIS drops everything including scrollback and sixels.
    pub fn reset(&mut self, hard: bool) {
        self.cursor = Cursor::default();
        self.saved_cursor = None;
        self.alt_saved_cursor = None;
        self.attrs = Attrs::default();
        self.charsets = Charsets::default();
        self.scroll_region = ScrollRegion::new(0, self.rows);
        self.modes = TermModes::default();
        self.cursor_style = CursorStyle::default();
        self.cursor_blink = false;
        self.alt_active = false;
        self.dcs = DcsConsumer::None;
        self.hyperlink = None;
        self.last_printed = None;
        self.selection = Selection::default();
        self.search = search::Search::default();

        if hard {
            self.normal.reset();
            self.alt.reset();
            self.palette = Palette::default();
            self.sixel = SixelDecoder::new();
            self.tab_stops = default_tab_stops(self.cols, 8);
            self.title.clear();
            self.title_stack.clear();
        }
        self.damage_all();
    }

    // --- C0/C1 -------------------------------------------------------

    fn execute_control(&mut self, byte: u8) {
        match byte {
            0x07 => self.event(TermEvent::Bell),
            0x08 => self.cursor_left(1),
            0x09 => self.tab_forward(1),
            0x0a | 0x0b | 0x0c => {
                self.linefeed();
                if self.modes.lnm {
                    self.carriage_return();
                }
            }
            0x0d => self.carriage_return(),
            0x0e => self.charsets.selected = 1, // SO
            0x0f => self.charsets.selected = 0, // SI
            // C1
            0x84 => self.linefeed(),       // IND
            0x85 => {
                self.linefeed();           // NEL
                self.carriage_return();
            }
            0x88 => self.set_tab_stop(),   // HTS
            0x8d => self.reverse_index(),  // RI
            0x9c => {}                     // ST outside a string
            _ => {
                tracing::debug!(target: "term.exec", byte, "unhandled control");
            }
        }
    }
}

impl Perform for Term {
    fn print(&mut self, c: char) {
        self.print_impl(c, false);
    }

    fn execute(&mut self, byte: u8) {
        self.execute_control(byte);
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], final_byte: u8) {
        esc::dispatch(self, intermediates, final_byte);
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], final_byte: u8) {
        csi::dispatch(self, params, intermediates, final_byte);
    }

    fn osc_dispatch(&mut self, payload: &[u8], bell_terminated: bool) {
        osc::dispatch(self, payload, bell_terminated);
    }

    fn hook(&mut self, params: &Params, intermediates: &[u8], final_byte: u8) {
        dcs::hook(self, params, intermediates, final_byte);
    }

    fn put(&mut self, byte: u8) {
        dcs::put(self, byte);
    }

    fn unhook(&mut self) {
        dcs::unhook(self);
    }
}

pub(crate) fn default_tab_stops(cols: usize, interval: usize) -> Vec<usize> {
    (interval..cols).step_by(interval).collect()
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    /// Feed raw bytes through a fresh parser into the terminal.
    pub fn feed(term: &mut Term, bytes: &[u8]) {
        let mut parser = core_vt::Parser::new();
        parser.advance(term, bytes);
    }

    /// The visible screen as one string per row, trailing blanks
    /// trimmed. Spacer cells are skipped.
    pub fn screen_text(term: &Term) -> Vec<String> {
        let grid = term.grid();
        (0..term.rows())
            .map(|r| {
                let mut s = String::new();
                if let Some(row) = grid.row(r) {
                    for cell in row.cells() {
                        if cell.is_spacer() {
                            continue;
                        }
                        match cell.codepoint() {
                            Some(c) => s.push(c),
                            None if cell.is_composed() => {
                                for &c in term.composed().lookup(cell.content).unwrap() {
                                    s.push(c);
                                }
                            }
                            None => s.push(' '),
                        }
                    }
                }
                s.trim_end().to_string()
            })
            .collect()
    }
}
