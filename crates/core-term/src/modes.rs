//! Mode flags and DECSET/DECRST/SM/RM handling.
//!
//! Unknown modes are recorded and ignored without error: clients probe
//! modes we do not implement, and failing loudly would be worse than
//! the silent no-op every real terminal performs.

use crate::Term;
use core_input::{MouseEncoding, MouseTracking};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct TermModes {
    /// `?1` DECCKM.
    pub cursor_keys_application: bool,
    /// `?5` DECSCNM.
    pub reverse_video: bool,
    /// `?6` DECOM.
    pub origin: bool,
    /// `?7` DECAWM; on by default.
    pub auto_margin: bool,
    /// `?25` DECTCEM; on by default.
    pub show_cursor: bool,
    /// `?9` / `?1000` / `?1002` / `?1003`.
    pub mouse_tracking: MouseTracking,
    /// `?1005` / `?1006` / `?1015`.
    pub mouse_encoding: MouseEncoding,
    /// `?1004`.
    pub focus_events: bool,
    /// `?1007`.
    pub alternate_scroll: bool,
    /// `?2004`.
    pub bracketed_paste: bool,
    /// SM/RM 4.
    pub insert: bool,
    /// SM/RM 20: LF implies CR.
    pub lnm: bool,
    /// ESC `=` / ESC `>`.
    pub keypad_application: bool,
    /// `CSI > 4 ; level m`.
    pub modify_other_keys: u8,
    /// Probed-but-unknown modes, for diagnostics.
    pub unknown: BTreeSet<(bool, u16)>,
}

impl Default for TermModes {
    fn default() -> Self {
        Self {
            cursor_keys_application: false,
            reverse_video: false,
            origin: false,
            auto_margin: true,
            show_cursor: true,
            mouse_tracking: MouseTracking::None,
            mouse_encoding: MouseEncoding::Normal,
            focus_events: false,
            alternate_scroll: false,
            bracketed_paste: false,
            insert: false,
            lnm: false,
            keypad_application: false,
            modify_other_keys: 0,
            unknown: BTreeSet::new(),
        }
    }
}

/// DECSET/DECRST (`CSI ? Pm h|l`).
pub(crate) fn set_private(term: &mut Term, mode: u16, enable: bool) {
    match mode {
        1 => term.modes.cursor_keys_application = enable,
        5 => {
            if term.modes.reverse_video != enable {
                term.modes.reverse_video = enable;
                term.damage_all();
            }
        }
        6 => {
            term.modes.origin = enable;
            term.cursor_to(0, 0);
        }
        7 => term.modes.auto_margin = enable,
        9 => {
            term.modes.mouse_tracking = if enable {
                MouseTracking::X10
            } else {
                MouseTracking::None
            };
        }
        25 => {
            if term.modes.show_cursor != enable {
                term.modes.show_cursor = enable;
                term.damage_cursor_cell();
            }
        }
        1000 => {
            term.modes.mouse_tracking = if enable {
                MouseTracking::Click
            } else {
                MouseTracking::None
            };
        }
        1002 => {
            term.modes.mouse_tracking = if enable {
                MouseTracking::Drag
            } else {
                MouseTracking::None
            };
        }
        1003 => {
            term.modes.mouse_tracking = if enable {
                MouseTracking::Motion
            } else {
                MouseTracking::None
            };
        }
        1004 => term.modes.focus_events = enable,
        1005 => {
            term.modes.mouse_encoding = if enable {
                MouseEncoding::Utf8
            } else {
                MouseEncoding::Normal
            };
        }
        1006 => {
            term.modes.mouse_encoding = if enable {
                MouseEncoding::Sgr
            } else {
                MouseEncoding::Normal
            };
        }
        1007 => term.modes.alternate_scroll = enable,
        1015 => {
            term.modes.mouse_encoding = if enable {
                MouseEncoding::Urxvt
            } else {
                MouseEncoding::Normal
            };
        }
        1049 => {
            if enable {
                enter_alt_screen(term);
            } else {
                leave_alt_screen(term);
            }
        }
        2004 => term.modes.bracketed_paste = enable,
        other => {
            if term.modes.unknown.insert((true, other)) {
                tracing::debug!(target: "term.modes", mode = other, enable, "unknown private mode");
            }
        }
    }
}

/// SM/RM (`CSI Pm h|l`).
pub(crate) fn set_standard(term: &mut Term, mode: u16, enable: bool) {
    match mode {
        4 => term.modes.insert = enable,
        20 => term.modes.lnm = enable,
        other => {
            if term.modes.unknown.insert((false, other)) {
                tracing::debug!(target: "term.modes", mode = other, enable, "unknown mode");
            }
        }
    }
}

/// `?1049`: save cursor, switch to the alternate grid, clear it.
fn enter_alt_screen(term: &mut Term) {
    if term.alt_active {
        return;
    }
    term.save_cursor();
    term.alt_active = true;
    term.alt.reset();
    term.cursor = crate::Cursor::default();
    term.scroll_region = core_grid::ScrollRegion::new(0, term.rows);
    term.damage_all();
}

/// `?1049` reset: back to the primary grid, cursor restored, nothing
/// on the primary touched.
fn leave_alt_screen(term: &mut Term) {
    if !term.alt_active {
        return;
    }
    term.alt.reset();
    term.alt_active = false;
    term.scroll_region = core_grid::ScrollRegion::new(0, term.rows);
    term.restore_cursor();
    term.damage_all();
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::Term;
    use core_input::{MouseEncoding, MouseTracking};

    #[test]
    fn decset_roundtrip() {
        let mut t = Term::new(10, 4, 0);
        feed(&mut t, b"\x1b[?1h\x1b[?2004h\x1b[?1006h\x1b[?1002h");
        assert!(t.modes().cursor_keys_application);
        assert!(t.modes().bracketed_paste);
        assert_eq!(t.modes().mouse_encoding, MouseEncoding::Sgr);
        assert_eq!(t.modes().mouse_tracking, MouseTracking::Drag);

        feed(&mut t, b"\x1b[?1l\x1b[?2004l\x1b[?1006l\x1b[?1002l");
        assert!(!t.modes().cursor_keys_application);
        assert!(!t.modes().bracketed_paste);
        assert_eq!(t.modes().mouse_encoding, MouseEncoding::Normal);
        assert_eq!(t.modes().mouse_tracking, MouseTracking::None);
    }

    #[test]
    fn unknown_modes_recorded_not_fatal() {
        let mut t = Term::new(10, 4, 0);
        feed(&mut t, b"\x1b[?12345h\x1b[?12345hX");
        assert!(t.modes().unknown.contains(&(true, 12345)));
        assert_eq!(screen_text(&t)[0], "X");
    }

    #[test]
    fn alt_screen_preserves_primary() {
        let mut t = Term::new(10, 4, 10);
        feed(&mut t, b"main\x1b[?1049h");
        assert!(t.alt_screen_active());
        assert_eq!(screen_text(&t), vec!["", "", "", ""]);
        feed(&mut t, b"alt");
        assert_eq!(screen_text(&t)[0], "alt");
        feed(&mut t, b"\x1b[?1049l");
        assert!(!t.alt_screen_active());
        assert_eq!(screen_text(&t)[0], "main");
        // Cursor restored to its pre-switch spot.
        assert_eq!(t.cursor().col, 4);
    }

    #[test]
    fn origin_mode_homes_to_region() {
        let mut t = Term::new(10, 6, 0);
        feed(&mut t, b"\x1b[2;5r\x1b[?6hX");
        // Home is the scroll region top under origin mode.
        assert_eq!(screen_text(&t)[1], "X");
    }
}
