//! CSI dispatch.
//!
//! Parameters default to 1 unless a final byte says otherwise; cursor
//! motions clamp to the screen (or scroll region under origin mode).
//! Unknown finals are logged at debug and ignored.

use crate::{modes, scroll, sgr, CursorStyle, Term};
use core_grid::ScrollRegion;
use core_vt::Params;

pub(crate) fn dispatch(term: &mut Term, params: &Params, intermediates: &[u8], final_byte: u8) {
    match intermediates {
        [] => plain(term, params, final_byte),
        [b'?'] => private(term, params, final_byte),
        [b'>'] => gt(term, params, final_byte),
        [b' '] => space(term, params, final_byte),
        [b'!'] => bang(term, params, final_byte),
        _ => {
            tracing::debug!(
                target: "term.csi",
                intermediates = %String::from_utf8_lossy(intermediates),
                final_byte = final_byte as char as u32,
                "unknown CSI intermediates"
            );
        }
    }
}

fn plain(term: &mut Term, params: &Params, final_byte: u8) {
    let n = params.get_or(0, 1) as usize;
    match final_byte {
        b'A' => term.cursor_up(n),
        b'B' => term.cursor_down(n),
        b'C' => term.cursor_right(n),
        b'D' => term.cursor_left(n),
        b'E' => {
            term.cursor_down(n);
            term.carriage_return();
        }
        b'F' => {
            term.cursor_up(n);
            term.carriage_return();
        }
        b'G' | b'`' => {
            // CHA / HPA: absolute column, 1-based.
            let row = term.cursor.row as isize;
            term.cursor_to(row, n as isize - 1);
        }
        b'H' | b'f' => {
            let row = params.get_or(0, 1) as isize - 1;
            let col = params.get_or(1, 1) as isize - 1;
            let row = if term.modes.origin {
                row + term.scroll_region.top as isize
            } else {
                row
            };
            term.cursor_to(row, col);
        }
        b'I' => term.tab_forward(n),
        b'J' => scroll::erase_display(term, params.raw(0)),
        b'K' => scroll::erase_line(term, params.raw(0)),
        b'L' => scroll::insert_lines(term, n),
        b'M' => scroll::delete_lines(term, n),
        b'P' => scroll::delete_chars(term, n),
        b'S' => {
            let region = term.scroll_region;
            scroll::scroll_up(term, region, n);
        }
        b'T' => {
            let region = term.scroll_region;
            scroll::scroll_down(term, region, n);
        }
        b'X' => scroll::erase_chars(term, n),
        b'Z' => term.tab_backward(n),
        b'@' => scroll::insert_chars(term, n),
        b'a' => term.cursor_right(n), // HPR
        b'b' => term.repeat_last(n),
        b'c' => {
            // DA1: VT220 with sixel (4) and ANSI color (22).
            term.reply(b"\x1b[?62;4;22c");
        }
        b'd' => {
            // VPA: absolute row, 1-based.
            let col = term.cursor.col as isize;
            let row = n as isize - 1;
            let row = if term.modes.origin {
                row + term.scroll_region.top as isize
            } else {
                row
            };
            term.cursor_to(row, col);
        }
        b'e' => term.cursor_down(n), // VPR
        b'g' => match params.raw(0) {
            0 => {
                let col = term.cursor.col;
                term.tab_stops.retain(|&t| t != col);
            }
            3 => term.tab_stops.clear(),
            other => {
                tracing::debug!(target: "term.csi", mode = other, "unknown TBC parameter");
            }
        },
        b'h' | b'l' => {
            let enable = final_byte == b'h';
            for p in params.iter() {
                modes::set_standard(term, p.value, enable);
            }
        }
        b'm' => sgr::dispatch(term, params),
        b'n' => match params.raw(0) {
            5 => term.reply(b"\x1b[0n"),
            6 => {
                let (row, col) = if term.modes.origin {
                    (
                        term.cursor.row.saturating_sub(term.scroll_region.top),
                        term.cursor.col,
                    )
                } else {
                    (term.cursor.row, term.cursor.col)
                };
                let reply = format!("\x1b[{};{}R", row + 1, col + 1);
                term.reply(reply.as_bytes());
            }
            other => {
                tracing::debug!(target: "term.csi", param = other, "unknown DSR");
            }
        },
        b'r' => {
            // DECSTBM. Bottom defaults to the last row; degenerate
            // regions are ignored.
            let top = params.get_or(0, 1) as usize - 1;
            let bottom = params.get_or(1, term.rows as u16) as usize;
            let bottom = bottom.min(term.rows);
            if top < bottom {
                term.scroll_region = ScrollRegion::new(top, bottom);
                term.cursor_to(0, 0);
            }
        }
        b's' => term.save_cursor(),
        b'u' => term.restore_cursor(),
        b't' => window_ops(term, params),
        other => {
            tracing::debug!(
                target: "term.csi",
                final_byte = other as char as u32,
                "unimplemented CSI final"
            );
        }
    }
}

fn private(term: &mut Term, params: &Params, final_byte: u8) {
    match final_byte {
        b'h' | b'l' => {
            let enable = final_byte == b'h';
            for p in params.iter() {
                modes::set_private(term, p.value, enable);
            }
        }
        b'S' => xtsmgraphics(term, params),
        b'n' => {
            // DECDSR aliases of the plain forms.
            plain(term, params, b'n');
        }
        other => {
            tracing::debug!(
                target: "term.csi",
                final_byte = other as char as u32,
                "unimplemented private CSI final"
            );
        }
    }
}

fn gt(term: &mut Term, params: &Params, final_byte: u8) {
    match final_byte {
        b'c' => {
            // DA2: "VT220", firmware version, keyboard.
            term.reply(b"\x1b[>1;10;0c");
        }
        b'm' => {
            // XTMODKEYS: resource 4 is modifyOtherKeys.
            if params.raw(0) == 4 {
                term.modes.modify_other_keys = params.raw(1).min(2) as u8;
            }
        }
        b'q' => {
            // XTVERSION.
            term.reply(b"\x1bP>|patina 0.1.0\x1b\\");
        }
        other => {
            tracing::debug!(
                target: "term.csi",
                final_byte = other as char as u32,
                "unimplemented CSI > final"
            );
        }
    }
}

fn space(term: &mut Term, params: &Params, final_byte: u8) {
    if final_byte == b'q' {
        // DECSCUSR.
        let (style, blink) = match params.raw(0) {
            0 | 1 => (CursorStyle::Block, true),
            2 => (CursorStyle::Block, false),
            3 => (CursorStyle::Underline, true),
            4 => (CursorStyle::Underline, false),
            5 => (CursorStyle::Bar, true),
            6 => (CursorStyle::Bar, false),
            other => {
                tracing::debug!(target: "term.csi", style = other, "unknown DECSCUSR");
                return;
            }
        };
        term.cursor_style = style;
        term.cursor_blink = blink;
        term.damage_cursor_cell();
    }
}

fn bang(term: &mut Term, _params: &Params, final_byte: u8) {
    if final_byte == b'p' {
        // DECSTR: soft reset.
        term.reset(false);
    }
}

/// XTSMGRAPHICS (`CSI ? Pi ; Pa ; Pv S`): color registers (Pi=1) and
/// sixel geometry (Pi=2). Replies `CSI ? Pi ; Ps ; Pv S`.
fn xtsmgraphics(term: &mut Term, params: &Params) {
    let item = params.raw(0);
    let action = params.raw(1);
    match (item, action) {
        (1, 1) => {
            let n = term.sixel.palette_size();
            term.reply(format!("\x1b[?1;0;{n}S").as_bytes());
        }
        (1, 2) => {
            term.sixel.reset_palette();
            let n = term.sixel.palette_size();
            term.reply(format!("\x1b[?1;0;{n}S").as_bytes());
        }
        (1, 3) => {
            term.sixel.set_palette_size(params.raw(2) as usize);
            let n = term.sixel.palette_size();
            term.reply(format!("\x1b[?1;0;{n}S").as_bytes());
        }
        (1, 4) => {
            term.reply(format!("\x1b[?1;0;{}S", core_sixel::MAX_COLORS).as_bytes());
        }
        (2, 1 | 4) => {
            let w = term.cols * term.cell_width;
            let h = term.rows * term.cell_height;
            term.reply(format!("\x1b[?2;0;{w};{h}S").as_bytes());
        }
        _ => {
            term.reply(format!("\x1b[?{item};1S").as_bytes());
        }
    }
}

/// Window ops: mostly ignored; size reports and the title stack are
/// honored.
fn window_ops(term: &mut Term, params: &Params) {
    match params.raw(0) {
        14 => {
            let (w, h) = (term.cols * term.cell_width, term.rows * term.cell_height);
            term.reply(format!("\x1b[4;{h};{w}t").as_bytes());
        }
        18 => {
            let reply = format!("\x1b[8;{};{}t", term.rows, term.cols);
            term.reply(reply.as_bytes());
        }
        22 => {
            let title = term.title.clone();
            term.title_stack.push(title);
        }
        23 => {
            if let Some(title) = term.title_stack.pop() {
                term.title = title.clone();
                term.event(crate::TermEvent::TitleChanged(title));
            }
        }
        op => {
            tracing::debug!(target: "term.csi", op, "ignored window op");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::Term;

    #[test]
    fn cursor_motion_clamps() {
        let mut t = Term::new(10, 5, 0);
        feed(&mut t, b"\x1b[99B\x1b[99C");
        assert_eq!(t.cursor().row, 4);
        assert_eq!(t.cursor().col, 9);
        feed(&mut t, b"\x1b[99A\x1b[99D");
        assert_eq!(t.cursor().row, 0);
        assert_eq!(t.cursor().col, 0);
    }

    #[test]
    fn cup_is_one_based_and_clamped() {
        let mut t = Term::new(10, 5, 0);
        feed(&mut t, b"\x1b[3;4H");
        assert_eq!((t.cursor().row, t.cursor().col), (2, 3));
        feed(&mut t, b"\x1b[99;99H");
        assert_eq!((t.cursor().row, t.cursor().col), (4, 9));
        feed(&mut t, b"\x1b[H");
        assert_eq!((t.cursor().row, t.cursor().col), (0, 0));
    }

    #[test]
    fn vpa_cha() {
        let mut t = Term::new(10, 5, 0);
        feed(&mut t, b"\x1b[3d\x1b[7G");
        assert_eq!((t.cursor().row, t.cursor().col), (2, 6));
    }

    #[test]
    fn da_and_dsr_replies() {
        let mut t = Term::new(10, 5, 0);
        feed(&mut t, b"\x1b[c");
        assert_eq!(t.take_output(), b"\x1b[?62;4;22c");
        feed(&mut t, b"\x1b[3;4H\x1b[6n");
        assert_eq!(t.take_output(), b"\x1b[3;4R");
        feed(&mut t, b"\x1b[5n");
        assert_eq!(t.take_output(), b"\x1b[0n");
    }

    #[test]
    fn decstbm_sets_region_and_homes() {
        let mut t = Term::new(10, 10, 0);
        feed(&mut t, b"\x1b[5;5H\x1b[3;7r");
        assert_eq!((t.cursor().row, t.cursor().col), (0, 0));
        feed(&mut t, b"\x1b[r");
        // Full-screen region restored.
        feed(&mut t, b"\x1b[10;1Hx\n");
        assert_eq!(t.cursor().row, 9);
    }

    #[test]
    fn tbc_clears_stops() {
        let mut t = Term::new(40, 2, 0);
        feed(&mut t, b"\x1b[9G\x1b[g\x1b[1G\t");
        // Stop at col 8 cleared; next stop is 16.
        assert_eq!(t.cursor().col, 16);
        feed(&mut t, b"\x1b[3g\x1b[1G\t");
        assert_eq!(t.cursor().col, 39);
    }

    #[test]
    fn decscusr() {
        let mut t = Term::new(10, 2, 0);
        feed(&mut t, b"\x1b[4 q");
        assert_eq!(
            t.cursor_style(),
            (crate::CursorStyle::Underline, false)
        );
    }

    #[test]
    fn title_stack_push_pop() {
        let mut t = Term::new(10, 2, 0);
        feed(&mut t, b"\x1b]2;first\x07\x1b[22t\x1b]2;second\x07\x1b[23t");
        assert_eq!(t.title(), "first");
    }

    #[test]
    fn window_size_reports() {
        let mut t = Term::new(80, 24, 0);
        feed(&mut t, b"\x1b[18t");
        assert_eq!(t.take_output(), b"\x1b[8;24;80t");
    }

    #[test]
    fn xtsmgraphics_color_query() {
        let mut t = Term::new(10, 2, 0);
        feed(&mut t, b"\x1b[?1;1S");
        assert_eq!(t.take_output(), b"\x1b[?1;0;256S");
    }

    #[test]
    fn modify_other_keys_set() {
        let mut t = Term::new(10, 2, 0);
        feed(&mut t, b"\x1b[>4;2m");
        assert_eq!(t.modes().modify_other_keys, 2);
        feed(&mut t, b"\x1b[>4;0m");
        assert_eq!(t.modes().modify_other_keys, 0);
    }
}
