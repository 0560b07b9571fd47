//! End-to-end byte-stream scenarios against an 80×24 terminal.

use core_grid::{AttrFlags, Color};
use core_term::{SelectionKind, Term};
use core_vt::Parser;
use pretty_assertions::assert_eq;

fn term() -> Term {
    Term::new(80, 24, 1000)
}

fn feed(t: &mut Term, bytes: &[u8]) {
    let mut p = Parser::new();
    p.advance(t, bytes);
}

fn row_text(t: &Term, r: usize) -> String {
    let mut s = String::new();
    if let Some(row) = t.grid().row(r) {
        for cell in row.cells() {
            if cell.is_spacer() {
                continue;
            }
            match cell.codepoint() {
                Some(c) => s.push(c),
                None => s.push(' '),
            }
        }
    }
    s.trim_end().to_string()
}

#[test]
fn abc_newline() {
    let mut t = term();
    feed(&mut t, b"ABC\n");
    assert_eq!(row_text(&t, 0), "ABC");
    // LF without LNM: no carriage return.
    assert_eq!(t.cursor().row, 1);
    assert_eq!(t.cursor().col, 3);
}

#[test]
fn sgr_red_bold_then_default() {
    let mut t = term();
    feed(&mut t, b"\x1b[31;1mX\x1b[0mY");
    let row = t.grid().row(0).unwrap();
    let x = row.cell(0);
    assert_eq!(x.codepoint(), Some('X'));
    assert_eq!(x.fg, Color::Base16(1));
    assert!(x.flags.contains(AttrFlags::BOLD));
    let y = row.cell(1);
    assert_eq!(y.codepoint(), Some('Y'));
    assert_eq!(y.fg, Color::Default);
    assert!(!y.flags.contains(AttrFlags::BOLD));
}

#[test]
fn clear_home_and_position() {
    let mut t = term();
    feed(&mut t, b"junk everywhere");
    feed(&mut t, b"\x1b[2J\x1b[H\x1b[10;10HZ");
    for r in 0..24 {
        if r == 9 {
            assert_eq!(row_text(&t, r), "         Z");
        } else {
            assert_eq!(row_text(&t, r), "", "row {r}");
        }
    }
    assert_eq!((t.cursor().row, t.cursor().col), (9, 10));
}

#[test]
fn alt_screen_round_trip() {
    let mut t = term();
    feed(&mut t, b"primary");
    let col_before = t.cursor().col;
    feed(&mut t, b"\x1b[?1049h");
    assert!(t.alt_screen_active());
    feed(&mut t, b"123");
    assert_eq!(row_text(&t, 0), "123");
    feed(&mut t, b"\x1b[?1049l");
    assert!(!t.alt_screen_active());
    assert_eq!(row_text(&t, 0), "primary");
    assert_eq!(t.cursor().col, col_before);
}

#[test]
fn sixel_insertion_advances_cursor() {
    let mut t = term();
    t.set_cell_metrics(2, 6);
    // Red 5-column image, two six-pixel bands tall.
    feed(&mut t, b"\x1bPq#1;2;100;0;0#1~~~~~-#1??@@\x1b\\");
    assert_eq!(t.grid().sixels.len(), 1);
    let s = &t.grid().sixels[0];
    assert_eq!(s.rows, 2);
    assert_eq!(s.cols, 3); // 5px wide at 2px cells
    // Register 1 was redefined to pure red.
    assert_eq!(s.data[0], 0xff00_0000 | 0x00ff_0000);
    assert_eq!(t.cursor().row, 2);
    assert_eq!(t.cursor().col, 0);
}

#[test]
fn selection_over_wrapped_words() {
    let mut t = Term::new(6, 4, 10);
    let mut p = Parser::new();
    p.advance(&mut t, b"Hello\r\nWorld");
    t.selection_start(0, 0, SelectionKind::Character);
    t.selection_update(1, 4);
    assert_eq!(t.selection_text().unwrap(), "Hello\nWorld");

    t.selection_start(0, 0, SelectionKind::Block);
    t.selection_update(1, 1);
    assert_eq!(t.selection_text().unwrap(), "He\nWo");
}

#[test]
fn save_restore_cursor_and_attrs_exact() {
    let mut t = term();
    feed(&mut t, b"\x1b[5;7H\x1b[1;33;44m\x1b7");
    let cursor = t.cursor();
    feed(&mut t, b"\x1b[H\x1b[0m\x1b[2Jtext\x1b8");
    assert_eq!(t.cursor(), cursor);
    // Attributes restored: the next print carries them.
    feed(&mut t, b"Q");
    let cell = *t.grid().row(4).unwrap().cell(6);
    assert_eq!(cell.codepoint(), Some('Q'));
    assert!(cell.flags.contains(AttrFlags::BOLD));
    assert_eq!(cell.fg, Color::Base16(3));
    assert_eq!(cell.bg, Color::Base16(4));
}

#[test]
fn right_margin_without_auto_margin() {
    let mut t = Term::new(5, 2, 0);
    let mut p = Parser::new();
    p.advance(&mut t, b"\x1b[?7l");
    p.advance(&mut t, b"abcdefghij");
    // Cursor parked at the last column forever.
    assert_eq!((t.cursor().row, t.cursor().col), (0, 4));
    assert_eq!(row_text(&t, 0), "abcdj");
}

#[test]
fn osc52_round_trip() {
    use core_term::TermEvent;
    let mut t = term();
    let payload = b"any carnal pleasure";
    let encoded = {
        // Round-trip through the terminal's own codec.
        let mut tmp = term();
        feed(&mut tmp, b"\x1b]52;c;?\x07");
        tmp.take_events();
        tmp.clipboard_reply(false, payload);
        let out = tmp.take_output();
        // \x1b]52;c;<b64>\x1b\\
        out[7..out.len() - 2].to_vec()
    };
    let mut seq = b"\x1b]52;c;".to_vec();
    seq.extend_from_slice(&encoded);
    seq.push(0x07);
    feed(&mut t, &seq);
    match t.take_events().as_slice() {
        [TermEvent::ClipboardSet { primary: false, data }] => {
            assert_eq!(data, payload);
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn scrollback_accumulates_and_view_scrolls() {
    let mut t = Term::new(10, 3, 32);
    let mut p = Parser::new();
    for i in 0..20 {
        p.advance(&mut t, format!("line{i}\r\n").as_bytes());
    }
    assert_eq!(row_text(&t, 0), "line18");
    // Everything is still in the ring.
    let g = t.grid();
    let mask = g.num_rows() - 1;
    let above = (g.offset() + mask) & mask;
    assert!(g.row_abs(above).is_some());
}

#[test]
fn wide_then_selection_round_trip() {
    let mut t = Term::new(10, 2, 0);
    let mut p = Parser::new();
    p.advance(&mut t, "终端模拟".as_bytes());
    t.selection_start(0, 0, SelectionKind::Character);
    t.selection_update(0, 7);
    assert_eq!(t.selection_text().unwrap(), "终端模拟");
}
