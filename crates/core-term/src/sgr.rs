//! SGR (`CSI ... m`): the current-attribute state machine.
//!
//! Parameters are scanned left to right; `38`/`48` consume their
//! extended-color arguments either as following parameters
//! (`38;5;N`, `38;2;R;G;B`) or as `:`-separated sub-parameters
//! (`38:5:N`, `38:2:R:G:B`, including the odd-but-seen
//! `38:2:colorspace:R:G:B` five-sub form). Unknown codes are logged
//! and skipped; they never poison the rest of the list.

use crate::Term;
use core_color::Rgb;
use core_grid::{AttrFlags, Color};
use core_vt::Params;

pub(crate) fn dispatch(term: &mut Term, params: &Params) {
    if params.is_empty() {
        term.attrs.reset();
        return;
    }

    let mut i = 0;
    while i < params.len() {
        let value = params.raw(i);
        let subs = params.subs(i);

        match value {
            0 => term.attrs.reset(),

            1 => term.attrs.flags.insert(AttrFlags::BOLD),
            2 => term.attrs.flags.insert(AttrFlags::DIM),
            3 => term.attrs.flags.insert(AttrFlags::ITALIC),
            4 => term.attrs.flags.insert(AttrFlags::UNDERLINE),
            5 | 6 => term.attrs.flags.insert(AttrFlags::BLINK),
            7 => term.attrs.flags.insert(AttrFlags::REVERSE),
            8 => term.attrs.flags.insert(AttrFlags::CONCEAL),
            9 => term.attrs.flags.insert(AttrFlags::STRIKETHROUGH),

            22 => term
                .attrs
                .flags
                .remove(AttrFlags::BOLD | AttrFlags::DIM),
            23 => term.attrs.flags.remove(AttrFlags::ITALIC),
            24 => term.attrs.flags.remove(AttrFlags::UNDERLINE),
            25 => term.attrs.flags.remove(AttrFlags::BLINK),
            27 => term.attrs.flags.remove(AttrFlags::REVERSE),
            28 => term.attrs.flags.remove(AttrFlags::CONCEAL),
            29 => term.attrs.flags.remove(AttrFlags::STRIKETHROUGH),

            30..=37 => term.attrs.fg = Color::Base16((value - 30) as u8),
            39 => term.attrs.fg = Color::Default,
            40..=47 => term.attrs.bg = Color::Base16((value - 40) as u8),
            49 => term.attrs.bg = Color::Default,
            90..=97 => term.attrs.fg = Color::Base16((value - 90 + 8) as u8),
            100..=107 => term.attrs.bg = Color::Base16((value - 100 + 8) as u8),

            38 | 48 => {
                let color = if !subs.is_empty() {
                    parse_extended_subs(subs)
                } else {
                    let (color, consumed) = parse_extended_params(params, i + 1);
                    i += consumed;
                    color
                };
                match color {
                    Some(c) if value == 38 => term.attrs.fg = c,
                    Some(c) => term.attrs.bg = c,
                    None => {
                        tracing::debug!(target: "term.csi", value, "malformed extended color");
                    }
                }
            }

            other => {
                tracing::debug!(target: "term.csi", code = other, "unknown SGR code");
            }
        }
        i += 1;
    }
}

/// `;`-separated form: returns the color and how many extra parameters
/// were consumed.
fn parse_extended_params(params: &Params, at: usize) -> (Option<Color>, usize) {
    match params.raw(at) {
        5 => {
            if at + 1 < params.len() {
                (Some(index_color(params.raw(at + 1))), 2)
            } else {
                (None, 1)
            }
        }
        2 => {
            if at + 3 < params.len() {
                let (r, g, b) = (
                    params.raw(at + 1).min(255) as u8,
                    params.raw(at + 2).min(255) as u8,
                    params.raw(at + 3).min(255) as u8,
                );
                (Some(Color::Rgb(Rgb::new(r, g, b))), 4)
            } else {
                (None, params.len() - at)
            }
        }
        _ => (None, 1),
    }
}

/// `:`-separated form.
fn parse_extended_subs(subs: &[u16]) -> Option<Color> {
    match subs.first()? {
        5 => Some(index_color(*subs.get(1)?)),
        2 => {
            // Either 2:R:G:B or 2:colorspace:R:G:B.
            let rgb: &[u16] = match subs.len() {
                4 => &subs[1..4],
                5.. => &subs[2..5],
                _ => return None,
            };
            Some(Color::Rgb(Rgb::new(
                rgb[0].min(255) as u8,
                rgb[1].min(255) as u8,
                rgb[2].min(255) as u8,
            )))
        }
        _ => None,
    }
}

fn index_color(idx: u16) -> Color {
    let idx = idx.min(255) as u8;
    if idx < 16 {
        Color::Base16(idx)
    } else {
        Color::Indexed(idx)
    }
}
