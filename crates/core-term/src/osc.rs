//! OSC dispatch: titles, palette, cwd, hyperlinks, clipboard.
//!
//! Replies echo the sender's terminator (BEL vs ST) — some clients
//! parse their own query replies strictly.

use crate::{base64, Term, TermEvent};
use core_color::Rgb;

pub(crate) fn dispatch(term: &mut Term, payload: &[u8], bell_terminated: bool) {
    let (ps, body) = match split_command(payload) {
        Some(v) => v,
        None => {
            tracing::debug!(target: "term.osc", "unparseable OSC payload");
            return;
        }
    };

    match ps {
        0 | 2 => {
            let title = String::from_utf8_lossy(body).into_owned();
            term.title = title.clone();
            term.event(TermEvent::TitleChanged(title));
        }
        1 => {} // icon name: accepted, not tracked separately

        4 => palette_set(term, body, bell_terminated),

        7 => {
            let cwd = String::from_utf8_lossy(body).into_owned();
            term.cwd = Some(cwd.clone());
            term.event(TermEvent::CwdChanged(cwd));
        }

        8 => hyperlink(term, body),

        10 => special_color(term, body, bell_terminated, 10),
        11 => special_color(term, body, bell_terminated, 11),
        12 => special_color(term, body, bell_terminated, 12),

        52 => clipboard(term, body, bell_terminated),

        104 => {
            if body.is_empty() {
                term.palette.reset_entry(None);
            } else {
                for idx in body.split(|&b| b == b';') {
                    if let Some(idx) = parse_usize(idx) {
                        term.palette.reset_entry(Some((idx % 256) as u8));
                    }
                }
            }
            term.damage_all();
        }
        105 => {} // special-color reset by index: nothing extra tracked
        110 => {
            term.palette.fg = term.palette.default_fg;
            term.damage_all();
        }
        111 => {
            term.palette.bg = term.palette.default_bg;
            term.damage_all();
        }
        112 => {
            term.palette.cursor = None;
            term.damage_cursor_cell();
        }

        other => {
            tracing::debug!(target: "term.osc", ps = other, "unknown OSC");
        }
    }
}

/// `Ps ; Pt` → (Ps, Pt). A payload with no `;` is a bare command.
fn split_command(payload: &[u8]) -> Option<(u16, &[u8])> {
    let sep = payload.iter().position(|&b| b == b';');
    let (num, rest) = match sep {
        Some(i) => (&payload[..i], &payload[i + 1..]),
        None => (payload, &payload[..0]),
    };
    let ps = parse_usize(num)?;
    u16::try_from(ps).ok().map(|ps| (ps, rest))
}

fn parse_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() || !bytes.iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn terminator(bell: bool) -> &'static str {
    if bell { "\x07" } else { "\x1b\\" }
}

/// OSC 4: `idx;spec` pairs; `?` queries.
fn palette_set(term: &mut Term, body: &[u8], bell: bool) {
    let parts: Vec<&[u8]> = body.split(|&b| b == b';').collect();
    for pair in parts.chunks(2) {
        if pair.len() < 2 {
            break;
        }
        let (idx, spec): (&[u8], &[u8]) = (pair[0], pair[1]);
        let Some(idx) = parse_usize(idx) else { continue };
        let idx = (idx % 256) as u8;
        if spec == b"?" {
            let c = term.palette.table[idx as usize];
            let reply = format!(
                "\x1b]4;{};{}{}",
                idx,
                format_color(c),
                terminator(bell)
            );
            term.reply(reply.as_bytes());
        } else if let Some(color) = parse_color_spec(spec) {
            term.palette.set_entry(idx, color);
            term.damage_all();
        } else {
            tracing::debug!(
                target: "term.osc",
                spec = %String::from_utf8_lossy(spec),
                "bad color spec"
            );
        }
    }
}

/// OSC 10/11/12: set or query fg/bg/cursor color.
fn special_color(term: &mut Term, body: &[u8], bell: bool, ps: u16) {
    if body == b"?" {
        let c = match ps {
            10 => term.palette.fg,
            11 => term.palette.bg,
            _ => term.palette.cursor.unwrap_or(term.palette.fg),
        };
        let reply = format!("\x1b]{};{}{}", ps, format_color(c), terminator(bell));
        term.reply(reply.as_bytes());
        return;
    }
    if let Some(color) = parse_color_spec(body) {
        match ps {
            10 => term.palette.fg = color,
            11 => term.palette.bg = color,
            _ => term.palette.cursor = Some(color),
        }
        term.damage_all();
    }
}

/// OSC 8: `params;uri`. Empty URI ends the hyperlink.
fn hyperlink(term: &mut Term, body: &[u8]) {
    let uri = body
        .iter()
        .position(|&b| b == b';')
        .map(|i| &body[i + 1..])
        .unwrap_or(b"");
    term.hyperlink = if uri.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(uri).into_owned())
    };
}

/// OSC 52: `c;<base64>` sets, `c;?` queries. The target list selects
/// primary (`p`/`s`) vs regular (`c`, default).
fn clipboard(term: &mut Term, body: &[u8], bell: bool) {
    let Some(sep) = body.iter().position(|&b| b == b';') else {
        return;
    };
    let (targets, data) = (&body[..sep], &body[sep + 1..]);
    let primary = targets.iter().any(|&b| b == b'p' || b == b's') && !targets.contains(&b'c');

    if data == b"?" {
        term.event(TermEvent::ClipboardRequest { primary });
        // The host answers asynchronously via `clipboard_reply`.
        let _ = bell;
        return;
    }

    match base64::decode(data) {
        Some(bytes) => {
            term.event(TermEvent::ClipboardSet {
                primary,
                data: bytes,
            });
        }
        None => {
            tracing::debug!(target: "term.osc", "invalid base64 in OSC 52");
        }
    }
}

impl Term {
    /// Host-side completion of an OSC 52 query.
    pub fn clipboard_reply(&mut self, primary: bool, data: &[u8]) {
        let kind = if primary { 'p' } else { 'c' };
        let reply = format!("\x1b]52;{};{}\x1b\\", kind, base64::encode(data));
        self.reply(reply.as_bytes());
    }
}

/// `rgb:RR/GG/BB` (1–4 hex digits per channel) or `#RGB`-family.
pub(crate) fn parse_color_spec(spec: &[u8]) -> Option<Rgb> {
    let s = std::str::from_utf8(spec).ok()?;
    if let Some(body) = s.strip_prefix("rgb:") {
        let mut channels = body.split('/');
        let mut out = [0u8; 3];
        for slot in &mut out {
            let ch = channels.next()?;
            if ch.is_empty() || ch.len() > 4 {
                return None;
            }
            let v = u16::from_str_radix(ch, 16).ok()?;
            // Scale an N-digit value to 8 bits.
            *slot = match ch.len() {
                1 => (v * 0x11) as u8,
                2 => v as u8,
                3 => (v >> 4) as u8,
                _ => (v >> 8) as u8,
            };
        }
        if channels.next().is_some() {
            return None;
        }
        return Some(Rgb::new(out[0], out[1], out[2]));
    }
    if let Some(hex) = s.strip_prefix('#') {
        let n = hex.len();
        if n % 3 != 0 || !(3..=12).contains(&n) {
            return None;
        }
        let per = n / 3;
        let mut out = [0u8; 3];
        for (i, slot) in out.iter_mut().enumerate() {
            let v = u16::from_str_radix(&hex[i * per..(i + 1) * per], 16).ok()?;
            // XParseColor semantics: #-form digits are the *most*
            // significant bits.
            *slot = match per {
                1 => (v * 0x11) as u8,
                2 => v as u8,
                3 => (v >> 4) as u8,
                _ => (v >> 8) as u8,
            };
        }
        return Some(Rgb::new(out[0], out[1], out[2]));
    }
    None
}

fn format_color(c: Rgb) -> String {
    format!(
        "rgb:{:04x}/{:04x}/{:04x}",
        c.r as u16 * 0x101,
        c.g as u16 * 0x101,
        c.b as u16 * 0x101
    )
}
