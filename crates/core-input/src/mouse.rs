//! Mouse event encoding.
//!
//! Button numbering is X-style: 0–2 for left/middle/right, +64 for
//! wheel buttons (4/5 → 64/65), +128 for buttons 8+. Modifier bits add
//! shift=+4, alt=+8, ctrl=+16. Three wire encodings:
//! * normal: `CSI M b+32 x+33 y+33` (single bytes; coordinates clamp
//!   at 255-33 in practice — we clamp at 222 columns/rows),
//! * SGR (`?1006`): `CSI < b ; x ; y M|m` (release keeps the button),
//! * URXVT (`?1015`): `CSI b+32 ; x ; y M`.
//!
//! Wheel buttons never produce release events; with alternate-scroll
//! active on the alt screen they turn into arrow-key sequences instead
//! of reports.

use crate::{InputModes, KeySym, Mods};

/// *What* to report (`?9`, `?1000`, `?1002`, `?1003`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseTracking {
    #[default]
    None,
    /// `?9`: button presses only, no modifiers, no releases.
    X10,
    /// `?1000`: presses and releases.
    Click,
    /// `?1002`: clicks plus motion while a button is held.
    Drag,
    /// `?1003`: all motion.
    Motion,
}

/// *How* to report (`?1005`, `?1006`, `?1015`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseEncoding {
    #[default]
    Normal,
    /// `?1005`: normal framing with UTF-8 coordinate bytes.
    Utf8,
    /// `?1006`.
    Sgr,
    /// `?1015`.
    Urxvt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    /// Extended buttons (8+), numbered from 8.
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub button: MouseButton,
    /// Cell coordinates, 0-based.
    pub col: usize,
    pub row: usize,
    pub mods: Mods,
    pub release: bool,
    /// Motion report (button may be held or not).
    pub motion: bool,
    /// Alternate screen is active (for alternate-scroll translation).
    pub alt_screen: bool,
}

fn button_number(button: MouseButton) -> u32 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::WheelUp => 64,
        MouseButton::WheelDown => 65,
        MouseButton::Other(n) => 128 + (n.saturating_sub(8) as u32),
    }
}

fn is_wheel(button: MouseButton) -> bool {
    matches!(button, MouseButton::WheelUp | MouseButton::WheelDown)
}

/// Encode one mouse event, or nothing when the active modes suppress
/// it.
pub fn encode_mouse(event: &MouseEvent, modes: &InputModes) -> Vec<u8> {
    // Wheel on the alternate screen translates to arrows when no
    // tracking is active and alternate-scroll is on.
    if is_wheel(event.button)
        && event.alt_screen
        && modes.alternate_scroll
        && modes.mouse_tracking == MouseTracking::None
    {
        if event.release {
            return Vec::new();
        }
        let sym = if event.button == MouseButton::WheelUp {
            KeySym::Up
        } else {
            KeySym::Down
        };
        let mut out = Vec::new();
        for _ in 0..3 {
            out.extend_from_slice(&crate::encode_key(sym, Mods::empty(), modes));
        }
        return out;
    }

    match modes.mouse_tracking {
        MouseTracking::None => return Vec::new(),
        MouseTracking::X10 => {
            if event.release || event.motion || is_wheel(event.button) {
                return Vec::new();
            }
        }
        MouseTracking::Click => {
            if event.motion {
                return Vec::new();
            }
        }
        MouseTracking::Drag | MouseTracking::Motion => {}
    }

    // Wheel release events are suppressed in every protocol.
    if event.release && is_wheel(event.button) {
        return Vec::new();
    }

    let mut b = button_number(event.button);
    if event.motion {
        b += 32;
    }
    if modes.mouse_tracking != MouseTracking::X10 {
        if event.mods.contains(Mods::SHIFT) {
            b += 4;
        }
        if event.mods.contains(Mods::ALT) {
            b += 8;
        }
        if event.mods.contains(Mods::CTRL) {
            b += 16;
        }
    }

    let x = event.col + 1;
    let y = event.row + 1;

    match modes.mouse_encoding {
        MouseEncoding::Sgr => {
            let fin = if event.release { 'm' } else { 'M' };
            format!("\x1b[<{b};{x};{y}{fin}").into_bytes()
        }
        MouseEncoding::Urxvt => {
            let b = if event.release { 3 + (b & !3) } else { b };
            format!("\x1b[{};{x};{y}M", b + 32).into_bytes()
        }
        MouseEncoding::Normal | MouseEncoding::Utf8 => {
            let b = if event.release { 3 + (b & !3) } else { b };
            let mut out = vec![0x1b, b'[', b'M', (b + 32).min(255) as u8];
            let coord = |v: usize, out: &mut Vec<u8>| {
                let v = v.min(222) + 32;
                if modes.mouse_encoding == MouseEncoding::Utf8 && v + 1 > 127 {
                    // Two-byte UTF-8 for coordinates past 95.
                    let v = (v + 1) as u32;
                    out.push(0xc0 | (v >> 6) as u8);
                    out.push(0x80 | (v & 0x3f) as u8);
                } else {
                    out.push((v + 1) as u8);
                }
            };
            coord(event.col, &mut out);
            coord(event.row, &mut out);
            out
        }
    }
}
