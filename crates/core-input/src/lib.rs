//! Input encoding: key and mouse events → the byte sequences the
//! child process expects.
//!
//! This is the reverse direction of the dataflow and never touches the
//! grid: the semantics layer exports a mode snapshot ([`InputModes`])
//! and the encoder is a pure function of `(event, modifiers, modes)`.
//!
//! Encoding contract (see also `keymap`):
//! * Modifier parameter `m = 1 + shift(1) + alt(2) + ctrl(4) + meta(8)`.
//! * `ESC [ X` / `ESC O X` forms splice modifiers as `ESC [ 1 ; m X`;
//!   `ESC [ n ~` forms splice as `ESC [ n ; m ~`.
//! * `modifyOtherKeys` level 1 keeps legacy encodings for the common
//!   specials; level 2 switches them to `CSI 27 ; m ; code ~`.
//! * F13–F24 are encoded as shift-modified F1–F12.

pub mod keymap;
pub mod mouse;

pub use mouse::{MouseButton, MouseEncoding, MouseEvent, MouseTracking};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mods: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
        const META  = 1 << 3;
    }
}

impl Mods {
    /// The xterm modifier parameter; 1 when no modifier is held.
    pub fn param(self) -> u8 {
        1 + (self.contains(Mods::SHIFT) as u8)
            + ((self.contains(Mods::ALT) as u8) << 1)
            + ((self.contains(Mods::CTRL) as u8) << 2)
            + ((self.contains(Mods::META) as u8) << 3)
    }
}

/// Keypad keys that change meaning in application keypad mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpKey {
    Digit(u8), // 0..=9
    Divide,
    Multiply,
    Subtract,
    Add,
    Enter,
    Separator,
    Decimal,
}

/// Decoded key identity delivered by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySym {
    /// A printable character (post keyboard-layout translation).
    Char(char),
    Up,
    Down,
    Right,
    Left,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    Return,
    Backspace,
    Tab,
    IsoLeftTab,
    Escape,
    F(u8), // 1..=24
    Keypad(KpKey),
}

/// Snapshot of the terminal modes the encoder depends on. Produced by
/// the semantics layer each time a relevant mode flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputModes {
    pub cursor_keys_application: bool,
    pub keypad_application: bool,
    /// xterm modifyOtherKeys level: 0, 1 or 2.
    pub modify_other_keys: u8,
    pub bracketed_paste: bool,
    /// Alt on a printable sends a leading ESC (configurable).
    pub alt_esc_prefix: bool,
    pub mouse_tracking: MouseTracking,
    pub mouse_encoding: MouseEncoding,
    /// Wheel events translate to arrow keys on the alternate screen.
    pub alternate_scroll: bool,
    pub focus_events: bool,
}

impl Default for InputModes {
    fn default() -> Self {
        Self {
            cursor_keys_application: false,
            keypad_application: false,
            modify_other_keys: 0,
            bracketed_paste: false,
            alt_esc_prefix: true,
            mouse_tracking: MouseTracking::None,
            mouse_encoding: MouseEncoding::Normal,
            alternate_scroll: false,
            focus_events: false,
        }
    }
}

/// Encode one key event. Empty output means the key produces nothing
/// (e.g. a bare modifier).
pub fn encode_key(sym: KeySym, mods: Mods, modes: &InputModes) -> Vec<u8> {
    let out = keymap::encode(sym, mods, modes);
    tracing::trace!(
        target: "input.encode",
        ?sym,
        mods = mods.bits(),
        len = out.len(),
        "key encoded"
    );
    out
}

/// Wrap pasted bytes per bracketed-paste mode. The payload is passed
/// through verbatim in both cases; no escaping of embedded bytes.
pub fn encode_paste(data: &[u8], modes: &InputModes) -> Vec<u8> {
    if modes.bracketed_paste {
        let mut out = Vec::with_capacity(data.len() + 12);
        out.extend_from_slice(b"\x1b[200~");
        out.extend_from_slice(data);
        out.extend_from_slice(b"\x1b[201~");
        out
    } else {
        data.to_vec()
    }
}

/// Focus in/out reports (`?1004`).
pub fn encode_focus(gained: bool, modes: &InputModes) -> Vec<u8> {
    if !modes.focus_events {
        return Vec::new();
    }
    if gained { b"\x1b[I".to_vec() } else { b"\x1b[O".to_vec() }
}
