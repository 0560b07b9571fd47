//! Key → sequence tables.
//!
//! The shape mirrors the classic per-key row tables: for each key, a
//! base form plus a rule for splicing the modifier parameter in. Three
//! base shapes exist:
//! * `SS3`-style (`ESC O X`, cursor/keypad application mode) and
//!   `CSI`-style (`ESC [ X`): with modifiers both become
//!   `ESC [ 1 ; m X`.
//! * Tilde-style (`ESC [ n ~`): with modifiers `ESC [ n ; m ~`.
//! * Raw legacy bytes (Return, Tab, Backspace, Escape): these have
//!   per-key modifier behavior, switched by the modifyOtherKeys level.

use crate::{InputModes, KeySym, KpKey, Mods};

fn csi(body: &str) -> Vec<u8> {
    let mut v = Vec::with_capacity(body.len() + 2);
    v.extend_from_slice(b"\x1b[");
    v.extend_from_slice(body.as_bytes());
    v
}

fn ss3(final_byte: u8) -> Vec<u8> {
    vec![0x1b, b'O', final_byte]
}

/// `ESC [ 1 ; m X` / `ESC [ X` / `ESC O X` for an arrow-class key.
fn arrow_like(final_byte: u8, mods: Mods, application: bool) -> Vec<u8> {
    if mods.is_empty() {
        if application {
            ss3(final_byte)
        } else {
            csi(&format!("{}", final_byte as char))
        }
    } else {
        csi(&format!("1;{}{}", mods.param(), final_byte as char))
    }
}

/// `ESC [ n ~` with the modifier splice.
fn tilde(n: u8, mods: Mods) -> Vec<u8> {
    if mods.is_empty() {
        csi(&format!("{n}~"))
    } else {
        csi(&format!("{n};{}~", mods.param()))
    }
}

/// `CSI 27 ; m ; code ~` — the modifyOtherKeys level-2 shape.
fn mok2(code: u32, mods: Mods) -> Vec<u8> {
    csi(&format!("27;{};{code}~", mods.param()))
}

pub(crate) fn encode(sym: KeySym, mods: Mods, modes: &InputModes) -> Vec<u8> {
    let app_cursor = modes.cursor_keys_application;
    match sym {
        KeySym::Char(c) => encode_char(c, mods, modes),

        KeySym::Up => arrow_like(b'A', mods, app_cursor),
        KeySym::Down => arrow_like(b'B', mods, app_cursor),
        KeySym::Right => arrow_like(b'C', mods, app_cursor),
        KeySym::Left => arrow_like(b'D', mods, app_cursor),
        KeySym::Home => arrow_like(b'H', mods, app_cursor),
        KeySym::End => arrow_like(b'F', mods, app_cursor),

        KeySym::Insert => tilde(2, mods),
        KeySym::Delete => tilde(3, mods),
        KeySym::PageUp => tilde(5, mods),
        KeySym::PageDown => tilde(6, mods),

        KeySym::Return => encode_return(mods, modes),
        KeySym::Backspace => encode_backspace(mods, modes),
        KeySym::Tab => encode_tab(mods, modes),
        KeySym::IsoLeftTab => encode_iso_left_tab(mods, modes),
        KeySym::Escape => encode_escape(mods, modes),

        KeySym::F(n) => encode_fkey(n, mods),
        KeySym::Keypad(k) => encode_keypad(k, mods, modes),
    }
}

fn encode_char(c: char, mods: Mods, modes: &InputModes) -> Vec<u8> {
    let extra = mods & !(Mods::SHIFT); // shift is consumed by layout
    if modes.modify_other_keys >= 2 && !extra.is_empty() {
        return mok2(c as u32, mods);
    }

    let mut out = Vec::new();
    if extra.contains(Mods::ALT) && modes.alt_esc_prefix {
        out.push(0x1b);
    }

    if extra.contains(Mods::CTRL) {
        // Legacy control mapping for the ASCII range.
        let upper = c.to_ascii_uppercase();
        match upper {
            '@'..='_' => {
                out.push(upper as u8 & 0x1f);
                return out;
            }
            '?' => {
                out.push(0x7f);
                return out;
            }
            _ => {}
        }
    }

    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    out
}

fn encode_return(mods: Mods, modes: &InputModes) -> Vec<u8> {
    if mods.is_empty() {
        b"\r".to_vec()
    } else if mods == Mods::ALT && modes.modify_other_keys < 2 {
        b"\x1b\r".to_vec()
    } else {
        mok2(13, mods)
    }
}

fn encode_backspace(mods: Mods, modes: &InputModes) -> Vec<u8> {
    if modes.modify_other_keys >= 2 && !mods.is_empty() {
        return mok2(127, mods);
    }
    let mut out = Vec::new();
    if mods.contains(Mods::ALT) {
        out.push(0x1b);
    }
    out.push(if mods.contains(Mods::CTRL) { 0x08 } else { 0x7f });
    out
}

fn encode_tab(mods: Mods, modes: &InputModes) -> Vec<u8> {
    if mods.is_empty() {
        return b"\t".to_vec();
    }
    if mods == Mods::SHIFT && modes.modify_other_keys < 2 {
        return b"\x1b[Z".to_vec();
    }
    if mods == Mods::ALT && modes.modify_other_keys < 2 {
        return b"\x1b\t".to_vec();
    }
    mok2(9, mods)
}

fn encode_iso_left_tab(mods: Mods, modes: &InputModes) -> Vec<u8> {
    // The key already implies shift; all combos behave as
    // mods+shift+tab.
    let effective = mods | Mods::SHIFT;
    if effective == Mods::SHIFT {
        return b"\x1b[Z".to_vec();
    }
    encode_tab(effective, modes)
}

fn encode_escape(mods: Mods, modes: &InputModes) -> Vec<u8> {
    if mods.is_empty() {
        return b"\x1b".to_vec();
    }
    if mods == Mods::ALT && modes.modify_other_keys < 2 {
        return b"\x1b\x1b".to_vec();
    }
    mok2(27, mods)
}

fn encode_fkey(n: u8, mods: Mods) -> Vec<u8> {
    // F13..F24 behave as shift-modified F1..F12.
    let (n, mods) = if (13..=24).contains(&n) {
        (n - 12, mods | Mods::SHIFT)
    } else {
        (n, mods)
    };

    match n {
        1..=4 => {
            let fin = b"PQRS"[(n - 1) as usize];
            if mods.is_empty() {
                ss3(fin)
            } else {
                csi(&format!("1;{}{}", mods.param(), fin as char))
            }
        }
        5..=12 => {
            const NUMS: [u8; 8] = [15, 17, 18, 19, 20, 21, 23, 24];
            tilde(NUMS[(n - 5) as usize], mods)
        }
        _ => {
            tracing::debug!(target: "input.encode", n, "function key out of range");
            Vec::new()
        }
    }
}

fn encode_keypad(k: KpKey, mods: Mods, modes: &InputModes) -> Vec<u8> {
    let fin = match k {
        KpKey::Digit(d) => b'p' + d.min(9),
        KpKey::Divide => b'o',
        KpKey::Multiply => b'j',
        KpKey::Subtract => b'm',
        KpKey::Add => b'k',
        KpKey::Enter => b'M',
        KpKey::Separator => b'l',
        KpKey::Decimal => b'n',
    };

    if modes.keypad_application {
        if mods.is_empty() {
            ss3(fin)
        } else {
            csi(&format!("1;{}{}", mods.param(), fin as char))
        }
    } else {
        // Numeric mode: the plain character(s).
        let c = match k {
            KpKey::Digit(d) => (b'0' + d.min(9)) as char,
            KpKey::Divide => '/',
            KpKey::Multiply => '*',
            KpKey::Subtract => '-',
            KpKey::Add => '+',
            KpKey::Enter => return encode_return(mods, modes),
            KpKey::Separator => ',',
            KpKey::Decimal => '.',
        };
        encode_char(c, mods, modes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode_key;

    fn modes() -> InputModes {
        InputModes::default()
    }

    #[test]
    fn arrows_follow_cursor_keys_mode() {
        let mut m = modes();
        assert_eq!(encode_key(KeySym::Up, Mods::empty(), &m), b"\x1b[A");
        m.cursor_keys_application = true;
        assert_eq!(encode_key(KeySym::Up, Mods::empty(), &m), b"\x1bOA");
    }

    #[test]
    fn modified_arrows_always_csi() {
        let mut m = modes();
        m.cursor_keys_application = true;
        assert_eq!(encode_key(KeySym::Up, Mods::CTRL, &m), b"\x1b[1;5A");
        assert_eq!(
            encode_key(KeySym::Left, Mods::SHIFT | Mods::ALT, &m),
            b"\x1b[1;4D"
        );
    }

    #[test]
    fn tilde_keys_splice_modifiers() {
        let m = modes();
        assert_eq!(encode_key(KeySym::Delete, Mods::empty(), &m), b"\x1b[3~");
        assert_eq!(encode_key(KeySym::Delete, Mods::SHIFT, &m), b"\x1b[3;2~");
        assert_eq!(encode_key(KeySym::PageUp, Mods::CTRL, &m), b"\x1b[5;5~");
    }

    #[test]
    fn plain_and_alt_chars() {
        let m = modes();
        assert_eq!(encode_key(KeySym::Char('a'), Mods::empty(), &m), b"a");
        assert_eq!(encode_key(KeySym::Char('a'), Mods::ALT, &m), b"\x1ba");
        assert_eq!(
            encode_key(KeySym::Char('é'), Mods::empty(), &m),
            "é".as_bytes()
        );
    }

    #[test]
    fn ctrl_chars_map_to_c0() {
        let m = modes();
        assert_eq!(encode_key(KeySym::Char('c'), Mods::CTRL, &m), b"\x03");
        assert_eq!(encode_key(KeySym::Char('['), Mods::CTRL, &m), b"\x1b");
        assert_eq!(encode_key(KeySym::Char('?'), Mods::CTRL, &m), b"\x7f");
        assert_eq!(
            encode_key(KeySym::Char('c'), Mods::CTRL | Mods::ALT, &m),
            b"\x1b\x03"
        );
    }

    #[test]
    fn modify_other_keys_level2_chars() {
        let mut m = modes();
        m.modify_other_keys = 2;
        assert_eq!(encode_key(KeySym::Char('c'), Mods::CTRL, &m), b"\x1b[27;5;99~");
        // Unmodified stays plain.
        assert_eq!(encode_key(KeySym::Char('c'), Mods::empty(), &m), b"c");
    }

    #[test]
    fn tab_variants() {
        let m = modes();
        assert_eq!(encode_key(KeySym::Tab, Mods::empty(), &m), b"\t");
        assert_eq!(encode_key(KeySym::Tab, Mods::SHIFT, &m), b"\x1b[Z");
        assert_eq!(encode_key(KeySym::IsoLeftTab, Mods::empty(), &m), b"\x1b[Z");
        assert_eq!(encode_key(KeySym::Tab, Mods::CTRL, &m), b"\x1b[27;5;9~");

        let mut m2 = modes();
        m2.modify_other_keys = 2;
        assert_eq!(encode_key(KeySym::Tab, Mods::SHIFT, &m2), b"\x1b[27;2;9~");
    }

    #[test]
    fn return_variants() {
        let m = modes();
        assert_eq!(encode_key(KeySym::Return, Mods::empty(), &m), b"\r");
        assert_eq!(encode_key(KeySym::Return, Mods::ALT, &m), b"\x1b\r");
        assert_eq!(encode_key(KeySym::Return, Mods::CTRL, &m), b"\x1b[27;5;13~");
    }

    #[test]
    fn backspace_variants() {
        let m = modes();
        assert_eq!(encode_key(KeySym::Backspace, Mods::empty(), &m), b"\x7f");
        assert_eq!(encode_key(KeySym::Backspace, Mods::CTRL, &m), b"\x08");
        assert_eq!(encode_key(KeySym::Backspace, Mods::ALT, &m), b"\x1b\x7f");
    }

    #[test]
    fn function_keys() {
        let m = modes();
        assert_eq!(encode_key(KeySym::F(1), Mods::empty(), &m), b"\x1bOP");
        assert_eq!(encode_key(KeySym::F(1), Mods::SHIFT, &m), b"\x1b[1;2P");
        assert_eq!(encode_key(KeySym::F(5), Mods::empty(), &m), b"\x1b[15~");
        assert_eq!(encode_key(KeySym::F(12), Mods::CTRL, &m), b"\x1b[24;5~");
        // F13 == shift+F1, F20 == shift+F8.
        assert_eq!(encode_key(KeySym::F(13), Mods::empty(), &m), b"\x1b[1;2P");
        assert_eq!(encode_key(KeySym::F(20), Mods::empty(), &m), b"\x1b[19;2~");
    }

    #[test]
    fn keypad_modes() {
        let mut m = modes();
        assert_eq!(
            encode_key(KeySym::Keypad(KpKey::Digit(5)), Mods::empty(), &m),
            b"5"
        );
        m.keypad_application = true;
        assert_eq!(
            encode_key(KeySym::Keypad(KpKey::Digit(5)), Mods::empty(), &m),
            b"\x1bOu"
        );
        assert_eq!(
            encode_key(KeySym::Keypad(KpKey::Enter), Mods::empty(), &m),
            b"\x1bOM"
        );
        assert_eq!(
            encode_key(KeySym::Keypad(KpKey::Add), Mods::CTRL, &m),
            b"\x1b[1;5k"
        );
    }
}
