//! The 256-entry terminal palette.
//!
//! Layout follows the xterm convention every client assumes:
//! * 0–7: normal colors, 8–15: bright variants,
//! * 16–231: 6×6×6 color cube with the 0/95/135/175/215/255 ramp,
//! * 232–255: 24-step grayscale ramp from 8 to 238.
//!
//! OSC 4 can overwrite any entry at runtime; OSC 104 restores entries
//! from the default table, which is kept alongside the live one so a
//! reset never depends on configuration re-application.

use crate::Rgb;

/// Default foreground when no SGR color is active.
pub const DEFAULT_FG: Rgb = Rgb::new(0xdc, 0xdc, 0xcc);
/// Default background.
pub const DEFAULT_BG: Rgb = Rgb::new(0x11, 0x11, 0x11);

const BASE16: [Rgb; 16] = [
    Rgb::new(0x24, 0x24, 0x24), // black
    Rgb::new(0xcc, 0x66, 0x66), // red
    Rgb::new(0xb5, 0xbd, 0x68), // green
    Rgb::new(0xf0, 0xc6, 0x74), // yellow
    Rgb::new(0x81, 0xa2, 0xbe), // blue
    Rgb::new(0xb2, 0x94, 0xbb), // magenta
    Rgb::new(0x8a, 0xbe, 0xb7), // cyan
    Rgb::new(0xc5, 0xc8, 0xc6), // white
    Rgb::new(0x3f, 0x3f, 0x3f), // bright black
    Rgb::new(0xd5, 0x4e, 0x53), // bright red
    Rgb::new(0xb9, 0xca, 0x4a), // bright green
    Rgb::new(0xe7, 0xc5, 0x47), // bright yellow
    Rgb::new(0x7a, 0xa6, 0xda), // bright blue
    Rgb::new(0xc3, 0x97, 0xd8), // bright magenta
    Rgb::new(0x70, 0xc0, 0xb1), // bright cyan
    Rgb::new(0xea, 0xea, 0xea), // bright white
];

fn cube_channel(i: u8) -> u8 {
    if i == 0 { 0 } else { 55 + 40 * i }
}

/// Build the default 256-entry table, with the first 16 entries taken
/// from `base16` (usually configuration, falling back to [`BASE16`]).
pub fn default_table(base16: &[Rgb; 16]) -> [Rgb; 256] {
    let mut table = [Rgb::BLACK; 256];
    table[..16].copy_from_slice(base16);

    for idx in 16u16..232 {
        let v = idx - 16;
        table[idx as usize] = Rgb::new(
            cube_channel((v / 36) as u8),
            cube_channel((v / 6 % 6) as u8),
            cube_channel((v % 6) as u8),
        );
    }

    for idx in 232u16..256 {
        let level = (8 + 10 * (idx - 232)) as u8;
        table[idx as usize] = Rgb::new(level, level, level);
    }

    table
}

/// Live color state: the mutable table plus the pristine copy used by
/// OSC 104/110/111/112 resets, and the special fg/bg/cursor colors.
#[derive(Debug, Clone)]
pub struct Palette {
    pub table: [Rgb; 256],
    pub default_table: [Rgb; 256],
    pub fg: Rgb,
    pub bg: Rgb,
    pub cursor: Option<Rgb>,
    pub default_fg: Rgb,
    pub default_bg: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(&BASE16, DEFAULT_FG, DEFAULT_BG)
    }
}

impl Palette {
    pub fn new(base16: &[Rgb; 16], fg: Rgb, bg: Rgb) -> Self {
        let table = default_table(base16);
        Self {
            table,
            default_table: table,
            fg,
            bg,
            cursor: None,
            default_fg: fg,
            default_bg: bg,
        }
    }

    /// OSC 4: overwrite one entry.
    pub fn set_entry(&mut self, idx: u8, color: Rgb) {
        self.table[idx as usize] = color;
    }

    /// OSC 104 with an index: restore one entry; without: restore all.
    pub fn reset_entry(&mut self, idx: Option<u8>) {
        match idx {
            Some(i) => self.table[i as usize] = self.default_table[i as usize],
            None => self.table = self.default_table,
        }
    }

    pub fn reset_special(&mut self) {
        self.fg = self.default_fg;
        self.bg = self.default_bg;
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_corners() {
        let t = default_table(&BASE16);
        assert_eq!(t[16], Rgb::BLACK);
        assert_eq!(t[231], Rgb::new(0xff, 0xff, 0xff));
        // 16 + 36*5 = 196 is pure red.
        assert_eq!(t[196], Rgb::new(0xff, 0, 0));
    }

    #[test]
    fn grayscale_ramp_endpoints() {
        let t = default_table(&BASE16);
        assert_eq!(t[232], Rgb::new(8, 8, 8));
        assert_eq!(t[255], Rgb::new(238, 238, 238));
    }

    #[test]
    fn set_and_reset_entry() {
        let mut p = Palette::default();
        let original = p.table[3];
        p.set_entry(3, Rgb::new(1, 2, 3));
        assert_eq!(p.table[3], Rgb::new(1, 2, 3));
        p.reset_entry(Some(3));
        assert_eq!(p.table[3], original);

        p.set_entry(200, Rgb::new(9, 9, 9));
        p.reset_entry(None);
        assert_eq!(p.table[200], p.default_table[200]);
    }
}
