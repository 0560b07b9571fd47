//! The default sixel color registers.
//!
//! Registers 0–15 are the classic VT-340 set (percent values scaled to
//! 8-bit); 16 onward reuse the xterm 6×6×6 cube and grayscale ramp so
//! clients that assume a 256-register terminal get sensible colors
//! without defining anything.

use core_color::Rgb;

/// Hard upper bound on the register file.
pub const MAX_COLORS: usize = 256;

/// VT-340 defaults, already converted from percent.
const VT340: [Rgb; 16] = [
    Rgb::new(0, 0, 0),       // 0  black
    Rgb::new(51, 51, 204),   // 1  blue
    Rgb::new(204, 33, 33),   // 2  red
    Rgb::new(51, 204, 51),   // 3  green
    Rgb::new(204, 51, 204),  // 4  magenta
    Rgb::new(51, 204, 204),  // 5  cyan
    Rgb::new(204, 204, 51),  // 6  yellow
    Rgb::new(135, 135, 135), // 7  gray 53%
    Rgb::new(66, 66, 66),    // 8  gray 26%
    Rgb::new(84, 84, 153),   // 9  light blue
    Rgb::new(153, 66, 66),   // 10 light red
    Rgb::new(84, 153, 84),   // 11 light green
    Rgb::new(153, 84, 153),  // 12 light magenta
    Rgb::new(84, 153, 153),  // 13 light cyan
    Rgb::new(153, 153, 84),  // 14 light yellow
    Rgb::new(204, 204, 204), // 15 gray 80%
];

/// Build a register file of `size` entries (2–256).
pub fn default_palette(size: usize) -> Vec<Rgb> {
    let size = size.clamp(2, MAX_COLORS);
    let mut palette = Vec::with_capacity(size);
    palette.extend_from_slice(&VT340[..size.min(16)]);

    for idx in 16..size {
        let entry = if idx < 232 {
            let v = idx - 16;
            let ch = |i: usize| if i == 0 { 0u8 } else { (55 + 40 * i) as u8 };
            Rgb::new(ch(v / 36), ch(v / 6 % 6), ch(v % 6))
        } else {
            let level = (8 + 10 * (idx - 232)) as u8;
            Rgb::new(level, level, level)
        };
        palette.push(entry);
    }

    palette
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_base_registers() {
        let p = default_palette(256);
        assert_eq!(p[0], Rgb::new(0, 0, 0));
        assert_eq!(p[1], Rgb::new(51, 51, 204));
        assert_eq!(p[15], Rgb::new(204, 204, 204));
    }

    #[test]
    fn cube_and_ramp_continue() {
        let p = default_palette(256);
        assert_eq!(p.len(), 256);
        assert_eq!(p[16], Rgb::new(0, 0, 0));
        assert_eq!(p[231], Rgb::new(255, 255, 255));
        assert_eq!(p[255], Rgb::new(238, 238, 238));
    }

    #[test]
    fn size_clamps() {
        assert_eq!(default_palette(0).len(), 2);
        assert_eq!(default_palette(10_000).len(), 256);
    }
}
