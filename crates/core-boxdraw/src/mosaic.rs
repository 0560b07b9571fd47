//! Sextants, wedge triangles and braille (U+1FB00-range, U+2800-range).

use crate::buf::Buf;

// --- sextants --------------------------------------------------------

// Segment numbering follows Unicode: 1 upper left, 2 upper right,
// 3 middle left, 4 middle right, 5 lower left, 6 lower right.
const UPPER_LEFT: u8 = 1 << 0;
const UPPER_RIGHT: u8 = 1 << 1;
const MIDDLE_LEFT: u8 = 1 << 2;
const MIDDLE_RIGHT: u8 = 1 << 3;
const LOWER_LEFT: u8 = 1 << 4;
const LOWER_RIGHT: u8 = 1 << 5;

/// U+1FB00..=U+1FB3B: every 2×3 combination except the empty cell,
/// the left/right half blocks (21 and 42, which live in U+2580-space)
/// and the full block.
fn sextant_mask(cp: u32) -> u8 {
    debug_assert!((0x1fb00..=0x1fb3b).contains(&cp));
    let mut n = (cp - 0x1fb00) as u8 + 1;
    if n >= 21 {
        n += 1;
    }
    if n >= 42 {
        n += 1;
    }
    n
}

pub(crate) fn sextant(buf: &mut Buf, cp: u32) {
    let mask = sextant_mask(cp);
    let (x0, x1) = (buf.x_halfs[0] as isize, buf.x_halfs[1] as isize);
    let (y0, y1) = (buf.y_thirds[0] as isize, buf.y_thirds[1] as isize);
    let (w, h) = (buf.width as isize, buf.height as isize);

    if mask & UPPER_LEFT != 0 {
        buf.rect(0, 0, x0, y0);
    }
    if mask & MIDDLE_LEFT != 0 {
        buf.rect(0, y0, x0, y1);
    }
    if mask & LOWER_LEFT != 0 {
        buf.rect(0, y1, x0, h);
    }
    if mask & UPPER_RIGHT != 0 {
        buf.rect(x1, 0, w, y0);
    }
    if mask & MIDDLE_RIGHT != 0 {
        buf.rect(x1, y0, w, y1);
    }
    if mask & LOWER_RIGHT != 0 {
        buf.rect(x1, y1, w, h);
    }
}

// --- wedges ----------------------------------------------------------

/// The filled triangle for one wedge codepoint (U+1FB3C..=U+1FB6F).
/// Smooth-mosaic codepoints share vertices between the "lower" and
/// "upper" variants; the *_and_box forms add a rectangle, the
/// U+1FB68..6B forms invert.
fn wedge_points(buf: &Buf, cp: u32) -> [(f64, f64); 3] {
    let w = buf.width as f64;
    let h = buf.height as f64;
    let h0 = buf.x_halfs[0] as f64;
    let h1 = buf.x_halfs[1] as f64;
    let t0 = buf.y_thirds[0] as f64;
    let t1 = buf.y_thirds[1] as f64;

    match cp {
        0x1fb3c | 0x1fb52 => [(0.0, t1), (0.0, h), (h0, h)],
        0x1fb3d | 0x1fb53 => [(0.0, t1), (0.0, h), (w, h)],
        0x1fb3e | 0x1fb54 => [(0.0, t0), (0.0, h), (h0, h)],
        0x1fb3f | 0x1fb55 => [(0.0, t0), (0.0, h), (w, h)],
        0x1fb40 | 0x1fb56 => [(0.0, 0.0), (0.0, h), (h0, h)],
        0x1fb47 | 0x1fb5d => [(w, t1), (w, h), (h1, h)],
        0x1fb48 | 0x1fb5e => [(w, t1), (w, h), (0.0, h)],
        0x1fb49 | 0x1fb5f => [(w, t0), (w, h), (h1, h)],
        0x1fb4a | 0x1fb60 => [(w, t0), (w, h), (0.0, h)],
        0x1fb4b | 0x1fb61 => [(w, 0.0), (w, h), (h1, h)],
        0x1fb41 | 0x1fb57 => [(0.0, 0.0), (0.0, t0), (h0, 0.0)],
        0x1fb42 | 0x1fb58 => [(0.0, 0.0), (0.0, t0), (w, 0.0)],
        0x1fb43 | 0x1fb59 => [(0.0, 0.0), (0.0, t1), (h0, 0.0)],
        0x1fb44 | 0x1fb5a => [(0.0, 0.0), (0.0, t1), (w, 0.0)],
        0x1fb45 | 0x1fb5b => [(0.0, 0.0), (0.0, h), (h0, 0.0)],
        0x1fb4c | 0x1fb62 => [(w, 0.0), (w, t0), (h1, 0.0)],
        0x1fb4d | 0x1fb63 => [(w, 0.0), (w, t0), (0.0, 0.0)],
        0x1fb4e | 0x1fb64 => [(w, 0.0), (w, t1), (h1, 0.0)],
        0x1fb4f | 0x1fb65 => [(w, 0.0), (w, t1), (0.0, 0.0)],
        0x1fb50 | 0x1fb66 => [(w, 0.0), (w, h), (h1, 0.0)],
        0x1fb46 => [(0.0, t1), (w, t0), (w, t1)],
        0x1fb51 => [(0.0, t0), (0.0, t1), (w, t1)],
        0x1fb5c => [(0.0, t0), (0.0, t1), (w, t0)],
        0x1fb67 => [(0.0, t0), (w, t0), (w, t1)],
        // Arrow-head / hollow forms.
        0x1fb68 | 0x1fb6c => [(0.0, 0.0), (h0, h / 2.0), (0.0, h)],
        0x1fb69 | 0x1fb6d => [(0.0, 0.0), (h1, h / 2.0), (w, 0.0)],
        0x1fb6a | 0x1fb6e => [(w, 0.0), (h1, h / 2.0), (w, h)],
        0x1fb6b | 0x1fb6f => [(0.0, h), (h1, h / 2.0), (w, h)],
        _ => unreachable!("not a wedge codepoint"),
    }
}

pub(crate) fn wedge(buf: &mut Buf, cp: u32) {
    let pts = wedge_points(buf, cp);
    buf.fill_poly(&pts);

    match cp {
        // Triangle plus the adjacent smooth-mosaic box.
        0x1fb46 | 0x1fb51 => {
            let y1 = buf.y_thirds[1] as isize;
            buf.rect(0, y1, buf.width as isize, buf.height as isize);
        }
        0x1fb5c | 0x1fb67 => {
            let y0 = buf.y_thirds[0] as isize;
            buf.rect(0, 0, buf.width as isize, y0);
        }
        // Hollow variants: everything but the triangle.
        0x1fb68..=0x1fb6b => buf.invert(),
        _ => {}
    }
}

// --- braille ---------------------------------------------------------

/// U+2800..=U+28FF. Dots on a 2×4 grid; the margin/spacing/dot-width
/// adjustment passes run in a fixed order and distribute leftover
/// pixels one class at a time. The order is load-bearing: changing it
/// shifts dots by a pixel at small cell sizes.
pub(crate) fn braille(buf: &mut Buf, cp: u32) {
    let mut w = (buf.width / 4).min(buf.height / 8);
    let mut x_spacing = buf.width / 4;
    let mut y_spacing = buf.height / 8;
    let mut x_margin = x_spacing / 2;
    let mut y_margin = y_spacing / 2;

    let mut x_px_left = buf
        .width
        .saturating_sub(2 * x_margin + x_spacing + 2 * w);
    let mut y_px_left = buf
        .height
        .saturating_sub(2 * y_margin + 3 * y_spacing + 4 * w);

    // First, try hard to ensure the dot width is non-zero.
    if x_px_left >= 2 && y_px_left >= 4 && w == 0 {
        w += 1;
        x_px_left -= 2;
        y_px_left -= 4;
    }

    // Second, prefer a non-zero margin.
    if x_px_left >= 2 && x_margin == 0 {
        x_margin = 1;
        x_px_left -= 2;
    }
    if y_px_left >= 2 && y_margin == 0 {
        y_margin = 1;
        y_px_left -= 2;
    }

    // Third, increase spacing.
    if x_px_left >= 1 {
        x_spacing += 1;
        x_px_left -= 1;
    }
    if y_px_left >= 3 {
        y_spacing += 1;
        y_px_left -= 3;
    }

    // Fourth, margins again (side padding).
    if x_px_left >= 2 {
        x_margin += 1;
        x_px_left -= 2;
    }
    if y_px_left >= 2 {
        y_margin += 1;
        y_px_left -= 2;
    }

    // Last, grow the dots themselves.
    if x_px_left >= 2 && y_px_left >= 4 {
        w += 1;
    }

    let x = [x_margin, x_margin + w + x_spacing];
    let mut y = [y_margin, 0, 0, 0];
    y[1] = y[0] + w + y_spacing;
    y[2] = y[1] + w + y_spacing;
    y[3] = y[2] + w + y_spacing;

    let sym = (cp - 0x2800) as u8;
    let dot = |buf: &mut Buf, cx: usize, cy: usize| {
        buf.rect(cx as isize, cy as isize, (cx + w) as isize, (cy + w) as isize);
    };

    // Left column, dots 1-3.
    if sym & 1 != 0 {
        dot(buf, x[0], y[0]);
    }
    if sym & 2 != 0 {
        dot(buf, x[0], y[1]);
    }
    if sym & 4 != 0 {
        dot(buf, x[0], y[2]);
    }
    // Right column, dots 4-6.
    if sym & 8 != 0 {
        dot(buf, x[1], y[0]);
    }
    if sym & 16 != 0 {
        dot(buf, x[1], y[1]);
    }
    if sym & 32 != 0 {
        dot(buf, x[1], y[2]);
    }
    // Dots 7-8.
    if sym & 64 != 0 {
        dot(buf, x[0], y[3]);
    }
    if sym & 128 != 0 {
        dot(buf, x[1], y[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buf::{stride_for, MaskFormat};

    fn buf(w: usize, h: usize) -> Buf {
        Buf {
            data: vec![0; w * h],
            format: MaskFormat::A8,
            width: w,
            height: h,
            stride: stride_for(MaskFormat::A8, w),
            solid_shades: true,
            thickness: [1, 3],
            x_halfs: [w.div_ceil(2), w / 2],
            y_thirds: [h / 3, 2 * h / 3],
        }
    }

    fn coverage(b: &Buf) -> f64 {
        let total: u64 = b.data.iter().map(|&v| v as u64).sum();
        total as f64 / (255.0 * (b.width * b.height) as f64)
    }

    #[test]
    fn sextant_mask_skips_half_blocks() {
        // First and last codepoints of the range.
        assert_eq!(sextant_mask(0x1fb00), UPPER_LEFT);
        assert_eq!(sextant_mask(0x1fb01), UPPER_RIGHT);
        // The left-half-block pattern (0b000111) is skipped.
        assert_ne!(
            sextant_mask(0x1fb06),
            UPPER_LEFT | MIDDLE_LEFT | LOWER_LEFT
        );
        assert_eq!(sextant_mask(0x1fb3b), 0b111110);
    }

    #[test]
    fn full_left_column_sextant() {
        // U+1FB27 is "upper left + middle left + lower left + upper
        // right"? Use a simple one instead: U+1FB00 covers only the
        // upper-left sixth.
        let mut b = buf(8, 12);
        sextant(&mut b, 0x1fb00);
        assert_eq!(b.data[0], 0xff);
        assert_eq!(b.data[11 * 8 + 7], 0);
        let c = coverage(&b);
        assert!((c - 1.0 / 6.0).abs() < 0.05, "coverage {c}");
    }

    #[test]
    fn wedge_covers_roughly_expected_area() {
        let mut b = buf(10, 18);
        // U+1FB45: triangle over the whole left half-diagonal.
        wedge(&mut b, 0x1fb45);
        let c = coverage(&b);
        assert!(c > 0.15 && c < 0.40, "coverage {c}");
    }

    #[test]
    fn inverted_wedge_is_complement() {
        let mut plain = buf(10, 18);
        let mut inverted = buf(10, 18);
        wedge(&mut plain, 0x1fb6c);
        wedge(&mut inverted, 0x1fb68);
        let sum = coverage(&plain) + coverage(&inverted);
        assert!((sum - 1.0).abs() < 0.02, "sum {sum}");
    }

    #[test]
    fn braille_dot_counts_scale_coverage() {
        let mut one = buf(8, 16);
        braille(&mut one, 0x2801); // dot 1
        let mut all = buf(8, 16);
        braille(&mut all, 0x28ff); // all eight dots
        assert!(coverage(&all) > 6.0 * coverage(&one));
        assert!(coverage(&one) > 0.0);
    }

    #[test]
    fn braille_blank_is_blank() {
        let mut b = buf(8, 16);
        braille(&mut b, 0x2800);
        assert!(b.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn braille_tiny_cell_does_not_panic() {
        for (w, h) in [(1, 2), (2, 4), (3, 5), (2, 2)] {
            let mut b = buf(w, h);
            braille(&mut b, 0x28ff);
        }
    }
}
