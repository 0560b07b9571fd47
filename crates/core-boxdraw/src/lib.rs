//! Procedural glyphs for box drawing, block elements, braille and the
//! legacy-computing mosaics.
//!
//! Fonts rarely cover these ranges at the exact metrics of a terminal
//! cell, and even when they do the results misalign between adjacent
//! cells. Everything here is synthesized at the requested cell size
//! instead: the output is an alpha mask exactly one cell large with an
//! advance equal to the cell, so runs of line-drawing characters butt
//! together with no seams.
//!
//! Covered ranges: U+2500..=U+259F (box/blocks), U+2800..=U+28FF
//! (braille), U+1FB00..=U+1FB9B (legacy computing).

pub mod blocks;
pub mod buf;
pub mod lines;
pub mod mosaic;

pub use buf::{MaskFormat, Thick};

use buf::{stride_for, Buf};
use lines::Arm;
use Thick::{Heavy, Light};

/// Synthesis knobs, straight from configuration.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Stroke width as a fraction of the cell diagonal.
    pub base_thickness: f64,
    /// Solid translucent shade blocks instead of stipple patterns.
    pub solid_shades: bool,
    /// Produce 8-bit masks (A1 otherwise).
    pub antialias: bool,
    pub dpi: f64,
    pub scale: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_thickness: 0.04,
            solid_shades: true,
            antialias: true,
            dpi: 96.0,
            scale: 1.0,
        }
    }
}

/// A finished glyph mask, cell-sized, advance == cell width.
#[derive(Debug, Clone)]
pub struct GlyphMask {
    pub data: Vec<u8>,
    pub format: MaskFormat,
    pub width: usize,
    pub height: usize,
    pub stride: usize,
}

/// Is `cp` in a range we synthesize?
pub fn covers(cp: char) -> bool {
    matches!(cp as u32,
        0x2500..=0x259f | 0x2800..=0x28ff | 0x1fb00..=0x1fb9b)
}

/// Rasterize `cp` at the given cell geometry.
pub fn draw(cp: char, cell_width: usize, cell_height: usize, opts: &Options) -> GlyphMask {
    debug_assert!(covers(cp));
    let width = cell_width.max(1);
    let height = cell_height.max(1);

    let format = if opts.antialias {
        MaskFormat::A8
    } else {
        MaskFormat::A1
    };
    let stride = stride_for(format, width);

    let diagonal = ((width * width + height * height) as f64).sqrt();
    let base =
        ((opts.base_thickness * opts.scale * diagonal * opts.dpi / 72.0) as usize).max(1);

    // Thirds overlap by a pixel for some heights so sextant rows butt
    // together without a seam.
    let (y0, y1) = match height % 3 {
        0 => (height / 3, 2 * height / 3),
        1 => (height / 3, 2 * height / 3 + 1),
        _ => (height / 3 + 1, height / 3 + 1 + height / 3),
    };

    let mut buf = Buf {
        data: vec![0; stride * height],
        format,
        width,
        height,
        stride,
        solid_shades: opts.solid_shades,
        thickness: [base, 3 * base],
        x_halfs: [
            (width as f64 / 2.0).round() as usize, // end of first half
            width / 2,                             // start of second half
        ],
        y_thirds: [y0, y1],
    };

    dispatch(&mut buf, cp);

    GlyphMask {
        stride: buf.stride,
        format: buf.format,
        width: buf.width,
        height: buf.height,
        data: buf.data,
    }
}

/// `(left, right, up, down)` arms for the solid-line combinations
/// U+250C..=U+254B. The four-glyph corner groups repeat a fixed
/// light/heavy pattern; tees and crosses are spelled out.
fn solid_arms(cp: u32) -> (Arm, Arm, Arm, Arm) {
    const L: Arm = Some(Light);
    const H: Arm = Some(Heavy);
    const N: Arm = None;
    match cp {
        0x250c => (N, L, N, L),
        0x250d => (N, H, N, L),
        0x250e => (N, L, N, H),
        0x250f => (N, H, N, H),
        0x2510 => (L, N, N, L),
        0x2511 => (H, N, N, L),
        0x2512 => (L, N, N, H),
        0x2513 => (H, N, N, H),
        0x2514 => (N, L, L, N),
        0x2515 => (N, H, L, N),
        0x2516 => (N, L, H, N),
        0x2517 => (N, H, H, N),
        0x2518 => (L, N, L, N),
        0x2519 => (H, N, L, N),
        0x251a => (L, N, H, N),
        0x251b => (H, N, H, N),
        0x251c => (N, L, L, L),
        0x251d => (N, H, L, L),
        0x251e => (N, L, H, L),
        0x251f => (N, L, L, H),
        0x2520 => (N, L, H, H),
        0x2521 => (N, H, H, L),
        0x2522 => (N, H, L, H),
        0x2523 => (N, H, H, H),
        0x2524 => (L, N, L, L),
        0x2525 => (H, N, L, L),
        0x2526 => (L, N, H, L),
        0x2527 => (L, N, L, H),
        0x2528 => (L, N, H, H),
        0x2529 => (H, N, H, L),
        0x252a => (H, N, L, H),
        0x252b => (H, N, H, H),
        0x252c => (L, L, N, L),
        0x252d => (H, L, N, L),
        0x252e => (L, H, N, L),
        0x252f => (H, H, N, L),
        0x2530 => (L, L, N, H),
        0x2531 => (H, L, N, H),
        0x2532 => (L, H, N, H),
        0x2533 => (H, H, N, H),
        0x2534 => (L, L, L, N),
        0x2535 => (H, L, L, N),
        0x2536 => (L, H, L, N),
        0x2537 => (H, H, L, N),
        0x2538 => (L, L, H, N),
        0x2539 => (H, L, H, N),
        0x253a => (L, H, H, N),
        0x253b => (H, H, H, N),
        0x253c => (L, L, L, L),
        0x253d => (H, L, L, L),
        0x253e => (L, H, L, L),
        0x253f => (H, H, L, L),
        0x2540 => (L, L, H, L),
        0x2541 => (L, L, L, H),
        0x2542 => (L, L, H, H),
        0x2543 => (H, L, H, L),
        0x2544 => (L, H, H, L),
        0x2545 => (H, L, L, H),
        0x2546 => (L, H, L, H),
        0x2547 => (H, H, H, L),
        0x2548 => (H, H, L, H),
        0x2549 => (H, L, H, H),
        0x254a => (L, H, H, H),
        0x254b => (H, H, H, H),
        _ => unreachable!(),
    }
}

fn dispatch(buf: &mut Buf, cp: char) {
    let code = cp as u32;
    let light = buf.thick(Light);
    let heavy = buf.thick(Heavy);

    match code {
        0x2500 => lines::hline_middle(buf, Light),
        0x2501 => lines::hline_middle(buf, Heavy),
        0x2502 => lines::vline_middle(buf, Light),
        0x2503 => lines::vline_middle(buf, Heavy),

        // Triple and quadruple dashes. Horizontal gaps are light-sized,
        // vertical gaps heavy-sized (narrow cells starve otherwise).
        0x2504 => lines::dash_horizontal(buf, 3, light, light),
        0x2505 => lines::dash_horizontal(buf, 3, heavy, light),
        0x2506 => lines::dash_vertical(buf, 3, light, heavy),
        0x2507 => lines::dash_vertical(buf, 3, heavy, heavy),
        0x2508 => lines::dash_horizontal(buf, 4, light, light),
        0x2509 => lines::dash_horizontal(buf, 4, heavy, light),
        0x250a => lines::dash_vertical(buf, 4, light, heavy),
        0x250b => lines::dash_vertical(buf, 4, heavy, heavy),

        0x250c..=0x254b => {
            let (l, r, u, d) = solid_arms(code);
            lines::junction(buf, l, r, u, d);
        }

        // Double dashes.
        0x254c => lines::dash_horizontal(buf, 2, light, light),
        0x254d => lines::dash_horizontal(buf, 2, heavy, light),
        0x254e => lines::dash_vertical(buf, 2, light, heavy),
        0x254f => lines::dash_vertical(buf, 2, heavy, heavy),

        0x2550..=0x256c => lines::double_box(buf, cp),

        0x256d..=0x2570 => lines::light_arc(buf, cp),
        0x2571 => lines::diagonal(buf, false),
        0x2572 => lines::diagonal(buf, true),
        0x2573 => {
            lines::diagonal(buf, false);
            lines::diagonal(buf, true);
        }

        // Half lines.
        0x2574 => lines::junction(buf, Some(Light), None, None, None),
        0x2575 => lines::junction(buf, None, None, Some(Light), None),
        0x2576 => lines::junction(buf, None, Some(Light), None, None),
        0x2577 => lines::junction(buf, None, None, None, Some(Light)),
        0x2578 => lines::junction(buf, Some(Heavy), None, None, None),
        0x2579 => lines::junction(buf, None, None, Some(Heavy), None),
        0x257a => lines::junction(buf, None, Some(Heavy), None, None),
        0x257b => lines::junction(buf, None, None, None, Some(Heavy)),
        0x257c => lines::junction(buf, Some(Light), Some(Heavy), None, None),
        0x257d => lines::junction(buf, None, None, Some(Light), Some(Heavy)),
        0x257e => lines::junction(buf, Some(Heavy), Some(Light), None, None),
        0x257f => lines::junction(buf, None, None, Some(Heavy), Some(Light)),

        // Blocks.
        0x2580 => blocks::upper_fraction(buf, 1, 2),
        0x2581..=0x2587 => blocks::lower_fraction(buf, (code - 0x2580) as usize, 8),
        0x2588 => {
            let (w, h) = (buf.width as isize, buf.height as isize);
            buf.rect(0, 0, w, h);
        }
        0x2589..=0x258f => blocks::left_fraction(buf, (0x2590 - code) as usize, 8),
        0x2590 => blocks::right_fraction(buf, 1, 2),
        0x2591 => blocks::shade(buf, 1),
        0x2592 => blocks::shade(buf, 2),
        0x2593 => blocks::shade(buf, 3),
        0x2594 => blocks::upper_fraction(buf, 1, 8),
        0x2595 => blocks::right_fraction(buf, 1, 8),
        0x2596..=0x259f => {
            blocks::quadrants(buf, blocks::QUADRANT_MATRIX[(code - 0x2596) as usize]);
        }

        0x2800..=0x28ff => mosaic::braille(buf, code),

        0x1fb00..=0x1fb3b => mosaic::sextant(buf, code),
        0x1fb3c..=0x1fb6f => mosaic::wedge(buf, code),

        0x1fb70..=0x1fb75 => blocks::vertical_eighth(buf, (code - 0x1fb70 + 1) as usize),
        0x1fb76..=0x1fb7b => blocks::horizontal_eighth(buf, (code - 0x1fb76 + 1) as usize),
        0x1fb7c => {
            blocks::left_fraction(buf, 1, 8);
            blocks::lower_fraction(buf, 1, 8);
        }
        0x1fb7d => {
            blocks::left_fraction(buf, 1, 8);
            blocks::upper_fraction(buf, 1, 8);
        }
        0x1fb7e => {
            blocks::right_fraction(buf, 1, 8);
            blocks::upper_fraction(buf, 1, 8);
        }
        0x1fb7f => {
            blocks::right_fraction(buf, 1, 8);
            blocks::lower_fraction(buf, 1, 8);
        }
        0x1fb80 => {
            blocks::upper_fraction(buf, 1, 8);
            blocks::lower_fraction(buf, 1, 8);
        }
        0x1fb81 => {
            // Rows 1, 3, 5 and 8 of eight.
            blocks::horizontal_eighth(buf, 0);
            blocks::horizontal_eighth(buf, 2);
            blocks::horizontal_eighth(buf, 4);
            blocks::horizontal_eighth(buf, 7);
        }
        0x1fb82 => blocks::upper_fraction(buf, 1, 4),
        0x1fb83 => blocks::upper_fraction(buf, 3, 8),
        0x1fb84 => blocks::upper_fraction(buf, 5, 8),
        0x1fb85 => blocks::upper_fraction(buf, 3, 4),
        0x1fb86 => blocks::upper_fraction(buf, 7, 8),
        0x1fb87 => blocks::right_fraction(buf, 1, 4),
        0x1fb88 => blocks::right_fraction(buf, 3, 8),
        0x1fb89 => blocks::right_fraction(buf, 5, 8),
        0x1fb8a => blocks::right_fraction(buf, 3, 4),
        0x1fb8b => blocks::right_fraction(buf, 7, 8),

        // Half and full medium shades.
        0x1fb8c => {
            let (w, h) = (buf.width as isize, buf.height as isize);
            blocks::half_shade(buf, 0, 0, w / 2, h);
        }
        0x1fb8d => {
            let (w, h) = (buf.width as isize, buf.height as isize);
            blocks::half_shade(buf, w / 2, 0, w, h);
        }
        0x1fb8e => {
            let (w, h) = (buf.width as isize, buf.height as isize);
            blocks::half_shade(buf, 0, 0, w, h / 2);
        }
        0x1fb8f => {
            let (w, h) = (buf.width as isize, buf.height as isize);
            blocks::half_shade(buf, 0, h / 2, w, h);
        }
        0x1fb90 => blocks::shade(buf, 2),
        0x1fb91 => {
            blocks::upper_fraction(buf, 1, 2);
            let (w, h) = (buf.width as isize, buf.height as isize);
            blocks::half_shade(buf, 0, h / 2, w, h);
        }
        0x1fb92 => {
            blocks::lower_fraction(buf, 1, 2);
            let (w, h) = (buf.width as isize, buf.height as isize);
            blocks::half_shade(buf, 0, 0, w, h / 2);
        }
        0x1fb93 => {
            // Left half block + right half shade (reserved in some
            // charts but symmetric with 1FB94).
            blocks::left_fraction(buf, 1, 2);
            let (w, h) = (buf.width as isize, buf.height as isize);
            blocks::half_shade(buf, w / 2, 0, w, h);
        }
        0x1fb94 => {
            blocks::right_fraction(buf, 1, 2);
            let (w, h) = (buf.width as isize, buf.height as isize);
            blocks::half_shade(buf, 0, 0, w / 2, h);
        }
        0x1fb95..=0x1fb99 => checkers(buf, code),
        0x1fb9a => {
            // Upper and lower triangles.
            let (w, h) = (buf.width as f64, buf.height as f64);
            buf.fill_poly(&[(0.0, 0.0), (w, 0.0), (w / 2.0, h / 2.0)]);
            buf.fill_poly(&[(0.0, h), (w, h), (w / 2.0, h / 2.0)]);
        }
        0x1fb9b => {
            // Left and right triangles.
            let (w, h) = (buf.width as f64, buf.height as f64);
            buf.fill_poly(&[(0.0, 0.0), (0.0, h), (w / 2.0, h / 2.0)]);
            buf.fill_poly(&[(w, 0.0), (w, h), (w / 2.0, h / 2.0)]);
        }

        _ => {
            tracing::debug!(target: "boxdraw", cp = code, "codepoint outside synthesized ranges");
        }
    }
}

/// U+1FB95..=U+1FB99: checker and diagonal fills, drawn on a 2×2-pixel
/// tile grid.
fn checkers(buf: &mut Buf, code: u32) {
    let tile = 2usize;
    for y in 0..buf.height {
        for x in 0..buf.width {
            let tx = x / tile;
            let ty = y / tile;
            let on = match code {
                0x1fb95 => (tx + ty) % 2 == 0,
                0x1fb96 => (tx + ty) % 2 == 1,
                // Heavy horizontal fill: alternating double rows.
                0x1fb97 => (y * 4 / buf.height.max(1)) % 2 == 1,
                // Diagonal fills.
                0x1fb98 => (x + y) % 4 < 2,
                _ => (x + buf.height - 1 - y) % 4 < 2,
            };
            if on {
                buf.set(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(cp: char) -> GlyphMask {
        draw(cp, 10, 20, &Options::default())
    }

    fn coverage(m: &GlyphMask) -> f64 {
        assert_eq!(m.format, MaskFormat::A8);
        let total: u64 = m.data.iter().map(|&v| v as u64).sum();
        total as f64 / (255.0 * (m.width * m.height) as f64)
    }

    #[test]
    fn every_covered_codepoint_renders() {
        let opts = Options::default();
        for range in [0x2500..=0x259f, 0x2800..=0x28ff, 0x1fb00..=0x1fb9b] {
            for code in range {
                let cp = char::from_u32(code).unwrap();
                assert!(covers(cp));
                let m = draw(cp, 7, 15, &opts);
                assert_eq!(m.width, 7);
                assert_eq!(m.height, 15);
            }
        }
    }

    #[test]
    fn sizes_down_to_one_pixel() {
        let opts = Options::default();
        for (w, h) in [(1, 1), (2, 3), (3, 7), (80, 2)] {
            for code in [0x2500u32, 0x2573, 0x256d, 0x2591, 0x28ff, 0x1fb9b] {
                let _ = draw(char::from_u32(code).unwrap(), w, h, &opts);
            }
        }
    }

    #[test]
    fn horizontal_line_spans_full_width() {
        let m = mask('─');
        let mid = m.height / 2;
        for x in 0..m.width {
            let column_hit = (0..m.height).any(|y| m.data[y * m.stride + x] != 0);
            assert!(column_hit, "gap at column {x}");
        }
        // The stroke hugs the vertical middle.
        assert!(m.data[mid * m.stride] != 0 || m.data[(mid - 1) * m.stride] != 0);
    }

    #[test]
    fn heavy_is_thicker_than_light() {
        let light = mask('─');
        let heavy = mask('━');
        assert!(coverage(&heavy) > coverage(&light) * 2.0);
    }

    #[test]
    fn corner_meets_in_the_middle() {
        // ┌: right and down arms must overlap at the center.
        let m = mask('┌');
        let (cx, cy) = (m.width / 2, m.height / 2);
        assert_ne!(m.data[cy * m.stride + cx], 0);
        // Top-left corner stays empty.
        assert_eq!(m.data[0], 0);
    }

    #[test]
    fn adjacent_cells_tile_seamlessly() {
        // ─ at the right edge and ─ at the left edge must both touch
        // their borders so runs connect.
        let m = mask('─');
        let mid_row = (m.height - 1) / 2;
        assert_ne!(m.data[mid_row * m.stride], 0);
        assert_ne!(m.data[mid_row * m.stride + m.width - 1], 0);
    }

    #[test]
    fn double_lines_have_a_gap() {
        let m = mask('═');
        // Somewhere mid-height there is an empty row between rails.
        let mut states = Vec::new();
        for y in 0..m.height {
            let any = (0..m.width).any(|x| m.data[y * m.stride + x] != 0);
            if states.last() != Some(&any) {
                states.push(any);
            }
        }
        // off, on, off, on, off.
        assert_eq!(states, vec![false, true, false, true, false]);
    }

    #[test]
    fn full_block_is_solid() {
        let m = mask('█');
        assert!(m.data.iter().all(|&v| v == 0xff));
    }

    #[test]
    fn shade_levels_order() {
        let light = coverage(&mask('░'));
        let medium = coverage(&mask('▒'));
        let dark = coverage(&mask('▓'));
        assert!(light < medium && medium < dark);
        assert!((light - 0.25).abs() < 0.02);
        assert!((medium - 0.5).abs() < 0.02);
        assert!((dark - 0.75).abs() < 0.02);
    }

    #[test]
    fn stipple_shades_honor_config() {
        let opts = Options {
            solid_shades: false,
            ..Options::default()
        };
        let m = draw('▒', 8, 8, &opts);
        assert_eq!(m.format, MaskFormat::A1);
    }

    #[test]
    fn arc_connects_its_two_edges() {
        // ╰ connects the top edge to the right edge.
        let m = mask('╰');
        let top_hit = (0..m.width).any(|x| m.data[x] != 0);
        let right_hit = (0..m.height).any(|y| m.data[y * m.stride + m.width - 1] != 0);
        assert!(top_hit, "arc misses the top edge");
        assert!(right_hit, "arc misses the right edge");
        // And stays clear of the lower-left corner.
        assert_eq!(m.data[(m.height - 1) * m.stride], 0);
    }

    #[test]
    fn diagonal_cross_hits_all_corners() {
        let m = mask('╳');
        let w = m.width;
        let h = m.height;
        for (x, y) in [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)] {
            assert_ne!(m.data[y * m.stride + x], 0, "corner ({x},{y})");
        }
    }

    #[test]
    fn left_eighth_and_right_eighth_disjoint() {
        let l = mask('▏');
        let r = mask('▕');
        for i in 0..l.data.len() {
            assert!(l.data[i] == 0 || r.data[i] == 0);
        }
    }

    #[test]
    fn braille_full_cell_has_eight_dots() {
        let m = mask('⣿');
        // Count connected dot rows crudely: at least some coverage in
        // all four quarters vertically.
        let quarter = m.height / 4;
        for q in 0..4 {
            let hit = (q * quarter..(q + 1) * quarter)
                .any(|y| (0..m.width).any(|x| m.data[y * m.stride + x] != 0));
            assert!(hit, "no dot in vertical quarter {q}");
        }
    }

    #[test]
    fn sextants_tile_the_cell() {
        // Upper-left only vs full-ish sextant patterns partition
        // consistently: U+1FB00 ∪ U+1FB3B misses only lower-right.
        let a = mask(char::from_u32(0x1fb00).unwrap());
        let b = mask(char::from_u32(0x1fb3b).unwrap());
        let both: Vec<u8> = a
            .data
            .iter()
            .zip(&b.data)
            .map(|(&x, &y)| x.max(y))
            .collect();
        // 1FB00 = segment 1 (upper left); 1FB3B = segments 2-6.
        let covered = both.iter().filter(|&&v| v > 0).count();
        assert_eq!(covered, a.data.len());
    }
}
