//! Box-drawing lines: solid combos, dashes, doubles, arcs, diagonals
//! and half-lines (U+2500–U+257F).

use crate::buf::{Buf, Thick};

/// One arm of a junction glyph.
pub(crate) type Arm = Option<Thick>;

fn max_arm(a: Arm, b: Arm) -> Arm {
    match (a, b) {
        (Some(Thick::Heavy), _) | (_, Some(Thick::Heavy)) => Some(Thick::Heavy),
        (Some(Thick::Light), _) | (_, Some(Thick::Light)) => Some(Thick::Light),
        _ => None,
    }
}

/// Draw a junction of up to four arms meeting mid-cell. Each arm
/// extends past center by half the perpendicular stroke so corners
/// close without gaps.
pub(crate) fn junction(buf: &mut Buf, left: Arm, right: Arm, up: Arm, down: Arm) {
    let w = buf.width as isize;
    let h = buf.height as isize;
    let vthick = max_arm(up, down).map(|t| buf.thick(t)).unwrap_or(0) as isize;
    let hthick = max_arm(left, right).map(|t| buf.thick(t)).unwrap_or(0) as isize;

    if let Some(t) = left {
        let t = buf.thick(t);
        buf.hline(0, (w + vthick) / 2, (h - t as isize) / 2, t);
    }
    if let Some(t) = right {
        let t = buf.thick(t);
        buf.hline((w - vthick) / 2, w, (h - t as isize) / 2, t);
    }
    if let Some(t) = up {
        let t = buf.thick(t);
        buf.vline(0, (h + hthick) / 2, (w - t as isize) / 2, t);
    }
    if let Some(t) = down {
        let t = buf.thick(t);
        buf.vline((h - hthick) / 2, h, (w - t as isize) / 2, t);
    }
}

pub(crate) fn hline_middle(buf: &mut Buf, t: Thick) {
    let t = buf.thick(t);
    buf.hline(0, buf.width as isize, (buf.height as isize - t as isize) / 2, t);
}

pub(crate) fn vline_middle(buf: &mut Buf, t: Thick) {
    let t = buf.thick(t);
    buf.vline(0, buf.height as isize, (buf.width as isize - t as isize) / 2, t);
}

// --- dashes ----------------------------------------------------------

/// Partition the width into `count` dashes with `gap` pixels between;
/// the gap shrinks before the dashes do.
pub(crate) fn dash_horizontal(buf: &mut Buf, count: usize, thick: usize, mut gap: usize) {
    debug_assert!((2..=4).contains(&count));
    let width = buf.width;
    let height = buf.height as isize;
    let gap_count = count - 1;

    let mut dash_width = (width.saturating_sub(gap_count * gap)) / count;
    while dash_width == 0 && gap > 1 {
        gap -= 1;
        dash_width = (width.saturating_sub(gap_count * gap)) / count;
    }
    if dash_width == 0 {
        hline_middle(buf, Thick::Light);
        return;
    }

    let remaining = width - count * dash_width - gap_count * gap;

    let mut x = [0usize; 4];
    let mut w = [dash_width; 4];

    x[1] = x[0] + w[0] + gap;
    match count {
        2 => w[1] = width - x[1],
        3 => w[1] += remaining,
        _ => w[1] += remaining / 2,
    }
    if count >= 3 {
        x[2] = x[1] + w[1] + gap;
        if count == 3 {
            w[2] = width - x[2];
        } else {
            w[2] += remaining - remaining / 2;
        }
    }
    if count >= 4 {
        x[3] = x[2] + w[2] + gap;
        w[3] = width - x[3];
    }

    let y = (height - thick as isize) / 2;
    for i in 0..count {
        buf.hline(x[i] as isize, (x[i] + w[i]) as isize, y, thick);
    }
}

pub(crate) fn dash_vertical(buf: &mut Buf, count: usize, thick: usize, mut gap: usize) {
    debug_assert!((2..=4).contains(&count));
    let height = buf.height;
    let width = buf.width as isize;
    let gap_count = count - 1;

    let mut dash_height = (height.saturating_sub(gap_count * gap)) / count;
    while dash_height == 0 && gap > 1 {
        gap -= 1;
        dash_height = (height.saturating_sub(gap_count * gap)) / count;
    }
    if dash_height == 0 {
        vline_middle(buf, Thick::Light);
        return;
    }

    let remaining = height - count * dash_height - gap_count * gap;

    let mut y = [0usize; 4];
    let mut h = [dash_height; 4];

    y[1] = y[0] + h[0] + gap;
    match count {
        2 => h[1] = height - y[1],
        3 => h[1] += remaining,
        _ => h[1] += remaining / 2,
    }
    if count >= 3 {
        y[2] = y[1] + h[1] + gap;
        if count == 3 {
            h[2] = height - y[2];
        } else {
            h[2] += remaining - remaining / 2;
        }
    }
    if count >= 4 {
        y[3] = y[2] + h[2] + gap;
        h[3] = height - y[3];
    }

    let x = (width - thick as isize) / 2;
    for i in 0..count {
        buf.vline(y[i] as isize, (y[i] + h[i]) as isize, x, thick);
    }
}

// --- doubles ---------------------------------------------------------

/// Double-line glyphs (U+2550–U+256C). Both rails use LIGHT thickness
/// `t`; for a double pair the first rail sits at `(extent - 3t)/2` and
/// the second `2t` further, so the gap between rails equals `t`. Rail
/// endpoints at mixed junctions are individually tuned (ported
/// coordinates, not derived).
pub(crate) fn double_box(buf: &mut Buf, cp: char) {
    let t = buf.thick(Thick::Light) as isize;
    let w = buf.width as isize;
    let h = buf.height as isize;
    let tu = t as usize;

    match cp {
        '═' => {
            let hmid = (h - t * 3) / 2;
            buf.hline(0, w, hmid, tu);
            buf.hline(0, w, hmid + 2 * t, tu);
        }
        '║' => {
            let vmid = (w - t * 3) / 2;
            buf.vline(0, h, vmid, tu);
            buf.vline(0, h, vmid + 2 * t, tu);
        }
        '╒' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t) / 2;
            buf.vline((h - t) / 2, h, vmid, tu);
            buf.hline(vmid, w, hmid, tu);
            buf.hline(vmid, w, hmid + 2 * t, tu);
        }
        '╓' => {
            let hmid = (h - t) / 2;
            let vmid = (w - t * 3) / 2;
            buf.hline((w - t) / 2, w, hmid, tu);
            buf.vline(hmid, h, vmid, tu);
            buf.vline(hmid, h, vmid + 2 * t, tu);
        }
        '╔' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t * 3) / 2;
            buf.vline(hmid, h, vmid, tu);
            buf.vline(hmid + 2 * t, h, vmid + 2 * t, tu);
            buf.hline(vmid, w, hmid, tu);
            buf.hline(vmid + 2 * t, w, hmid + 2 * t, tu);
        }
        '╕' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w + t) / 2;
            buf.vline((h - t) / 2, h, (w - t) / 2, tu);
            buf.hline(0, vmid, hmid, tu);
            buf.hline(0, vmid, hmid + 2 * t, tu);
        }
        '╖' => {
            let hmid = (h - t) / 2;
            let vmid = (w - t * 3) / 2;
            buf.hline(0, (w + t) / 2, hmid, tu);
            buf.vline(hmid, h, vmid, tu);
            buf.vline(hmid, h, vmid + 2 * t, tu);
        }
        '╗' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t * 3) / 2;
            buf.vline(hmid + 2 * t, h, vmid, tu);
            buf.vline(hmid, h, vmid + 2 * t, tu);
            buf.hline(0, vmid + 2 * t, hmid, tu);
            buf.hline(0, vmid, hmid + 2 * t, tu);
        }
        '╘' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t) / 2;
            buf.vline(0, (h + t) / 2, vmid, tu);
            buf.hline(vmid, w, hmid, tu);
            buf.hline(vmid, w, hmid + 2 * t, tu);
        }
        '╙' => {
            let hmid = (h + t) / 2;
            let vmid = (w - t * 3) / 2;
            buf.hline((w - t) / 2, w, (h - t) / 2, tu);
            buf.vline(0, hmid, vmid, tu);
            buf.vline(0, hmid, vmid + 2 * t, tu);
        }
        '╚' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t * 3) / 2;
            buf.vline(0, hmid + 2 * t, vmid, tu);
            buf.vline(0, hmid, vmid + 2 * t, tu);
            buf.hline(vmid + 2 * t, w, hmid, tu);
            buf.hline(vmid, w, hmid + 2 * t, tu);
        }
        '╛' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w + t) / 2;
            buf.vline(0, (h + t) / 2, (w - t) / 2, tu);
            buf.hline(0, vmid, hmid, tu);
            buf.hline(0, vmid, hmid + 2 * t, tu);
        }
        '╜' => {
            let hmid = (h + t) / 2;
            let vmid = (w - t * 3) / 2;
            buf.hline(0, (w + t) / 2, (h - t) / 2, tu);
            buf.vline(0, hmid, vmid, tu);
            buf.vline(0, hmid, vmid + 2 * t, tu);
        }
        '╝' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t * 3) / 2;
            buf.vline(0, hmid + t, vmid, tu);
            buf.vline(0, hmid + 2 * t + t, vmid + 2 * t, tu);
            buf.hline(0, vmid, hmid, tu);
            buf.hline(0, vmid + 2 * t, hmid + 2 * t, tu);
        }
        '╞' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t) / 2;
            vline_middle(buf, Thick::Light);
            buf.hline(vmid, w, hmid, tu);
            buf.hline(vmid, w, hmid + 2 * t, tu);
        }
        '╟' => {
            let vmid = (w - t * 3) / 2;
            buf.hline(vmid + 2 * t, w, (h - t) / 2, tu);
            buf.vline(0, h, vmid, tu);
            buf.vline(0, h, vmid + 2 * t, tu);
        }
        '╠' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t * 3) / 2;
            buf.vline(0, h, vmid, tu);
            buf.vline(0, hmid, vmid + 2 * t, tu);
            buf.vline(hmid + 2 * t, h, vmid + 2 * t, tu);
            buf.hline(vmid + 2 * t, w, hmid, tu);
            buf.hline(vmid + 2 * t, w, hmid + 2 * t, tu);
        }
        '╡' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w + t) / 2;
            vline_middle(buf, Thick::Light);
            buf.hline(0, vmid, hmid, tu);
            buf.hline(0, vmid, hmid + 2 * t, tu);
        }
        '╢' => {
            let vmid = (w - t * 3) / 2;
            buf.hline(0, vmid, (h - t) / 2, tu);
            buf.vline(0, h, vmid, tu);
            buf.vline(0, h, vmid + 2 * t, tu);
        }
        '╣' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t * 3) / 2;
            buf.vline(0, h, vmid + 2 * t, tu);
            buf.vline(0, hmid, vmid, tu);
            buf.vline(hmid + 2 * t, h, vmid, tu);
            buf.hline(0, vmid + t, hmid, tu);
            buf.hline(0, vmid, hmid + 2 * t, tu);
        }
        '╤' => {
            let hmid = (h - t * 3) / 2;
            buf.vline(hmid + 2 * t, h, (w - t) / 2, tu);
            buf.hline(0, w, hmid, tu);
            buf.hline(0, w, hmid + 2 * t, tu);
        }
        '╥' => {
            let hmid = (h - t) / 2;
            let vmid = (w - t * 3) / 2;
            hline_middle(buf, Thick::Light);
            buf.vline(hmid, h, vmid, tu);
            buf.vline(hmid, h, vmid + 2 * t, tu);
        }
        '╦' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t * 3) / 2;
            buf.hline(0, w, hmid, tu);
            buf.hline(0, vmid, hmid + 2 * t, tu);
            buf.hline(vmid + 2 * t, w, hmid + 2 * t, tu);
            buf.vline(hmid + 2 * t, h, vmid, tu);
            buf.vline(hmid + 2 * t, h, vmid + 2 * t, tu);
        }
        '╧' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t) / 2;
            buf.vline(0, hmid, vmid, tu);
            buf.hline(0, w, hmid, tu);
            buf.hline(0, w, hmid + 2 * t, tu);
        }
        '╨' => {
            let hmid = (h - t) / 2;
            let vmid = (w - t * 3) / 2;
            hline_middle(buf, Thick::Light);
            buf.vline(0, hmid, vmid, tu);
            buf.vline(0, hmid, vmid + 2 * t, tu);
        }
        '╩' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t * 3) / 2;
            buf.vline(0, hmid, vmid, tu);
            buf.vline(0, hmid, vmid + 2 * t, tu);
            buf.hline(0, vmid + t, hmid, tu);
            buf.hline(vmid + 2 * t, w, hmid, tu);
            buf.hline(0, w, hmid + 2 * t, tu);
        }
        '╪' => {
            let hmid = (h - t * 3) / 2;
            vline_middle(buf, Thick::Light);
            buf.hline(0, w, hmid, tu);
            buf.hline(0, w, hmid + 2 * t, tu);
        }
        '╫' => {
            let vmid = (w - t * 3) / 2;
            hline_middle(buf, Thick::Light);
            buf.vline(0, h, vmid, tu);
            buf.vline(0, h, vmid + 2 * t, tu);
        }
        '╬' => {
            let hmid = (h - t * 3) / 2;
            let vmid = (w - t * 3) / 2;
            buf.hline(0, vmid, hmid, tu);
            buf.hline(vmid + 2 * t, w, hmid, tu);
            buf.hline(0, vmid, hmid + 2 * t, tu);
            buf.hline(vmid + 2 * t, w, hmid + 2 * t, tu);
            buf.vline(0, hmid + t, vmid, tu);
            buf.vline(0, hmid, vmid + 2 * t, tu);
            buf.vline(hmid + 2 * t, h, vmid, tu);
            buf.vline(hmid + 2 * t, h, vmid + 2 * t, tu);
        }
        _ => unreachable!("not a double-line glyph"),
    }
}

// --- arcs and diagonals ----------------------------------------------

/// Light arcs ╭ ╮ ╯ ╰: a quarter circle connecting the two incoming
/// lines, drawn by stamping thickness-radius dots along a supersampled
/// circle, then extended to the box edges with straight lines.
pub(crate) fn light_arc(buf: &mut Buf, cp: char) {
    let supersample: usize = if buf.format == crate::buf::MaskFormat::A8 { 4 } else { 1 };
    let width_px = buf.width as isize;
    let height_px = buf.height as isize;
    let thick_px = buf.thick(Thick::Light) as isize;

    let width = width_px * supersample as isize;
    let height = height_px * supersample as isize;
    let thick = thick_px * supersample as isize;
    let mut hi: Vec<u8> = vec![0; (width * height) as usize];

    let circle_inner_edge = (width_px.min(height_px) - thick_px) / 2;
    let mut c_r = circle_inner_edge as f64 + thick_px as f64 / 2.0;

    let (c_x, c_y, hemisphere, y_min, y_max, vert_to, hor_to);
    match cp {
        '╭' => {
            let right_bottom_edge = (height_px + thick_px) / 2;
            let bottom_right_edge = (width_px + thick_px) / 2;
            c_y = right_bottom_edge + circle_inner_edge;
            c_x = bottom_right_edge + circle_inner_edge;
            hemisphere = -1.0;
            y_min = 0;
            y_max = c_y;
            vert_to = height_px;
            hor_to = width_px;
        }
        '╮' => {
            let left_bottom_edge = (height_px + thick_px) / 2;
            let bottom_left_edge = (width_px - thick_px) / 2;
            c_y = left_bottom_edge + circle_inner_edge;
            c_x = bottom_left_edge - circle_inner_edge;
            hemisphere = 1.0;
            y_min = 0;
            y_max = c_y;
            vert_to = height_px;
            hor_to = 0;
        }
        '╰' => {
            let right_top_edge = (height_px - thick_px) / 2;
            let top_right_edge = (width_px + thick_px) / 2;
            c_y = right_top_edge - circle_inner_edge;
            c_x = top_right_edge + circle_inner_edge;
            hemisphere = -1.0;
            y_min = c_y;
            y_max = height_px;
            vert_to = 0;
            hor_to = width_px;
        }
        _ => {
            // '╯'
            let left_top_edge = (height_px - thick_px) / 2;
            let top_left_edge = (width_px - thick_px) / 2;
            c_y = left_top_edge - circle_inner_edge;
            c_x = top_left_edge - circle_inner_edge;
            hemisphere = 1.0;
            y_min = c_y;
            y_max = height_px;
            vert_to = 0;
            hor_to = 0;
        }
    }

    let (c_x_px, c_y_px) = (c_x, c_y);
    let ss = supersample as isize;
    c_r *= supersample as f64;
    let (c_x, c_y) = ((c_x * ss) as f64, (c_y * ss) as f64);
    let (y_min, y_max) = (y_min * ss, y_max * ss);
    let c_r2 = c_r * c_r;

    // Oversample the parameter so the circle has no gaps; an uneven
    // factor lands exactly on the half-pixel the arc ends in.
    let mut i = (y_min * 16) as f64;
    while i <= (y_max * 16) as f64 {
        let y = i / 16.0;
        let d2 = c_r2 - (y - c_y) * (y - c_y);
        i += 1.0;
        if d2 < 0.0 {
            continue;
        }
        let x = hemisphere * d2.sqrt() + c_x;
        if !x.is_finite() || x < 0.0 {
            continue;
        }

        let row = y.round() as isize;
        let col = x.round() as isize;
        let r0 = (row - (thick / 2 + 1)).max(0);
        let r1 = (row + thick / 2 + 1).min(height);
        let c0 = (col - (thick / 2 + 1)).max(0);
        let c1 = (col + thick / 2 + 1).min(width);

        for r in r0..r1 {
            let rm = r as f64 + 0.5;
            for c in c0..c1 {
                let cm = c as f64 + 0.5;
                let dist = ((cm - x) * (cm - x) + (rm - y) * (rm - y)).sqrt();
                if dist <= thick as f64 / 2.0 {
                    hi[(r * width + c) as usize] = 0xff;
                }
            }
        }
    }

    // Downsample into the mask.
    for py in 0..buf.height {
        for px in 0..buf.width {
            let mut total = 0u32;
            for sy in 0..supersample {
                for sx in 0..supersample {
                    total += hi[(py * supersample + sy) * width as usize
                        + px * supersample
                        + sx] as u32;
                }
            }
            let avg = (total / (supersample * supersample) as u32).min(0xff) as u8;
            if avg > 0 {
                match buf.format {
                    crate::buf::MaskFormat::A8 => {
                        buf.data[py * buf.stride + px] = buf.data[py * buf.stride + px].max(avg);
                    }
                    crate::buf::MaskFormat::A1 => {
                        if avg >= 0x80 {
                            buf.set(px, py);
                        }
                    }
                }
            }
        }
    }

    // Straight continuations to the box edges.
    buf.vline(
        c_y_px.min(vert_to),
        c_y_px.max(vert_to),
        (width_px - thick_px) / 2,
        thick_px as usize,
    );
    buf.hline(
        c_x_px.min(hor_to),
        c_x_px.max(hor_to),
        (height_px - thick_px) / 2,
        thick_px as usize,
    );
}

/// ╲-family diagonals as thick quads.
pub(crate) fn diagonal(buf: &mut Buf, upper_left_to_lower_right: bool) {
    let w = buf.width as f64;
    let h = buf.height as f64;
    let half = buf.thick(Thick::Light) as f64 / 2.0;
    let pts = if upper_left_to_lower_right {
        [
            (0.0 - half, 0.0),
            (0.0 + half, 0.0),
            (w + half, h),
            (w - half, h),
        ]
    } else {
        [
            (w - half, 0.0),
            (w + half, 0.0),
            (0.0 + half, h),
            (0.0 - half, h),
        ]
    };
    buf.fill_poly(&pts);
}
