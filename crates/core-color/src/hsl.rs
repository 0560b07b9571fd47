//! HSL/HLS ↔ RGB conversion.
//!
//! Two related but distinct color spaces live here. `hsl_to_rgb` /
//! `rgb_to_hsl` are the standard formulation (hue 0° = red), used by
//! OSC color handling. Sixel color registers instead speak DEC HLS:
//! the argument order is (hue, lightness, saturation) and the hue
//! circle is rotated so 0° is *blue* — collapsing the two produces
//! registers rotated a third of the way around the wheel. All
//! components are integers, hue in degrees, lightness/saturation in
//! percent; inputs outside the nominal ranges clamp.

use crate::Rgb;

/// Convert hue (degrees, 0–360), saturation (percent) and lightness
/// (percent) to RGB.
pub fn hsl_to_rgb(hue: i32, sat: i32, lum: i32) -> Rgb {
    let l = (lum.clamp(0, 100) as f64) / 100.0;
    let s = (sat.clamp(0, 100) as f64) / 100.0;
    let h = hue.rem_euclid(360) as f64;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h as u32 {
        0..60 => (c, x, 0.0),
        60..120 => (x, c, 0.0),
        120..180 => (0.0, c, x),
        180..240 => (0.0, x, c),
        240..300 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb::new(
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

/// DEC HLS, as spoken by sixel color registers: argument order is
/// hue, lightness, saturation, and hue 0° is blue (red sits at 120°,
/// green at 240°). Rotating by +240° maps onto the standard formula.
pub fn hls_to_rgb(hue: i32, lum: i32, sat: i32) -> Rgb {
    hsl_to_rgb(hue + 240, sat, lum)
}

/// Convert RGB to (hue degrees, saturation percent, lightness percent).
pub fn rgb_to_hsl(color: Rgb) -> (i32, i32, i32) {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;

    let x_max = r.max(g).max(b);
    let x_min = r.min(g).min(b);
    let c = x_max - x_min;
    let l = (x_max + x_min) / 2.0;

    let mut hue = if c == 0.0 {
        0.0
    } else if x_max == r {
        60.0 * ((g - b) / c)
    } else if x_max == g {
        60.0 * (2.0 + (b - r) / c)
    } else {
        60.0 * (4.0 + (r - g) / c)
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    let s = if c == 0.0 {
        0.0
    } else {
        c / (1.0 - (2.0 * l - 1.0).abs())
    };

    (
        hue.round() as i32,
        (s * 100.0).round() as i32,
        (l * 100.0).round() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_colors() {
        assert_eq!(hsl_to_rgb(0, 100, 50), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(120, 100, 50), Rgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(240, 100, 50), Rgb::new(0, 0, 255));
    }

    #[test]
    fn grays_ignore_hue() {
        assert_eq!(hsl_to_rgb(0, 0, 0), Rgb::BLACK);
        assert_eq!(hsl_to_rgb(123, 0, 100), Rgb::WHITE);
        assert_eq!(hsl_to_rgb(45, 0, 50), Rgb::new(128, 128, 128));
    }

    #[test]
    fn dec_hls_hue_origin_is_blue() {
        // DEC HLS: 0° blue, 120° red, 240° green; arguments are
        // (hue, lightness, saturation).
        assert_eq!(hls_to_rgb(0, 50, 100), Rgb::new(0, 0, 255));
        assert_eq!(hls_to_rgb(120, 50, 100), Rgb::new(255, 0, 0));
        assert_eq!(hls_to_rgb(240, 50, 100), Rgb::new(0, 255, 0));
        // Grays still ignore hue; lightness is the second argument.
        assert_eq!(hls_to_rgb(300, 100, 0), Rgb::WHITE);
        assert_eq!(hls_to_rgb(300, 0, 0), Rgb::BLACK);
    }

    #[test]
    fn round_trips_through_hsl() {
        for c in [
            Rgb::new(255, 0, 0),
            Rgb::new(0, 128, 255),
            Rgb::new(10, 200, 30),
            Rgb::new(128, 128, 128),
        ] {
            let (h, s, l) = rgb_to_hsl(c);
            let back = hsl_to_rgb(h, s, l);
            // Integer percent quantization allows a small channel error.
            assert!((back.r as i32 - c.r as i32).abs() <= 3, "{c:?} -> {back:?}");
            assert!((back.g as i32 - c.g as i32).abs() <= 3, "{c:?} -> {back:?}");
            assert!((back.b as i32 - c.b as i32).abs() <= 3, "{c:?} -> {back:?}");
        }
    }

    #[test]
    fn out_of_range_inputs_clamp() {
        assert_eq!(hsl_to_rgb(720, 100, 50), hsl_to_rgb(0, 100, 50));
        assert_eq!(hsl_to_rgb(0, 150, 50), hsl_to_rgb(0, 100, 50));
    }
}
