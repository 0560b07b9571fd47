//! DECSIXEL decoding.
//!
//! A tiny four-state machine layered under the DCS passthrough: normal
//! painting (`DECSIXEL`), raster attributes (`DECGRA`, after `"`),
//! repeat counts (`DECGRI`, after `!`) and color selection/definition
//! (`DECGCI`, after `#`). Bytes `?`..`~` paint a column of six pixels,
//! `$` is carriage return, `-` moves to the next six-pixel band.
//!
//! The raster buffer starts at 1×6 and grows as painted, height
//! rounded up to six-pixel bands, bounded by the geometry caps handed
//! to [`SixelDecoder::hook`] (0 ⇒ current screen size, resolved by the
//! caller). An explicit `DECGRA` size within bounds fixes the geometry
//! and disables autosizing.
//!
//! The color palette persists across images (clients define registers
//! once and paint many images); register indices wrap modulo the
//! palette size. Placement into the grid is not handled here — the
//! semantics layer consumes the finished [`SixelRaster`].

pub mod palette;

pub use palette::{default_palette, MAX_COLORS};

use core_color::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Decsixel,
    Decgra,
    Decgri,
    Decgci,
}

const MAX_PARAMS: usize = 5;

/// A finished raster, ready for grid placement.
#[derive(Debug)]
pub struct SixelRaster {
    /// ARGB32 pixels, stride == `width`.
    pub data: Vec<u32>,
    pub width: usize,
    pub height: usize,
    /// False when the image was declared with a transparent background
    /// (DECSIXEL P2 = 1): unpainted pixels have zero alpha.
    pub opaque: bool,
}

#[derive(Debug)]
struct Raster {
    data: Vec<u32>,
    width: usize,
    height: usize,
    autosize: bool,
}

#[derive(Debug)]
pub struct SixelDecoder {
    state: State,
    params: [u32; MAX_PARAMS],
    param_idx: usize,
    param: u32,
    color_idx: usize,
    palette: Vec<Rgb>,
    col: usize,
    band: usize,
    max_col: usize,
    image: Raster,
    fill: u32,
    opaque: bool,
    max_width: usize,
    max_height: usize,
    active: bool,
}

impl SixelDecoder {
    pub fn new() -> Self {
        Self::with_palette_size(MAX_COLORS)
    }

    pub fn with_palette_size(palette_size: usize) -> Self {
        let palette_size = palette_size.clamp(2, MAX_COLORS);
        SixelDecoder {
            state: State::Decsixel,
            params: [0; MAX_PARAMS],
            param_idx: 0,
            param: 0,
            color_idx: 0,
            palette: default_palette(palette_size),
            col: 0,
            band: 0,
            max_col: 0,
            image: Raster {
                data: Vec::new(),
                width: 0,
                height: 0,
                autosize: true,
            },
            fill: 0,
            opaque: true,
            max_width: 0,
            max_height: 0,
            active: false,
        }
    }

    pub fn palette_size(&self) -> usize {
        self.palette.len()
    }

    /// Resize the register file (XTSMGRAPHICS). Clamped to
    /// `[2, MAX_COLORS]`; resets registers to defaults.
    pub fn set_palette_size(&mut self, size: usize) {
        let size = size.clamp(2, MAX_COLORS);
        self.palette = default_palette(size);
    }

    pub fn reset_palette(&mut self) {
        self.palette = default_palette(MAX_COLORS);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begin a new image. `p2` is the DECSIXEL background-select
    /// parameter (1 ⇒ transparent); `bg` is the terminal background
    /// used to fill opaque images; geometry caps are in pixels.
    pub fn hook(&mut self, p2: u32, bg: Rgb, max_width: usize, max_height: usize) {
        debug_assert!(!self.active, "unbalanced hook");
        self.state = State::Decsixel;
        self.params = [0; MAX_PARAMS];
        self.param_idx = 0;
        self.param = 0;
        self.color_idx = 0;
        self.col = 0;
        self.band = 0;
        self.max_col = 0;
        self.opaque = p2 != 1;
        self.fill = if self.opaque { bg.argb(0xff) } else { 0 };
        self.max_width = max_width.max(1);
        self.max_height = max_height.max(6);
        self.image = Raster {
            data: vec![self.fill; 6],
            width: 1,
            height: 6,
            autosize: true,
        };
        self.active = true;
    }

    /// One byte of DCS passthrough body.
    pub fn put(&mut self, byte: u8) {
        match self.state {
            State::Decsixel => self.decsixel(byte),
            State::Decgra => self.decgra(byte),
            State::Decgri => self.decgri(byte),
            State::Decgci => self.decgci(byte),
        }
    }

    /// End of the DCS string: hand over the raster. Returns `None` for
    /// an image that never painted anything.
    pub fn unhook(&mut self) -> Option<SixelRaster> {
        debug_assert!(self.active, "unbalanced unhook");
        self.active = false;
        let image = std::mem::replace(
            &mut self.image,
            Raster {
                data: Vec::new(),
                width: 0,
                height: 0,
                autosize: true,
            },
        );
        if image.width == 0 || image.height == 0 || (self.max_col == 0 && self.col == 0 && self.band == 0)
        {
            return None;
        }
        Some(SixelRaster {
            data: image.data,
            width: image.width,
            height: image.height,
            opaque: self.opaque,
        })
    }

    // --- states ------------------------------------------------------

    fn decsixel(&mut self, byte: u8) {
        match byte {
            b'"' => {
                self.state = State::Decgra;
                self.begin_params();
            }
            b'!' => {
                self.state = State::Decgri;
                self.begin_params();
            }
            b'#' => {
                self.state = State::Decgci;
                self.begin_params();
            }
            b'$' => {
                self.max_col = self.max_col.max(self.col);
                self.col = 0;
            }
            b'-' => {
                self.max_col = self.max_col.max(self.col);
                self.band += 1;
                self.col = 0;
            }
            b'?'..=b'~' => self.add(byte - 63, 1),
            b' ' | b'\n' | b'\r' => {}
            _ => {
                tracing::debug!(target: "sixel", byte, "invalid sixel byte dropped");
            }
        }
    }

    fn begin_params(&mut self) {
        self.params = [0; MAX_PARAMS];
        self.param_idx = 0;
        self.param = 0;
    }

    fn push_param(&mut self) {
        if self.param_idx < MAX_PARAMS {
            self.params[self.param_idx] = self.param;
            self.param_idx += 1;
        }
        self.param = 0;
    }

    fn accumulate(&mut self, byte: u8) {
        self.param = self
            .param
            .saturating_mul(10)
            .saturating_add((byte - b'0') as u32);
    }

    fn decgra(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => self.accumulate(byte),
            b';' => self.push_param(),
            _ => {
                self.push_param();
                let n = self.param_idx;
                let pan = if n > 0 { self.params[0].max(1) } else { 1 };
                let pad = if n > 1 { self.params[1].max(1) } else { 1 };
                let ph = if n > 2 { self.params[2] } else { 0 } as usize;
                let pv = if n > 3 { self.params[3] } else { 0 } as usize;
                tracing::trace!(target: "sixel", pan, pad, ph, pv, "raster attributes");

                if ph >= self.image.width
                    && pv >= self.image.height
                    && ph <= self.max_width
                    && pv <= self.max_height
                    && self.resize(ph, pv)
                {
                    self.image.autosize = false;
                }

                self.state = State::Decsixel;
                self.decsixel(byte);
            }
        }
    }

    fn decgri(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => self.accumulate(byte),
            _ => {
                let count = self.param.max(1) as usize;
                self.state = State::Decsixel;
                if (b'?'..=b'~').contains(&byte) {
                    self.add(byte - 63, count);
                } else {
                    self.decsixel(byte);
                }
            }
        }
    }

    fn decgci(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => self.accumulate(byte),
            b';' => self.push_param(),
            _ => {
                self.push_param();
                let n = self.param_idx;

                if n > 0 {
                    // Register indices wrap modulo the palette size.
                    self.color_idx = self.params[0] as usize % self.palette.len();
                }

                if n > 4 {
                    let format = self.params[1];
                    let (c1, c2, c3) = (
                        self.params[2] as i32,
                        self.params[3] as i32,
                        self.params[4] as i32,
                    );
                    match format {
                        1 => {
                            // HLS: hue, lightness, saturation.
                            let rgb = core_color::hsl::hls_to_rgb(c1, c2, c3);
                            self.palette[self.color_idx] = rgb;
                        }
                        2 => {
                            // RGB in percent.
                            let pct = |v: i32| (255 * v.clamp(0, 100) / 100) as u8;
                            self.palette[self.color_idx] = Rgb::new(pct(c1), pct(c2), pct(c3));
                        }
                        other => {
                            tracing::debug!(target: "sixel", format = other, "unknown color format");
                        }
                    }
                }

                self.state = State::Decsixel;
                self.decsixel(byte);
            }
        }
    }

    // --- painting ----------------------------------------------------

    fn add(&mut self, sixel: u8, count: usize) {
        let color = self.palette[self.color_idx].argb(0xff);
        for _ in 0..count {
            if self.col >= self.max_width || self.band * 6 + 5 >= self.max_height {
                // Clipped by the geometry cap; keep consuming input.
                continue;
            }

            if self.col >= self.image.width || (self.band + 1) * 6 > self.image.height {
                let width = self
                    .image
                    .width
                    .max(self.max_col.max(self.col + 1));
                let height = self.image.height.max((self.band + 1) * 6);
                if !self.resize(width, height) {
                    return;
                }
            }

            let mut bits = sixel;
            for i in 0..6 {
                if bits & 1 != 0 {
                    let y = self.band * 6 + i;
                    self.image.data[y * self.image.width + self.col] = color;
                }
                bits >>= 1;
            }
            self.col += 1;
        }
    }

    /// Grow the raster, filling fresh pixels with the background.
    /// Height is rounded up to a whole six-pixel band.
    fn resize(&mut self, new_width: usize, new_height: usize) -> bool {
        if !self.image.autosize && (new_width > self.image.width || new_height > self.image.height)
        {
            return false;
        }

        let alloc_height = new_height.div_ceil(6) * 6;
        let old = &self.image;

        if new_width == old.width {
            self.image.data.resize(new_width * alloc_height, self.fill);
        } else {
            let mut data = vec![self.fill; new_width * alloc_height];
            for r in 0..old.height {
                data[r * new_width..r * new_width + old.width]
                    .copy_from_slice(&old.data[r * old.width..(r + 1) * old.width]);
            }
            self.image.data = data;
        }
        self.image.width = new_width;
        self.image.height = alloc_height;
        true
    }
}

impl Default for SixelDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &[u8]) -> Option<SixelRaster> {
        let mut d = SixelDecoder::new();
        d.hook(0, Rgb::BLACK, 800, 480);
        for &b in body {
            d.put(b);
        }
        d.unhook()
    }

    #[test]
    fn single_full_column() {
        // '~' = 0b111111: six pixels down.
        let img = decode(b"#1~").unwrap();
        assert_eq!(img.width, 1);
        assert_eq!(img.height, 6);
        let blue = default_palette(MAX_COLORS)[1].argb(0xff);
        for y in 0..6 {
            assert_eq!(img.data[y], blue, "row {y}");
        }
    }

    #[test]
    fn question_mark_paints_nothing_but_advances() {
        let img = decode(b"#1??~").unwrap();
        assert_eq!(img.width, 3);
        let bg = Rgb::BLACK.argb(0xff);
        assert_eq!(img.data[0], bg);
        assert_eq!(img.data[1], bg);
        assert_ne!(img.data[2], bg);
    }

    #[test]
    fn repeat_count() {
        let img = decode(b"#2!10@").unwrap();
        // '@' = bit 0 only: one pixel tall, ten wide.
        assert_eq!(img.width, 10);
        let red = default_palette(MAX_COLORS)[2].argb(0xff);
        for x in 0..10 {
            assert_eq!(img.data[x], red);
        }
        let bg = Rgb::BLACK.argb(0xff);
        assert_eq!(img.data[img.width], bg); // second pixel row untouched
    }

    #[test]
    fn band_advance_and_cr() {
        let img = decode(b"#1~-~").unwrap();
        assert_eq!(img.height, 12);
        // Second band painted at column 0.
        assert_ne!(img.data[6 * img.width], 0);
    }

    #[test]
    fn rgb_register_definition() {
        let img = decode(b"#1;2;100;0;0#1~").unwrap();
        assert_eq!(img.data[0], Rgb::new(255, 0, 0).argb(0xff));
    }

    #[test]
    fn hls_register_definition() {
        // DEC HLS hue 0 is blue: #1;1;0;50;100 defines a pure blue
        // register, not red.
        let img = decode(b"#1;1;0;50;100#1~").unwrap();
        assert_eq!(img.data[0], Rgb::new(0, 0, 255).argb(0xff));
        // And 120° is red.
        let img = decode(b"#1;1;120;50;100#1~").unwrap();
        assert_eq!(img.data[0], Rgb::new(255, 0, 0).argb(0xff));
    }

    #[test]
    fn register_index_wraps() {
        let mut d = SixelDecoder::with_palette_size(16);
        d.hook(0, Rgb::BLACK, 100, 100);
        for &b in b"#18;2;0;100;0#18~" {
            d.put(b);
        }
        let img = d.unhook().unwrap();
        // 18 % 16 == 2: register 2 was redefined and used.
        assert_eq!(img.data[0], Rgb::new(0, 255, 0).argb(0xff));
    }

    #[test]
    fn raster_attributes_fix_size() {
        let img = decode(b"\"1;1;4;12#1~").unwrap();
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 12);
    }

    #[test]
    fn geometry_cap_clips() {
        let mut d = SixelDecoder::new();
        d.hook(0, Rgb::BLACK, 4, 6);
        for &b in b"#1!100~-~" {
            d.put(b);
        }
        let img = d.unhook().unwrap();
        assert!(img.width <= 4);
        assert!(img.height <= 6);
    }

    #[test]
    fn transparent_background() {
        let mut d = SixelDecoder::new();
        d.hook(1, Rgb::BLACK, 100, 100);
        for &b in b"#1?~" {
            d.put(b);
        }
        let img = d.unhook().unwrap();
        assert!(!img.opaque);
        assert_eq!(img.data[0], 0); // unpainted pixel fully transparent
    }

    #[test]
    fn empty_image_yields_none() {
        assert!(decode(b"").is_none());
    }

    #[test]
    fn palette_persists_across_images() {
        let mut d = SixelDecoder::new();
        d.hook(0, Rgb::BLACK, 100, 100);
        for &b in b"#5;2;0;0;100~" {
            d.put(b);
        }
        d.unhook();

        d.hook(0, Rgb::BLACK, 100, 100);
        for &b in b"#5~" {
            d.put(b);
        }
        let img = d.unhook().unwrap();
        assert_eq!(img.data[0], Rgb::new(0, 0, 255).argb(0xff));
    }
}
