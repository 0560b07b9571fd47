//! Glyph lookup and caching.
//!
//! One entry per `(style, content)`; glyphs are immutable once created
//! and shared by reference with the render workers. The cache is
//! filled on the main thread during the pre-fetch pass (the font
//! collaborator is not thread safe); workers only read. Box-drawing
//! range codepoints bypass the font entirely and go to the procedural
//! synthesizer; lookup failures fall back to a shared `.notdef` box.
//!
//! Instantiation is lazy and the first writer holds the cache mutex
//! while filling the slot, so a glyph is rasterized exactly once per
//! font generation even when many cells need it in the same frame.

use ahash::AHashMap;
use core_boxdraw as boxdraw;
use core_platform::{FontHandle, FontSource, Glyph, PixFormat};
use std::sync::{Arc, Mutex};

/// Font style axes derived from cell attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub style: FontStyle,
    pub content: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn handle(self) -> FontHandle {
        FontHandle(match self {
            FontStyle::Regular => 0,
            FontStyle::Bold => 1,
            FontStyle::Italic => 2,
            FontStyle::BoldItalic => 3,
        })
    }
}

#[derive(Debug)]
pub struct GlyphCache {
    map: Mutex<AHashMap<GlyphKey, Option<Arc<Glyph>>>>,
    notdef: Mutex<Option<Arc<Glyph>>>,
    boxdraw_opts: boxdraw::Options,
    cell_width: usize,
    cell_height: usize,
}

impl GlyphCache {
    pub fn new(cell_width: usize, cell_height: usize, boxdraw_opts: boxdraw::Options) -> Self {
        Self {
            map: Mutex::new(AHashMap::new()),
            notdef: Mutex::new(None),
            boxdraw_opts,
            cell_width,
            cell_height,
        }
    }

    /// Drop everything (font or cell geometry changed).
    pub fn clear(&mut self, cell_width: usize, cell_height: usize) {
        self.map.lock().unwrap().clear();
        *self.notdef.lock().unwrap() = None;
        self.cell_width = cell_width;
        self.cell_height = cell_height;
    }

    /// Main-thread fill: make sure an entry exists for `key`.
    pub fn ensure(&self, key: GlyphKey, fonts: &mut dyn FontSource) {
        let mut map = self.map.lock().unwrap();
        if map.contains_key(&key) {
            return;
        }
        let glyph = self.rasterize(key, fonts);
        map.insert(key, glyph);
    }

    /// Worker-side read. `None` means "draw the .notdef box".
    pub fn get(&self, key: GlyphKey) -> Option<Arc<Glyph>> {
        self.map.lock().unwrap().get(&key).cloned().flatten()
    }

    /// The replacement box for codepoints nothing can render.
    pub fn notdef(&self) -> Arc<Glyph> {
        let mut slot = self.notdef.lock().unwrap();
        slot.get_or_insert_with(|| Arc::new(notdef_box(self.cell_width, self.cell_height)))
            .clone()
    }

    fn rasterize(&self, key: GlyphKey, fonts: &mut dyn FontSource) -> Option<Arc<Glyph>> {
        let cp = char::from_u32(key.content)?;

        // Whitespace renders as background only.
        if cp == ' ' || cp == '\t' {
            return None;
        }

        if boxdraw::covers(cp) {
            let mask = boxdraw::draw(cp, self.cell_width, self.cell_height, &self.boxdraw_opts);
            return Some(Arc::new(mask_to_glyph(mask, self.cell_width, self.cell_height)));
        }

        match fonts.glyph_for(key.style.handle(), cp, false) {
            Some(g) => Some(Arc::new(g)),
            None => {
                tracing::trace!(target: "render.glyphs", cp = key.content, "missing glyph");
                None
            }
        }
    }
}

fn mask_to_glyph(mask: boxdraw::GlyphMask, cell_width: usize, cell_height: usize) -> Glyph {
    Glyph {
        pix: mask.data,
        format: match mask.format {
            boxdraw::MaskFormat::A1 => PixFormat::A1,
            boxdraw::MaskFormat::A8 => PixFormat::A8,
        },
        width: mask.width,
        height: mask.height,
        stride: mask.stride,
        x_bearing: 0,
        // Synthesized glyphs are positioned from the cell top, which
        // the renderer expresses as a bearing of one full ascent.
        y_bearing: cell_height as i32,
        advance: cell_width as i32,
    }
}

/// A hollow rectangle two pixels in from the cell edge.
fn notdef_box(cell_width: usize, cell_height: usize) -> Glyph {
    let w = cell_width.max(1);
    let h = cell_height.max(1);
    let mut pix = vec![0u8; w * h];
    let inset = 1usize.min(w / 4).min(h / 4);
    let x0 = inset;
    let x1 = w.saturating_sub(inset + 1);
    let y0 = inset;
    let y1 = h.saturating_sub(inset + 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            if x == x0 || x == x1 || y == y0 || y == y1 {
                pix[y * w + x] = 0xff;
            }
        }
    }
    Glyph {
        pix,
        format: PixFormat::A8,
        width: w,
        height: h,
        stride: w,
        x_bearing: 0,
        y_bearing: h as i32,
        advance: w as i32,
    }
}
