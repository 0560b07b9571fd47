//! End-to-end frame rendering against in-memory collaborators.

use core_color::Rgb;
use core_platform::{
    CellMetrics, CoreError, DamageRect, FontHandle, FontSource, Glyph, PixFormat, Surface,
    SurfaceBuffer,
};
use core_render::{OverlayState, RenderConfig, Renderer};
use core_term::Term;
use core_vt::Parser;

const CW: usize = 4;
const CH: usize = 8;

/// A surface backed by a plain vector, age-tracking like a
/// double-buffered compositor.
struct MemSurface {
    data: Vec<u8>,
    width: usize,
    height: usize,
    age: usize,
    commits: Vec<Vec<DamageRect>>,
}

impl MemSurface {
    fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height * 4],
            width,
            height,
            age: 0,
            commits: Vec::new(),
        }
    }

    fn pixel(&self, x: usize, y: usize) -> u32 {
        let off = y * self.width * 4 + x * 4;
        u32::from_le_bytes(self.data[off..off + 4].try_into().unwrap())
    }
}

impl Surface for MemSurface {
    fn acquire(&mut self, width: usize, height: usize) -> Result<SurfaceBuffer<'_>, CoreError> {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.data = vec![0; width * height * 4];
            self.age = 0;
        }
        Ok(SurfaceBuffer {
            data: &mut self.data,
            width: self.width,
            height: self.height,
            stride: self.width * 4,
            age: self.age,
        })
    }

    fn commit(&mut self, damage: &[DamageRect]) -> Result<(), CoreError> {
        self.commits.push(damage.to_vec());
        self.age = 1;
        Ok(())
    }
}

/// Every printable gets a solid square glyph; box-drawing codepoints
/// intentionally miss so the synthesizer handles them.
struct BlockFont;

impl FontSource for BlockFont {
    fn glyph_for(&mut self, _font: FontHandle, cp: char, _subpixel: bool) -> Option<Glyph> {
        if !cp.is_ascii_graphic() {
            return None;
        }
        Some(Glyph {
            pix: vec![0xff; CW * CH],
            format: PixFormat::A8,
            width: CW,
            height: CH,
            stride: CW,
            x_bearing: 0,
            y_bearing: CH as i32,
            advance: CW as i32,
        })
    }

    fn cell_metrics(&self) -> CellMetrics {
        CellMetrics {
            cell_width: CW,
            cell_height: CH,
            ascent: CH,
            descent: 0,
        }
    }
}

fn setup(cols: usize, rows: usize) -> (Term, Renderer, MemSurface) {
    let term = Term::new(cols, rows, 32);
    let config = RenderConfig {
        worker_count: Some(2),
        ..RenderConfig::default()
    };
    let renderer = Renderer::new(config, &BlockFont);
    let surface = MemSurface::new(cols * CW, rows * CH);
    (term, renderer, surface)
}

fn feed(term: &mut Term, bytes: &[u8]) {
    let mut p = Parser::new();
    p.advance(term, bytes);
}

#[test]
fn renders_text_into_pixels() {
    let (mut term, mut renderer, mut surface) = setup(10, 4);
    feed(&mut term, b"AB");
    let drew = renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    assert!(drew);

    // 'A' paints the full first cell with the default foreground.
    let fg = term.palette().fg.argb(0xff);
    assert_eq!(surface.pixel(0, 0), fg);
    assert_eq!(surface.pixel(CW - 1, CH - 1), fg);
    // An untouched cell shows the default background.
    let bg = term.palette().bg.argb(0xff);
    assert_eq!(surface.pixel(5 * CW, 2 * CH), bg);
}

#[test]
fn painted_cells_become_clean() {
    let (mut term, mut renderer, mut surface) = setup(10, 4);
    feed(&mut term, b"hello");
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    let row = term.grid().row(0).unwrap();
    for c in 0..5 {
        assert!(row.cell(c).is_clean(), "cell {c} still dirty");
    }
    assert!(!row.dirty);
}

#[test]
fn second_frame_only_repaints_changes() {
    let (mut term, mut renderer, mut surface) = setup(10, 4);
    feed(&mut term, b"static");
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    let first_commit_count = surface.commits.len();

    feed(&mut term, b"\x1b[3;1Hx");
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    assert_eq!(surface.commits.len(), first_commit_count + 1);
    let damage = surface.commits.last().unwrap();
    // Damage touches row 2's band (plus possibly the cursor row), but
    // not the full frame.
    assert!(damage.iter().any(|d| d.y == 2 * CH));
    let total: usize = damage.iter().map(|d| d.height).sum();
    assert!(total < 4 * CH, "repainted too much: {total}");
}

#[test]
fn sgr_colors_reach_the_buffer() {
    let (mut term, mut renderer, mut surface) = setup(10, 4);
    feed(&mut term, b"\x1b[41m \x1b[0m");
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    let red = term.palette().table[1].argb(0xff);
    assert_eq!(surface.pixel(1, 1), red);
}

#[test]
fn box_drawing_comes_from_the_synthesizer() {
    let (mut term, mut renderer, mut surface) = setup(10, 4);
    feed(&mut term, "──".as_bytes());
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    // A horizontal line: some pixel in the vertical middle of cell 0
    // carries the foreground, the top row does not.
    let fg = term.palette().fg.argb(0xff);
    let mid = CH / 2;
    let hit = (0..CW).any(|x| surface.pixel(x, mid) == fg || surface.pixel(x, mid - 1) == fg);
    assert!(hit, "no line pixels found");
    assert_ne!(surface.pixel(0, 0), fg);
}

#[test]
fn cursor_cell_is_painted_and_tracked() {
    let (mut term, mut renderer, mut surface) = setup(10, 4);
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    // Block cursor at the origin: reversed colors -> fg as background.
    let fg = term.palette().fg.argb(0xff);
    assert_eq!(surface.pixel(0, 0), fg);

    // Move the cursor; the old cell reverts on the next frame.
    feed(&mut term, b"\x1b[2;2H");
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    let bg = term.palette().bg.argb(0xff);
    assert_eq!(surface.pixel(0, 0), bg);
    assert_eq!(surface.pixel(CW, CH), fg);
}

#[test]
fn scroll_blit_moves_pixels() {
    let (mut term, mut renderer, mut surface) = setup(10, 4);
    feed(&mut term, b"top\r\n\r\n\r\n");
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    let fg = term.palette().fg.argb(0xff);
    assert_eq!(surface.pixel(0, 0), fg);

    // One more linefeed scrolls everything up one row.
    feed(&mut term, b"\r\n");
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    // "top" is gone from the screen (scrolled into history).
    let bg = term.palette().bg.argb(0xff);
    assert_eq!(surface.pixel(0, 0), bg);
}

#[test]
fn flash_overlay_tints_everything() {
    let (mut term, mut renderer, mut surface) = setup(6, 3);
    renderer
        .render_frame(
            &mut term,
            &mut surface,
            &mut BlockFont,
            &OverlayState {
                flash: true,
                ..OverlayState::default()
            },
        )
        .unwrap();
    // The flash blends yellow over the background everywhere.
    let plain_bg = term.palette().bg.argb(0xff);
    assert_ne!(surface.pixel(3 * CW, CH), plain_bg);
}

#[test]
fn sixel_pixels_composite() {
    let (mut term, mut renderer, mut surface) = setup(10, 6);
    term.set_cell_metrics(CW, CH);
    // A red 4x6 sixel at the origin.
    feed(&mut term, b"\x1bPq#1;2;100;0;0#1~~~~\x1b\\");
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    assert_eq!(surface.pixel(0, 0), 0xffff_0000);
}

#[test]
fn search_overlay_occupies_bottom_row() {
    let (mut term, mut renderer, mut surface) = setup(12, 4);
    feed(&mut term, b"findme");
    term.search_begin();
    term.search_push('f');
    renderer
        .render_frame(&mut term, &mut surface, &mut BlockFont, &OverlayState::default())
        .unwrap();
    let bar_bg = term.palette().table[12].argb(0xff);
    assert_eq!(surface.pixel(11 * CW, 3 * CH + 1), bar_bg);
}
