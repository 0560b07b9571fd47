//! Per-row rasterization: the work item the pool executes.
//!
//! A job owns one grid row exclusively for the duration of the frame
//! and writes only to that row's pixel band, so jobs running on
//! different threads never alias. Everything else a job touches is
//! read-only shared state collected in [`FrameShared`].

use crate::glyph_cache::{FontStyle, GlyphCache, GlyphKey};
use crate::paint::Canvas;
use core_color::palette::Palette;
use core_color::Rgb;
use core_grid::{AttrFlags, Cell, Color, ComposedTable, Row};
use core_term::CursorStyle;
use std::sync::Arc;

/// Bold→bright rule, straight from configuration.
#[derive(Debug, Clone, Copy)]
pub struct BoldInBright {
    pub enabled: bool,
    /// Map palette 0–7 to 8–15 instead of scaling the color.
    pub palette_based: bool,
    /// Luminance multiplier for the scaling variant.
    pub amount: f32,
}

impl Default for BoldInBright {
    fn default() -> Self {
        Self {
            enabled: false,
            palette_based: true,
            amount: 1.3,
        }
    }
}

/// Read-only per-frame state shared with every row job.
///
/// The raw pointers are valid for the whole frame: the coordinator
/// keeps the buffer borrow and the terminal alive across the
/// post-jobs rendezvous and workers never outlive it.
pub struct FrameShared {
    pub buf_data: *mut u8,
    pub buf_len: usize,
    pub stride: usize,
    pub buf_width: usize,
    pub buf_height: usize,

    pub cell_width: usize,
    pub cell_height: usize,
    pub ascent: usize,
    pub cols: usize,

    pub palette: Palette,
    pub reverse_video: bool,
    pub show_cursor: bool,
    pub cursor_style: CursorStyle,
    pub blink_hidden: bool,
    pub bold_in_bright: BoldInBright,

    pub composed: *const ComposedTable,
    pub glyphs: Arc<GlyphCache>,
}

// SAFETY: the pointers reference the frame buffer and the terminal's
// composed table, both of which the coordinator keeps alive and
// unmodified until all jobs have acknowledged end-of-frame. Distinct
// jobs write to disjoint pixel bands (enforced by handing out each
// row index exactly once).
unsafe impl Send for FrameShared {}
unsafe impl Sync for FrameShared {}

/// One row's work: the row pointer is exclusively owned by this job
/// until the end-of-frame rendezvous.
pub struct RowJob {
    pub view_row: usize,
    pub row: *mut Row,
    pub cursor_col: Option<usize>,
}

// SAFETY: each row pointer is handed to exactly one job per frame; the
// grid is not otherwise touched during the frame.
unsafe impl Send for RowJob {}

pub fn resolve_fg(shared: &FrameShared, cell: &Cell) -> Rgb {
    let mut fg = match cell.fg {
        Color::Default => shared.palette.fg,
        Color::Base16(i) => {
            let mut idx = i as usize;
            let bb = shared.bold_in_bright;
            if bb.enabled && bb.palette_based && cell.flags.contains(AttrFlags::BOLD) && idx < 8 {
                idx += 8;
            }
            shared.palette.table[idx]
        }
        Color::Indexed(i) => shared.palette.table[i as usize],
        Color::Rgb(c) => c,
    };

    let bb = shared.bold_in_bright;
    if bb.enabled && !bb.palette_based && cell.flags.contains(AttrFlags::BOLD) {
        fg = fg.scaled(bb.amount);
    }
    if cell.flags.contains(AttrFlags::DIM) {
        fg = fg.scaled(0.5);
    }
    fg
}

pub fn resolve_bg(shared: &FrameShared, cell: &Cell) -> Rgb {
    match cell.bg {
        Color::Default => shared.palette.bg,
        Color::Base16(i) => shared.palette.table[i as usize],
        Color::Indexed(i) => shared.palette.table[i as usize],
        Color::Rgb(c) => c,
    }
}

fn style_for(flags: AttrFlags) -> FontStyle {
    match (
        flags.contains(AttrFlags::BOLD),
        flags.contains(AttrFlags::ITALIC),
    ) {
        (false, false) => FontStyle::Regular,
        (true, false) => FontStyle::Bold,
        (false, true) => FontStyle::Italic,
        (true, true) => FontStyle::BoldItalic,
    }
}

/// Rasterize every not-clean cell of one row (plus the cursor cell).
///
/// # Safety
/// `job.row` must be exclusively owned by this call and
/// `shared.buf_data`/`shared.composed` valid per [`FrameShared`] docs.
pub unsafe fn render_row(shared: &FrameShared, job: &RowJob) {
    let row: &mut Row = unsafe { &mut *job.row };
    let composed: &ComposedTable = unsafe { &*shared.composed };
    let data: &mut [u8] =
        unsafe { std::slice::from_raw_parts_mut(shared.buf_data, shared.buf_len) };
    let mut canvas = Canvas {
        data,
        width: shared.buf_width,
        height: shared.buf_height,
        stride: shared.stride,
    };

    let y = job.view_row * shared.cell_height;
    let cols = shared.cols.min(row.len());

    for col in 0..cols {
        let is_cursor = job.cursor_col == Some(col) && shared.show_cursor;
        if row.cell(col).is_clean() && !is_cursor {
            continue;
        }

        let cell = *row.cell(col);
        let x = col * shared.cell_width;

        // Color resolution: reverse attribute, global reverse video
        // and selection each flip fg/bg; an even number of flips is
        // the identity.
        let mut fg = resolve_fg(shared, &cell);
        let mut bg = resolve_bg(shared, &cell);
        let mut flips = 0;
        if cell.flags.contains(AttrFlags::REVERSE) {
            flips += 1;
        }
        if shared.reverse_video {
            flips += 1;
        }
        if cell.flags.contains(AttrFlags::SELECTED) {
            flips += 1;
        }
        if flips % 2 == 1 {
            std::mem::swap(&mut fg, &mut bg);
        }

        let block_cursor = is_cursor && shared.cursor_style == CursorStyle::Block;
        if block_cursor {
            match shared.palette.cursor {
                Some(c) => {
                    bg = c;
                    fg = shared.palette.bg;
                }
                None => std::mem::swap(&mut fg, &mut bg),
            }
        }

        if cell.flags.contains(AttrFlags::CONCEAL) || (shared.blink_hidden && cell.flags.contains(AttrFlags::BLINK)) {
            fg = bg;
        }

        // Wide glyphs paint a double-width background from the leader.
        let width_cells = if col + 1 < cols && row.cell(col + 1).is_spacer() {
            2
        } else {
            1
        };
        let w = shared.cell_width * if cell.is_spacer() { 1 } else { width_cells };
        canvas.fill_rect(x, y, w, shared.cell_height, bg);

        if !cell.is_spacer() {
            draw_content(shared, &mut canvas, &cell, composed, x, y, fg, width_cells);
        }

        // Underline and strikethrough bars.
        if cell.flags.contains(AttrFlags::UNDERLINE) || cell.flags.contains(AttrFlags::URL) {
            let uy = y + shared.ascent + 1;
            canvas.fill_rect(x, uy.min(y + shared.cell_height - 1), w, 1, fg);
        }
        if cell.flags.contains(AttrFlags::STRIKETHROUGH) {
            canvas.fill_rect(x, y + shared.cell_height * 2 / 5, w, 1, fg);
        }

        // Non-block cursor overlays.
        if is_cursor && !block_cursor {
            let ccolor = shared.palette.cursor.unwrap_or(shared.palette.fg);
            match shared.cursor_style {
                CursorStyle::Underline => {
                    canvas.fill_rect(x, y + shared.cell_height - 2, w, 2, ccolor);
                }
                CursorStyle::Bar => {
                    canvas.fill_rect(x, y, 2, shared.cell_height, ccolor);
                }
                CursorStyle::Block => unreachable!(),
            }
        }

        row.cell_mut(col).set_clean(true);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_content(
    shared: &FrameShared,
    canvas: &mut Canvas<'_>,
    cell: &Cell,
    composed: &ComposedTable,
    x: usize,
    y: usize,
    fg: Rgb,
    width_cells: usize,
) {
    let style = style_for(cell.flags);
    let baseline = y as isize + shared.ascent as isize;

    if cell.is_composed() {
        let Some(chars) = composed.lookup(cell.content) else {
            return;
        };
        let mut first = true;
        for &c in chars {
            let key = GlyphKey {
                style,
                content: c as u32,
            };
            let Some(glyph) = shared.glyphs.get(key) else {
                continue;
            };
            let pen_x = if first {
                x as isize + glyph.x_bearing as isize
            } else if glyph.x_bearing < 0 {
                // The mark's metrics assume the pen already advanced
                // past the base: add the full cluster width back.
                x as isize + (width_cells * shared.cell_width) as isize + glyph.x_bearing as isize
            } else {
                // Metrics assume the pen is still on the base cell.
                x as isize
                    + ((width_cells - 1) * shared.cell_width) as isize
                    + glyph.x_bearing as isize
            };
            canvas.composite_glyph(&glyph, pen_x, baseline - glyph.y_bearing as isize, fg);
            first = false;
        }
        return;
    }

    if cell.is_empty() {
        return;
    }

    let key = GlyphKey {
        style,
        content: cell.content,
    };
    match shared.glyphs.get(key) {
        Some(glyph) => {
            canvas.composite_glyph(
                &glyph,
                x as isize + glyph.x_bearing as isize,
                baseline - glyph.y_bearing as isize,
                fg,
            );
        }
        None => {
            // Whitespace legitimately has no glyph; anything else gets
            // the .notdef box.
            if !matches!(char::from_u32(cell.content), Some(' ') | Some('\t')) {
                let glyph = shared.glyphs.notdef();
                canvas.composite_glyph(
                    &glyph,
                    x as isize,
                    baseline - glyph.y_bearing as isize,
                    fg,
                );
            }
        }
    }
}
