//! Single-threaded overlay pass: search box, scrollback position
//! indicator, URL jump labels, IME pre-edit, flash.
//!
//! Overlays paint into the frame buffer after the grid pass; whatever
//! they cover is re-damaged so the next frame repaints the cells
//! underneath. Each helper returns the view-row bands it touched.

use crate::glyph_cache::{FontStyle, GlyphCache, GlyphKey};
use crate::paint::Canvas;
use core_color::Rgb;
use core_platform::FontSource;
use core_term::Term;

/// Host-supplied overlay inputs for one frame.
#[derive(Debug, Default)]
pub struct OverlayState {
    /// Visual-bell flash is armed.
    pub flash: bool,
    /// IME pre-edit text shown at the cursor.
    pub preedit: Option<String>,
    /// URL jump labels: hint character plus viewport position.
    pub url_labels: Vec<(char, usize, usize)>,
}

const FLASH_COLOR: Rgb = Rgb::new(0x7f, 0x7f, 0x00);

type Bands = Vec<(usize, usize)>;

#[allow(clippy::too_many_arguments)]
pub(crate) fn draw(
    canvas: &mut Canvas<'_>,
    term: &mut Term,
    glyphs: &GlyphCache,
    fonts: &mut dyn FontSource,
    cell_w: usize,
    cell_h: usize,
    ascent: usize,
    state: &OverlayState,
) -> Bands {
    let mut bands = Bands::new();
    let rows = term.rows();

    if term.search_is_active() {
        search_box(canvas, term, glyphs, fonts, cell_w, cell_h, ascent);
        bands.push((rows.saturating_sub(1), rows));
    }

    if !term.grid().view_follows_offset() {
        scrollback_indicator(canvas, term, glyphs, fonts, cell_w, cell_h, ascent);
        bands.push((0, 1));
    }

    for &(hint, row, col) in &state.url_labels {
        if row < rows {
            label(
                canvas,
                glyphs,
                fonts,
                cell_w,
                cell_h,
                ascent,
                row,
                col,
                &hint.to_string(),
                term.palette().table[3],
                term.palette().table[0],
            );
            bands.push((row, row + 1));
        }
    }

    if let Some(text) = &state.preedit {
        preedit(canvas, term, glyphs, fonts, cell_w, cell_h, ascent, text);
        let cr = term.cursor().row;
        bands.push((cr, cr + 1));
    }

    if state.flash {
        canvas.blend_rect(0, 0, canvas.width, canvas.height, FLASH_COLOR, 0x80);
        bands.push((0, rows));
    }

    bands
}

/// Paint `text` with explicit colors at a pixel position, filling the
/// cell background behind each glyph.
#[allow(clippy::too_many_arguments)]
fn text_run(
    canvas: &mut Canvas<'_>,
    glyphs: &GlyphCache,
    fonts: &mut dyn FontSource,
    cell_w: usize,
    cell_h: usize,
    ascent: usize,
    x: usize,
    y: usize,
    text: &str,
    fg: Rgb,
    bg: Rgb,
) -> usize {
    let mut pen_x = x;
    for c in text.chars() {
        canvas.fill_rect(pen_x, y, cell_w, cell_h, bg);
        let key = GlyphKey {
            style: FontStyle::Regular,
            content: c as u32,
        };
        glyphs.ensure(key, fonts);
        if let Some(glyph) = glyphs.get(key) {
            canvas.composite_glyph(
                &glyph,
                pen_x as isize + glyph.x_bearing as isize,
                (y + ascent) as isize - glyph.y_bearing as isize,
                fg,
            );
        }
        pen_x += cell_w;
    }
    pen_x - x
}

fn search_box(
    canvas: &mut Canvas<'_>,
    term: &Term,
    glyphs: &GlyphCache,
    fonts: &mut dyn FontSource,
    cell_w: usize,
    cell_h: usize,
    ascent: usize,
) {
    let rows = term.rows();
    let y = rows.saturating_sub(1) * cell_h;
    let fg = term.palette().table[0];
    let bg = term.palette().table[12];

    canvas.fill_rect(0, y, canvas.width, cell_h, bg);
    let query: String = term.search_query().iter().collect();
    let text = format!("search: {query}");
    text_run(
        canvas, glyphs, fonts, cell_w, cell_h, ascent, 0, y, &text, fg, bg,
    );
}

fn scrollback_indicator(
    canvas: &mut Canvas<'_>,
    term: &Term,
    glyphs: &GlyphCache,
    fonts: &mut dyn FontSource,
    cell_w: usize,
    cell_h: usize,
    ascent: usize,
) {
    let grid = term.grid();
    let rows = term.rows();
    let mask = grid.num_rows() - 1;

    // Find where the populated scrollback begins.
    let scrollback_start = (grid.offset() + rows) & mask;
    let mut empty = 0usize;
    while empty < grid.num_rows()
        && grid.row_abs((scrollback_start + empty) & mask).is_none()
    {
        empty += 1;
    }
    let populated = grid.num_rows() - empty;

    let rebased_view = grid.rebase_row(grid.view(), rows).saturating_sub(empty);
    let percent = if populated <= rows || rebased_view + rows >= populated {
        100
    } else {
        100 * rebased_view / (populated - rows)
    };

    let text = format!("{percent}%");
    let w = text.chars().count() * cell_w;
    let x = canvas.width.saturating_sub(w + cell_w / 2);
    let fg = term.palette().table[0];
    let bg = term.palette().table[12];
    text_run(
        canvas, glyphs, fonts, cell_w, cell_h, ascent, x, 0, &text, fg, bg,
    );
}

#[allow(clippy::too_many_arguments)]
fn label(
    canvas: &mut Canvas<'_>,
    glyphs: &GlyphCache,
    fonts: &mut dyn FontSource,
    cell_w: usize,
    cell_h: usize,
    ascent: usize,
    row: usize,
    col: usize,
    text: &str,
    bg: Rgb,
    fg: Rgb,
) {
    text_run(
        canvas,
        glyphs,
        fonts,
        cell_w,
        cell_h,
        ascent,
        col * cell_w,
        row * cell_h,
        text,
        fg,
        bg,
    );
}

#[allow(clippy::too_many_arguments)]
fn preedit(
    canvas: &mut Canvas<'_>,
    term: &Term,
    glyphs: &GlyphCache,
    fonts: &mut dyn FontSource,
    cell_w: usize,
    cell_h: usize,
    ascent: usize,
    text: &str,
) {
    let cursor = term.cursor();
    let x = cursor.col * cell_w;
    let y = cursor.row * cell_h;
    // Reverse colors plus an underline mark composition.
    let fg = term.palette().bg;
    let bg = term.palette().fg;
    let w = text_run(
        canvas, glyphs, fonts, cell_w, cell_h, ascent, x, y, text, fg, bg,
    );
    canvas.fill_rect(x, y + cell_h.saturating_sub(2), w, 1, fg);
}
