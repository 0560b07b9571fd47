//! The frame coordinator.
//!
//! Per frame, in order:
//! 1. decide server-side punch scrolls, then acquire a buffer from the
//!    surface (failure ⇒ skip the frame, full repaint next time),
//! 2. repair the buffer from its age (copy forward last frame's dirty
//!    bands, or the whole previous frame, or force a full repaint),
//! 3. apply remaining scroll damage as in-buffer blits,
//! 4. composite opaque sixels and mark cells they fully cover clean,
//! 5. fan per-row jobs out to the pool (cursor cells pre-dirtied,
//!    overflow runs expanded, glyphs pre-fetched on this thread),
//! 6. rendezvous,
//! 7. composite translucent sixels, then the single-threaded overlays,
//! 8. remember the final buffer for the next age repair and commit.

use crate::glyph_cache::{FontStyle, GlyphCache, GlyphKey};
use crate::overlays::{self, OverlayState};
use crate::paint::Canvas;
use crate::rowpaint::{BoldInBright, FrameShared, RowJob};
use crate::timing;
use crate::workers::{Job, WorkerPool};
use core_grid::{AttrFlags, Damage};
use core_platform::{CoreError, DamageRect, FontSource, Surface};
use core_term::Term;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Worker threads; `None` ⇒ available parallelism − 1.
    pub worker_count: Option<usize>,
    /// Enable the overflowing-glyph dirty-run pre-pass.
    pub overflowing_glyphs: bool,
    pub bold_in_bright: BoldInBright,
    pub boxdraw: core_boxdraw::Options,
    /// Minimum moved bytes before asking the surface for a server-side
    /// scroll instead of an in-buffer move.
    pub scroll_punch_threshold: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            overflowing_glyphs: false,
            bold_in_bright: BoldInBright::default(),
            boxdraw: core_boxdraw::Options::default(),
            scroll_punch_threshold: 128 * 1024,
        }
    }
}

struct LastFrame {
    data: Vec<u8>,
    width: usize,
    height: usize,
    stride: usize,
    dirty_bands: Vec<bool>,
}

pub struct Renderer {
    config: RenderConfig,
    pool: WorkerPool,
    glyphs: Arc<GlyphCache>,
    cell_width: usize,
    cell_height: usize,
    ascent: usize,
    last: Option<LastFrame>,
    last_cursor: Option<(usize, usize)>,
    blink_hidden: bool,
    pub stats: timing::PresentationStats,
}

impl Renderer {
    pub fn new(config: RenderConfig, fonts: &dyn FontSource) -> Self {
        let metrics = fonts.cell_metrics();
        let workers = config.worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
        });
        Renderer {
            glyphs: Arc::new(GlyphCache::new(
                metrics.cell_width,
                metrics.cell_height,
                config.boxdraw,
            )),
            pool: WorkerPool::new(workers),
            cell_width: metrics.cell_width,
            cell_height: metrics.cell_height,
            ascent: metrics.ascent,
            last: None,
            last_cursor: None,
            blink_hidden: false,
            stats: timing::PresentationStats::default(),
            config,
        }
    }

    pub fn cell_metrics(&self) -> (usize, usize) {
        (self.cell_width, self.cell_height)
    }

    /// Font or scale change: new metrics, fresh glyph cache.
    pub fn set_cell_metrics(&mut self, cell_width: usize, cell_height: usize, ascent: usize) {
        self.cell_width = cell_width.max(1);
        self.cell_height = cell_height.max(1);
        self.ascent = ascent.min(self.cell_height);
        self.glyphs = Arc::new(GlyphCache::new(
            self.cell_width,
            self.cell_height,
            self.config.boxdraw,
        ));
        self.last = None;
    }

    /// Blink phase tick: damages every blinking cell in the viewport.
    pub fn set_blink_hidden(&mut self, hidden: bool, term: &mut Term) {
        if self.blink_hidden == hidden {
            return;
        }
        self.blink_hidden = hidden;
        for r in 0..term.rows() {
            let row = term.grid_mut().row_in_view_alloc(r);
            let mut any = false;
            for cell in row.cells_mut() {
                if cell.flags.contains(AttrFlags::BLINK) {
                    cell.set_clean(false);
                    any = true;
                }
            }
            row.dirty |= any;
        }
    }

    /// Render one frame. Returns false when the frame was skipped
    /// (surface refused a buffer).
    pub fn render_frame(
        &mut self,
        term: &mut Term,
        surface: &mut dyn Surface,
        fonts: &mut dyn FontSource,
        overlay_state: &OverlayState,
    ) -> Result<bool, CoreError> {
        let started = Instant::now();
        let rows = term.rows();
        let cols = term.cols();
        let want_w = cols * self.cell_width;
        let want_h = rows * self.cell_height;

        // Selection bits must be in place before damage is examined.
        term.selection_sync();

        // Cursor motion dirties both the old and the new cell before
        // jobs are dispatched.
        let cursor_view = cursor_view_pos(term);
        if self.last_cursor != cursor_view {
            if let Some((r, c)) = self.last_cursor {
                dirty_cell(term, r, c);
            }
            if let Some((r, c)) = cursor_view {
                dirty_cell(term, r, c);
            }
        }

        if self.config.overflowing_glyphs {
            overflow_prepass(term);
        }

        let scroll_damage = term.grid_mut().take_damage();
        let follow = term.grid().view_follows_offset();

        // 1a. punch-scroll decisions happen before the buffer borrow.
        let mut punched = vec![false; scroll_damage.len()];
        for (i, damage) in scroll_damage.iter().enumerate() {
            if !follow {
                continue;
            }
            let (region, lines, up) = scroll_parts(damage);
            let keep = region.len().saturating_sub(lines);
            let moved = keep * self.cell_height * want_w * 4;
            if keep > 0 && moved >= self.config.scroll_punch_threshold {
                let delta =
                    lines as isize * self.cell_height as isize * if up { 1 } else { -1 };
                punched[i] =
                    surface.punch_scroll(region.top * self.cell_height, region.bottom * self.cell_height, delta);
                if punched[i] {
                    tracing::trace!(target: "render.frame", lines, "punch-hole scroll");
                }
            }
        }

        // 1b. acquire.
        let buffer = match surface.acquire(want_w, want_h) {
            Ok(b) => b,
            Err(err) => {
                tracing::error!(target: "render.frame", %err, "no buffer; skipping frame");
                // Scroll records are gone; nothing to blit from next
                // frame, so force a full repaint then.
                self.last = None;
                force_full_repaint(term);
                return Ok(false);
            }
        };
        let (buf_w, buf_h, stride, age) =
            (buffer.width, buffer.height, buffer.stride, buffer.age);
        if buf_w < want_w || buf_h < want_h {
            tracing::error!(target: "render.frame", "undersized buffer; skipping frame");
            self.last = None;
            force_full_repaint(term);
            return Ok(false);
        }

        // 2. age repair.
        let geometry_matches = self
            .last
            .as_ref()
            .is_some_and(|l| l.width == buf_w && l.height == buf_h && l.stride == stride);
        let mut full_repaint = false;
        match (&self.last, age) {
            (Some(last), 1) if geometry_matches => {
                for (band, dirty) in last.dirty_bands.iter().enumerate() {
                    if *dirty {
                        let y0 = band * self.cell_height;
                        let y1 = ((band + 1) * self.cell_height).min(buf_h);
                        let span = y0 * stride..y1 * stride;
                        buffer.data[span.clone()].copy_from_slice(&last.data[span]);
                    }
                }
            }
            (Some(last), n) if n > 1 && geometry_matches => {
                buffer.data[..last.data.len()].copy_from_slice(&last.data);
            }
            _ => full_repaint = true,
        }
        if full_repaint {
            force_full_repaint(term);
        }

        let mut canvas = Canvas {
            data: buffer.data,
            width: buf_w,
            height: buf_h,
            stride,
        };

        // 3. the remaining scroll damage becomes in-buffer blits.
        if !full_repaint && follow {
            for (i, damage) in scroll_damage.iter().enumerate() {
                if punched[i] {
                    continue;
                }
                let (region, lines, up) = scroll_parts(damage);
                let keep = region.len().saturating_sub(lines);
                if keep == 0 {
                    continue;
                }
                let ch = self.cell_height;
                if up {
                    canvas.move_band(region.top * ch + lines * ch, region.top * ch, keep * ch);
                } else {
                    canvas.move_band(region.top * ch, region.top * ch + lines * ch, keep * ch);
                }
            }
        }

        // 4. opaque sixels first; fully covered cells become clean.
        composite_sixels(&mut canvas, term, self.cell_width, self.cell_height, true);

        // Pre-fetch glyphs here: the font collaborator stays on this
        // thread, workers only read the cache.
        prefetch_glyphs(term, &self.glyphs, fonts);

        // 5. per-row jobs.
        let shared = Arc::new(FrameShared {
            buf_data: canvas.data.as_mut_ptr(),
            buf_len: canvas.data.len(),
            stride,
            buf_width: buf_w,
            buf_height: buf_h,
            cell_width: self.cell_width,
            cell_height: self.cell_height,
            ascent: self.ascent,
            cols,
            palette: term.palette().clone(),
            reverse_video: term.modes().reverse_video,
            show_cursor: term.modes().show_cursor && follow,
            cursor_style: term.cursor_style().0,
            blink_hidden: self.blink_hidden,
            bold_in_bright: self.config.bold_in_bright,
            composed: term.composed() as *const _,
            glyphs: Arc::clone(&self.glyphs),
        });

        let mut dirty_bands = vec![false; rows];
        let mut posted_jobs = 0usize;
        for r in 0..rows {
            let cursor_col = match cursor_view {
                Some((cr, cc)) if cr == r => Some(cc),
                _ => None,
            };
            let needs_paint = cursor_col.is_some()
                || term.grid().row_in_view(r).is_some_and(|row| row.dirty);
            if !needs_paint {
                continue;
            }
            dirty_bands[r] = true;

            let row_ptr: *mut core_grid::Row = term.grid_mut().row_in_view_alloc(r);
            // SAFETY: each row index is handed out exactly once per
            // frame; the counted rendezvous below outlives every job.
            unsafe { (*row_ptr).dirty = false };
            let job = RowJob {
                view_row: r,
                row: row_ptr,
                cursor_col,
            };
            if self.pool.count() > 0 {
                self.pool.send(Job::Row {
                    shared: Arc::clone(&shared),
                    job,
                });
                posted_jobs += 1;
            } else {
                // SAFETY: inline rendering on this thread, same
                // exclusivity argument.
                unsafe { crate::rowpaint::render_row(&shared, &job) };
            }
        }

        // Barrier: one ack per completed row, so no worker can still
        // be writing when the buffer is reused below.
        self.pool.rendezvous(posted_jobs);
        drop(shared);

        // 7a. translucent sixels sit on top of the grid.
        composite_sixels(&mut canvas, term, self.cell_width, self.cell_height, false);

        // 7b. overlays, single-threaded.
        let overlay_bands = overlays::draw(
            &mut canvas,
            term,
            &self.glyphs,
            fonts,
            self.cell_width,
            self.cell_height,
            self.ascent,
            overlay_state,
        );
        for (start, end) in overlay_bands {
            for r in start..end.min(rows) {
                dirty_bands[r] = true;
            }
        }
        if !scroll_damage.is_empty() || full_repaint {
            dirty_bands.fill(true);
        }

        // 8. damage rects from dirty band runs; remember; commit.
        let mut damage_rects: Vec<DamageRect> = Vec::new();
        let mut run_start = None;
        for (r, dirty) in dirty_bands.iter().enumerate() {
            match (*dirty, run_start) {
                (true, None) => run_start = Some(r),
                (false, Some(s)) => {
                    damage_rects.push(band_rect(s, r, self.cell_height, buf_w));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = run_start {
            damage_rects.push(band_rect(s, rows, self.cell_height, buf_w));
        }

        self.last = Some(LastFrame {
            data: canvas.data.to_vec(),
            width: buf_w,
            height: buf_h,
            stride,
            dirty_bands,
        });
        self.last_cursor = cursor_view;

        surface.commit(&damage_rects)?;
        timing::record_last_render_ns(started.elapsed().as_nanos() as u64);
        Ok(true)
    }
}

/// Allocate and damage every viewport row so the next pass repaints
/// the whole screen, blank rows included.
fn force_full_repaint(term: &mut Term) {
    for r in 0..term.rows() {
        let row = term.grid_mut().row_in_view_alloc(r);
        row.dirty = true;
        for cell in row.cells_mut() {
            cell.set_clean(false);
        }
    }
}

fn scroll_parts(damage: &Damage) -> (core_grid::ScrollRegion, usize, bool) {
    match damage {
        Damage::Scroll { region, lines } => (*region, *lines, true),
        Damage::ScrollReverse { region, lines } => (*region, *lines, false),
    }
}

fn band_rect(start_row: usize, end_row: usize, cell_height: usize, width: usize) -> DamageRect {
    DamageRect {
        x: 0,
        y: start_row * cell_height,
        width,
        height: (end_row - start_row) * cell_height,
    }
}

/// The cursor's viewport position, if visible.
fn cursor_view_pos(term: &Term) -> Option<(usize, usize)> {
    let grid = term.grid();
    let cursor = term.cursor();
    let mask = grid.num_rows() - 1;
    let abs = grid.absolute(cursor.row);
    let view_row = (abs + grid.num_rows() - grid.view()) & mask;
    (view_row < term.rows()).then_some((view_row, cursor.col))
}

fn dirty_cell(term: &mut Term, view_row: usize, col: usize) {
    if view_row >= term.rows() || col >= term.cols() {
        return;
    }
    let row = term.grid_mut().row_in_view_alloc(view_row);
    if col < row.len() {
        row.dirty = true;
        row.cell_mut(col).set_clean(false);
    }
}

/// Expand dirtiness across runs of overflowing (not `CONFINED`)
/// glyphs: a dirty cell inside such a run dirties the whole run plus
/// the confining cell that ends it.
fn overflow_prepass(term: &mut Term) {
    let rows = term.rows();
    let cols = term.cols();
    for r in 0..rows {
        let dirty = term.grid().row_in_view(r).is_some_and(|row| row.dirty);
        if !dirty {
            continue;
        }
        let row = term.grid_mut().row_in_view_alloc(r);
        let cells = row.cells_mut();
        let mut col = 0;
        while col < cols {
            if cells[col].is_clean() {
                col += 1;
                continue;
            }
            // Walk left through unconfined, still-clean cells; a
            // confined or already-dirty cell ends the run.
            let mut back = col;
            while back > 0 {
                let prev = &mut cells[back - 1];
                if prev.flags.contains(AttrFlags::CONFINED) || !prev.is_clean() {
                    break;
                }
                prev.set_clean(false);
                back -= 1;
            }
            // Walk right until the first confined cell (inclusive).
            while col < cols {
                cells[col].set_clean(false);
                if cells[col].flags.contains(AttrFlags::CONFINED) {
                    break;
                }
                col += 1;
            }
            col += 1;
        }
    }
}

/// Composite sixels; the `opaque` pass also marks fully covered cells
/// clean so the grid pass skips them.
fn composite_sixels(
    canvas: &mut Canvas<'_>,
    term: &mut Term,
    cell_w: usize,
    cell_h: usize,
    opaque_pass: bool,
) {
    if term.grid().sixels.is_empty() {
        return;
    }
    let rows = term.rows();
    let view = term.grid().view();
    let num_rows = term.grid().num_rows();
    let mask = num_rows - 1;

    for idx in 0..term.grid().sixels.len() {
        let (data, img_w, img_h, pos, img_rows, opaque) = {
            let six = &term.grid().sixels[idx];
            (
                six.data.clone(),
                six.width,
                six.height,
                six.pos,
                six.rows,
                six.opaque,
            )
        };
        if opaque != opaque_pass {
            continue;
        }

        for ir in 0..img_rows {
            let abs = (pos.row + ir) & mask;
            let vr = (abs + num_rows - view) & mask;
            if vr >= rows {
                continue;
            }
            let src_y = ir * cell_h;
            let h = cell_h.min(img_h.saturating_sub(src_y));
            if h == 0 {
                continue;
            }
            canvas.composite_argb(
                &data,
                img_w,
                0,
                src_y,
                pos.col * cell_w,
                vr * cell_h,
                img_w,
                h,
                opaque,
            );

            if opaque_pass {
                // Every cell the image touches is clean: partially
                // covered edge cells keep whatever was underneath
                // rather than being overpainted by the grid pass.
                let span = img_w.div_ceil(cell_w);
                let row = term.grid_mut().row_in_view_alloc(vr);
                for c in pos.col..(pos.col + span).min(row.len()) {
                    row.cell_mut(c).set_clean(true);
                }
            }
        }
    }
}

/// Fill the glyph cache for every cell the workers are about to paint.
fn prefetch_glyphs(term: &Term, cache: &GlyphCache, fonts: &mut dyn FontSource) {
    for r in 0..term.rows() {
        let Some(row) = term.grid().row_in_view(r) else {
            continue;
        };
        if !row.dirty {
            continue;
        }
        for cell in row.cells() {
            if cell.is_clean() || cell.is_empty() || cell.is_spacer() {
                continue;
            }
            let style = match (
                cell.flags.contains(AttrFlags::BOLD),
                cell.flags.contains(AttrFlags::ITALIC),
            ) {
                (false, false) => FontStyle::Regular,
                (true, false) => FontStyle::Bold,
                (false, true) => FontStyle::Italic,
                (true, true) => FontStyle::BoldItalic,
            };
            if cell.is_composed() {
                if let Some(chars) = term.composed().lookup(cell.content) {
                    for &c in chars {
                        cache.ensure(
                            GlyphKey {
                                style,
                                content: c as u32,
                            },
                            fonts,
                        );
                    }
                }
            } else {
                cache.ensure(
                    GlyphKey {
                        style,
                        content: cell.content,
                    },
                    fonts,
                );
            }
        }
    }
}
