//! Sixel placement and lifetime in the grid.
//!
//! Placement rules:
//! 1. An image that would cross the ring wrap-around is split into
//!    per-segment images, the cursor advancing by linefeeds between
//!    segments (so the split is invisible to the client).
//! 2. Before insertion, every existing image overlapping the target
//!    rectangle is split into up to four non-overlapping slabs (above,
//!    below, left, right) and the original destroyed. The left/right
//!    slabs cover only the first overlapped cell row; content beside
//!    later rows of the rectangle is dropped with the original.
//! 3. The per-grid list is kept sorted by scrollback-relative end row,
//!    descending. Two images may share an end row only with disjoint
//!    column ranges.
//!
//! Scroll-up eviction must walk the *entire* list: it evicts on the
//! image's *start* row, but the list is ordered by *end* row, so a
//! tall image due for eviction may sit anywhere in the list.

use crate::{DcsConsumer, Term};
use core_grid::{ScrollRegion, SixelImage, SixelPos};
use core_vt::Params;

/// Resolve the terminal background to the palette RGB (sixel fill).
fn background(term: &Term) -> core_color::Rgb {
    term.palette.bg
}

pub(crate) fn hook(term: &mut Term, params: &Params) {
    let p2 = params.raw(1);
    let bg = background(term);
    let max_w = term.cols * term.cell_width;
    let max_h = term.rows * term.cell_height;
    term.sixel.hook(p2 as u32, bg, max_w, max_h);
    term.dcs = DcsConsumer::Sixel;
}

/// Finalize the in-progress image and place it, splitting across the
/// ring wrap-around as needed.
pub(crate) fn unhook(term: &mut Term) {
    let Some(raster) = term.sixel.unhook() else {
        return;
    };

    let (cell_w, cell_h) = (term.cell_width, term.cell_height);
    let start_col = term.cursor.col;
    let stride = raster.width;

    let mut pixel_row = 0usize;
    let mut left = raster.height;

    while left > 0 {
        let cur_abs = term.grid().absolute(term.cursor.row);
        let rows_avail = term.grid().num_rows() - cur_abs;
        let pixel_rows_avail = rows_avail * cell_h;
        let height = left.min(pixel_rows_avail);

        let data = raster.data[pixel_row * stride..(pixel_row + height) * stride].to_vec();
        let image = SixelImage::new(
            data,
            raster.width,
            height,
            SixelPos {
                row: cur_abs,
                col: start_col,
            },
            cell_w,
            cell_h,
            raster.opaque,
        );

        let cursor_row = term.cursor.row;
        overwrite_by_rectangle(term, cursor_row, image.pos.col, image.rows, image.cols);

        tracing::trace!(
            target: "sixel",
            width = image.width,
            height = image.height,
            row = image.pos.row,
            col = image.pos.col,
            "placing sixel segment"
        );

        // Allocate grid space first, then insert.
        let cell_rows = image.rows;
        for r in 0..cell_rows {
            damage_image_row(term, (image.pos.row + r) & (term.grid().num_rows() - 1));
            term.linefeed();
        }
        term.carriage_return();

        insert_sorted(term, image);

        pixel_row += height;
        left -= height;
    }

    let rows = term.rows;
    term.grid().verify_sixels(rows);
}

/// Insert keeping end-row-descending order.
fn insert_sorted(term: &mut Term, image: SixelImage) {
    let rows = term.rows;
    let end = term.grid().rebase_row(image.end_row(), rows);
    let idx = term
        .grid()
        .sixels
        .iter()
        .position(|s| term.grid().rebase_row(s.end_row(), rows) < end)
        .unwrap_or(term.grid().sixels.len());
    term.grid_mut().sixels.insert(idx, image);
}

/// Mark every cell of an absolute grid row not-clean so the next frame
/// repaints what an image used to cover (or now covers).
fn damage_image_row(term: &mut Term, abs: usize) {
    let row = term.grid_mut().row_abs_alloc(abs);
    row.dirty = true;
    for cell in row.cells_mut() {
        cell.set_clean(false);
    }
}

fn erase_image(term: &mut Term, image: &SixelImage) {
    let num_rows = term.grid().num_rows();
    for r in 0..image.rows {
        damage_image_row(term, (image.pos.row + r) & (num_rows - 1));
    }
}

/// Split `six` around the absolute-row rectangle and insert the
/// surviving slabs.
fn split_around(
    term: &mut Term,
    six: &SixelImage,
    row: usize,
    col: usize,
    height: usize,
    width: usize,
) {
    let (cell_w, cell_h) = (term.cell_width, term.cell_height);

    let rel_above = (row as isize - six.pos.row as isize).clamp(0, six.rows as isize) as usize;
    let rel_below = ((row + height) as isize - six.pos.row as isize).clamp(0, six.rows as isize)
        as usize;
    let rel_left = (col as isize - six.pos.col as isize).clamp(0, six.cols as isize) as usize;
    let rel_right =
        ((col + width) as isize - six.pos.col as isize).clamp(0, six.cols as isize) as usize;

    let mut slabs: Vec<SixelImage> = Vec::with_capacity(4);

    if rel_above > 0 {
        let h = (rel_above * cell_h).min(six.height);
        slabs.push(SixelImage::new(
            six.copy_rect(0, 0, six.width, h),
            six.width,
            h,
            six.pos,
            cell_w,
            cell_h,
            six.opaque,
        ));
    }

    if rel_below < six.rows {
        let y = rel_below * cell_h;
        let h = six.height - y.min(six.height);
        if h > 0 {
            slabs.push(SixelImage::new(
                six.copy_rect(0, y, six.width, h),
                six.width,
                h,
                SixelPos {
                    row: six.pos.row + rel_below,
                    col: six.pos.col,
                },
                cell_w,
                cell_h,
                six.opaque,
            ));
        }
    }

    // Left/right slabs cover only the first overlapped cell row.
    let band_y = rel_above * cell_h;
    let band_h = cell_h.min(six.height.saturating_sub(band_y));

    if rel_left > 0 && band_h > 0 {
        let w = (rel_left * cell_w).min(six.width);
        slabs.push(SixelImage::new(
            six.copy_rect(0, band_y, w, band_h),
            w,
            band_h,
            SixelPos {
                row: six.pos.row + rel_above,
                col: six.pos.col,
            },
            cell_w,
            cell_h,
            six.opaque,
        ));
    }

    if rel_right < six.cols && band_h > 0 {
        let x = rel_right * cell_w;
        let w = six.width - x.min(six.width);
        if w > 0 {
            slabs.push(SixelImage::new(
                six.copy_rect(x, band_y, w, band_h),
                w,
                band_h,
                SixelPos {
                    row: six.pos.row + rel_above,
                    col: six.pos.col + rel_right,
                },
                cell_w,
                cell_h,
                six.opaque,
            ));
        }
    }

    for slab in slabs {
        insert_sorted(term, slab);
    }
}

/// Destroy/split every image overlapping the rectangle. Rows are
/// absolute and the rectangle must not wrap (the caller splits).
fn overwrite_abs(term: &mut Term, row: usize, col: usize, height: usize, width: usize) {
    if term.grid().sixels.is_empty() || height == 0 || width == 0 {
        return;
    }
    let rows = term.rows;
    let start = row;
    let end = row + height - 1;
    let rel_start = term.grid().rebase_row(start, rows);

    let mut idx = 0;
    while idx < term.grid().sixels.len() {
        let six = &term.grid().sixels[idx];
        let six_start = six.pos.row;
        let six_end = six.end_row();
        let six_rel_end = term.grid().rebase_row(six_end, rows);

        if six_rel_end < rel_start {
            // List is end-row descending: everything further is above
            // our rectangle.
            break;
        }

        let rows_overlap = start <= six_end && end >= six_start;
        let cols_overlap = col < six.pos.col + six.cols && six.pos.col < col + width;

        if rows_overlap && cols_overlap {
            let removed = term.grid_mut().sixels.remove(idx);
            split_around(term, &removed, start, col, height, width);
            erase_image(term, &removed);
            // Restart scanning: insertions may reorder around idx.
            idx = 0;
        } else {
            idx += 1;
        }
    }
}

/// Overwrite by a logical-row rectangle, splitting at the ring
/// wrap-around.
pub(crate) fn overwrite_by_rectangle(
    term: &mut Term,
    logical_row: usize,
    col: usize,
    height: usize,
    width: usize,
) {
    if term.grid().sixels.is_empty() {
        return;
    }
    let num_rows = term.grid().num_rows();
    let start = term.grid().absolute(logical_row);
    let end = (start + height - 1) & (num_rows - 1);

    if end < start {
        let first = num_rows - start;
        overwrite_abs(term, start, col, first, width);
        overwrite_abs(term, 0, col, height - first, width);
    } else {
        overwrite_abs(term, start, col, height, width);
    }
}

/// Overwrite the cell span `[col, col+width)` of one logical row.
pub(crate) fn overwrite_by_row(term: &mut Term, logical_row: usize, col: usize, width: usize) {
    if term.grid().sixels.is_empty() || width == 0 {
        return;
    }
    let width = width.min(term.cols - col.min(term.cols));
    overwrite_by_rectangle(term, logical_row, col, 1, width);
}

pub(crate) fn overwrite_at_cursor(term: &mut Term, width: usize) {
    let (row, col) = (term.cursor.row, term.cursor.col);
    overwrite_by_row(term, row, col, width);
}

/// Full-screen scroll up by `n`: evict images whose *start* row leaves
/// the scrollback. No early break — see module docs.
pub(crate) fn scroll_up_evict(term: &mut Term, n: usize) {
    if term.grid().sixels.is_empty() {
        return;
    }
    let rows = term.rows;
    let mut idx = 0;
    while idx < term.grid().sixels.len() {
        let start_rel = {
            let six = &term.grid().sixels[idx];
            term.grid().rebase_row(six.pos.row, rows)
        };
        if start_rel < n {
            let removed = term.grid_mut().sixels.remove(idx);
            erase_image(term, &removed);
        } else {
            idx += 1;
        }
    }
}

/// Full-screen reverse scroll: evict images pushed off the bottom.
/// The list order allows stopping at the first survivor.
pub(crate) fn scroll_down_evict(term: &mut Term, n: usize) {
    if term.grid().sixels.is_empty() {
        return;
    }
    let rows = term.rows;
    let num_rows = term.grid().num_rows();
    while let Some(six) = term.grid().sixels.first() {
        let end_rel = term.grid().rebase_row(six.end_row(), rows);
        if end_rel >= num_rows - n {
            let removed = term.grid_mut().sixels.remove(0);
            erase_image(term, &removed);
        } else {
            break;
        }
    }
}

/// Partial-region scroll: images overlapping the region are dropped
/// (their content no longer corresponds to any stable rows).
pub(crate) fn evict_region(term: &mut Term, region: ScrollRegion) {
    if term.grid().sixels.is_empty() {
        return;
    }
    let abs: Vec<usize> = (region.top..region.bottom)
        .map(|r| term.grid().absolute(r))
        .collect();
    let mut idx = 0;
    while idx < term.grid().sixels.len() {
        let overlaps = {
            let six = &term.grid().sixels[idx];
            (0..six.rows).any(|r| abs.contains(&(six.pos.row + r)))
        };
        if overlaps {
            let removed = term.grid_mut().sixels.remove(idx);
            erase_image(term, &removed);
        } else {
            idx += 1;
        }
    }
}

/// Cell geometry changed: recompute every image's cell footprint.
pub(crate) fn cell_size_changed(term: &mut Term) {
    let (cw, ch) = (term.cell_width, term.cell_height);
    for grid in [&mut term.normal, &mut term.alt] {
        for six in &mut grid.sixels {
            six.rows = six.height.div_ceil(ch);
            six.cols = six.width.div_ceil(cw);
        }
    }
}
