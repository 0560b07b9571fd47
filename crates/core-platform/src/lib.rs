//! Collaborator contracts.
//!
//! The core assumes only a byte-oriented duplex channel, a monotonic
//! clock and a way to blit an RGBA buffer. Everything else — the PTY
//! itself, the window-system surface, font files, the clipboard — sits
//! behind these traits. The core never constructs an implementation;
//! the host wires them in.
//!
//! Error policy (by kind):
//! * PTY errors propagate to the host (fatal for the session).
//! * Surface failures downgrade to "skip this frame".
//! * Font lookup failures fall back to a `.notdef` box.
//! * Allocation failure during grid/sixel growth surfaces as
//!   [`CoreError::ResourceExhaustion`]; the core then refuses input.

use std::io;

/// Boundary errors with policy attached; recoverable protocol
/// conditions never reach this type (they are logged and dropped).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("allocation failed during {context}")]
    ResourceExhaustion { context: &'static str },

    #[error("pty: {0}")]
    Pty(#[source] io::Error),

    #[error("surface: {0}")]
    Surface(String),

    #[error("clipboard: {0}")]
    Clipboard(#[source] io::Error),
}

/// The pseudo-terminal side: non-blocking reads/writes plus window
/// size reporting. Short reads and writes are normal.
pub trait Pty {
    /// Non-blocking read; `Ok(0)` means nothing available (or EOF,
    /// which the host's event loop distinguishes).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CoreError>;
    /// Non-blocking write; may write fewer bytes than given.
    fn write(&mut self, buf: &[u8]) -> Result<usize, CoreError>;
    /// TIOCSWINSZ equivalent.
    fn set_window_size(
        &mut self,
        rows: u16,
        cols: u16,
        px_width: u16,
        px_height: u16,
    ) -> Result<(), CoreError>;
}

/// One frame's pixel buffer, loaned by the surface.
pub struct SurfaceBuffer<'a> {
    /// ARGB32 pixels, `stride` bytes per row.
    pub data: &'a mut [u8],
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    /// Frames since this buffer was last presented; 0 = brand new
    /// contents (nothing can be reused).
    pub age: usize,
}

/// A damage rectangle in buffer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// The presentation side. `acquire` + `commit` bracket one frame.
pub trait Surface {
    fn acquire(&mut self, width: usize, height: usize) -> Result<SurfaceBuffer<'_>, CoreError>;
    fn commit(&mut self, damage: &[DamageRect]) -> Result<(), CoreError>;

    /// Attempt a server-side scroll of `region_px` rows by `lines_px`
    /// (positive = up). Returns false when unsupported, in which case
    /// the renderer falls back to an in-buffer move.
    fn punch_scroll(&mut self, _region_top: usize, _region_bottom: usize, _lines: isize) -> bool {
        false
    }
}

/// Pixel formats a font rasterizer may hand us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixFormat {
    /// 1-bit alpha, rows padded to whole bytes.
    A1,
    /// 8-bit alpha.
    A8,
    /// Pre-rendered color glyph (emoji).
    Argb32,
}

/// A rasterized glyph plus metrics, shared immutably once created.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub pix: Vec<u8>,
    pub format: PixFormat,
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub x_bearing: i32,
    pub y_bearing: i32,
    pub advance: i32,
}

/// Opaque host-side font identity (primary/bold/italic/bold-italic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle(pub u32);

/// Font collaborator. Lookup failure is not an error: `None` sends the
/// renderer to the box-drawing synthesizer or the `.notdef` box.
pub trait FontSource {
    fn glyph_for(&mut self, font: FontHandle, codepoint: char, subpixel: bool) -> Option<Glyph>;

    /// Shape a composed sequence as one cluster (when grapheme shaping
    /// is enabled). Default: no shaping available.
    fn grapheme_run(&mut self, _font: FontHandle, _codepoints: &[char]) -> Option<Vec<Glyph>> {
        None
    }

    /// Cell geometry derived from the primary font's metrics.
    fn cell_metrics(&self) -> CellMetrics;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub cell_width: usize,
    pub cell_height: usize,
    pub ascent: usize,
    pub descent: usize,
}

/// Which selection buffer a clipboard operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardKind {
    /// The primary (middle-click) selection.
    Primary,
    /// The regular clipboard.
    Regular,
}

/// Clipboard transport. `request` returns asynchronously through the
/// host event loop; the core only issues the request here.
pub trait ClipboardHost {
    fn set_clipboard(&mut self, kind: ClipboardKind, bytes: Vec<u8>) -> Result<(), CoreError>;
    fn request_clipboard(&mut self, kind: ClipboardKind) -> Result<(), CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_carry_context() {
        let e = CoreError::ResourceExhaustion { context: "sixel raster" };
        assert!(e.to_string().contains("sixel raster"));
    }

    #[test]
    fn surface_punch_scroll_defaults_off() {
        struct Null;
        impl Surface for Null {
            fn acquire(
                &mut self,
                _w: usize,
                _h: usize,
            ) -> Result<SurfaceBuffer<'_>, CoreError> {
                Err(CoreError::Surface("headless".into()))
            }
            fn commit(&mut self, _damage: &[DamageRect]) -> Result<(), CoreError> {
                Ok(())
            }
        }
        assert!(!Null.punch_scroll(0, 10, 1));
    }
}
