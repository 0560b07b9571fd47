//! Cell content and attributes.
//!
//! Cells are plain 16-byte value types; the grid owns all of them.
//! Content is a packed `u32`: a Unicode scalar value, `0` for
//! never-written/erased, the [`SPACER`] sentinel for the right half of
//! a double-width glyph, or a key into the composed-grapheme table
//! (see [`crate::composed`]) when the visible content needs more than
//! one codepoint.
//!
//! Invariants:
//! * `CLEAN` means the currently displayed pixel buffer depicts this
//!   cell; printing or erasing must drop it.
//! * `CONFINED` is set for glyphs known not to overflow their cell to
//!   the right; the renderer's overflow pre-pass trusts it.
//! * A `SPACER` cell always sits immediately right of a wide leader
//!   and carries the leader's attributes.

use core_color::Rgb;

/// Right half of a double-width glyph. Above the Unicode scalar range
/// so it can never collide with real content.
pub const SPACER: u32 = 0x0011_0000;

/// First composed-grapheme key. Content values in
/// `COMB_BASE..=COMB_MAX` index the composed table.
pub const COMB_BASE: u32 = 0x0020_0000;
pub const COMB_MAX: u32 = 0x002f_ffff;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AttrFlags: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const STRIKETHROUGH = 1 << 4;
        const BLINK         = 1 << 5;
        const REVERSE       = 1 << 6;
        const CONCEAL       = 1 << 7;
        /// Pixel buffer already depicts this cell.
        const CLEAN         = 1 << 8;
        /// Glyph does not overflow its cell to the right.
        const CONFINED      = 1 << 9;
        /// Cell is inside the active selection.
        const SELECTED      = 1 << 10;
        /// Cell belongs to an OSC 8 hyperlink body.
        const URL           = 1 << 11;
    }
}

/// A color as specified by the client, tagged with its source so
/// palette redefinition (OSC 4) retroactively affects indexed cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    /// 0–15, honoring the bold-is-bright rule at render time.
    Base16(u8),
    /// 16–255 (the cube and ramp).
    Indexed(u8),
    Rgb(Rgb),
}

/// The attributes stamped into each printed cell: the current SGR
/// state. Saved/restored by DECSC/DECRC alongside the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attrs {
    pub flags: AttrFlags,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Attrs {
    fn default() -> Self {
        Self {
            flags: AttrFlags::empty(),
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

impl Attrs {
    /// SGR 0: everything off, default colors. Does not touch the
    /// render-tracking bits, which are per-cell only.
    pub fn reset(&mut self) {
        *self = Attrs::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Packed content; see module docs.
    pub content: u32,
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            content: 0,
            fg: Color::Default,
            bg: Color::Default,
            flags: AttrFlags::CLEAN | AttrFlags::CONFINED,
        }
    }
}

impl Cell {
    /// A blank cell carrying `attrs`' background (ED/EL fill).
    pub fn blank(attrs: Attrs) -> Self {
        Cell {
            content: 0,
            fg: Color::Default,
            bg: attrs.bg,
            flags: AttrFlags::CONFINED,
        }
    }

    pub fn write(&mut self, content: u32, attrs: Attrs) {
        self.content = content;
        self.fg = attrs.fg;
        self.bg = attrs.bg;
        // Preserve nothing: a write invalidates render tracking.
        self.flags = attrs.flags & !(AttrFlags::CLEAN | AttrFlags::SELECTED);
        self.flags |= AttrFlags::CONFINED;
    }

    pub fn is_empty(&self) -> bool {
        self.content == 0
    }

    pub fn is_spacer(&self) -> bool {
        self.content == SPACER
    }

    pub fn is_composed(&self) -> bool {
        (COMB_BASE..=COMB_MAX).contains(&self.content)
    }

    /// The single codepoint, if the content is one.
    pub fn codepoint(&self) -> Option<char> {
        if self.is_empty() || self.is_spacer() || self.is_composed() {
            None
        } else {
            char::from_u32(self.content)
        }
    }

    pub fn is_clean(&self) -> bool {
        self.flags.contains(AttrFlags::CLEAN)
    }

    pub fn set_clean(&mut self, clean: bool) {
        self.flags.set(AttrFlags::CLEAN, clean);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_is_16_bytes() {
        // The grid allocates millions of these; keep them compact.
        assert!(std::mem::size_of::<Cell>() <= 16);
    }

    #[test]
    fn write_clears_clean_and_selected() {
        let mut cell = Cell::default();
        cell.flags.insert(AttrFlags::SELECTED);
        let mut attrs = Attrs::default();
        attrs.flags.insert(AttrFlags::BOLD | AttrFlags::SELECTED);
        cell.write('x' as u32, attrs);
        assert!(!cell.is_clean());
        assert!(!cell.flags.contains(AttrFlags::SELECTED));
        assert!(cell.flags.contains(AttrFlags::BOLD));
        assert_eq!(cell.codepoint(), Some('x'));
    }

    #[test]
    fn sentinels_have_no_codepoint() {
        let mut cell = Cell::default();
        cell.content = SPACER;
        assert!(cell.is_spacer());
        assert_eq!(cell.codepoint(), None);
        cell.content = COMB_BASE + 3;
        assert!(cell.is_composed());
        assert_eq!(cell.codepoint(), None);
    }

    #[test]
    fn blank_takes_background() {
        let attrs = Attrs {
            bg: Color::Indexed(42),
            ..Default::default()
        };
        let cell = Cell::blank(attrs);
        assert_eq!(cell.bg, Color::Indexed(42));
        assert!(!cell.is_clean());
        assert!(cell.is_empty());
    }
}
