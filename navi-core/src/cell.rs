//! Terminal cell representation
//!
//! Each cell in a surface holds:
//! - A single code point (space when blank)
//! - Style flags, including the structural wide/dummy/wrap markers
//! - Foreground and background colors
//!
//! Cells are plain values and are copied by assignment.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::color::Color;

bitflags! {
    /// Style and layout flags of a cell
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CellFlags: u16 {
        const BOLD       = 1 << 0;
        const FAINT      = 1 << 1;
        const ITALIC     = 1 << 2;
        const UNDERLINE  = 1 << 3;
        const BLINK      = 1 << 4;
        const REVERSE    = 1 << 5;
        const INVISIBLE  = 1 << 6;
        const STRUCK     = 1 << 7;
        /// Row continues on the next row (set on the trailing cell)
        const WRAP       = 1 << 8;
        /// First half of a double-width glyph
        const WIDE       = 1 << 9;
        /// Second half of a double-width glyph, never rendered
        const WIDE_DUMMY = 1 << 10;
    }
}

impl CellFlags {
    /// Flags describing layout rather than style
    pub const STRUCTURAL: CellFlags = CellFlags::WRAP
        .union(CellFlags::WIDE)
        .union(CellFlags::WIDE_DUMMY);
}

impl Default for CellFlags {
    fn default() -> Self {
        CellFlags::empty()
    }
}

/// Attributes that affect how a cell is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellAttributes {
    pub fg: Color,
    pub bg: Color,
    pub flags: CellFlags,
}

impl CellAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all attributes to default
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Same colors and style, without the layout markers
    pub fn style_only(self) -> Self {
        Self {
            flags: self.flags - CellFlags::STRUCTURAL,
            ..self
        }
    }

    /// Get effective foreground color (accounting for reverse video)
    pub fn effective_fg(&self) -> Color {
        if self.flags.contains(CellFlags::REVERSE) {
            self.bg
        } else {
            self.fg
        }
    }

    /// Get effective background color (accounting for reverse video)
    pub fn effective_bg(&self) -> Color {
        if self.flags.contains(CellFlags::REVERSE) {
            self.fg
        } else {
            self.bg
        }
    }
}

/// A single cell in a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    c: char,
    pub attrs: CellAttributes,
}

impl Cell {
    /// Create a new blank cell
    pub fn new() -> Self {
        Self {
            c: ' ',
            attrs: CellAttributes::default(),
        }
    }

    /// Blank cell carrying the given style
    pub fn blank(attrs: CellAttributes) -> Self {
        Self {
            c: ' ',
            attrs: attrs.style_only(),
        }
    }

    pub fn with_char(c: char) -> Self {
        Self {
            c,
            attrs: CellAttributes::default(),
        }
    }

    pub fn with_char_and_attrs(c: char, attrs: CellAttributes) -> Self {
        Self { c, attrs }
    }

    pub fn set_char(&mut self, c: char) {
        self.c = c;
    }

    /// The code point to draw (space when blank)
    pub fn display_char(&self) -> char {
        self.c
    }

    /// Check if cell is blank
    pub fn is_empty(&self) -> bool {
        self.c == ' '
    }

    pub fn flags(&self) -> CellFlags {
        self.attrs.flags
    }

    pub fn is_wide(&self) -> bool {
        self.attrs.flags.contains(CellFlags::WIDE)
    }

    /// Check if this is the hidden half of a wide glyph
    pub fn is_wide_dummy(&self) -> bool {
        self.attrs.flags.contains(CellFlags::WIDE_DUMMY)
    }

    /// Check if the row continues onto the next row after this cell
    pub fn is_wrapped(&self) -> bool {
        self.attrs.flags.contains(CellFlags::WRAP)
    }

    pub fn set_wrapped(&mut self, wrapped: bool) {
        self.attrs.flags.set(CellFlags::WRAP, wrapped);
    }

    /// Reset the cell to a blank with the given style
    pub fn clear(&mut self, attrs: CellAttributes) {
        *self = Self::blank(attrs);
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of columns a code point occupies (0 for combining marks)
pub fn char_width(c: char) -> usize {
    match c.width() {
        Some(w) => w.min(2),
        // Control characters never reach the grid, treat as narrow
        None => 1,
    }
}
