//! Cell colors
//!
//! Palette resolution belongs to the renderer; cells only carry the
//! color reference the output stream selected.

use serde::{Deserialize, Serialize};

/// Foreground or background color of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Color {
    /// Terminal default color
    #[default]
    Default,
    /// Palette index (0-255)
    Indexed(u8),
    /// 24-bit color
    Rgb { r: u8, g: u8, b: u8 },
}

impl Color {
    pub fn indexed(index: u8) -> Self {
        Color::Indexed(index)
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Color::Default)
    }

    /// Stable text form for snapshots: `idx:N`, `#rrggbb`, or `None` for
    /// the default color
    pub fn label(self) -> Option<String> {
        match self {
            Color::Default => None,
            Color::Indexed(idx) => Some(format!("idx:{}", idx)),
            Color::Rgb { r, g, b } => Some(format!("#{:02x}{:02x}{:02x}", r, g, b)),
        }
    }
}
