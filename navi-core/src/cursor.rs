//! Cursor state management
//!
//! A screen owns two cursors that share the active surface: the output
//! cursor, written to by the output stream, and the navigation cursor,
//! driven by keyboard navigation. Each carries its own viewport offset,
//! so the two can look at different parts of the history.

use serde::{Deserialize, Serialize};

use crate::cell::CellAttributes;

/// Selects one of the two cursors of a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorId {
    /// Receives output from the application
    Output,
    /// Moved by keyboard navigation
    Navigation,
}

/// Top-left corner of a cursor's viewport, in absolute surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: usize,
    pub y: usize,
}

/// A restorable cursor location, including the viewport it was seen through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
    pub offset: Offset,
}

/// Cursor state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    /// Absolute column in the active surface
    pub x: usize,
    /// Absolute row in the active surface
    pub y: usize,
    /// Attributes used for new characters and blanked cells
    pub attrs: CellAttributes,
    /// At the right margin, the next glyph wraps first
    pub wrap_pending: bool,
    /// Rows are confined to the scroll region
    pub origin: bool,
    /// Viewport position for this cursor
    pub offset: Offset,
}

impl Cursor {
    /// Create a new cursor at position (0, 0)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
            offset: self.offset,
        }
    }

    /// Column relative to the viewport
    pub fn view_x(&self) -> usize {
        self.x.saturating_sub(self.offset.x)
    }

    /// Row relative to the viewport
    pub fn view_y(&self) -> usize {
        self.y.saturating_sub(self.offset.y)
    }
}

/// Saved cursor state for DECSC/DECRC
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavedCursor {
    pub x: usize,
    pub y: usize,
    pub attrs: CellAttributes,
    pub origin: bool,
    pub wrap_pending: bool,
}

impl SavedCursor {
    /// Save current cursor state
    pub fn save(cursor: &Cursor) -> Self {
        Self {
            x: cursor.x,
            y: cursor.y,
            attrs: cursor.attrs,
            origin: cursor.origin,
            wrap_pending: cursor.wrap_pending,
        }
    }

    /// Restore everything except the position, which the screen clamps
    /// against the current viewport
    pub fn restore_attrs(&self, cursor: &mut Cursor) {
        cursor.attrs = self.attrs;
        cursor.origin = self.origin;
        cursor.wrap_pending = self.wrap_pending;
    }
}
