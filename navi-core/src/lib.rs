//! Navi Core - terminal surface model for output and keyboard navigation
//!
//! This crate provides the screen state shared by a terminal's output path
//! and its keyboard-driven navigation mode:
//! - A growable primary surface (screen plus history) and a fixed alternate surface
//! - Two cursors, each with its own viewport offset into the active surface
//! - Scroll regions, dirty-row tracking and tab stops
//! - Selection with word/line snapping and text extraction
//!
//! Every public mutator leaves both cursors inside their viewports, so
//! callers never observe a half-applied state.

mod buffer;
mod cell;
mod color;
mod config;
mod cursor;
pub mod error;
mod line;
mod modes;
mod screen;
pub mod selection;
mod snapshot;
mod surface;

pub use buffer::GrowableBuffer;
pub use cell::{char_width, Cell, CellAttributes, CellFlags};
pub use color::Color;
pub use config::{ScreenConfig, DEFAULT_MAX_ROWS, DEFAULT_TAB_WIDTH};
pub use cursor::{Cursor, CursorId, Offset, Position, SavedCursor};
pub use error::{Error, Result};
pub use line::Line;
pub use modes::Modes;
pub use screen::Screen;
pub use selection::{Point, Selection, SelectionMode, SelectionType, Snap};
pub use snapshot::{Frame, Snapshot, SnapshotAttrSpan, SnapshotDimensions, SnapshotLine};
pub use surface::{Surface, SurfaceKind};

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub cols: usize,
    pub rows: usize,
}

impl Dimensions {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self { cols, rows }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}
