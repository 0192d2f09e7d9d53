//! Surfaces - the row storage behind a viewport
//!
//! The primary surface holds the normal screen and its history as one
//! contiguous, growable run of rows. The alternate surface is exactly as
//! tall as the viewport. Rows are addressed by absolute index; which part
//! is visible is decided by each cursor's offset, not by the surface.

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellAttributes};
use crate::error::{Error, Result};
use crate::line::Line;

/// Which surface a cursor offset or selection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SurfaceKind {
    #[default]
    Primary,
    Alternate,
}

/// A column-uniform stack of rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    lines: Vec<Line>,
    cols: usize,
}

impl Surface {
    /// Create a blank surface
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            lines: (0..rows).map(|_| Line::new(cols)).collect(),
            cols,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows currently allocated
    pub fn rows(&self) -> usize {
        self.lines.len()
    }

    /// Get a line, panics if out of bounds
    pub fn line(&self, row: usize) -> &Line {
        &self.lines[row]
    }

    /// Get a mutable line, panics if out of bounds
    pub fn line_mut(&mut self, row: usize) -> &mut Line {
        &mut self.lines[row]
    }

    pub fn get_line(&self, row: usize) -> Option<&Line> {
        self.lines.get(row)
    }

    pub fn get_line_mut(&mut self, row: usize) -> Option<&mut Line> {
        self.lines.get_mut(row)
    }

    /// Cell at absolute (col, row)
    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        self.lines.get(row).and_then(|line| line.get(col))
    }

    /// Clear every row
    pub fn clear(&mut self, attrs: CellAttributes) {
        for line in &mut self.lines {
            line.clear(attrs);
        }
    }

    /// Rotate rows `top..=bottom` up by `n` and blank the `n` exposed rows
    /// at the bottom. Rows change places; cell contents are not copied.
    pub fn scroll_up(&mut self, top: usize, bottom: usize, n: usize, attrs: CellAttributes) {
        if n == 0 || top > bottom || bottom >= self.lines.len() {
            return;
        }
        let n = n.min(bottom - top + 1);
        self.lines[top..=bottom].rotate_left(n);
        for line in &mut self.lines[bottom + 1 - n..=bottom] {
            line.clear(attrs);
        }
    }

    /// Rotate rows `top..=bottom` down by `n` and blank the `n` exposed rows
    /// at the top.
    pub fn scroll_down(&mut self, top: usize, bottom: usize, n: usize, attrs: CellAttributes) {
        if n == 0 || top > bottom || bottom >= self.lines.len() {
            return;
        }
        let n = n.min(bottom - top + 1);
        self.lines[top..=bottom].rotate_right(n);
        for line in &mut self.lines[top..top + n] {
            line.clear(attrs);
        }
    }

    /// Append blank rows until the surface has `rows` rows
    ///
    /// Fails without touching the surface if memory cannot be reserved.
    pub fn grow_to(&mut self, rows: usize, attrs: CellAttributes) -> Result<()> {
        let current = self.lines.len();
        if rows <= current {
            return Ok(());
        }
        let additional = rows - current;
        self.lines
            .try_reserve(additional)
            .map_err(|_| Error::Alloc(additional))?;
        let cols = self.cols;
        self.lines
            .extend((0..additional).map(|_| Line::with_attrs(cols, attrs)));
        Ok(())
    }

    /// Drop the oldest `n` rows, recycling their storage as blank rows at
    /// the end. The row count does not change.
    pub fn evict_front(&mut self, n: usize, attrs: CellAttributes) {
        let len = self.lines.len();
        let n = n.min(len);
        if n == 0 {
            return;
        }
        self.lines.rotate_left(n);
        for line in &mut self.lines[len - n..] {
            line.clear(attrs);
        }
    }

    /// Set the exact row count, truncating or appending blank rows
    pub fn set_rows(&mut self, rows: usize, attrs: CellAttributes) -> Result<()> {
        if rows < self.lines.len() {
            self.lines.truncate(rows);
            Ok(())
        } else {
            self.grow_to(rows, attrs)
        }
    }

    /// Widen or narrow every row, preserving content
    pub fn resize_cols(&mut self, cols: usize, attrs: CellAttributes) {
        if cols == self.cols {
            return;
        }
        for line in &mut self.lines {
            line.resize(cols, attrs);
        }
        self.cols = cols;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }
}
