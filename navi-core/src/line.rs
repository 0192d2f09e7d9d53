//! Surface row representation
//!
//! A line is a row of cells. Soft wrapping is recorded on the trailing
//! cell (the WRAP flag) so it travels with the row when rows
//! are rotated or swapped.

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellAttributes};

/// A single row of a surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    cells: Vec<Cell>,
}

impl Line {
    /// Create a new blank line with the specified number of columns
    pub fn new(cols: usize) -> Self {
        Self {
            cells: vec![Cell::new(); cols],
        }
    }

    /// Create a blank line whose cells carry `attrs`
    pub fn with_attrs(cols: usize, attrs: CellAttributes) -> Self {
        Self {
            cells: vec![Cell::blank(attrs); cols],
        }
    }

    pub fn cols(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    pub fn get_mut(&mut self, col: usize) -> Option<&mut Cell> {
        self.cells.get_mut(col)
    }

    /// Get cell at column, panics if out of bounds
    pub fn cell(&self, col: usize) -> &Cell {
        &self.cells[col]
    }

    /// Get mutable cell at column, panics if out of bounds
    pub fn cell_mut(&mut self, col: usize) -> &mut Cell {
        &mut self.cells[col]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Whether the row continues on the next row
    pub fn is_wrapped(&self) -> bool {
        self.cells.last().map_or(false, Cell::is_wrapped)
    }

    /// Mark or unmark the row as soft-wrapped
    pub fn set_wrapped(&mut self, wrapped: bool) {
        if let Some(last) = self.cells.last_mut() {
            last.set_wrapped(wrapped);
        }
    }

    /// Clear the entire line with given attributes
    pub fn clear(&mut self, attrs: CellAttributes) {
        self.cells.fill(Cell::blank(attrs));
    }

    /// Blank columns `start..=end`, clamped to the row
    pub fn clear_range(&mut self, start: usize, end: usize, attrs: CellAttributes) {
        let end = end.min(self.cells.len().saturating_sub(1));
        if start > end || start >= self.cells.len() {
            return;
        }
        self.cells[start..=end].fill(Cell::blank(attrs));
    }

    /// Resize the line to a new column count
    ///
    /// Content is preserved; new columns are blank. The wrap marker moves
    /// with the trailing cell.
    pub fn resize(&mut self, cols: usize, attrs: CellAttributes) {
        if cols == self.cells.len() {
            return;
        }
        let wrapped = self.is_wrapped();
        self.set_wrapped(false);
        self.cells.resize(cols, Cell::blank(attrs));
        self.set_wrapped(wrapped);
    }

    /// Insert n blank cells at column, shifting cells right
    /// Cells that shift past the end are lost
    pub fn insert_cells(&mut self, col: usize, n: usize, attrs: CellAttributes) {
        let len = self.cells.len();
        if col >= len {
            return;
        }
        let n = n.min(len - col);
        self.cells.copy_within(col..len - n, col + n);
        self.cells[col..col + n].fill(Cell::blank(attrs));
    }

    /// Delete n cells at column, shifting cells left
    /// New cells at the end are filled with attrs
    pub fn delete_cells(&mut self, col: usize, n: usize, attrs: CellAttributes) {
        let len = self.cells.len();
        if col >= len {
            return;
        }
        let n = n.min(len - col);
        self.cells.copy_within(col + n..len, col);
        self.cells[len - n..].fill(Cell::blank(attrs));
    }

    /// Number of meaningful columns
    ///
    /// A wrapped row is always full width; otherwise trailing blanks
    /// do not count.
    pub fn content_len(&self) -> usize {
        if self.is_wrapped() {
            return self.cells.len();
        }
        self.cells
            .iter()
            .rposition(|c| !c.is_empty())
            .map_or(0, |i| i + 1)
    }

    /// Get the text content of the line, without trailing blanks
    pub fn text(&self) -> String {
        let mut result: String = self
            .cells
            .iter()
            .filter(|c| !c.is_wide_dummy())
            .map(Cell::display_char)
            .collect();
        let trimmed = result.trim_end_matches(' ').len();
        result.truncate(trimmed);
        result
    }

    /// Check if line is empty (all cells are blank)
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }
}

/// Build a line from text, one cell per character (test and bench helper)
impl From<&str> for Line {
    fn from(text: &str) -> Self {
        Self {
            cells: text.chars().map(Cell::with_char).collect(),
        }
    }
}
