//! Search match overlay
//!
//! Derived display state: the matches of the current search pattern
//! within the navigation viewport. Recomputed whenever the pattern or the
//! viewport changes, never used to change content.

use navi_core::{error, CursorId, GrowableBuffer, Point, Screen};

use crate::motion::find_all;

#[derive(Debug, Clone, Default)]
pub struct Highlights {
    /// First and last cell of each match
    spans: GrowableBuffer<(Point, Point)>,
    /// Screen width at the last refresh
    cols: usize,
}

impl Highlights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// Screen width the spans were computed for
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Recompute matches of `pattern` over the navigation viewport
    pub fn refresh(&mut self, screen: &Screen, pattern: &[char]) {
        self.spans.clear();
        self.cols = screen.cols();
        let top = screen.cursor(CursorId::Navigation).offset.y;
        let bottom = top + screen.rows();
        for span in find_all(screen.surface(), pattern, top, bottom) {
            if let Err(err) = self.spans.push(span) {
                error::report(&err);
                break;
            }
        }
    }

    /// Whether the cell at absolute `(x, y)` belongs to a match
    ///
    /// Matches may continue onto the following row.
    pub fn highlighted(&self, x: usize, y: usize) -> bool {
        if x >= self.cols {
            return false;
        }
        self.spans
            .iter()
            .any(|&(start, end)| ((start.y, start.x)..=(end.y, end.x)).contains(&(y, x)))
    }

    /// Start of each match
    pub fn starts(&self) -> impl Iterator<Item = Point> + '_ {
        self.spans.iter().map(|&(start, _)| start)
    }
}
