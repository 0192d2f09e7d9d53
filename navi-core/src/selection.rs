//! Text selection for copy/paste
//!
//! A selection is an anchor and an extend point in absolute surface
//! coordinates, plus the normalized begin/end derived from them. It is
//! bound to the surface it was started on.
//!
//! Lifecycle: `Idle -> Empty` on start, `Empty -> Ready` after a real
//! extend, `-> Idle` when finished or cleared. A finished selection keeps
//! its anchor and stays visible until it is cleared.

use serde::{Deserialize, Serialize};

use crate::surface::{Surface, SurfaceKind};

/// A point in a surface (column, absolute row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Selection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    #[default]
    Idle,
    Empty,
    Ready,
}

/// Selection shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionType {
    /// Follows the text from begin to end, wrapping at row ends
    #[default]
    Regular,
    /// Same column range on every row
    Rectangular,
}

/// Granularity the selection boundaries snap to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Snap {
    #[default]
    Char,
    Word,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

/// Selection state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    mode: SelectionMode,
    ty: SelectionType,
    snap: Snap,
    anchor: Option<Point>,
    extend: Point,
    begin: Point,
    end: Point,
    surface: SurfaceKind,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn selection_type(&self) -> SelectionType {
        self.ty
    }

    pub fn snap(&self) -> Snap {
        self.snap
    }

    /// Surface the selection was started on
    pub fn surface(&self) -> SurfaceKind {
        self.surface
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    /// Whether an anchor is set
    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    /// Normalized (begin, end), if an anchor is set
    pub fn bounds(&self) -> Option<(Point, Point)> {
        self.anchor.map(|_| (self.begin, self.end))
    }

    /// Clear any previous selection and anchor a new one at `point`
    pub fn start(
        &mut self,
        point: Point,
        snap: Snap,
        kind: SurfaceKind,
        surface: &Surface,
        delimiters: &str,
    ) {
        self.clear();
        self.mode = SelectionMode::Empty;
        self.ty = SelectionType::Regular;
        self.snap = snap;
        self.surface = kind;
        self.anchor = Some(point);
        self.extend = point;
        self.normalize(surface, delimiters);
        if self.snap != Snap::Char {
            self.mode = SelectionMode::Ready;
        }
    }

    /// Move the extend point
    ///
    /// `done` finishes the selection; finishing one that was never
    /// extended clears it instead.
    pub fn extend(
        &mut self,
        point: Point,
        ty: SelectionType,
        done: bool,
        surface: &Surface,
        delimiters: &str,
    ) {
        if self.mode == SelectionMode::Idle || self.anchor.is_none() {
            return;
        }
        if done && self.mode == SelectionMode::Empty {
            self.clear();
            return;
        }

        self.extend = point;
        self.ty = ty;
        self.normalize(surface, delimiters);
        self.mode = if done {
            SelectionMode::Idle
        } else {
            SelectionMode::Ready
        };
    }

    /// Drop the selection
    pub fn clear(&mut self) {
        self.anchor = None;
        self.mode = SelectionMode::Idle;
    }

    /// Recompute begin/end from anchor and extend
    pub fn normalize(&mut self, surface: &Surface, delimiters: &str) {
        let Some(anchor) = self.anchor else {
            return;
        };
        let extend = self.extend;

        let (begin_x, end_x) = if self.ty == SelectionType::Regular && anchor.y != extend.y {
            if anchor.y < extend.y {
                (anchor.x, extend.x)
            } else {
                (extend.x, anchor.x)
            }
        } else {
            (anchor.x.min(extend.x), anchor.x.max(extend.x))
        };
        self.begin = Point::new(begin_x, anchor.y.min(extend.y));
        self.end = Point::new(end_x, anchor.y.max(extend.y));

        self.begin = self.snapped(self.begin, Direction::Backward, surface, delimiters);
        self.end = self.snapped(self.end, Direction::Forward, surface, delimiters);

        if self.ty == SelectionType::Rectangular || surface.cols() == 0 {
            return;
        }
        // Expand over line ends so the rest of the row reads as selected
        let begin_len = line_len(surface, self.begin.y);
        if begin_len < self.begin.x {
            self.begin.x = begin_len.min(surface.cols() - 1);
        }
        if line_len(surface, self.end.y) <= self.end.x {
            self.end.x = surface.cols() - 1;
        }
    }

    /// Check if a cell is inside the selection
    pub fn contains(&self, x: usize, y: usize) -> bool {
        if self.mode == SelectionMode::Empty || self.anchor.is_none() {
            return false;
        }
        if y < self.begin.y || y > self.end.y {
            return false;
        }
        match self.ty {
            SelectionType::Rectangular => x >= self.begin.x && x <= self.end.x,
            SelectionType::Regular => {
                (y != self.begin.y || x >= self.begin.x) && (y != self.end.y || x <= self.end.x)
            }
        }
    }

    /// Whether any selected cell lies in rows `top..=bottom` and columns
    /// `left..=right`
    pub fn intersects(&self, left: usize, top: usize, right: usize, bottom: usize) -> bool {
        if self.mode == SelectionMode::Empty || self.anchor.is_none() {
            return false;
        }
        if left > right || bottom < self.begin.y || top > self.end.y {
            return false;
        }
        let (first_row, last_row) = (top.max(self.begin.y), bottom.min(self.end.y));
        match self.ty {
            SelectionType::Rectangular => left <= self.end.x && right >= self.begin.x,
            SelectionType::Regular => (first_row..=last_row).any(|y| {
                let from = if y == self.begin.y { self.begin.x } else { 0 };
                let to = if y == self.end.y { self.end.x } else { usize::MAX };
                left <= to && right >= from
            }),
        }
    }

    /// Shift the selection after rows `origin..=bottom` moved by `n`
    ///
    /// A selection pushed entirely out of `top..=bottom` is cleared; one
    /// that only partly leaves is clamped to the region.
    pub fn scroll(
        &mut self,
        origin: usize,
        n: isize,
        top: usize,
        bottom: usize,
        surface: &Surface,
        delimiters: &str,
    ) {
        let Some(anchor) = self.anchor else {
            return;
        };
        if n == 0 || self.end.y < origin || self.begin.y > bottom {
            return;
        }

        let shift = |y: usize| y as isize + n;
        let (anchor_y, extend_y) = (shift(anchor.y), shift(self.extend.y));
        let (lo, hi) = (anchor_y.min(extend_y), anchor_y.max(extend_y));
        let (top_i, bottom_i) = (top as isize, bottom as isize);
        if hi < top_i || lo > bottom_i {
            self.clear();
            return;
        }

        let last_col = surface.cols().saturating_sub(1);
        let clamp = |x: usize, y: isize| -> Point {
            match self.ty {
                SelectionType::Rectangular => Point::new(x, y.clamp(top_i, bottom_i) as usize),
                SelectionType::Regular if y < top_i => Point::new(0, top),
                SelectionType::Regular if y > bottom_i => Point::new(last_col, bottom),
                SelectionType::Regular => Point::new(x, y as usize),
            }
        };
        let new_anchor = clamp(anchor.x, anchor_y);
        let new_extend = clamp(self.extend.x, extend_y);
        self.anchor = Some(new_anchor);
        self.extend = new_extend;
        self.normalize(surface, delimiters);
    }

    /// Move both endpoints up by `n` rows after the oldest rows were evicted
    pub fn shift_up(&mut self, n: usize, surface: &Surface, delimiters: &str) {
        let Some(anchor) = self.anchor else {
            return;
        };
        if self.begin.y < n {
            self.clear();
            return;
        }
        self.anchor = Some(Point::new(anchor.x, anchor.y - n));
        self.extend.y -= n;
        self.normalize(surface, delimiters);
    }

    /// Extract the selected text
    ///
    /// Trailing blanks past each row's content are dropped, wide-glyph
    /// padding is skipped and rows are joined with `\n` unless the row
    /// soft-wraps into the next one.
    pub fn text(&self, surface: &Surface) -> String {
        let mut out = String::new();
        if self.anchor.is_none() || surface.cols() == 0 {
            return out;
        }
        let last_col = surface.cols() - 1;

        for y in self.begin.y..=self.end.y {
            let Some(line) = surface.get_line(y) else {
                break;
            };
            let len = line.content_len();
            let (first, last) = match self.ty {
                SelectionType::Rectangular => (self.begin.x, self.end.x),
                SelectionType::Regular => (
                    if y == self.begin.y { self.begin.x } else { 0 },
                    if y == self.end.y { self.end.x } else { last_col },
                ),
            };

            let mut wraps = false;
            if len > 0 {
                let last = last.min(len - 1);
                if first <= last {
                    out.extend(
                        line.cells()[first..=last]
                            .iter()
                            .filter(|c| !c.is_wide_dummy())
                            .map(|c| c.display_char()),
                    );
                    wraps = line.cell(last).is_wrapped();
                }
            }
            if y < self.end.y && !wraps {
                out.push('\n');
            }
        }
        out
    }

    fn snapped(
        &self,
        mut p: Point,
        dir: Direction,
        surface: &Surface,
        delimiters: &str,
    ) -> Point {
        let cols = surface.cols();
        let rows = surface.rows();
        if cols == 0 || p.y >= rows {
            return p;
        }
        match self.snap {
            Snap::Char => p,
            Snap::Line => {
                match dir {
                    Direction::Backward => {
                        p.x = 0;
                        while p.y > 0 && surface.line(p.y - 1).is_wrapped() {
                            p.y -= 1;
                        }
                    }
                    Direction::Forward => {
                        p.x = cols - 1;
                        while p.y + 1 < rows && surface.line(p.y).is_wrapped() {
                            p.y += 1;
                        }
                    }
                }
                p
            }
            Snap::Word => {
                let Some(mut prev) = surface.cell(p.x.min(cols - 1), p.y).copied() else {
                    return p;
                };
                let is_delim = |c: char| delimiters.contains(c);
                let mut prev_delim = is_delim(prev.display_char());
                loop {
                    let (nx, ny) = match dir {
                        Direction::Forward if p.x + 1 < cols => (p.x + 1, p.y),
                        Direction::Forward => {
                            if p.y + 1 >= rows || !surface.line(p.y).is_wrapped() {
                                break;
                            }
                            (0, p.y + 1)
                        }
                        Direction::Backward if p.x > 0 => (p.x - 1, p.y),
                        Direction::Backward => {
                            if p.y == 0 || !surface.line(p.y - 1).is_wrapped() {
                                break;
                            }
                            (cols - 1, p.y - 1)
                        }
                    };
                    if nx >= line_len(surface, ny) {
                        break;
                    }
                    let cell = *surface.line(ny).cell(nx);
                    let delim = is_delim(cell.display_char());
                    if !cell.is_wide_dummy()
                        && (delim != prev_delim
                            || (delim && cell.display_char() != prev.display_char()))
                    {
                        break;
                    }
                    p = Point::new(nx, ny);
                    prev = cell;
                    prev_delim = delim;
                }
                p
            }
        }
    }
}

fn line_len(surface: &Surface, y: usize) -> usize {
    surface.get_line(y).map_or(0, |line| line.content_len())
}
