//! Terminal screen - the main interface for terminal state
//!
//! The Screen ties together both surfaces, the output and navigation
//! cursors, the scroll region, tab stops, dirty tracking and the
//! selection. Every public mutator finishes with [`Screen::check_invariants`]
//! holding: each cursor sits inside its own viewport.

use crate::cell::{char_width, Cell, CellAttributes, CellFlags};
use crate::config::ScreenConfig;
use crate::cursor::{Cursor, CursorId, Offset, Position, SavedCursor};
use crate::error::{report, Error};
use crate::line::Line;
use crate::modes::Modes;
use crate::selection::{Point, Selection, SelectionType, Snap};
use crate::snapshot::Frame;
use crate::surface::{Surface, SurfaceKind};
use crate::Dimensions;

/// The complete terminal screen state
#[derive(Debug, Clone)]
pub struct Screen {
    config: ScreenConfig,
    /// Normal screen plus history, grows on demand
    primary: Surface,
    /// Fixed-height surface for full-screen applications
    alternate: Surface,
    active: SurfaceKind,
    width: usize,
    height: usize,
    output: Cursor,
    navigation: Cursor,
    /// Cursor whose viewport is on display
    display: CursorId,
    /// DECSC slots, one per surface
    saved: [SavedCursor; 2],
    /// Primary positions stashed while the alternate surface is active
    stashed: [Position; 2],
    modes: Modes,
    /// Scroll region, viewport-relative and inclusive
    top: usize,
    bottom: usize,
    tabs: Vec<bool>,
    dirty: Vec<bool>,
    selection: Selection,
    /// Display cursor position at the last finished frame
    previous_cursor: (usize, usize),
    /// Primary rows recycled at the row cap since creation
    evicted: u64,
}

impl Screen {
    /// Create a new screen with the specified dimensions
    pub fn new(dims: Dimensions) -> Self {
        Self::with_config(dims, ScreenConfig::default())
    }

    pub fn with_config(dims: Dimensions, config: ScreenConfig) -> Self {
        let cols = dims.cols.max(1);
        let rows = dims.rows.max(1);
        let mut screen = Self {
            primary: Surface::new(cols, rows),
            alternate: Surface::new(cols, rows),
            active: SurfaceKind::Primary,
            width: cols,
            height: rows,
            output: Cursor::new(),
            navigation: Cursor::new(),
            display: CursorId::Output,
            saved: Default::default(),
            stashed: Default::default(),
            modes: Modes::new(),
            top: 0,
            bottom: rows - 1,
            tabs: vec![false; cols],
            dirty: vec![true; rows],
            selection: Selection::new(),
            previous_cursor: (0, 0),
            evicted: 0,
            config,
        };
        screen.extend_tabs(0);
        screen
    }

    /// Get viewport dimensions
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Viewport width
    pub fn cols(&self) -> usize {
        self.width
    }

    /// Viewport height
    pub fn rows(&self) -> usize {
        self.height
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    /// The active surface
    pub fn surface(&self) -> &Surface {
        match self.active {
            SurfaceKind::Primary => &self.primary,
            SurfaceKind::Alternate => &self.alternate,
        }
    }

    fn surface_mut(&mut self) -> &mut Surface {
        match self.active {
            SurfaceKind::Primary => &mut self.primary,
            SurfaceKind::Alternate => &mut self.alternate,
        }
    }

    /// Rows of the active surface
    pub fn surface_rows(&self) -> usize {
        self.surface().rows()
    }

    pub fn active_surface(&self) -> SurfaceKind {
        self.active
    }

    pub fn is_alternate(&self) -> bool {
        self.active == SurfaceKind::Alternate
    }

    /// Cell at absolute coordinates of the active surface
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.surface().cell(x, y)
    }

    pub fn cursor(&self, id: CursorId) -> &Cursor {
        match id {
            CursorId::Output => &self.output,
            CursorId::Navigation => &self.navigation,
        }
    }

    fn cursor_mut(&mut self, id: CursorId) -> &mut Cursor {
        match id {
            CursorId::Output => &mut self.output,
            CursorId::Navigation => &mut self.navigation,
        }
    }

    /// Attributes applied to new output
    pub fn attrs(&self) -> CellAttributes {
        self.output.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut CellAttributes {
        &mut self.output.attrs
    }

    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    pub fn modes_mut(&mut self) -> &mut Modes {
        &mut self.modes
    }

    /// Scroll region bounds (top, bottom), viewport-relative and inclusive
    pub fn scroll_region(&self) -> (usize, usize) {
        (self.top, self.bottom)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn display_cursor(&self) -> CursorId {
        self.display
    }

    /// Total primary rows recycled at the row cap
    ///
    /// Absolute positions held outside the screen move up by the
    /// difference between two readings.
    pub fn evicted_rows(&self) -> u64 {
        self.evicted
    }

    /// Show the navigation viewport instead of the output viewport
    pub fn set_navigation_display(&mut self, enabled: bool) {
        self.display = if enabled {
            CursorId::Navigation
        } else {
            CursorId::Output
        };
        self.mark_all_dirty();
    }

    fn row_bounds(&self, origin: bool) -> (usize, usize) {
        if origin {
            (self.top, self.bottom)
        } else {
            (0, self.height - 1)
        }
    }

    // ---- Cursor movement ------------------------------------------------

    /// Move a cursor to absolute surface coordinates
    ///
    /// Without `adjust_viewport` the target is clamped into the cursor's
    /// current viewport. With it, the output cursor on the alternate
    /// surface scrolls the region by the overflow, and otherwise the
    /// viewport follows the cursor; the output cursor on the primary
    /// surface grows the surface to make room.
    pub fn move_cursor(&mut self, id: CursorId, x: isize, y: isize, adjust_viewport: bool) {
        if !adjust_viewport {
            self.move_within_viewport(id, x, y);
        } else if id == CursorId::Output && self.is_alternate() {
            self.move_scrolling(x, y);
        } else {
            self.move_following(id, x, y);
        }
        self.enforce_invariants();
    }

    /// Move the output cursor relative to the viewport (and to the scroll
    /// region in origin mode)
    pub fn move_to(&mut self, col: usize, row: usize) {
        let origin_top = if self.output.origin { self.top } else { 0 };
        let Offset { x, y } = self.output.offset;
        self.move_cursor(
            CursorId::Output,
            (x + col) as isize,
            (y + origin_top + row) as isize,
            false,
        );
    }

    /// Put a cursor back to a remembered position and viewport
    pub fn set_position(&mut self, id: CursorId, position: Position) {
        let cursor = self.cursor_mut(id);
        cursor.x = position.x;
        cursor.y = position.y;
        cursor.offset = position.offset;
        cursor.wrap_pending = false;
        if id == self.display {
            self.mark_all_dirty();
        }
        self.enforce_invariants();
    }

    /// Scroll a cursor's viewport by `delta` rows, dragging the cursor
    /// along only as far as needed to keep it visible
    pub fn scroll_viewport(&mut self, id: CursorId, delta: isize) {
        let max_offset = self.surface_rows().saturating_sub(self.height);
        let cursor = self.cursor_mut(id);
        let target = (cursor.offset.y as isize + delta).clamp(0, max_offset as isize);
        cursor.offset.y = target as usize;
        if id == self.display {
            self.mark_all_dirty();
        }
        self.enforce_invariants();
    }

    fn move_within_viewport(&mut self, id: CursorId, x: isize, y: isize) {
        let width = self.width;
        let (miny, maxy) = self.row_bounds(self.cursor(id).origin);
        let cursor = self.cursor_mut(id);
        let Offset {
            x: off_x,
            y: off_y,
        } = cursor.offset;
        cursor.x = clamp(x, off_x, off_x + width - 1);
        cursor.y = clamp(y, off_y + miny, off_y + maxy);
        cursor.wrap_pending = false;
    }

    fn move_scrolling(&mut self, x: isize, y: isize) {
        let (miny, maxy) = self.row_bounds(self.output.origin);
        let (top, bottom) = (self.top as isize, self.bottom as isize);
        let current = self.output.y as isize;
        let inside = (top..=bottom).contains(&current);
        let mut y = y;
        if inside && y > bottom {
            self.scroll_up(self.top, y - bottom);
            y = bottom;
        } else if inside && y < top {
            self.scroll_down(self.top, top - y);
            y = top;
        }
        self.output.x = clamp(x, 0, self.width - 1);
        self.output.y = clamp(y, miny, maxy);
        self.output.offset = Offset::default();
        self.output.wrap_pending = false;
    }

    fn move_following(&mut self, id: CursorId, x: isize, y: isize) {
        let (miny, maxy) = self.row_bounds(self.cursor(id).origin);
        let height = self.height;
        let mut y = y.max(0) as usize;

        if id == CursorId::Output && !self.is_alternate() {
            let needed = (y.saturating_sub(maxy) + height).max(y + 1);
            if needed > self.primary.rows() {
                y = self.grow_primary(needed, y);
            }
        }

        let rows = self.surface_rows();
        let max_offset = rows.saturating_sub(height);
        let x = clamp(x, 0, self.width - 1);
        let y = y.min(rows - 1);
        let display = self.display;
        let cursor = self.cursor_mut(id);
        let old_offset = cursor.offset;

        cursor.offset.x = 0;
        cursor.offset.y = cursor.offset.y.min(max_offset);
        if y < cursor.offset.y + miny {
            cursor.offset.y = y.saturating_sub(miny);
        } else if y > cursor.offset.y + maxy {
            cursor.offset.y = (y - maxy).min(max_offset);
        }
        cursor.x = x;
        cursor.y = y.clamp(cursor.offset.y + miny, cursor.offset.y + maxy);
        cursor.wrap_pending = false;

        if cursor.offset != old_offset && id == display {
            self.mark_all_dirty();
        }
    }

    /// Grow the primary surface to `needed` rows, recycling the oldest
    /// rows past the row cap. Returns `y` adjusted for evicted rows.
    fn grow_primary(&mut self, needed: usize, y: usize) -> usize {
        let cap = self.config.max_rows.max(self.height);
        let mut y = y;
        let mut needed = needed;
        if needed > cap {
            let excess = needed - cap;
            self.evict_history(excess);
            y = y.saturating_sub(excess);
            needed = cap;
        }
        if let Err(err) = self.primary.grow_to(needed, CellAttributes::default()) {
            report(&err);
            y = y.min(self.primary.rows() - 1);
        }
        y
    }

    fn evict_history(&mut self, n: usize) {
        let n = n.min(self.primary.rows());
        if n == 0 {
            return;
        }
        log::debug!("row limit reached, recycling {} history rows", n);
        self.primary.evict_front(n, CellAttributes::default());
        self.evicted += n as u64;
        for cursor in [&mut self.output, &mut self.navigation] {
            cursor.y = cursor.y.saturating_sub(n);
            cursor.offset.y = cursor.offset.y.saturating_sub(n);
        }
        let saved = &mut self.saved[surface_index(SurfaceKind::Primary)];
        saved.y = saved.y.saturating_sub(n);
        if self.selection.surface() == SurfaceKind::Primary {
            self.selection
                .shift_up(n, &self.primary, &self.config.word_delimiters);
        }
        self.mark_all_dirty();
    }

    // ---- Scrolling and erasing --------------------------------------------

    /// Scroll rows `origin..=bottom` of the region up by `n`
    ///
    /// `origin` is viewport-relative. Rows change places rather than being
    /// copied; the exposed rows at the bottom are blanked with the current
    /// attributes.
    pub fn scroll_up(&mut self, origin: usize, n: isize) {
        if n <= 0 || origin > self.bottom {
            return;
        }
        let n = (n as usize).min(self.bottom - origin + 1);
        let off = self.output.offset.y;
        let attrs = self.output.attrs;
        let bottom = self.bottom;
        self.surface_mut()
            .scroll_up(off + origin, off + bottom, n, attrs);
        self.mark_dirty(origin, bottom);
        self.scroll_selection(origin, -(n as isize));
        self.enforce_invariants();
    }

    /// Scroll rows `origin..=bottom` of the region down by `n`
    pub fn scroll_down(&mut self, origin: usize, n: isize) {
        if n <= 0 || origin > self.bottom {
            return;
        }
        let n = (n as usize).min(self.bottom - origin + 1);
        let off = self.output.offset.y;
        let attrs = self.output.attrs;
        let bottom = self.bottom;
        self.surface_mut()
            .scroll_down(off + origin, off + bottom, n, attrs);
        self.mark_dirty(origin, bottom);
        self.scroll_selection(origin, n as isize);
        self.enforce_invariants();
    }

    fn scroll_selection(&mut self, origin: usize, n: isize) {
        if !self.selection.is_active() || self.selection.surface() != self.active {
            return;
        }
        let off = self.output.offset.y;
        self.mark_selection_dirty();
        let surface = match self.active {
            SurfaceKind::Primary => &self.primary,
            SurfaceKind::Alternate => &self.alternate,
        };
        self.selection.scroll(
            off + origin,
            n,
            off + self.top,
            off + self.bottom,
            surface,
            &self.config.word_delimiters,
        );
        self.mark_selection_dirty();
    }

    /// Blank the rectangle `(x1, y1)..=(x2, y2)` in absolute coordinates
    pub fn clear_region(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) {
        if x1 > x2 || y1 > y2 {
            return;
        }
        let x2 = x2.min(self.width - 1);
        let y2 = y2.min(self.surface_rows() - 1);
        if x1 > x2 || y1 > y2 {
            return;
        }
        if self.selection.surface() == self.active && self.selection.intersects(x1, y1, x2, y2) {
            self.selection_clear();
        }
        let attrs = self.output.attrs;
        let surface = self.surface_mut();
        for y in y1..=y2 {
            surface.line_mut(y).clear_range(x1, x2, attrs);
        }
        self.mark_dirty_absolute(y1, y2);
    }

    /// Insert `n` blank cells at the output cursor, shifting the row right
    pub fn insert_blank(&mut self, n: usize) {
        let (x, y) = (self.output.x, self.output.y);
        let n = n.min(self.width - x);
        if n == 0 {
            return;
        }
        let attrs = self.output.attrs;
        self.surface_mut().line_mut(y).insert_cells(x, n, attrs);
        self.mark_dirty_absolute(y, y);
    }

    /// Delete `n` cells at the output cursor, shifting the row left
    pub fn delete_char(&mut self, n: usize) {
        let (x, y) = (self.output.x, self.output.y);
        let n = n.min(self.width - x);
        if n == 0 {
            return;
        }
        let attrs = self.output.attrs;
        self.surface_mut().line_mut(y).delete_cells(x, n, attrs);
        self.mark_dirty_absolute(y, y);
    }

    /// Insert `n` blank lines at the output cursor row
    ///
    /// The alternate surface scrolls the rest of the region down; the
    /// primary surface keeps its history and blanks rows instead.
    pub fn insert_blank_line(&mut self, n: usize) {
        let row = self.output.view_y();
        if n == 0 || row < self.top || row > self.bottom {
            return;
        }
        if self.is_alternate() {
            self.scroll_down(row, n as isize);
        } else {
            let y = self.output.y;
            let last = y + (n - 1).min(self.bottom - row);
            self.clear_region(0, y, self.width - 1, last);
        }
    }

    /// Delete `n` lines at the output cursor row
    pub fn delete_line(&mut self, n: usize) {
        let row = self.output.view_y();
        if n == 0 || row < self.top || row > self.bottom {
            return;
        }
        if self.is_alternate() {
            self.scroll_up(row, n as isize);
        } else {
            let off = self.output.offset.y;
            let first = (off + self.bottom + 1).saturating_sub(n).max(self.output.y);
            self.clear_region(0, first, self.width - 1, off + self.bottom);
        }
    }

    // ---- Output -----------------------------------------------------------

    /// Write a glyph at the output cursor and advance it
    pub fn put_char(&mut self, c: char) {
        let w = char_width(c);
        if w == 0 {
            return;
        }
        if w > self.width {
            log::trace!("dropping {:?}, wider than the viewport", c);
            return;
        }
        if self.output.wrap_pending && self.modes.contains(Modes::AUTO_WRAP) {
            self.wrap_line();
        }
        if self.output.x + w > self.width {
            if self.modes.contains(Modes::AUTO_WRAP) && w <= self.width {
                self.wrap_line();
            } else {
                self.output.x = self.width.saturating_sub(w);
            }
        }
        if self.modes.contains(Modes::INSERT) {
            self.insert_blank(w);
        }

        let (x, y) = (self.output.x, self.output.y);
        let attrs = self.output.attrs.style_only();
        let width = self.width;
        let line = self.surface_mut().line_mut(y);

        // Never leave half of a wide glyph behind
        if line.cell(x).is_wide_dummy() && x > 0 {
            line.cell_mut(x - 1).clear(attrs);
        }
        let covered_end = x + w - 1;
        if covered_end + 1 < width && line.cell(covered_end).is_wide() {
            line.cell_mut(covered_end + 1).clear(attrs);
        }

        *line.cell_mut(x) = Cell::with_char_and_attrs(c, attrs);
        if w == 2 {
            line.cell_mut(x).attrs.flags.insert(CellFlags::WIDE);
            let mut dummy = Cell::blank(attrs);
            dummy.attrs.flags.insert(CellFlags::WIDE_DUMMY);
            *line.cell_mut(x + 1) = dummy;
        }
        self.mark_dirty_absolute(y, y);

        if x + w < width {
            self.output.x = x + w;
        } else {
            self.output.wrap_pending = true;
        }
    }

    /// Put a string through [`Screen::put_char`], treating `\n` as CR LF
    pub fn put_str(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' => self.newline(true),
                '\r' => self.carriage_return(),
                '\t' => self.put_tab(1),
                c => self.put_char(c),
            }
        }
    }

    fn wrap_line(&mut self) {
        let y = self.output.y;
        self.surface_mut().line_mut(y).set_wrapped(true);
        self.newline(true);
    }

    /// Move the output cursor down one row, scrolling or growing as needed
    pub fn newline(&mut self, first_col: bool) {
        let x = if first_col || self.modes.contains(Modes::LINEFEED) {
            0
        } else {
            self.output.x
        };
        let y = self.output.y as isize + 1;
        self.move_cursor(CursorId::Output, x as isize, y, true);
    }

    /// Move the output cursor up one row, scrolling down at the region top
    pub fn reverse_index(&mut self) {
        let (x, y) = (self.output.x as isize, self.output.y as isize - 1);
        self.move_cursor(CursorId::Output, x, y, true);
    }

    pub fn carriage_return(&mut self) {
        let (off_x, y) = (self.output.offset.x, self.output.y);
        self.move_cursor(CursorId::Output, off_x as isize, y as isize, false);
    }

    pub fn backspace(&mut self) {
        let (x, y) = (self.output.x as isize - 1, self.output.y as isize);
        self.move_cursor(CursorId::Output, x, y, false);
    }

    /// Advance `n` tab stops (backwards when negative)
    pub fn put_tab(&mut self, n: isize) {
        let mut x = self.output.x;
        if n > 0 {
            for _ in 0..n {
                if x + 1 >= self.width {
                    break;
                }
                x += 1;
                while x + 1 < self.width && !self.tabs[x] {
                    x += 1;
                }
            }
        } else {
            for _ in n..0 {
                while x > 0 {
                    x -= 1;
                    if self.tabs[x] {
                        break;
                    }
                }
            }
        }
        let y = self.output.y as isize;
        self.move_cursor(CursorId::Output, x as isize, y, false);
    }

    /// Set a tab stop at the output cursor column
    pub fn set_tab_stop(&mut self) {
        let x = self.output.x;
        self.tabs[x] = true;
    }

    /// Clear the tab stop at the cursor, or every tab stop
    pub fn clear_tab_stop(&mut self, all: bool) {
        if all {
            self.tabs.fill(false);
        } else {
            let x = self.output.x;
            self.tabs[x] = false;
        }
    }

    /// Seed default tab stops for columns from `from` onwards, continuing
    /// the interval from the last existing stop
    fn extend_tabs(&mut self, from: usize) {
        let tab_width = self.config.tab_width.max(1);
        let last = self.tabs[..from.min(self.tabs.len())]
            .iter()
            .rposition(|&stop| stop);
        let mut x = match last {
            Some(stop) => stop + tab_width,
            None => tab_width,
        };
        while x < self.tabs.len() {
            if x >= from {
                self.tabs[x] = true;
            }
            x += tab_width;
        }
    }

    /// Save the output cursor (DECSC)
    pub fn save_cursor(&mut self) {
        self.saved[surface_index(self.active)] = SavedCursor::save(&self.output);
    }

    /// Restore the output cursor (DECRC), clamped to the current viewport
    pub fn restore_cursor(&mut self) {
        let saved = self.saved[surface_index(self.active)].clone();
        saved.restore_attrs(&mut self.output);
        self.move_cursor(CursorId::Output, saved.x as isize, saved.y as isize, false);
        self.output.wrap_pending = saved.wrap_pending;
    }

    /// Toggle origin mode (DECOM) and home the cursor
    pub fn set_origin_mode(&mut self, enabled: bool) {
        self.output.origin = enabled;
        self.move_to(0, 0);
    }

    /// Set the scroll region (0-indexed, inclusive) and home the cursor
    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let max = self.height - 1;
        let (top, bottom) = (top.min(max), bottom.min(max));
        let (top, bottom) = if top > bottom {
            (bottom, top)
        } else {
            (top, bottom)
        };
        self.top = top;
        self.bottom = bottom;
        self.move_to(0, 0);
    }

    /// Switch between the primary and the alternate surface
    ///
    /// Entering clears the alternate surface; leaving puts both cursors
    /// back where they were on the primary surface.
    pub fn set_alternate_screen(&mut self, enabled: bool) {
        if enabled == self.is_alternate() {
            return;
        }
        if enabled {
            self.stashed = [self.output.position(), self.navigation.position()];
            let attrs = self.output.attrs;
            self.alternate.clear(attrs);
            self.active = SurfaceKind::Alternate;
            for cursor in [&mut self.output, &mut self.navigation] {
                cursor.y = cursor.view_y();
                cursor.x = cursor.view_x();
                cursor.offset = Offset::default();
            }
        } else {
            self.active = SurfaceKind::Primary;
            let [output, navigation] = self.stashed;
            for (cursor, pos) in [(&mut self.output, output), (&mut self.navigation, navigation)] {
                cursor.x = pos.x;
                cursor.y = pos.y;
                cursor.offset = pos.offset;
            }
        }
        self.output.wrap_pending = false;
        self.selection.clear();
        self.mark_all_dirty();
        self.enforce_invariants();
    }

    // ---- Resize -------------------------------------------------------------

    /// Resize the viewport
    ///
    /// Rows are widened or narrowed in place. The alternate surface always
    /// matches the viewport height; the primary surface only grows. The
    /// scroll region resets to the full height.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        if cols == 0 || rows == 0 || (cols == self.width && rows == self.height) {
            return;
        }
        let mut rows = rows;
        if rows > self.config.max_rows {
            report(&Error::RowLimit {
                requested: rows,
                limit: self.config.max_rows,
            });
            rows = self.config.max_rows.max(1);
        }

        if cols != self.width {
            let attrs = CellAttributes::default();
            self.primary.resize_cols(cols, attrs);
            self.alternate.resize_cols(cols, attrs);
            let old = self.width;
            self.tabs.resize(cols, false);
            self.extend_tabs(old);
            self.width = cols;
        }

        if rows != self.height {
            let attrs = CellAttributes::default();
            if let Err(err) = self.primary.grow_to(rows, attrs) {
                report(&err);
                rows = rows.min(self.primary.rows());
            }
            if let Err(err) = self.alternate.set_rows(rows, attrs) {
                report(&err);
                rows = rows.min(self.alternate.rows());
            }
            self.height = rows;
            self.dirty.resize(rows, true);
        }

        self.top = 0;
        self.bottom = self.height - 1;

        let height = self.height;
        let max_offset = self.surface_rows().saturating_sub(height);
        for cursor in [&mut self.output, &mut self.navigation] {
            cursor.offset.y = cursor.offset.y.min(max_offset);
            if cursor.y >= cursor.offset.y + height {
                cursor.offset.y = (cursor.y + 1 - height).min(max_offset);
            }
        }
        if self.selection.is_active() {
            let surface = match self.selection.surface() {
                SurfaceKind::Primary => &self.primary,
                SurfaceKind::Alternate => &self.alternate,
            };
            self.selection
                .normalize(surface, &self.config.word_delimiters);
        }

        self.mark_all_dirty();
        self.enforce_invariants();
    }

    // ---- Selection ----------------------------------------------------------

    /// Anchor a new selection at absolute coordinates of the active surface
    pub fn selection_start(&mut self, x: usize, y: usize, snap: Snap) {
        self.mark_selection_dirty();
        let kind = self.active;
        let surface = match kind {
            SurfaceKind::Primary => &self.primary,
            SurfaceKind::Alternate => &self.alternate,
        };
        self.selection.start(
            Point::new(x, y),
            snap,
            kind,
            surface,
            &self.config.word_delimiters,
        );
        self.mark_selection_dirty();
    }

    /// Move the selection's extend point
    pub fn selection_extend(&mut self, x: usize, y: usize, ty: SelectionType, done: bool) {
        if self.selection.surface() != self.active {
            return;
        }
        self.mark_selection_dirty();
        let surface = match self.active {
            SurfaceKind::Primary => &self.primary,
            SurfaceKind::Alternate => &self.alternate,
        };
        self.selection.extend(
            Point::new(x, y),
            ty,
            done,
            surface,
            &self.config.word_delimiters,
        );
        self.mark_selection_dirty();
    }

    pub fn selection_clear(&mut self) {
        if !self.selection.is_active() {
            return;
        }
        self.mark_selection_dirty();
        self.selection.clear();
    }

    /// Replace the selection wholesale (used to roll back aborted commands)
    pub fn restore_selection(&mut self, selection: Selection) {
        self.mark_selection_dirty();
        self.selection = selection;
        self.mark_selection_dirty();
    }

    /// Whether the cell at absolute coordinates is selected
    pub fn selected(&self, x: usize, y: usize) -> bool {
        self.selection.surface() == self.active && self.selection.contains(x, y)
    }

    /// Text covered by the selection
    pub fn selection_text(&self) -> String {
        if self.selection.surface() != self.active {
            return String::new();
        }
        self.selection.text(self.surface())
    }

    fn mark_selection_dirty(&mut self) {
        if self.selection.surface() != self.active {
            return;
        }
        if let Some((begin, end)) = self.selection.bounds() {
            self.mark_dirty_absolute(begin.y, end.y);
        }
    }

    // ---- Dirty tracking and rendering -------------------------------------

    /// Mark viewport rows `start..=end` dirty
    pub fn mark_dirty(&mut self, start: usize, end: usize) {
        let end = end.min(self.height - 1);
        for row in start..=end {
            self.dirty[row] = true;
        }
    }

    /// Mark absolute rows dirty, restricted to the displayed viewport
    fn mark_dirty_absolute(&mut self, start: usize, end: usize) {
        let off = self.cursor(self.display).offset.y;
        let last_visible = off + self.height - 1;
        if end < off || start > last_visible {
            return;
        }
        self.mark_dirty(start.max(off) - off, end.min(last_visible) - off);
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    pub fn is_dirty(&self, row: usize) -> bool {
        self.dirty.get(row).copied().unwrap_or(false)
    }

    /// Viewport rows needing a repaint
    pub fn dirty_rows(&self) -> Vec<usize> {
        (0..self.height).filter(|&row| self.dirty[row]).collect()
    }

    /// Row `row` of the displayed viewport
    pub fn visible_line(&self, row: usize) -> Option<&Line> {
        if row >= self.height {
            return None;
        }
        let off = self.cursor(self.display).offset.y;
        self.surface().get_line(off + row)
    }

    /// Everything the renderer needs to repaint the dirty rows
    pub fn frame(&self) -> Frame<'_> {
        let rows = self
            .dirty_rows()
            .into_iter()
            .filter_map(|row| self.visible_line(row).map(|line| (row, line)))
            .collect();
        let cursor = self.cursor(self.display);
        Frame {
            rows,
            cursor: (cursor.view_x(), cursor.view_y()),
            previous_cursor: self.previous_cursor,
        }
    }

    /// Record that the last frame was painted
    pub fn finish_frame(&mut self) {
        self.dirty.fill(false);
        let cursor = self.cursor(self.display);
        self.previous_cursor = (cursor.view_x(), cursor.view_y());
    }

    // ---- Invariants ---------------------------------------------------------

    /// Whether both cursors sit inside their viewports
    pub fn check_invariants(&self) -> bool {
        let rows = self.surface_rows();
        [CursorId::Output, CursorId::Navigation].iter().all(|&id| {
            let cursor = self.cursor(id);
            let (miny, maxy) = self.row_bounds(cursor.origin);
            cursor.offset.y + self.height <= rows
                && cursor.x >= cursor.offset.x
                && cursor.x - cursor.offset.x < self.width
                && cursor.y >= cursor.offset.y + miny
                && cursor.y <= cursor.offset.y + maxy
        })
    }

    /// Clamp both cursors back into their viewports
    fn enforce_invariants(&mut self) {
        let rows = self.surface_rows();
        let (width, height) = (self.width, self.height);
        let max_offset = rows.saturating_sub(height);
        let region = (self.top, self.bottom);
        for cursor in [&mut self.output, &mut self.navigation] {
            let (miny, maxy) = if cursor.origin {
                region
            } else {
                (0, height - 1)
            };
            let before = cursor.position();
            cursor.offset.x = 0;
            cursor.offset.y = cursor.offset.y.min(max_offset);
            cursor.x = cursor.x.min(width - 1);
            cursor.y = cursor
                .y
                .clamp(cursor.offset.y + miny, cursor.offset.y + maxy);
            if cursor.position() != before {
                log::trace!("cursor clamped from {:?} to {:?}", before, cursor.position());
            }
        }
    }
}

fn surface_index(kind: SurfaceKind) -> usize {
    match kind {
        SurfaceKind::Primary => 0,
        SurfaceKind::Alternate => 1,
    }
}

/// Clamp a signed coordinate into `lo..=hi`
fn clamp(value: isize, lo: usize, hi: usize) -> usize {
    value.clamp(lo as isize, hi as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(cols: usize, rows: usize) -> Screen {
        Screen::new(Dimensions::new(cols, rows))
    }

    fn label_rows(screen: &mut Screen, count: usize) {
        for row in 0..count {
            screen.move_to(0, row);
            screen.put_char(char::from_digit(row as u32, 36).unwrap());
        }
    }

    fn visible_labels(screen: &Screen) -> String {
        (0..screen.rows())
            .map(|row| screen.visible_line(row).unwrap().cell(0).display_char())
            .collect()
    }

    #[test]
    fn test_screen_new() {
        let screen = screen(80, 24);
        assert_eq!(screen.cols(), 80);
        assert_eq!(screen.rows(), 24);
        assert_eq!(screen.surface_rows(), 24);
        assert_eq!(screen.scroll_region(), (0, 23));
        assert!(screen.check_invariants());
    }

    #[test]
    fn test_put_str() {
        let mut screen = screen(80, 24);
        screen.put_str("Hello\nWorld");
        assert_eq!(screen.surface().line(0).text(), "Hello");
        assert_eq!(screen.surface().line(1).text(), "World");
        assert_eq!(screen.cursor(CursorId::Output).x, 5);
    }

    #[test]
    fn test_autowrap_marks_row() {
        let mut screen = screen(5, 3);
        screen.put_str("abcdefg");
        assert_eq!(screen.surface().line(0).text(), "abcde");
        assert!(screen.surface().line(0).is_wrapped());
        assert_eq!(screen.surface().line(1).text(), "fg");
        assert!(!screen.surface().line(1).is_wrapped());
    }

    #[test]
    fn test_output_modes() {
        let mut screen = screen(5, 3);
        screen.modes_mut().remove(Modes::AUTO_WRAP);
        screen.put_str("abcdefg");
        assert_eq!(screen.surface().line(0).text(), "abcdg");
        assert!(!screen.surface().line(0).is_wrapped());

        screen.move_to(1, 0);
        screen.modes_mut().insert(Modes::INSERT);
        screen.put_char('X');
        assert_eq!(screen.surface().line(0).text(), "aXbcd");
    }

    #[test]
    fn test_wide_char_on_single_column() {
        let mut narrow = screen(1, 3);
        narrow.put_char('中');
        narrow.put_char('a');
        assert_eq!(narrow.surface().line(0).text(), "a");
        assert!(narrow.check_invariants());

        let mut resized = screen(4, 2);
        resized.resize(1, 2);
        resized.put_str("中\n文");
        assert!(resized.check_invariants());
    }

    #[test]
    fn test_wide_char() {
        let mut screen = screen(10, 2);
        screen.put_char('中');
        let line = screen.surface().line(0);
        assert!(line.cell(0).is_wide());
        assert!(line.cell(1).is_wide_dummy());
        assert_eq!(screen.cursor(CursorId::Output).x, 2);

        // Overwriting the padding half blanks the glyph
        screen.move_to(1, 0);
        screen.put_char('x');
        let line = screen.surface().line(0);
        assert!(line.cell(0).is_empty());
        assert!(!line.cell(0).is_wide());
        assert_eq!(line.cell(1).display_char(), 'x');
    }

    #[test]
    fn test_primary_grows_on_output() {
        let mut screen = screen(10, 3);
        for i in 0..5 {
            screen.put_str(&format!("line{}\n", i));
        }
        assert_eq!(screen.surface_rows(), 6);
        let output = screen.cursor(CursorId::Output);
        assert_eq!(output.y, 5);
        assert_eq!(output.offset.y, 3);
        assert_eq!(screen.visible_line(0).unwrap().text(), "line3");
        // History is still addressable
        assert_eq!(screen.surface().line(0).text(), "line0");
        assert!(screen.check_invariants());
    }

    #[test]
    fn test_row_cap_recycles_history() {
        let config = ScreenConfig {
            max_rows: 5,
            ..ScreenConfig::default()
        };
        let mut screen = Screen::with_config(Dimensions::new(10, 3), config);
        for i in 0..8 {
            screen.put_str(&format!("l{}\n", i));
        }
        assert_eq!(screen.surface_rows(), 5);
        assert_eq!(screen.surface().line(0).text(), "l4");
        assert_eq!(screen.surface().line(3).text(), "l7");
        assert_eq!(screen.cursor(CursorId::Output).y, 4);
        assert_eq!(screen.evicted_rows(), 4);
        assert!(screen.check_invariants());
    }

    #[test]
    fn test_alternate_scrolls_instead_of_growing() {
        let mut screen = screen(10, 3);
        screen.set_alternate_screen(true);
        screen.put_str("a\nb\nc\nd");
        assert_eq!(screen.surface_rows(), 3);
        assert_eq!(visible_labels(&screen), "bcd");
        screen.set_alternate_screen(false);
        assert!(screen.surface().line(0).is_empty());
        assert!(screen.check_invariants());
    }

    #[test]
    fn test_scroll_up_region() {
        let mut screen = screen(4, 5);
        label_rows(&mut screen, 5);
        screen.finish_frame();

        screen.scroll_up(0, 2);
        assert_eq!(visible_labels(&screen), "234  ");
        assert!(screen.is_dirty(3));
        assert!(screen.is_dirty(4));
    }

    #[test]
    fn test_scroll_up_adjusts_selection() {
        let mut screen = screen(4, 5);
        label_rows(&mut screen, 5);

        screen.selection_start(0, 0, Snap::Char);
        screen.selection_extend(0, 1, SelectionType::Regular, false);
        screen.scroll_up(0, 2);
        assert!(!screen.selection().is_active());

        screen.selection_start(0, 2, Snap::Char);
        screen.selection_extend(0, 4, SelectionType::Regular, false);
        screen.scroll_up(0, 2);
        let (begin, end) = screen.selection().bounds().unwrap();
        assert_eq!((begin.y, end.y), (0, 2));
    }

    #[test]
    fn test_scroll_down_region() {
        let mut screen = screen(4, 5);
        label_rows(&mut screen, 5);
        screen.set_scroll_region(1, 3);
        screen.scroll_down(1, 1);
        assert_eq!(visible_labels(&screen), "0 124");
    }

    #[test]
    fn test_scroll_ignores_non_positive() {
        let mut screen = screen(4, 3);
        label_rows(&mut screen, 3);
        screen.scroll_up(0, 0);
        screen.scroll_down(0, -3);
        assert_eq!(visible_labels(&screen), "012");
    }

    #[test]
    fn test_clear_region() {
        let mut screen = screen(5, 3);
        screen.put_str("abcde\nfghij\nklmno");
        screen.selection_start(1, 1, Snap::Char);
        screen.selection_extend(2, 1, SelectionType::Regular, false);

        // Inverted rectangles are ignored
        screen.clear_region(3, 0, 1, 0);
        assert_eq!(screen.surface().line(0).text(), "abcde");
        assert!(screen.selection().is_active());

        screen.clear_region(1, 0, 2, 1);
        assert_eq!(screen.surface().line(0).text(), "a  de");
        assert_eq!(screen.surface().line(1).text(), "f  ij");
        assert_eq!(screen.surface().line(2).text(), "klmno");
        assert!(!screen.selection().is_active());
    }

    #[test]
    fn test_insert_and_delete_chars() {
        let mut screen = screen(6, 2);
        screen.put_str("abcdef");
        screen.move_to(1, 0);
        screen.insert_blank(2);
        assert_eq!(screen.surface().line(0).text(), "a  bcd");
        screen.delete_char(3);
        assert_eq!(screen.surface().line(0).text(), "acd");
        // Bounded by the row
        screen.insert_blank(100);
        assert_eq!(screen.surface().line(0).text(), "a");
    }

    #[test]
    fn test_insert_delete_line_alternate() {
        let mut screen = screen(4, 4);
        screen.set_alternate_screen(true);
        label_rows(&mut screen, 4);
        screen.move_to(0, 1);
        screen.insert_blank_line(1);
        assert_eq!(visible_labels(&screen), "0 12");
        screen.delete_line(2);
        assert_eq!(visible_labels(&screen), "02  ");
    }

    #[test]
    fn test_insert_delete_line_primary_clears() {
        let mut screen = screen(4, 4);
        label_rows(&mut screen, 4);
        screen.move_to(0, 1);
        screen.insert_blank_line(2);
        assert_eq!(visible_labels(&screen), "0  3");

        let mut screen = self::screen(4, 4);
        label_rows(&mut screen, 4);
        screen.move_to(0, 1);
        screen.delete_line(1);
        assert_eq!(visible_labels(&screen), "012 ");
        assert_eq!(screen.surface_rows(), 4);
    }

    #[test]
    fn test_move_cursor_without_adjust_clamps_to_viewport() {
        let mut screen = screen(10, 5);
        screen.move_cursor(CursorId::Output, 50, 50, false);
        let output = screen.cursor(CursorId::Output);
        assert_eq!((output.x, output.y), (9, 4));
        assert_eq!(screen.surface_rows(), 5);
    }

    #[test]
    fn test_origin_mode_confines_rows() {
        let mut screen = screen(10, 10);
        screen.set_scroll_region(2, 5);
        screen.set_origin_mode(true);
        assert_eq!(screen.cursor(CursorId::Output).y, 2);
        screen.move_to(0, 20);
        assert_eq!(screen.cursor(CursorId::Output).y, 5);
        assert!(screen.check_invariants());
    }

    #[test]
    fn test_set_scroll_region_swaps_inverted() {
        let mut screen = screen(10, 10);
        screen.set_scroll_region(7, 3);
        assert_eq!(screen.scroll_region(), (3, 7));
        screen.set_scroll_region(0, 99);
        assert_eq!(screen.scroll_region(), (0, 9));
    }

    #[test]
    fn test_navigation_cursor_is_independent() {
        let mut screen = screen(10, 3);
        for i in 0..6 {
            screen.put_str(&format!("l{}\n", i));
        }
        let output = screen.cursor(CursorId::Output).position();
        screen.set_position(CursorId::Navigation, output);
        screen.set_navigation_display(true);

        screen.move_cursor(CursorId::Navigation, 0, 0, true);
        let nav = screen.cursor(CursorId::Navigation);
        assert_eq!((nav.y, nav.offset.y), (0, 0));
        assert_eq!(screen.visible_line(0).unwrap().text(), "l0");
        // Output viewport did not move
        assert_eq!(screen.cursor(CursorId::Output).position(), output);
        // Navigation never grows the surface
        screen.move_cursor(CursorId::Navigation, 0, 100, true);
        assert_eq!(screen.cursor(CursorId::Navigation).y, screen.surface_rows() - 1);
        assert_eq!(screen.surface_rows(), 7);
    }

    #[test]
    fn test_scroll_viewport() {
        let mut screen = screen(10, 3);
        for i in 0..6 {
            screen.put_str(&format!("l{}\n", i));
        }
        let output = screen.cursor(CursorId::Output).position();
        screen.set_position(CursorId::Navigation, output);
        screen.scroll_viewport(CursorId::Navigation, -2);
        let nav = screen.cursor(CursorId::Navigation);
        assert_eq!(nav.offset.y, 2);
        // Cursor dragged up to stay visible
        assert_eq!(nav.y, 4);
        screen.scroll_viewport(CursorId::Navigation, -100);
        assert_eq!(screen.cursor(CursorId::Navigation).offset.y, 0);
    }

    #[test]
    fn test_resize() {
        let mut screen = screen(10, 5);
        screen.put_str("hello");
        screen.set_scroll_region(1, 2);
        screen.resize(20, 8);
        assert_eq!(screen.dimensions(), Dimensions::new(20, 8));
        assert_eq!(screen.scroll_region(), (0, 7));
        assert_eq!(screen.surface().line(0).text(), "hello");
        assert_eq!(screen.surface().line(0).cols(), 20);
        assert!(screen.check_invariants());

        // Shrinking keeps the primary history
        screen.resize(4, 2);
        assert_eq!(screen.surface_rows(), 8);
        assert_eq!(screen.surface().line(0).text(), "hell");
        assert!(screen.check_invariants());
    }

    #[test]
    fn test_resize_noop() {
        let mut screen = screen(10, 5);
        screen.finish_frame();
        screen.resize(10, 5);
        screen.resize(0, 5);
        assert!(screen.dirty_rows().is_empty());
    }

    #[test]
    fn test_resize_pulls_back_navigation_viewport() {
        let mut screen = screen(10, 3);
        for i in 0..6 {
            screen.put_str(&format!("l{}\n", i));
        }
        let output = screen.cursor(CursorId::Output).position();
        screen.set_position(CursorId::Navigation, output);
        screen.resize(10, 6);
        let nav = screen.cursor(CursorId::Navigation);
        assert!(nav.offset.y + 6 <= screen.surface_rows());
        assert!(screen.check_invariants());
    }

    #[test]
    fn test_tabs() {
        let mut screen = screen(20, 2);
        screen.put_tab(1);
        assert_eq!(screen.cursor(CursorId::Output).x, 8);
        screen.put_tab(1);
        assert_eq!(screen.cursor(CursorId::Output).x, 16);
        screen.put_tab(1);
        assert_eq!(screen.cursor(CursorId::Output).x, 19);
        screen.put_tab(-1);
        assert_eq!(screen.cursor(CursorId::Output).x, 16);

        screen.resize(40, 2);
        screen.put_tab(1);
        assert_eq!(screen.cursor(CursorId::Output).x, 24);

        screen.clear_tab_stop(true);
        screen.move_to(0, 0);
        screen.put_tab(1);
        assert_eq!(screen.cursor(CursorId::Output).x, 39);
    }

    #[test]
    fn test_save_restore_cursor() {
        let mut screen = screen(10, 5);
        screen.move_to(3, 2);
        screen.attrs_mut().flags.insert(CellFlags::BOLD);
        screen.save_cursor();
        screen.move_to(0, 0);
        screen.attrs_mut().reset();
        screen.restore_cursor();
        let output = screen.cursor(CursorId::Output);
        assert_eq!((output.x, output.y), (3, 2));
        assert!(output.attrs.flags.contains(CellFlags::BOLD));
    }

    #[test]
    fn test_frame_and_previous_cursor() {
        let mut screen = screen(10, 3);
        screen.put_str("ab");
        let frame = screen.frame();
        assert_eq!(frame.rows.len(), 3);
        assert_eq!(frame.cursor, (2, 0));
        screen.finish_frame();
        assert!(screen.frame().rows.is_empty());

        screen.put_char('c');
        let frame = screen.frame();
        assert_eq!(frame.rows.len(), 1);
        assert_eq!(frame.rows[0].0, 0);
        assert_eq!(frame.previous_cursor, (2, 0));
        assert_eq!(frame.cursor, (3, 0));
    }

    #[test]
    fn test_selection_cleared_on_surface_swap() {
        let mut screen = screen(10, 3);
        screen.put_str("abc");
        screen.selection_start(0, 0, Snap::Char);
        screen.selection_extend(2, 0, SelectionType::Regular, false);
        assert_eq!(screen.selection_text(), "abc");
        screen.set_alternate_screen(true);
        assert!(!screen.selection().is_active());
        assert_eq!(screen.selection_text(), "");
    }
}
