//! Render frames and serializable state snapshots
//!
//! [`Frame`] borrows the rows a renderer has to repaint. [`Snapshot`] is an
//! owned, JSON-serializable picture of the displayed viewport used by
//! scenario tests and debugging.

use serde::{Deserialize, Serialize};

use crate::cell::{CellAttributes, CellFlags};
use crate::color::Color;
use crate::cursor::{CursorId, Position};
use crate::line::Line;
use crate::screen::Screen;
use crate::selection::Point;

/// Dirty rows of the displayed viewport plus cursor movement
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    /// (viewport row, line) pairs to repaint
    pub rows: Vec<(usize, &'a Line)>,
    /// Display cursor, viewport-relative
    pub cursor: (usize, usize),
    /// Display cursor as of the previous frame, to erase its old image
    pub previous_cursor: (usize, usize),
}

impl Frame<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.cursor == self.previous_cursor
    }
}

/// A complete snapshot of the displayed viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub dimensions: SnapshotDimensions,
    pub alternate_screen: bool,
    pub output: Position,
    pub navigation: Position,
    /// Which cursor's viewport `screen` shows
    pub display: CursorId,
    pub scroll_region: (usize, usize),
    pub screen: Vec<SnapshotLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<(Point, Point)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDimensions {
    pub cols: usize,
    pub rows: usize,
    /// Rows allocated on the active surface
    pub surface_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub wrapped: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<SnapshotAttrSpan>,
}

/// A run of cells sharing non-default style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAttrSpan {
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
    pub flags: CellFlags,
}

impl Snapshot {
    /// Capture the displayed viewport of a screen
    pub fn from_screen(screen: &Screen) -> Self {
        let screen_lines = (0..screen.rows())
            .filter_map(|row| screen.visible_line(row))
            .map(|line| SnapshotLine {
                text: line.text(),
                wrapped: line.is_wrapped(),
                attrs: extract_attr_spans(line),
            })
            .collect();

        Self {
            dimensions: SnapshotDimensions {
                cols: screen.cols(),
                rows: screen.rows(),
                surface_rows: screen.surface_rows(),
            },
            alternate_screen: screen.is_alternate(),
            output: screen.cursor(CursorId::Output).position(),
            navigation: screen.cursor(CursorId::Navigation).position(),
            display: screen.display_cursor(),
            scroll_region: screen.scroll_region(),
            screen: screen_lines,
            selection: screen.selection().bounds(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Displayed rows joined with newlines
    pub fn screen_text(&self) -> String {
        self.screen
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn extract_attr_spans(line: &Line) -> Vec<SnapshotAttrSpan> {
    let mut spans: Vec<SnapshotAttrSpan> = Vec::new();
    let mut current: Option<(usize, CellAttributes)> = None;

    let mut close = |start: usize, end: usize, attrs: CellAttributes| {
        spans.push(SnapshotAttrSpan {
            start,
            end,
            fg: Color::label(attrs.fg),
            bg: Color::label(attrs.bg),
            flags: attrs.flags,
        });
    };

    for (i, cell) in line.iter().enumerate() {
        if cell.is_wide_dummy() {
            continue;
        }
        let attrs = cell.attrs.style_only();
        match current {
            Some((_, open)) if open == attrs => continue,
            Some((start, open)) => {
                close(start, i, open);
                current = None;
            }
            None => {}
        }
        if attrs != CellAttributes::default() {
            current = Some((i, attrs));
        }
    }
    if let Some((start, open)) = current {
        close(start, line.cols(), open);
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dimensions;

    #[test]
    fn test_snapshot_json_roundtrip() {
        let mut screen = Screen::new(Dimensions::new(10, 3));
        screen.put_str("Hello\nWorld");
        let snapshot = Snapshot::from_screen(&screen);
        assert_eq!(snapshot.screen_text(), "Hello\nWorld\n");
        assert_eq!(snapshot.output.x, 5);
        assert_eq!(snapshot.output.y, 1);

        let json = snapshot.to_json().unwrap();
        let restored = Snapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_attr_spans() {
        let mut screen = Screen::new(Dimensions::new(10, 2));
        screen.put_str("ab");
        screen.attrs_mut().flags.insert(CellFlags::BOLD);
        screen.attrs_mut().fg = Color::Indexed(1);
        screen.put_str("cd");
        screen.attrs_mut().reset();
        screen.put_str("e");

        let snapshot = Snapshot::from_screen(&screen);
        let spans = &snapshot.screen[0].attrs;
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (2, 4));
        assert_eq!(spans[0].fg.as_deref(), Some("idx:1"));
        assert!(spans[0].flags.contains(CellFlags::BOLD));
    }

    #[test]
    fn test_snapshot_follows_display_cursor() {
        let mut screen = Screen::new(Dimensions::new(10, 2));
        screen.put_str("one\ntwo\nthree");
        screen.set_position(
            CursorId::Navigation,
            Position {
                x: 0,
                y: 0,
                offset: Default::default(),
            },
        );
        screen.set_navigation_display(true);
        let snapshot = Snapshot::from_screen(&screen);
        assert_eq!(snapshot.screen_text(), "one\ntwo");
        assert_eq!(snapshot.display, CursorId::Navigation);
    }
}
