//! Cursor motions over a surface
//!
//! Motions treat the surface as one run of cells in reading order, so
//! they cross row boundaries freely. All positions are absolute.

use navi_core::{Point, Surface};

use crate::state::SearchDirection;

/// Which end of a word a word motion lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordMotion {
    /// `w`: start of the next word
    Next,
    /// `e`: end of the current or next word
    End,
    /// `b`: start of the current or previous word
    Back,
}

impl WordMotion {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'w' | 'W' => Some(WordMotion::Next),
            'e' | 'E' => Some(WordMotion::End),
            'b' | 'B' => Some(WordMotion::Back),
            _ => None,
        }
    }
}

pub fn to_index(point: Point, cols: usize) -> usize {
    point.y * cols + point.x
}

pub fn from_index(index: usize, cols: usize) -> Point {
    Point::new(index % cols, index / cols)
}

fn cell_count(surface: &Surface) -> usize {
    surface.rows() * surface.cols()
}

/// One cell forward or back, wrapping across rows
pub fn step(surface: &Surface, point: Point, forward: bool) -> Option<Point> {
    let index = to_index(point, surface.cols());
    let next = if forward {
        index.checked_add(1).filter(|&i| i < cell_count(surface))?
    } else {
        index.checked_sub(1)?
    };
    Some(from_index(next, surface.cols()))
}

/// Move `delta` cells, stopping at either end of the surface
pub fn move_cells(surface: &Surface, point: Point, delta: isize) -> Point {
    let last = cell_count(surface).saturating_sub(1) as isize;
    let index = to_index(point, surface.cols()) as isize;
    let target = index.saturating_add(delta).clamp(0, last);
    from_index(target as usize, surface.cols())
}

fn char_at(surface: &Surface, point: Point) -> Option<char> {
    surface.cell(point.x, point.y).map(|cell| cell.display_char())
}

fn is_delimiter(surface: &Surface, point: Point, delimiters: &str) -> bool {
    match surface.cell(point.x, point.y) {
        Some(cell) if cell.is_wide_dummy() => false,
        Some(cell) => delimiters.contains(cell.display_char()),
        None => true,
    }
}

/// Word motion repeated `count` times
///
/// First skips cells of the class the cursor starts on, then stops where
/// the class changes. `e` and `b` step once before scanning and step back
/// once after, so they do not stick to the word they already sit on. The
/// scan never runs longer than one pass over the surface.
pub fn word_motion(
    surface: &Surface,
    start: Point,
    motion: WordMotion,
    delimiters: &str,
    count: u32,
) -> Point {
    let forward = motion != WordMotion::Back;
    let separator_first = motion != WordMotion::Next;
    let limit = cell_count(surface);
    let mut pos = start;

    for _ in 0..count {
        if separator_first {
            match step(surface, pos, forward) {
                Some(next) => pos = next,
                None => break,
            }
        }
        let mut seen_other = false;
        for _ in 0..limit {
            if separator_first == is_delimiter(surface, pos, delimiters) {
                if seen_other {
                    if separator_first {
                        pos = step(surface, pos, !forward).unwrap_or(pos);
                    }
                    break;
                }
            } else {
                seen_other = true;
            }
            match step(surface, pos, forward) {
                Some(next) => pos = next,
                None => break,
            }
        }
    }
    pos
}

/// Index of the last cell of a match of `pattern` starting at `index`
///
/// Padding cells behind wide glyphs are skipped so a pattern matches the
/// text as typed.
fn match_at(surface: &Surface, pattern: &[char], index: usize) -> Option<usize> {
    let cols = surface.cols();
    let total = cell_count(surface);
    let mut i = index;
    let mut last = index;
    for &wanted in pattern {
        loop {
            if i >= total {
                return None;
            }
            let point = from_index(i, cols);
            match surface.cell(point.x, point.y) {
                Some(cell) if cell.is_wide_dummy() => i += 1,
                Some(_) => break,
                None => return None,
            }
        }
        if char_at(surface, from_index(i, cols)) != Some(wanted) {
            return None;
        }
        last = i;
        i += 1;
    }
    Some(last)
}

fn starts_match(surface: &Surface, pattern: &[char], index: usize) -> bool {
    let point = from_index(index, surface.cols());
    let on_padding = surface
        .cell(point.x, point.y)
        .map_or(true, |cell| cell.is_wide_dummy());
    !on_padding && match_at(surface, pattern, index).is_some()
}

/// Start of the nearest match strictly after (forward) or strictly
/// before (backward) `from`
pub fn find(
    surface: &Surface,
    pattern: &[char],
    from: Point,
    direction: SearchDirection,
) -> Option<Point> {
    if pattern.is_empty() {
        return None;
    }
    let cols = surface.cols();
    let start = to_index(from, cols);
    let found = match direction {
        SearchDirection::None => None,
        SearchDirection::Forward => {
            (start + 1..cell_count(surface)).find(|&i| starts_match(surface, pattern, i))
        }
        SearchDirection::Backward => (0..start.min(cell_count(surface)))
            .rev()
            .find(|&i| starts_match(surface, pattern, i)),
    };
    found.map(|i| from_index(i, cols))
}

/// Non-overlapping matches lying entirely within rows `top..bottom`
pub fn find_all(surface: &Surface, pattern: &[char], top: usize, bottom: usize) -> Vec<(Point, Point)> {
    let mut matches = Vec::new();
    if pattern.is_empty() {
        return matches;
    }
    let cols = surface.cols();
    let end = bottom.min(surface.rows()) * cols;
    let mut i = top * cols;
    while i < end {
        match match_at(surface, pattern, i) {
            Some(last) if last < end && starts_match(surface, pattern, i) => {
                matches.push((from_index(i, cols), from_index(last, cols)));
                i = last + 1;
            }
            _ => i += 1,
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use navi_core::{Dimensions, Screen};

    const DELIMS: &str = " \t`'\"()[]{}<>|,;:.";

    fn screen_with(cols: usize, rows: usize, text: &str) -> Screen {
        let mut screen = Screen::new(Dimensions::new(cols, rows));
        screen.put_str(text);
        screen
    }

    #[test]
    fn test_step_and_move_cells() {
        let screen = screen_with(5, 2, "");
        let surface = screen.surface();
        assert_eq!(step(surface, Point::new(4, 0), true), Some(Point::new(0, 1)));
        assert_eq!(step(surface, Point::new(0, 1), false), Some(Point::new(4, 0)));
        assert_eq!(step(surface, Point::new(0, 0), false), None);
        assert_eq!(step(surface, Point::new(4, 1), true), None);
        assert_eq!(move_cells(surface, Point::new(3, 0), 4), Point::new(2, 1));
        assert_eq!(move_cells(surface, Point::new(3, 0), -10), Point::new(0, 0));
        assert_eq!(move_cells(surface, Point::new(3, 0), 100), Point::new(4, 1));
    }

    #[test]
    fn test_word_motions() {
        let screen = screen_with(20, 2, "foo bar baz");
        let surface = screen.surface();
        let w = word_motion(surface, Point::new(0, 0), WordMotion::Next, DELIMS, 1);
        assert_eq!(w, Point::new(4, 0));
        let e = word_motion(surface, Point::new(4, 0), WordMotion::End, DELIMS, 1);
        assert_eq!(e, Point::new(6, 0));
        let e = word_motion(surface, Point::new(0, 0), WordMotion::End, DELIMS, 1);
        assert_eq!(e, Point::new(2, 0));
        let b = word_motion(surface, Point::new(9, 0), WordMotion::Back, DELIMS, 1);
        assert_eq!(b, Point::new(8, 0));
        let b = word_motion(surface, Point::new(8, 0), WordMotion::Back, DELIMS, 2);
        assert_eq!(b, Point::new(0, 0));
        let w = word_motion(surface, Point::new(0, 0), WordMotion::Next, DELIMS, 2);
        assert_eq!(w, Point::new(8, 0));
    }

    #[test]
    fn test_word_motion_crosses_rows() {
        let screen = screen_with(10, 3, "alpha\nbeta");
        let surface = screen.surface();
        let w = word_motion(surface, Point::new(1, 0), WordMotion::Next, DELIMS, 1);
        assert_eq!(w, Point::new(0, 1));
        let b = word_motion(surface, Point::new(0, 1), WordMotion::Back, DELIMS, 1);
        assert_eq!(b, Point::new(0, 0));
    }

    #[test]
    fn test_small_and_large_words() {
        let screen = screen_with(20, 1, "a.b c");
        let surface = screen.surface();
        let w = word_motion(surface, Point::new(0, 0), WordMotion::Next, DELIMS, 1);
        assert_eq!(w, Point::new(2, 0));
        let big = word_motion(surface, Point::new(0, 0), WordMotion::Next, " \t", 1);
        assert_eq!(big, Point::new(4, 0));
    }

    #[test]
    fn test_word_motion_on_blank_surface_terminates() {
        let screen = screen_with(8, 4, "");
        let surface = screen.surface();
        let w = word_motion(surface, Point::new(0, 0), WordMotion::Next, DELIMS, 3);
        assert_eq!(w, Point::new(7, 3));
        let b = word_motion(surface, Point::new(7, 3), WordMotion::Back, DELIMS, 3);
        assert_eq!(b, Point::new(0, 0));
    }

    #[test]
    fn test_find_forward_and_backward() {
        let screen = screen_with(20, 2, "ab ab ab");
        let surface = screen.surface();
        let pattern: Vec<char> = "ab".chars().collect();
        let next = find(surface, &pattern, Point::new(0, 0), SearchDirection::Forward);
        assert_eq!(next, Some(Point::new(3, 0)));
        let prev = find(surface, &pattern, Point::new(3, 0), SearchDirection::Backward);
        assert_eq!(prev, Some(Point::new(0, 0)));
        let none = find(surface, &pattern, Point::new(6, 0), SearchDirection::Forward);
        assert_eq!(none, None);
        assert_eq!(find(surface, &[], Point::new(0, 0), SearchDirection::Forward), None);
    }

    #[test]
    fn test_find_across_soft_wrap() {
        let screen = screen_with(4, 3, "xxhello");
        let surface = screen.surface();
        let pattern: Vec<char> = "hello".chars().collect();
        let found = find(surface, &pattern, Point::new(0, 0), SearchDirection::Forward);
        assert_eq!(found, Some(Point::new(2, 0)));
    }

    #[test]
    fn test_find_skips_wide_padding() {
        let screen = screen_with(10, 1, "a中文b");
        let surface = screen.surface();
        let pattern: Vec<char> = "中文".chars().collect();
        let found = find(surface, &pattern, Point::new(0, 0), SearchDirection::Forward);
        assert_eq!(found, Some(Point::new(1, 0)));
    }

    #[test]
    fn test_find_all_in_rows() {
        let screen = screen_with(10, 3, "aa aa\naaa");
        let surface = screen.surface();
        let pattern: Vec<char> = "aa".chars().collect();
        let matches = find_all(surface, &pattern, 0, 2);
        assert_eq!(
            matches,
            vec![
                (Point::new(0, 0), Point::new(1, 0)),
                (Point::new(3, 0), Point::new(4, 0)),
                (Point::new(0, 1), Point::new(1, 1)),
            ]
        );
        assert!(find_all(surface, &pattern, 2, 3).is_empty());
    }
}
