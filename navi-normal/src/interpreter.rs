//! Modal command interpreter
//!
//! Consumes one keystroke at a time and drives the navigation cursor and
//! the selection of a [`Screen`]. Composite commands (text objects,
//! `.` and shortcuts) are expanded into keystroke sequences and replayed
//! through [`NormalMode::handle_key`]'s own dispatch. A replay that fails
//! part way rolls the interpreter and the cursor back to where it started.

use navi_core::{error, CursorId, GrowableBuffer, Point, Position, Screen, Selection, SelectionType, Snap};

use crate::config::NormalModeConfig;
use crate::highlight::Highlights;
use crate::history::CommandHistory;
use crate::key::{keys, Key, KeyCode, Modifiers};
use crate::motion::{self, from_index, to_index, WordMotion};
use crate::state::{ExitState, Infix, NormalModeState, Operator, SearchDirection};
use crate::text_object::expand_text_object;

/// Nesting limit for replays started from within replays
const MAX_REPLAY_DEPTH: usize = 8;

/// Receives yanked text
pub trait Clipboard {
    fn copy(&mut self, text: &str);
}

/// Collects every yank, latest last
impl Clipboard for Vec<String> {
    fn copy(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

/// Where a keystroke comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Typed by the user; recorded into the command echo
    Live,
    /// Replayed by `.` or a shortcut; not recorded
    Command,
    /// Replayed as part of a text object; a pending yank waits for the
    /// whole sequence instead of committing on the first motion
    TextObject,
}

/// How a motion bounds a yank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    /// Up to but not including the target cell
    Exclusive,
    /// Including the target cell
    Inclusive,
    /// Target not known yet (search opened)
    Pending,
    /// Not a movement
    Stay,
}

/// Everything a failed replay restores
struct Checkpoint {
    state: NormalModeState,
    position: Position,
    selection: Selection,
    search: GrowableBuffer<char>,
    highlights: Highlights,
    selection_type: SelectionType,
}

/// The navigation-mode interpreter of one terminal session
#[derive(Debug, Clone)]
pub struct NormalMode {
    config: NormalModeConfig,
    state: NormalModeState,
    history: CommandHistory,
    search: GrowableBuffer<char>,
    highlights: Highlights,
    /// Shape of the visual selection, toggled by `t`
    selection_type: SelectionType,
    depth: usize,
    /// `Screen::evicted_rows` as of the last key
    evicted: u64,
}

impl Default for NormalMode {
    fn default() -> Self {
        Self::new(NormalModeConfig::default())
    }
}

impl NormalMode {
    pub fn new(config: NormalModeConfig) -> Self {
        Self {
            config,
            state: NormalModeState::default(),
            history: CommandHistory::new(),
            search: GrowableBuffer::new(),
            highlights: Highlights::new(),
            selection_type: SelectionType::Regular,
            depth: 0,
            evicted: 0,
        }
    }

    pub fn config(&self) -> &NormalModeConfig {
        &self.config
    }

    pub fn state(&self) -> &NormalModeState {
        &self.state
    }

    /// Open a navigation session at the output cursor
    pub fn on_navigation_start(&mut self, screen: &mut Screen) {
        let position = screen.cursor(CursorId::Output).position();
        self.state = NormalModeState::new(position);
        self.selection_type = SelectionType::Regular;
        self.highlights.clear();
        self.evicted = screen.evicted_rows();
        screen.set_position(CursorId::Navigation, position);
        screen.selection_clear();
        screen.set_navigation_display(true);
        log::debug!("navigation started at ({}, {})", position.x, position.y);
    }

    /// Handle one keystroke
    pub fn handle_key(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        key: Key,
    ) -> ExitState {
        self.follow_screen(screen);
        self.process(screen, clipboard, key, Replay::Live)
    }

    /// Catch up with output that arrived since the last key
    ///
    /// Recycled history rows move every stored position up, and a width
    /// change invalidates the match spans.
    fn follow_screen(&mut self, screen: &mut Screen) {
        let evicted = screen.evicted_rows();
        let n = evicted.saturating_sub(self.evicted) as usize;
        self.evicted = evicted;
        if n > 0 {
            log::debug!("following {} recycled rows", n);
            let state = &mut self.state;
            for position in [
                &mut state.initial_position,
                &mut state.command.start,
                &mut state.motion.search_start,
            ] {
                position.y = position.y.saturating_sub(n);
                position.offset.y = position.offset.y.saturating_sub(n);
            }
        }
        let stale = n > 0 || self.highlights.cols() != screen.cols();
        if stale && !self.highlights.is_empty() {
            self.refresh_highlights(screen);
        }
    }

    /// Handle a keystroke given as raw UTF-8 bytes
    pub fn handle_bytes(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        bytes: &[u8],
    ) -> ExitState {
        match Key::from_bytes(bytes) {
            Some(key) => self.handle_key(screen, clipboard, key),
            None => ExitState::Failed,
        }
    }

    /// Whether the cell at absolute `(x, y)` is part of a search match
    pub fn highlighted(&self, x: usize, y: usize) -> bool {
        self.highlights.highlighted(x, y)
    }

    pub fn highlights(&self) -> &Highlights {
        &self.highlights
    }

    /// The command being typed, or the last completed one
    pub fn command_echo(&self) -> String {
        self.history.echo()
    }

    /// The last completed command, as replayed by `.`
    pub fn last_command(&self) -> String {
        self.history.last().iter().collect()
    }

    /// The search pattern with its direction prefix, empty without search
    pub fn search_echo(&self) -> String {
        let prefix = match self.state.motion.search {
            SearchDirection::None => return String::new(),
            SearchDirection::Forward => '/',
            SearchDirection::Backward => '?',
        };
        std::iter::once(prefix)
            .chain(self.search.iter().copied())
            .collect()
    }

    fn process(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        key: Key,
        mode: Replay,
    ) -> ExitState {
        let idle = self.state.is_motion_finished() && self.state.is_operator_finished();
        match key.code {
            KeyCode::Escape => return self.terminate(screen, clipboard, true, mode),
            KeyCode::Enter => return self.terminate(screen, clipboard, false, mode),
            KeyCode::Char('i') if idle && !key.is_chord() => {
                return self.terminate(screen, clipboard, true, mode)
            }
            _ => {}
        }

        if self.state.is_searching() {
            return self.search_key(screen, key, mode);
        }
        if key.modifiers.contains(Modifiers::CTRL) {
            return self.scroll_chord(screen, key);
        }
        let Some(c) = key.printable() else {
            return ExitState::Failed;
        };

        if let Some(digit) = c.to_digit(10) {
            if digit != 0 || self.state.motion.count > 0 {
                let count = self.state.motion.count.saturating_mul(10).saturating_add(digit);
                self.state.motion.count = count.min(self.config.max_count);
                return ExitState::Success;
            }
        }

        if self.state.command.infix != Infix::None {
            return self.text_object(screen, clipboard, c, mode);
        }

        match c {
            'i' | 'a' => {
                self.state.command.infix = if c == 'i' {
                    Infix::Inner
                } else {
                    Infix::Around
                };
                self.record(c, mode);
                return ExitState::Success;
            }
            'y' => return self.yank_key(screen, clipboard, mode),
            'v' | 'V' => return self.visual_key(screen, c, mode),
            '.' => return self.repeat_last(screen, clipboard, mode),
            _ => {}
        }

        match self.motion(screen, c) {
            Some((reach, true)) => self.after_motion(screen, clipboard, c, reach, mode),
            Some((_, false)) => {
                self.state.motion.count = 0;
                ExitState::Failed
            }
            None => self.shortcut(screen, clipboard, c),
        }
    }

    fn record(&mut self, c: char, mode: Replay) {
        if mode == Replay::Live {
            self.history.record(c);
        }
    }

    fn nav_point(screen: &Screen) -> Point {
        let cursor = screen.cursor(CursorId::Navigation);
        Point::new(cursor.x, cursor.y)
    }

    // ---- Ending commands ----------------------------------------------------

    /// Escape, Enter, or a bare `i`
    ///
    /// A pending search is closed first; otherwise the operator is closed,
    /// and with no operator pending the whole session ends.
    fn terminate(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        abort: bool,
        mode: Replay,
    ) -> ExitState {
        if !self.state.is_motion_finished() {
            self.state.motion.finished = true;
            if abort {
                screen.set_position(CursorId::Navigation, self.state.motion.search_start);
                if mode == Replay::Live {
                    self.history.truncate(self.state.motion.echo_mark);
                }
                self.highlights.clear();
                screen.mark_all_dirty();
                self.extend_selection(screen);
            } else {
                self.record('\n', mode);
                match self.state.command.operator {
                    Operator::Yank if mode != Replay::TextObject => {
                        self.commit_motion_yank(screen, clipboard, Reach::Exclusive, mode);
                    }
                    Operator::None if mode == Replay::Live => self.history.discard(),
                    _ => {}
                }
            }
            return ExitState::Success;
        }

        let exit_session = self.state.is_operator_finished();
        self.close_operator(screen);
        if mode == Replay::Live {
            if abort {
                self.history.discard();
            } else {
                self.history.commit();
            }
        }
        if exit_session {
            self.finish_session(screen);
            return ExitState::Finished;
        }
        ExitState::Success
    }

    fn close_operator(&mut self, screen: &mut Screen) {
        self.state.finish_operator();
        self.state.motion.count = 0;
        screen.selection_clear();
        if !self.highlights.is_empty() {
            self.highlights.clear();
            screen.mark_all_dirty();
        }
    }

    fn finish_session(&mut self, screen: &mut Screen) {
        let initial = self.state.initial_position;
        screen.set_position(CursorId::Navigation, initial);
        screen.selection_clear();
        screen.set_navigation_display(false);
        self.highlights.clear();
        self.state = NormalModeState::new(initial);
        log::debug!("navigation finished");
    }

    // ---- Search -------------------------------------------------------------

    fn search_key(&mut self, screen: &mut Screen, key: Key, mode: Replay) -> ExitState {
        match key.code {
            KeyCode::Backspace if self.search.is_empty() => {
                // Deleting past the pattern start cancels the search
                screen.set_position(CursorId::Navigation, self.state.motion.search_start);
                if mode == Replay::Live {
                    self.history.truncate(self.state.motion.echo_mark);
                }
                self.state.motion.search = SearchDirection::None;
                self.state.motion.finished = true;
                self.highlights.clear();
                screen.mark_all_dirty();
                self.extend_selection(screen);
                return ExitState::Success;
            }
            KeyCode::Backspace => {
                self.search.pop().ok();
                if mode == Replay::Live {
                    self.history.pop();
                }
            }
            KeyCode::Char(c) if !key.is_chord() => {
                if let Err(err) = self.search.push(c) {
                    error::report(&err);
                    return ExitState::Failed;
                }
                self.record(c, mode);
            }
            _ => return ExitState::Success,
        }

        let found = self.run_search(screen);
        self.extend_selection(screen);
        if found {
            ExitState::Success
        } else {
            ExitState::Failed
        }
    }

    /// Search from the recorded start; the cursor stays at the start when
    /// nothing matches
    fn run_search(&mut self, screen: &mut Screen) -> bool {
        let start = self.state.motion.search_start;
        screen.set_position(CursorId::Navigation, start);
        if self.search.is_empty() {
            self.highlights.clear();
            screen.mark_all_dirty();
            return true;
        }
        let target = motion::find(
            screen.surface(),
            self.search.as_slice(),
            Point::new(start.x, start.y),
            self.state.motion.search,
        );
        match target {
            Some(point) => {
                screen.move_cursor(CursorId::Navigation, point.x as isize, point.y as isize, true);
                self.refresh_highlights(screen);
                true
            }
            None => {
                self.highlights.clear();
                screen.mark_all_dirty();
                false
            }
        }
    }

    fn refresh_highlights(&mut self, screen: &mut Screen) {
        self.highlights.refresh(screen, self.search.as_slice());
        screen.mark_all_dirty();
    }

    /// Stretch the selection of a pending operator to the cursor
    fn extend_selection(&mut self, screen: &mut Screen) {
        let nav = Self::nav_point(screen);
        match self.state.command.operator {
            Operator::None => {}
            Operator::Visual => {
                screen.selection_extend(nav.x, nav.y, self.selection_type, false);
            }
            Operator::Yank => {
                screen.selection_extend(nav.x, nav.y, SelectionType::Regular, false);
            }
            Operator::VisualLine => {
                let last = screen.cols() - 1;
                screen.selection_extend(last, nav.y, SelectionType::Rectangular, false);
            }
        }
    }

    // ---- Operators ----------------------------------------------------------

    fn yank_key(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        mode: Replay,
    ) -> ExitState {
        self.record('y', mode);
        match self.state.command.operator {
            Operator::None => {
                let position = screen.cursor(CursorId::Navigation).position();
                self.state.open_operator(Operator::Yank, position);
                screen.selection_start(position.x, position.y, Snap::Char);
            }
            Operator::Visual | Operator::VisualLine => {
                let text = screen.selection_text();
                clipboard.copy(&text);
                log::debug!("yanked {} chars from visual selection", text.chars().count());
                self.close_operator(screen);
                if mode == Replay::Live {
                    self.history.commit();
                }
            }
            Operator::Yank => {
                // Doubled operator: whole rows from the operator start
                let start = self.state.command.start;
                let last_row = (start.y + self.state.repeat() as usize - 1)
                    .min(screen.surface_rows() - 1);
                let range = (Point::new(0, start.y), Point::new(screen.cols() - 1, last_row));
                self.finish_yank(screen, clipboard, Some(range), SelectionType::Rectangular, mode);
            }
        }
        ExitState::Success
    }

    /// Yank from the operator start to the cursor
    fn commit_motion_yank(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        reach: Reach,
        mode: Replay,
    ) {
        let cols = screen.cols();
        let start = self.state.command.start;
        let from = to_index(Point::new(start.x, start.y), cols);
        let to = to_index(Self::nav_point(screen), cols);
        let range = match reach {
            Reach::Inclusive => Some((from.min(to), from.max(to))),
            _ if to > from => Some((from, to - 1)),
            _ if to < from => Some((to, from - 1)),
            _ => None,
        };
        let range = range.map(|(begin, end)| (from_index(begin, cols), from_index(end, cols)));
        self.finish_yank(screen, clipboard, range, SelectionType::Regular, mode);
    }

    /// Copy `range` to the clipboard, put the cursor back on the operator
    /// start and close the operator
    fn finish_yank(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        range: Option<(Point, Point)>,
        ty: SelectionType,
        mode: Replay,
    ) {
        if let Some((begin, end)) = range {
            screen.selection_start(begin.x, begin.y, Snap::Char);
            screen.selection_extend(end.x, end.y, ty, false);
            let text = screen.selection_text();
            clipboard.copy(&text);
            log::debug!("yanked {} chars", text.chars().count());
        }
        screen.set_position(CursorId::Navigation, self.state.command.start);
        self.close_operator(screen);
        if mode == Replay::Live {
            self.history.commit();
        }
    }

    fn visual_key(&mut self, screen: &mut Screen, c: char, mode: Replay) -> ExitState {
        let target = if c == 'v' {
            Operator::Visual
        } else {
            Operator::VisualLine
        };
        let open = self.state.command.operator != target;
        if !self.state.is_operator_finished() {
            self.close_operator(screen);
            if mode == Replay::Live {
                self.history.discard();
            }
        }
        self.state.motion.count = 0;
        if !open {
            return ExitState::Success;
        }

        let position = screen.cursor(CursorId::Navigation).position();
        self.state.open_operator(target, position);
        self.record(c, mode);
        if target == Operator::VisualLine {
            screen.selection_start(0, position.y, Snap::Char);
            let last = screen.cols() - 1;
            screen.selection_extend(last, position.y, SelectionType::Rectangular, false);
        } else {
            self.selection_type = SelectionType::Regular;
            screen.selection_start(position.x, position.y, Snap::Char);
        }
        ExitState::Success
    }

    // ---- Replay -------------------------------------------------------------

    fn checkpoint(&self, screen: &Screen) -> Checkpoint {
        Checkpoint {
            state: self.state,
            position: screen.cursor(CursorId::Navigation).position(),
            selection: screen.selection().clone(),
            search: self.search.clone(),
            highlights: self.highlights.clone(),
            selection_type: self.selection_type,
        }
    }

    fn rollback(&mut self, screen: &mut Screen, checkpoint: Checkpoint) {
        self.state = checkpoint.state;
        self.search = checkpoint.search;
        self.highlights = checkpoint.highlights;
        self.selection_type = checkpoint.selection_type;
        screen.set_position(CursorId::Navigation, checkpoint.position);
        screen.restore_selection(checkpoint.selection);
        screen.mark_all_dirty();
    }

    /// Feed `sequence` through the dispatcher, all or nothing
    fn replay(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        sequence: &[Key],
        mode: Replay,
    ) -> ExitState {
        if self.depth >= MAX_REPLAY_DEPTH {
            log::debug!("replay nested too deeply, dropping {} keys", sequence.len());
            return ExitState::Failed;
        }
        let checkpoint = self.checkpoint(screen);
        self.depth += 1;
        let mut result = ExitState::Success;
        for &key in sequence {
            result = self.process(screen, clipboard, key, mode);
            if result != ExitState::Success {
                break;
            }
        }
        self.depth -= 1;
        if result == ExitState::Failed {
            log::debug!("replay of {} keys failed, rolling back", sequence.len());
            self.rollback(screen, checkpoint);
        }
        result
    }

    fn repeat_last(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        mode: Replay,
    ) -> ExitState {
        let command: Vec<Key> = self.history.last().iter().map(|&c| Key::from_char(c)).collect();
        if mode == Replay::Live {
            self.history.discard();
        }
        self.state.motion.count = 0;
        if command.is_empty() {
            return ExitState::Failed;
        }
        self.replay(screen, clipboard, &command, Replay::Command)
    }

    fn text_object(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        object: char,
        mode: Replay,
    ) -> ExitState {
        let infix = self.state.command.infix;
        let operator = self.state.command.operator;
        let nav = Self::nav_point(screen);
        let under_cursor = screen
            .cell(nav.x, nav.y)
            .map_or(' ', |cell| cell.display_char());

        let sequence = operator
            .key()
            .and_then(|op_key| expand_text_object(object, infix, op_key, under_cursor));
        let Some(sequence) = sequence else {
            log::debug!("no text object for {:?}", object);
            self.state.command.infix = Infix::None;
            if mode == Replay::Live {
                self.history.pop();
            }
            return ExitState::Failed;
        };

        let checkpoint = self.checkpoint(screen);
        self.state.finish_operator();
        screen.selection_clear();
        let result = self.replay(screen, clipboard, &sequence, Replay::TextObject);
        if result == ExitState::Failed {
            self.rollback(screen, checkpoint);
            self.state.command.infix = Infix::None;
            if mode == Replay::Live {
                self.history.pop();
            }
            return ExitState::Failed;
        }

        self.record(object, mode);
        if self.state.command.operator == Operator::Yank {
            self.commit_motion_yank(screen, clipboard, Reach::Inclusive, mode);
        }
        result
    }

    fn shortcut(&mut self, screen: &mut Screen, clipboard: &mut dyn Clipboard, c: char) -> ExitState {
        self.state.motion.count = 0;
        let sequence = self.config.shortcut(c).map(keys);
        match sequence {
            Some(sequence) => self.replay(screen, clipboard, &sequence, Replay::Command),
            None => {
                log::trace!("unmapped key {:?}", c);
                ExitState::Failed
            }
        }
    }

    // ---- Motions ------------------------------------------------------------

    /// Move the navigation cursor for motion key `c`
    ///
    /// Returns `None` for keys that are not motions, otherwise how the
    /// motion bounds a yank and whether it succeeded.
    fn motion(&mut self, screen: &mut Screen, c: char) -> Option<(Reach, bool)> {
        let repeat = self.state.repeat();
        let cursor = screen.cursor(CursorId::Navigation).clone();
        let (cols, height) = (screen.cols(), screen.rows());
        let last_row = screen.surface_rows() - 1;
        let here = Point::new(cursor.x, cursor.y);

        let (target, reach) = match c {
            'h' | 'l' => {
                let delta = if c == 'l' { repeat as isize } else { -(repeat as isize) };
                (motion::move_cells(screen.surface(), here, delta), Reach::Exclusive)
            }
            'j' => (Point::new(here.x, (here.y + repeat as usize).min(last_row)), Reach::Inclusive),
            'k' => (Point::new(here.x, here.y.saturating_sub(repeat as usize)), Reach::Inclusive),
            'H' | 'M' | 'L' => {
                let row = match c {
                    'H' => 0,
                    'M' => (height - 1) / 2,
                    _ => height - 1,
                };
                let y = (cursor.offset.y + row).min(last_row);
                (Point::new(here.x, y), Reach::Inclusive)
            }
            'G' => {
                screen.set_position(CursorId::Navigation, self.state.initial_position);
                return Some((Reach::Inclusive, true));
            }
            '0' => (Point::new(0, here.y), Reach::Exclusive),
            '$' => (Point::new(cols - 1, here.y), Reach::Inclusive),
            'w' | 'W' | 'b' | 'B' | 'e' | 'E' => {
                let word = WordMotion::from_key(c)?;
                let target = motion::word_motion(
                    screen.surface(),
                    here,
                    word,
                    self.config.delimiters_for(c),
                    repeat,
                );
                let reach = if word == WordMotion::End {
                    Reach::Inclusive
                } else {
                    Reach::Exclusive
                };
                (target, reach)
            }
            '/' | '?' => {
                self.search.clear();
                self.state.motion.search = if c == '/' {
                    SearchDirection::Forward
                } else {
                    SearchDirection::Backward
                };
                self.state.motion.search_start = cursor.position();
                self.state.motion.echo_mark = self.history.current().len();
                self.state.motion.finished = false;
                return Some((Reach::Pending, true));
            }
            'n' | 'N' => return Some((Reach::Exclusive, self.repeat_search(screen, c == 'N'))),
            't' => {
                self.selection_type = match self.selection_type {
                    SelectionType::Regular => SelectionType::Rectangular,
                    SelectionType::Rectangular => SelectionType::Regular,
                };
                if self.state.command.operator == Operator::Visual {
                    self.extend_selection(screen);
                }
                return Some((Reach::Stay, true));
            }
            _ => return None,
        };

        screen.move_cursor(
            CursorId::Navigation,
            target.x as isize,
            target.y as isize,
            true,
        );
        Some((reach, true))
    }

    /// `n`/`N`: repeat the last search, all repetitions or none
    fn repeat_search(&mut self, screen: &mut Screen, reverse: bool) -> bool {
        if self.state.motion.search == SearchDirection::None {
            self.state.motion.search = SearchDirection::Forward;
        }
        let mut direction = self.state.motion.search;
        if reverse {
            direction = direction.reversed();
        }
        if self.search.is_empty() {
            return false;
        }

        let mut point = Self::nav_point(screen);
        for _ in 0..self.state.repeat() {
            match motion::find(screen.surface(), self.search.as_slice(), point, direction) {
                Some(found) => point = found,
                None => return false,
            }
        }
        screen.move_cursor(CursorId::Navigation, point.x as isize, point.y as isize, true);
        self.refresh_highlights(screen);
        true
    }

    /// Viewport-scroll chords
    fn scroll_chord(&mut self, screen: &mut Screen, key: Key) -> ExitState {
        let KeyCode::Char(c) = key.code else {
            return ExitState::Failed;
        };
        let repeat = self.state.repeat() as isize;
        self.state.motion.count = 0;
        let height = screen.rows() as isize;
        let half = (height / 2).max(1);

        match c {
            'e' => screen.scroll_viewport(CursorId::Navigation, repeat),
            'y' => screen.scroll_viewport(CursorId::Navigation, -repeat),
            'd' | 'u' | 'f' | 'b' => {
                let page = if matches!(c, 'd' | 'u') { half } else { height };
                let delta = if matches!(c, 'd' | 'f') {
                    page * repeat
                } else {
                    -page * repeat
                };
                let cursor = screen.cursor(CursorId::Navigation);
                let (x, y) = (cursor.x as isize, cursor.y as isize);
                screen.scroll_viewport(CursorId::Navigation, delta);
                screen.move_cursor(CursorId::Navigation, x, y + delta, true);
            }
            _ => {
                log::trace!("unmapped chord ctrl-{}", c);
                return ExitState::Failed;
            }
        }

        if !self.highlights.is_empty() {
            self.refresh_highlights(screen);
        }
        self.extend_selection(screen);
        ExitState::Success
    }

    fn after_motion(
        &mut self,
        screen: &mut Screen,
        clipboard: &mut dyn Clipboard,
        c: char,
        reach: Reach,
        mode: Replay,
    ) -> ExitState {
        if !self.highlights.is_empty() && !matches!(c, 'n' | 'N') {
            self.refresh_highlights(screen);
        }
        self.record(c, mode);

        match self.state.command.operator {
            Operator::None => {
                if reach != Reach::Pending && mode == Replay::Live {
                    self.history.discard();
                }
            }
            Operator::Visual | Operator::VisualLine => self.extend_selection(screen),
            Operator::Yank => match reach {
                Reach::Exclusive | Reach::Inclusive if mode != Replay::TextObject => {
                    self.commit_motion_yank(screen, clipboard, reach, mode);
                }
                _ => {}
            },
        }
        self.state.motion.count = 0;
        ExitState::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navi_core::Dimensions;

    fn setup(text: &str) -> (Screen, NormalMode, Vec<String>) {
        let mut screen = Screen::new(Dimensions::new(20, 4));
        screen.put_str(text);
        let mut normal = NormalMode::default();
        normal.on_navigation_start(&mut screen);
        (screen, normal, Vec::new())
    }

    fn type_keys(
        normal: &mut NormalMode,
        screen: &mut Screen,
        clipboard: &mut Vec<String>,
        text: &str,
    ) -> ExitState {
        let mut result = ExitState::Success;
        for key in keys(text) {
            result = normal.handle_key(screen, clipboard, key);
        }
        result
    }

    fn nav(screen: &Screen) -> (usize, usize) {
        let cursor = screen.cursor(CursorId::Navigation);
        (cursor.x, cursor.y)
    }

    #[test]
    fn test_session_starts_at_output_cursor() {
        let (screen, normal, _) = setup("abc");
        assert_eq!(nav(&screen), (3, 0));
        assert_eq!(screen.display_cursor(), CursorId::Navigation);
        assert!(normal.state().is_operator_finished());
    }

    #[test]
    fn test_count_accumulates_and_caps() {
        let (mut screen, mut normal, mut clip) = setup("");
        type_keys(&mut normal, &mut screen, &mut clip, "12");
        assert_eq!(normal.state().motion.count, 12);
        type_keys(&mut normal, &mut screen, &mut clip, "999999");
        assert_eq!(normal.state().motion.count, normal.config().max_count);
        type_keys(&mut normal, &mut screen, &mut clip, "k");
        assert_eq!(normal.state().motion.count, 0);
    }

    #[test]
    fn test_zero_is_motion_without_count() {
        let (mut screen, mut normal, mut clip) = setup("hello");
        type_keys(&mut normal, &mut screen, &mut clip, "0");
        assert_eq!(nav(&screen), (0, 0));
        type_keys(&mut normal, &mut screen, &mut clip, "10l");
        assert_eq!(nav(&screen), (10, 0));
    }

    #[test]
    fn test_escape_ends_session() {
        let (mut screen, mut normal, mut clip) = setup("abc");
        type_keys(&mut normal, &mut screen, &mut clip, "0");
        let result = normal.handle_key(&mut screen, &mut clip, Key::escape());
        assert_eq!(result, ExitState::Finished);
        assert_eq!(nav(&screen), (3, 0));
        assert_eq!(screen.display_cursor(), CursorId::Output);
    }

    #[test]
    fn test_bare_i_behaves_like_escape() {
        let (mut screen, mut normal, mut clip) = setup("abc");
        let result = normal.handle_key(&mut screen, &mut clip, Key::char('i'));
        assert_eq!(result, ExitState::Finished);
    }

    #[test]
    fn test_escape_closes_operator_first() {
        let (mut screen, mut normal, mut clip) = setup("abc");
        type_keys(&mut normal, &mut screen, &mut clip, "v");
        assert!(screen.selection().is_active());
        let result = normal.handle_key(&mut screen, &mut clip, Key::escape());
        assert_eq!(result, ExitState::Success);
        assert!(!screen.selection().is_active());
        assert!(normal.state().is_operator_finished());
    }

    #[test]
    fn test_toggle_selection_type() {
        let (mut screen, mut normal, mut clip) = setup("abcd\nefgh");
        type_keys(&mut normal, &mut screen, &mut clip, "k0lvjl");
        assert_eq!(screen.selection().selection_type(), SelectionType::Regular);
        type_keys(&mut normal, &mut screen, &mut clip, "t");
        assert_eq!(screen.selection().selection_type(), SelectionType::Rectangular);
        type_keys(&mut normal, &mut screen, &mut clip, "y");
        assert_eq!(clip, vec!["bc\nfg".to_string()]);
    }

    #[test]
    fn test_unmapped_key_fails_and_resets_count() {
        let (mut screen, mut normal, mut clip) = setup("abc");
        type_keys(&mut normal, &mut screen, &mut clip, "3");
        let result = normal.handle_key(&mut screen, &mut clip, Key::char('z'));
        assert_eq!(result, ExitState::Failed);
        assert_eq!(normal.state().motion.count, 0);
    }

    #[test]
    fn test_replay_depth_is_bounded() {
        let mut config = NormalModeConfig::default();
        config.shortcuts.insert('g', "g".to_string());
        let mut screen = Screen::new(Dimensions::new(10, 2));
        let mut normal = NormalMode::new(config);
        normal.on_navigation_start(&mut screen);
        let mut clip = Vec::new();
        let result = normal.handle_key(&mut screen, &mut clip, Key::char('g'));
        assert_eq!(result, ExitState::Failed);
    }

    #[test]
    fn test_stored_positions_follow_recycled_rows() {
        let config = navi_core::ScreenConfig {
            max_rows: 6,
            ..navi_core::ScreenConfig::default()
        };
        let mut screen = Screen::with_config(Dimensions::new(10, 3), config);
        screen.put_str("a\nb\nc\nd");
        let mut normal = NormalMode::default();
        normal.on_navigation_start(&mut screen);
        let mut clip = Vec::new();

        // Output at the row cap while navigating
        screen.put_str("\ne\nf\ng");
        assert!(screen.evicted_rows() > 0);

        type_keys(&mut normal, &mut screen, &mut clip, "kG");
        let (_, y) = nav(&screen);
        assert_eq!(screen.surface().line(y).text(), "d");

        let result = normal.handle_key(&mut screen, &mut clip, Key::escape());
        assert_eq!(result, ExitState::Finished);
        let (_, y) = nav(&screen);
        assert_eq!(screen.surface().line(y).text(), "d");
    }

    #[test]
    fn test_highlights_follow_width_change() {
        let mut screen = Screen::new(Dimensions::new(6, 3));
        screen.put_str("xx ab");
        let mut normal = NormalMode::default();
        normal.on_navigation_start(&mut screen);
        let mut clip = Vec::new();
        type_keys(&mut normal, &mut screen, &mut clip, "0/ab\n");
        assert!(normal.highlighted(3, 0));

        screen.resize(4, 3);
        let result = normal.handle_key(&mut screen, &mut clip, Key::char('z'));
        assert_eq!(result, ExitState::Failed);
        assert!(normal.highlights().is_empty());
        assert!(!normal.highlighted(3, 0));
    }
}
