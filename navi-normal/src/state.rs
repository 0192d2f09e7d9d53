//! Interpreter state
//!
//! Everything the interpreter remembers between keystrokes, apart from
//! the buffers it owns. The whole struct is `Copy` so a failed replay can
//! roll back by value.

use navi_core::Position;

/// Result of handling one keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    /// The keystroke could not be carried out; nothing changed
    Failed,
    /// Handled, navigation continues
    Success,
    /// Navigation is over, the caller should return to normal input
    Finished,
}

/// Pending operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    #[default]
    None,
    /// `v`: run selection following the cursor
    Visual,
    /// `V`: whole rows
    VisualLine,
    /// `y`: yank over the next motion
    Yank,
}

impl Operator {
    /// Key that opens this operator
    pub fn key(self) -> Option<char> {
        match self {
            Operator::None => None,
            Operator::Visual => Some('v'),
            Operator::VisualLine => Some('V'),
            Operator::Yank => Some('y'),
        }
    }

    pub fn is_visual(self) -> bool {
        matches!(self, Operator::Visual | Operator::VisualLine)
    }
}

/// Text-object modifier typed after an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Infix {
    #[default]
    None,
    /// `i`: contents only
    Inner,
    /// `a`: contents and delimiters
    Around,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    #[default]
    None,
    Forward,
    Backward,
}

impl SearchDirection {
    pub fn reversed(self) -> Self {
        match self {
            SearchDirection::None => SearchDirection::None,
            SearchDirection::Forward => SearchDirection::Backward,
            SearchDirection::Backward => SearchDirection::Forward,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperatorState {
    pub operator: Operator,
    /// Cursor position when the operator was opened
    pub start: Position,
    pub infix: Infix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionState {
    /// Repeat count typed so far, zero when none
    pub count: u32,
    pub search: SearchDirection,
    /// Where the pending search started
    pub search_start: Position,
    /// Length of the echoed command before the search was opened
    pub echo_mark: usize,
    /// False while an incremental search takes input
    pub finished: bool,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            count: 0,
            search: SearchDirection::None,
            search_start: Position::default(),
            echo_mark: 0,
            finished: true,
        }
    }
}

/// The state of a navigation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalModeState {
    /// Where the session started, restored when it ends
    pub initial_position: Position,
    pub command: OperatorState,
    pub motion: MotionState,
}

impl NormalModeState {
    pub fn new(initial_position: Position) -> Self {
        Self {
            initial_position,
            ..Self::default()
        }
    }

    /// No operator and no infix pending
    pub fn is_operator_finished(&self) -> bool {
        self.command.operator == Operator::None && self.command.infix == Infix::None
    }

    pub fn is_motion_finished(&self) -> bool {
        self.motion.finished
    }

    /// An incremental search is taking input
    pub fn is_searching(&self) -> bool {
        self.motion.search != SearchDirection::None && !self.motion.finished
    }

    /// The repeat count, at least one
    pub fn repeat(&self) -> u32 {
        self.motion.count.max(1)
    }

    pub fn open_operator(&mut self, operator: Operator, start: Position) {
        self.command = OperatorState {
            operator,
            start,
            infix: Infix::None,
        };
    }

    pub fn finish_operator(&mut self) {
        self.command = OperatorState::default();
    }
}
