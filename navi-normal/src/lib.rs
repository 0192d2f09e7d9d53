//! Navi Normal - vim-style keyboard navigation for a navi-core screen
//!
//! [`NormalMode`] turns keystrokes into movements of the navigation
//! cursor, visual selections and yanks. It supports:
//! - Counts, word motions and screen-relative jumps
//! - Incremental `/` and `?` search with match highlighting
//! - Text objects (`iw`, `a(`, `i"`, ...) expanded into keystroke sequences
//! - Repeating the last command with `.` and user-defined shortcut keys
//!
//! Composite commands either apply completely or leave no trace.

pub mod config;
mod highlight;
mod history;
mod interpreter;
mod key;
pub mod motion;
mod state;
mod text_object;

pub use config::{ConfigError, NormalModeConfig};
pub use highlight::Highlights;
pub use history::CommandHistory;
pub use interpreter::{Clipboard, NormalMode};
pub use key::{keys, Key, KeyCode, Modifiers};
pub use state::{
    ExitState, Infix, MotionState, NormalModeState, Operator, OperatorState, SearchDirection,
};
pub use text_object::expand_text_object;
