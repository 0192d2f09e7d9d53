//! Screen configuration

use serde::{Deserialize, Serialize};

/// Rows the primary surface may hold, history included
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// Tab stop interval (default)
pub const DEFAULT_TAB_WIDTH: usize = 8;

/// Tunables of the screen model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScreenConfig {
    /// Hard cap on primary surface rows; the oldest rows are recycled past it
    pub max_rows: usize,
    /// Columns between default tab stops
    pub tab_width: usize,
    /// Characters that end a word when a selection snaps to words
    pub word_delimiters: String,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            tab_width: DEFAULT_TAB_WIDTH,
            word_delimiters: " ".to_string(),
        }
    }
}
