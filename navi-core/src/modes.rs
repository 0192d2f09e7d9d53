//! Output mode flags
//!
//! Set by the escape decoder, consulted by `put_char` and `newline`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// How output lands on the surface
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Modes: u8 {
        /// IRM: glyphs shift the rest of the row right
        const INSERT = 1 << 0;
        /// LNM: line feed also returns to column 0
        const LINEFEED = 1 << 1;
        /// DECAWM: printing past the margin wraps to the next row
        const AUTO_WRAP = 1 << 2;
    }
}

impl Modes {
    pub fn new() -> Self {
        Modes::AUTO_WRAP
    }
}

impl Default for Modes {
    fn default() -> Self {
        Self::new()
    }
}
