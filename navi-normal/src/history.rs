//! Command echo history
//!
//! Two buffers, one collecting the command being typed and one holding
//! the last completed command. Completing a command flips which buffer is
//! current and empties the new current one, so no text is copied.

use navi_core::{error, GrowableBuffer};

#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    buffers: [GrowableBuffer<char>; 2],
    /// Index of the buffer collecting the current command
    current: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a code point to the current command
    pub fn record(&mut self, c: char) {
        if let Err(err) = self.buffers[self.current].push(c) {
            error::report(&err);
        }
    }

    /// Remove the last code point of the current command
    pub fn pop(&mut self) -> Option<char> {
        self.buffers[self.current].pop().ok()
    }

    /// Drop code points until the current command is `len` long
    pub fn truncate(&mut self, len: usize) {
        while self.buffers[self.current].len() > len {
            if self.pop().is_none() {
                break;
            }
        }
    }

    /// The current command becomes the last one
    ///
    /// An empty current command leaves the last one untouched.
    pub fn commit(&mut self) {
        if self.buffers[self.current].is_empty() {
            return;
        }
        self.current ^= 1;
        self.buffers[self.current].clear();
    }

    /// Forget the current command
    pub fn discard(&mut self) {
        self.buffers[self.current].clear();
    }

    pub fn current(&self) -> &[char] {
        self.buffers[self.current].as_slice()
    }

    pub fn last(&self) -> &[char] {
        self.buffers[self.current ^ 1].as_slice()
    }

    /// What a status line shows: the current command, or the last one
    /// while nothing is being typed
    pub fn echo(&self) -> String {
        let shown = if self.current().is_empty() {
            self.last()
        } else {
            self.current()
        };
        shown.iter().collect()
    }
}
