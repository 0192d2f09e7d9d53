//! Keystrokes as seen by the interpreter
//!
//! The keyboard front end hands over either a decoded key or raw bytes.
//! Control bytes are folded into a letter plus [`Modifiers::CTRL`], so
//! `0x05` and `Ctrl+e` are the same keystroke.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifiers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b001;
        const CTRL = 0b010;
        const ALT = 0b100;
    }
}

/// The key itself, without modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
    Escape,
}

/// One keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl Key {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// An unmodified printable key
    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), Modifiers::empty())
    }

    /// `Ctrl` plus a letter
    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c.to_ascii_lowercase()), Modifiers::CTRL)
    }

    pub fn escape() -> Self {
        Self::new(KeyCode::Escape, Modifiers::empty())
    }

    pub fn enter() -> Self {
        Self::new(KeyCode::Enter, Modifiers::empty())
    }

    pub fn backspace() -> Self {
        Self::new(KeyCode::Backspace, Modifiers::empty())
    }

    /// Decode a single code point, mapping control characters
    pub fn from_char(c: char) -> Self {
        match c {
            '\n' | '\r' => Self::enter(),
            '\x1b' => Self::escape(),
            '\x08' | '\x7f' => Self::backspace(),
            '\t' => Self::char('\t'),
            '\x01'..='\x1a' => Self::ctrl((b'a' + (c as u8 - 1)) as char),
            c => Self::char(c),
        }
    }

    /// Decode the first code point of a raw UTF-8 byte string
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(bytes).ok()?;
        text.chars().next().map(Self::from_char)
    }

    /// The printable character, if any and unmodified by `Ctrl`/`Alt`
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.is_chord() => Some(c),
            _ => None,
        }
    }

    /// Whether `Ctrl` or `Alt` is held
    pub fn is_chord(&self) -> bool {
        self.modifiers.intersects(Modifiers::CTRL | Modifiers::ALT)
    }

    /// The code point this key stands for in a recorded command
    pub fn to_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.is_chord() => Some(c),
            KeyCode::Enter => Some('\n'),
            _ => None,
        }
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Self::from_char(c)
    }
}

/// Turn a string into the keystrokes that would type it
pub fn keys(text: &str) -> Vec<Key> {
    text.chars().map(Key::from_char).collect()
}
