//! Text objects
//!
//! A text object is never executed directly. It expands into ordinary
//! keystrokes (searches and single-cell moves around the operator key)
//! which the interpreter replays like typed input.

use crate::key::{keys, Key};
use crate::state::Infix;

const BRACKETS: [(char, char); 4] = [('(', ')'), ('<', '>'), ('{', '}'), ('[', ']')];

/// Expand `object` into a keystroke sequence around `operator`
///
/// `under_cursor` is the character the navigation cursor sits on. Returns
/// `None` for unknown objects, and for quote objects when the cursor is on
/// a quote, since it is then unclear which side the quoted text lies on.
pub fn expand_text_object(
    object: char,
    infix: Infix,
    operator: char,
    under_cursor: char,
) -> Option<Vec<Key>> {
    let inner = match infix {
        Infix::None => return None,
        Infix::Inner => true,
        Infix::Around => false,
    };
    let mut seq = String::new();

    match object {
        // wb<op>e: lands on the word start even when already on it
        'w' | 'W' => {
            let (back, end) = if object == 'W' { ('B', 'E') } else { ('b', 'e') };
            seq.push(object);
            seq.push(back);
            seq.push(operator);
            seq.push(end);
        }
        '\'' | '"' | '`' => {
            if under_cursor == object {
                return None;
            }
            seq.push('?');
            seq.push(object);
            seq.push('\n');
            if inner {
                seq.push('l');
            }
            seq.push(operator);
            seq.push('/');
            seq.push(object);
            seq.push('\n');
            if inner {
                seq.push('h');
            }
        }
        c => {
            let &(open, close) = BRACKETS
                .iter()
                .find(|&&(open, close)| c == open || c == close)?;
            if under_cursor != open {
                seq.push('?');
                seq.push(open);
                seq.push('\n');
            }
            if inner {
                seq.push('l');
            }
            seq.push(operator);
            seq.push('/');
            seq.push(close);
            seq.push('\n');
            if inner {
                seq.push('h');
            }
        }
    }

    Some(keys(&seq))
}
