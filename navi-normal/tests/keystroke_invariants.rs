//! Property tests for the interpreter
//!
//! Any keystroke sequence, including aborts, backspaces and scroll
//! chords, must leave the screen with both cursors inside their
//! viewports and must never panic.

use navi_core::{CursorId, Dimensions, Screen, ScreenConfig};
use navi_normal::{ExitState, Key, NormalMode};
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = Key> {
    prop_oneof![
        8 => prop::sample::select(
            "hjklHMLG0$wWbBeE/?nNtyvVia.()\"'fF123 xz".chars().collect::<Vec<_>>()
        )
        .prop_map(Key::char),
        1 => Just(Key::escape()),
        1 => Just(Key::enter()),
        1 => Just(Key::backspace()),
        1 => prop::sample::select(vec!['e', 'y', 'd', 'u', 'f', 'b', 'x'])
            .prop_map(Key::ctrl),
    ]
}

fn screen_with_text(lines: &[String]) -> Screen {
    let config = ScreenConfig {
        max_rows: 30,
        ..ScreenConfig::default()
    };
    let mut screen = Screen::with_config(Dimensions::new(12, 5), config);
    screen.put_str(&lines.join("\n"));
    screen
}

proptest! {
    #[test]
    fn keys_keep_screen_invariants(
        lines in prop::collection::vec("[a-z (){}\"']{0,16}", 1..20),
        keys in prop::collection::vec(key_strategy(), 1..120),
    ) {
        let mut screen = screen_with_text(&lines);
        let mut normal = NormalMode::default();
        let mut clipboard: Vec<String> = Vec::new();
        normal.on_navigation_start(&mut screen);

        for key in keys {
            let result = normal.handle_key(&mut screen, &mut clipboard, key);
            prop_assert!(screen.check_invariants(), "violated after {:?}", key);
            if result == ExitState::Finished {
                prop_assert_eq!(screen.display_cursor(), CursorId::Output);
                prop_assert!(!screen.selection().is_active());
                normal.on_navigation_start(&mut screen);
            }
        }
    }

    #[test]
    fn failed_keys_do_not_move_cursor(
        keys in prop::collection::vec(key_strategy(), 1..60),
    ) {
        let mut screen = screen_with_text(&["foo (bar) \"baz\"".to_string()]);
        let mut normal = NormalMode::default();
        let mut clipboard: Vec<String> = Vec::new();
        normal.on_navigation_start(&mut screen);

        for key in keys {
            let before = screen.cursor(CursorId::Navigation).position();
            let searching = normal.state().is_searching();
            let result = normal.handle_key(&mut screen, &mut clipboard, key);
            // A failed composite command is undone completely
            if result == ExitState::Failed && !searching && !normal.state().is_searching() {
                let after = screen.cursor(CursorId::Navigation).position();
                prop_assert_eq!((before.x, before.y), (after.x, after.y));
            }
        }
    }
}
