use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Blocks navigation
        KeyCode::Char('j') | KeyCode::Down => app.blocks_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.blocks_nav_up(),

        // Toggle the highlighted block
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected_block(),

        // Chat scrolling
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.chat_scroll_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.chat_scroll_up();
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        // Edit the blocks filter
        KeyCode::Char('/') => {
            app.focus = FocusPane::Blocks;
            app.input_mode = InputMode::Editing;
        }

        // Jump to the message input
        KeyCode::Tab | KeyCode::Char('i') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
            // Cursor at end of existing text
            app.message_cursor = app.message_input.chars().count();
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.focus {
        FocusPane::Blocks => handle_filter_editing(app, key),
        FocusPane::Input => handle_message_editing(app, key),
    }
}

fn handle_filter_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.filter_clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.filter_pop();
        }
        // List stays navigable while the filter narrows
        KeyCode::Down => app.blocks_nav_down(),
        KeyCode::Up => app.blocks_nav_up(),
        KeyCode::Tab => {
            app.focus = FocusPane::Input;
            app.message_cursor = app.message_input.chars().count();
        }
        KeyCode::Char(c) => {
            app.filter_push(c);
        }
        _ => {}
    }
}

fn handle_message_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Blocks;
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Blocks;
        }
        KeyCode::Enter => {
            app.submit_message();
        }
        KeyCode::Backspace => {
            if app.message_cursor > 0 {
                app.message_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.message_input, app.message_cursor);
                app.message_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.message_input.chars().count();
            if app.message_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.message_input, app.message_cursor);
                app.message_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.message_cursor = app.message_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.message_input.chars().count();
            app.message_cursor = (app.message_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.message_cursor = 0;
        }
        KeyCode::End => {
            app.message_cursor = app.message_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.message_input, app.message_cursor);
            app.message_input.insert(byte_pos, c);
            app.message_cursor += 1;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn app() -> App {
        App::new(&Config::new())
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::from(code));
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3); // 'é' is two bytes
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn test_enter_toggles_block_in_normal_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selector.active_count(), 1);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selector.active_count(), 0);
    }

    #[test]
    fn test_slash_enters_filter_editing() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Editing);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.selector.filter(), "g");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.selector.filter(), "");
    }

    #[test]
    fn test_tab_moves_to_message_input() {
        let mut app = app();
        app.message_input = "draft".to_string();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, FocusPane::Input);
        assert_eq!(app.input_mode, InputMode::Editing);
        assert_eq!(app.message_cursor, 5);
    }

    #[test]
    fn test_message_editing_utf8_cursor() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        for c in "héllo".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.message_input, "hélo");
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.message_input, "élo");
    }

    #[test]
    fn test_filter_editing_keeps_selection_intact() {
        let mut app = app();
        press(&mut app, KeyCode::Enter); // activate "Google Search"
        press(&mut app, KeyCode::Char('/'));
        for c in "zzzz".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert!(app.selector.visible().is_empty());
        assert_eq!(
            app.selector.active_internal_names(),
            vec!["google_search".to_string()]
        );
    }

    #[test]
    fn test_ctrl_c_quits_from_editing() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }
}
