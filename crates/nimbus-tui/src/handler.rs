use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick().await,
    }
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
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        KeyCode::Char('t') => app.toggle_dark_mode(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_input(),

        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.clear_input(),

        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Home => app.move_cursor_home(),
        KeyCode::End => app.move_cursor_end(),

        // The chat stays scrollable while typing
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),

        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(3),
        MouseEventKind::ScrollDown => app.scroll_down(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_core::{Config, HttpBackend};

    fn test_app() -> App {
        let backend = HttpBackend::new("http://127.0.0.1:9", None).unwrap();
        App::new(&Config::new(), backend, None)
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).await;
        }
    }

    #[tokio::test]
    async fn enter_submits_once_and_repeats_are_ignored() {
        let mut app = test_app();
        type_text(&mut app, "rain in Leeds?").await;

        handle_event(&mut app, key(KeyCode::Enter)).await;
        handle_event(&mut app, key(KeyCode::Enter)).await;
        handle_event(&mut app, key(KeyCode::Enter)).await;

        assert_eq!(app.conversation().len(), 1);
        assert_eq!(app.conversation().messages()[0].text, "rain in Leeds?");
        assert!(app.is_loading());
    }

    #[tokio::test]
    async fn typing_q_in_editing_mode_does_not_quit() {
        let mut app = test_app();
        type_text(&mut app, "q").await;
        assert!(!app.should_quit);
        assert_eq!(app.input, "q");

        handle_event(&mut app, key(KeyCode::Esc)).await;
        handle_event(&mut app, key(KeyCode::Char('q'))).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn ctrl_c_quits_from_any_mode() {
        let mut app = test_app();
        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, ctrl_c).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn ctrl_u_clears_the_line() {
        let mut app = test_app();
        type_text(&mut app, "snow in Bern").await;
        let ctrl_u = AppEvent::Key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        handle_event(&mut app, ctrl_u).await;
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
    }

    #[tokio::test]
    async fn normal_mode_keys_scroll_and_reenter_editing() {
        let mut app = test_app();
        app.chat_max_scroll = 20;
        app.scroll_to_bottom();

        handle_event(&mut app, key(KeyCode::Esc)).await;
        handle_event(&mut app, key(KeyCode::Char('k'))).await;
        handle_event(&mut app, key(KeyCode::Char('k'))).await;
        assert_eq!(app.chat_scroll, 18);

        handle_event(&mut app, key(KeyCode::Char('g'))).await;
        assert_eq!(app.chat_scroll, 0);

        handle_event(&mut app, key(KeyCode::Char('i'))).await;
        assert_eq!(app.input_mode, InputMode::Editing);
    }
}
