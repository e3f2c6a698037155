use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
    app.poll_tasks().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.picker.is_some() {
        handle_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_chat_editing(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            app.set_screen(app.screen.next());
            return;
        }
        KeyCode::BackTab => {
            app.set_screen(app.screen.prev());
            return;
        }
        KeyCode::Char('1') => {
            app.set_screen(Screen::Upload);
            return;
        }
        KeyCode::Char('2') => {
            app.set_screen(Screen::Chat);
            return;
        }
        KeyCode::Char('3') => {
            app.set_screen(Screen::Documents);
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Upload => handle_upload_normal(app, key),
        Screen::Chat => handle_chat_normal(app, key),
        Screen::Documents => handle_documents_normal(app, key),
    }
}

fn handle_upload_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('o') | KeyCode::Char('a') => app.open_picker(),
        KeyCode::Char('j') | KeyCode::Down => app.pending_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.pending_nav_up(),
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected_pending(),
        KeyCode::Char('u') | KeyCode::Enter => app.start_upload(),
        KeyCode::Char('m') => app.toggle_upload_mode(),
        _ => {}
    }
}

fn handle_picker(app: &mut App, key: KeyEvent) {
    let Some(picker) = app.picker.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.picker = None,
        KeyCode::Char('j') | KeyCode::Down => picker.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => picker.nav_up(),
        KeyCode::Char('h') | KeyCode::Backspace | KeyCode::Left => picker.parent(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.picker_activate(),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => {
            // The input stays locked until the outstanding answer arrives
            if !app.chat.is_sending() {
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_down(10)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_up(10)
        }
        KeyCode::PageDown => app.scroll_chat_down(10),
        KeyCode::PageUp => app.scroll_chat_up(10),
        KeyCode::Char('G') | KeyCode::End => app.chat_follow = true,
        KeyCode::Char('n') => app.new_conversation(),
        KeyCode::Char('m') => app.toggle_chat_mode(),
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.send_question(),
        KeyCode::Backspace => app.chat.backspace(),
        KeyCode::Delete => app.chat.delete(),
        KeyCode::Left => app.chat.cursor_left(),
        KeyCode::Right => app.chat.cursor_right(),
        KeyCode::Home => app.chat.cursor_home(),
        KeyCode::End => app.chat.cursor_end(),
        KeyCode::Char(c) => app.chat.insert_char(c),
        _ => {}
    }
}

fn handle_documents_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => {
            app.refresh_documents();
            app.check_health();
        }
        KeyCode::Char('j') | KeyCode::Down => app.documents_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.documents_nav_up(),
        _ => {}
    }
}

fn handle_paste(app: &mut App, text: &str) {
    if app.screen != Screen::Chat || app.input_mode != InputMode::Editing {
        return;
    }
    // The input is a single line
    for c in text.chars() {
        app.chat.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Screen::Chat {
        return;
    }
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_chat_down(3),
        MouseEventKind::ScrollUp => app.scroll_chat_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::{BackendClient, ChatMode, UploadMode};

    fn app() -> App {
        App::new(
            BackendClient::new("http://127.0.0.1:9"),
            UploadMode::Multi,
            ChatMode::MultiTurn,
        )
    }

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, press(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_number_keys_switch_screens() {
        let mut app = app();
        handle_event(&mut app, press(KeyCode::Char('2'))).await.unwrap();
        assert_eq!(app.screen, Screen::Chat);
        handle_event(&mut app, press(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.screen, Screen::Documents);
    }

    #[tokio::test]
    async fn test_typing_and_sending_from_chat() {
        let mut app = app();
        app.set_screen(Screen::Chat);
        handle_event(&mut app, press(KeyCode::Char('i'))).await.unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);

        // 'q' is text while editing, not quit
        type_text(&mut app, "q1 revenue").await;
        assert!(!app.should_quit);
        assert_eq!(app.chat.input, "q1 revenue");

        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();
        assert!(app.chat.input.is_empty());
        assert_eq!(app.chat.transcript.len(), 1);

        // Request task has not been polled yet, so the input is still locked
        type_text(&mut app, "more").await;
        assert!(app.chat.is_sending());
        assert!(app.chat.input.is_empty());
    }

    #[tokio::test]
    async fn test_enter_on_blank_input_is_noop() {
        let mut app = app();
        app.set_screen(Screen::Chat);
        app.input_mode = InputMode::Editing;
        type_text(&mut app, "   ").await;
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert!(app.chat.transcript.is_empty());
        assert!(app.chat_task.is_none());
    }

    #[tokio::test]
    async fn test_paste_flattens_newlines() {
        let mut app = app();
        app.set_screen(Screen::Chat);
        app.input_mode = InputMode::Editing;
        handle_event(&mut app, AppEvent::Paste("net\nincome".to_string()))
            .await
            .unwrap();
        assert_eq!(app.chat.input, "net income");
    }

    #[tokio::test]
    async fn test_resize_keeps_state() {
        let mut app = app();
        app.set_screen(Screen::Chat);
        app.input_mode = InputMode::Editing;
        type_text(&mut app, "eps").await;

        handle_event(&mut app, AppEvent::Resize).await.unwrap();
        assert_eq!(app.screen, Screen::Chat);
        assert_eq!(app.input_mode, InputMode::Editing);
        assert_eq!(app.chat.input, "eps");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_while_editing() {
        let mut app = app();
        app.input_mode = InputMode::Editing;
        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, ctrl_c).await.unwrap();
        assert!(app.should_quit);
    }
}
