use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, DIFF_PAGE};

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),

        KeyCode::Char('l') | KeyCode::Right => app.expand_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Enter => app.toggle_selected(),
        KeyCode::Char('d') => app.show_diff_selected(),
        KeyCode::Char('r') => app.retry_selected(),

        KeyCode::Char('J') => app.diff.scroll_down(1),
        KeyCode::Char('K') => app.diff.scroll_up(1),
        KeyCode::PageDown => app.diff.scroll_down(DIFF_PAGE),
        KeyCode::PageUp => app.diff.scroll_up(DIFF_PAGE),

        KeyCode::Esc => app.clear_status_message(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::tests::PlainRenderer;
    use crate::source::memory::MemorySource;
    use crate::theme;
    use crate::tree::node::{Node, NodeId};
    use crate::tree::policy::ExpansionPolicy;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(
            Arc::new(MemorySource::default()),
            ExpansionPolicy::default(),
            Box::new(PlainRenderer),
            theme::dark_theme(),
            false,
            tx,
        );
        app.controller
            .load_initial(vec![
                Node::dir("/a", 2, 2).with_children(vec![Node::file("/a/1"), Node::dir("/a/d", 0, 0)]),
                Node::file("/b"),
            ])
            .unwrap();
        app.view.rebuild(&app.controller);
        app
    }

    #[test]
    fn quit_keys() {
        let mut app = loaded_app();
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = loaded_app();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn plain_c_does_not_quit() {
        let mut app = loaded_app();
        handle_key_event(&mut app, press(KeyCode::Char('c')));
        assert!(!app.should_quit);
    }

    #[test]
    fn movement_keys() {
        let mut app = loaded_app();
        handle_key_event(&mut app, press(KeyCode::Char('j')));
        assert_eq!(app.view.selected_index, 1);
        handle_key_event(&mut app, press(KeyCode::Down));
        assert_eq!(app.view.selected_index, 2);
        handle_key_event(&mut app, press(KeyCode::Char('k')));
        assert_eq!(app.view.selected_index, 1);
        handle_key_event(&mut app, press(KeyCode::Char('G')));
        assert_eq!(app.view.selected_id(), Some(&NodeId::from("/b")));
        handle_key_event(&mut app, press(KeyCode::Char('g')));
        assert_eq!(app.view.selected_index, 0);
    }

    #[test]
    fn h_collapses_then_l_reopens_without_fetch() {
        let mut app = loaded_app();
        handle_key_event(&mut app, press(KeyCode::Char('h')));
        assert_eq!(app.view.flat_items.len(), 2);
        handle_key_event(&mut app, press(KeyCode::Right));
        assert_eq!(app.view.flat_items.len(), 4);
        assert_eq!(app.controller.in_flight_count(), 0);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = loaded_app();
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        handle_key_event(&mut app, key);
        assert!(!app.should_quit);
    }
}
