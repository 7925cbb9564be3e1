//! Keyboard input dispatch: global keys first, then text entry into the focused field.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::AppState;

pub fn handle_key(app: &mut AppState, key: KeyEvent, now: Instant) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.running = false,
            KeyCode::Char('u') => app.clear_field(now),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.running = false,
        KeyCode::Tab | KeyCode::Down => app.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.focus_prev(),
        KeyCode::Char(' ') => app.toggle_side(),
        KeyCode::Char('r') => app.apply_plan(),
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => app.type_char(c, now),
        KeyCode::Backspace => app.backspace(now),
        KeyCode::Delete => app.clear_field(now),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Focus, FOCUS_ORDER};
    use crate::persistence::PersistedState;
    use crossterm::event::KeyEventState;
    use sizelab_core::{MetricField, PositionType, SessionConfig};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> AppState {
        AppState::new(&PersistedState::default(), &SessionConfig::default())
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut a = app();
            handle_key(&mut a, press(code), Instant::now());
            assert!(!a.running);
        }
    }

    #[test]
    fn release_events_are_ignored() {
        let mut a = app();
        let key = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key(&mut a, key, Instant::now());
        assert!(a.running);
    }

    #[test]
    fn tab_and_backtab_move_focus() {
        let mut a = app();
        let start = a.focus_idx;
        handle_key(&mut a, press(KeyCode::Tab), Instant::now());
        assert_eq!(a.focus_idx, (start + 1) % FOCUS_ORDER.len());
        handle_key(&mut a, press(KeyCode::BackTab), Instant::now());
        assert_eq!(a.focus_idx, start);
    }

    #[test]
    fn space_toggles_side() {
        let mut a = app();
        handle_key(&mut a, press(KeyCode::Char(' ')), Instant::now());
        assert_eq!(a.form.side, PositionType::Short);
    }

    #[test]
    fn digits_reach_the_focused_metric() {
        let now = Instant::now();
        let mut a = app();
        assert_eq!(a.focus(), Focus::Metric(MetricField::Margin));
        handle_key(&mut a, press(KeyCode::Delete), now);
        for c in ['2', '.', '5', 'x'] {
            handle_key(&mut a, press(KeyCode::Char(c)), now);
        }
        assert_eq!(a.session.display(MetricField::Margin), "2.5");
        assert!(a.session.is_pending());
    }

    #[test]
    fn ctrl_u_clears_param_text() {
        let mut a = app();
        a.focus_idx = 0;
        handle_key(&mut a, KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL), Instant::now());
        assert!(a.form.entry.is_empty());
        assert!(a.running);
    }
}
