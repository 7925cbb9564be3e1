//! Top-level UI layout: parameter form, sizing fields, status bar.

pub mod params_panel;
pub mod sizing_panel;
pub mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::app::AppState;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    // Split: form + sizing + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(7), Constraint::Length(1)])
        .split(f.area());

    params_panel::render(f, chunks[0], app);
    sizing_panel::render(f, chunks[1], app);
    status_bar::render(f, chunks[2], app);
}
