//! Sizing fields: margin, cost, quantity, 1R, driven by the edit session.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use sizelab_core::{MetricField, SessionState};

use crate::app::{AppState, Focus};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let t = theme::theme();
    let state = app.session.state();
    let color = t.state_color(state);

    let caption = app.session.label().unwrap_or("Sizing");
    let suffix = match state {
        SessionState::Idle => "",
        SessionState::Editing(_) => " | editing",
        SessionState::MissingData => " | missing data",
        SessionState::Disabled => " | disabled",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(color))
        .title(format!(" {caption}{suffix} "))
        .title_style(theme::panel_title(color));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = MetricField::ALL
        .iter()
        .map(|&field| {
            let is_focused = app.focus() == Focus::Metric(field);
            let is_authority = app.session.authority() == Some(field);
            let value_style = match state {
                SessionState::MissingData | SessionState::Disabled => theme::muted(),
                _ if is_focused => theme::focused(),
                _ if is_authority => theme::warning(),
                _ => theme::accent(),
            };
            let marker = if is_authority { " *" } else { "" };
            Line::from(vec![
                Span::styled(format!(" {:>10}: ", field.label()), theme::muted()),
                Span::styled(app.session.display(field).to_string(), value_style),
                Span::styled(marker, theme::warning()),
            ])
        })
        .collect();

    lines.push(Line::raw(""));
    let footer = match state {
        SessionState::MissingData => {
            Span::styled(" Enter a valid entry, stop, and leverage to size the trade", theme::negative())
        }
        _ => Span::styled(
            format!(
                " Portfolio {:.2} | risk {:.2}% | commits {}",
                app.portfolio_value,
                app.r_percent * 100.0,
                app.commit_count()
            ),
            theme::muted(),
        ),
    };
    lines.push(Line::from(footer));

    f.render_widget(Paragraph::new(lines), inner);
}
