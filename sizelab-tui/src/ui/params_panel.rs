//! Trade parameter form: entry, stop, leverage, side.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use sizelab_core::plan;

use crate::app::{AppState, Focus, ParamField};
use crate::theme;

const ROWS: [ParamField; 4] =
    [ParamField::Entry, ParamField::Stop, ParamField::Leverage, ParamField::Side];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let t = theme::theme();
    let color = if matches!(app.focus(), Focus::Param(_)) { t.accent } else { t.muted };
    let params = app.form.to_parameters();

    let max_leverage = params
        .is_valid()
        .then(|| plan::max_leverage_for_stop(&params, plan::DEFAULT_LEVERAGE_CAP));
    let title = match max_leverage {
        Some(max) => format!(
            " Parameters | risk/unit {:.4} | max {max}x ",
            params.risk_per_unit()
        ),
        None => " Parameters ".to_string(),
    };
    let over_leveraged = max_leverage.is_some_and(|max| params.leverage > max as f64);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(color))
        .title(title)
        .title_style(theme::panel_title(color));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<Line> = ROWS
        .iter()
        .map(|&field| {
            let is_focused = app.focus() == Focus::Param(field);
            let value_style = if is_focused {
                theme::focused()
            } else if field == ParamField::Side {
                Style::default().fg(t.side_color(app.form.side))
            } else if field == ParamField::Leverage && over_leveraged {
                theme::warning()
            } else {
                theme::text()
            };
            let cursor = if is_focused && field != ParamField::Side { "_" } else { "" };
            Line::from(vec![
                Span::styled(format!(" {:>10}: ", field.label()), theme::muted()),
                Span::styled(format!("{}{cursor}", app.form.text(field)), value_style),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}
