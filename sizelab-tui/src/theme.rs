//! Neon-on-charcoal palette and the style helpers the panels draw with.
//!
//! # Color Palette
//! - **Accent**: electric cyan (focus, committed values)
//! - **Positive**: neon green (long)
//! - **Negative**: hot pink (short, invalid input)
//! - **Warning**: neon orange (pending edits, status warnings)
//! - **Muted**: steel blue (hints, disabled fields)

use ratatui::style::{Color, Modifier, Style};

use sizelab_core::{PositionType, SessionState};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub muted: Color,
    pub text_primary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        THEME
    }
}

impl Theme {
    pub fn side_color(&self, side: PositionType) -> Color {
        match side {
            PositionType::Long => self.positive,
            PositionType::Short => self.negative,
        }
    }

    /// Color of the sizing panel border for a session state.
    pub fn state_color(&self, state: SessionState) -> Color {
        match state {
            SessionState::Idle => self.accent,
            SessionState::Editing(_) => self.warning,
            SessionState::MissingData => self.negative,
            SessionState::Disabled => self.muted,
        }
    }
}

const THEME: Theme = Theme {
    background: Color::Rgb(18, 18, 20),
    accent: Color::Rgb(0, 255, 255),
    positive: Color::Rgb(0, 255, 128),
    negative: Color::Rgb(255, 20, 147),
    warning: Color::Rgb(255, 140, 0),
    muted: Color::Rgb(100, 149, 237),
    text_primary: Color::White,
};

pub fn theme() -> Theme {
    THEME
}

pub fn accent() -> Style {
    Style::default().fg(THEME.accent)
}

pub fn muted() -> Style {
    Style::default().fg(THEME.muted)
}

pub fn warning() -> Style {
    Style::default().fg(THEME.warning)
}

pub fn negative() -> Style {
    Style::default().fg(THEME.negative)
}

pub fn text() -> Style {
    Style::default().fg(THEME.text_primary)
}

/// Row highlight for the input under the cursor.
pub fn focused() -> Style {
    Style::default()
        .fg(THEME.background)
        .bg(THEME.accent)
        .add_modifier(Modifier::BOLD)
}

pub fn panel_border(color: Color) -> Style {
    Style::default().fg(color)
}

pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
