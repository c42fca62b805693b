//! Color tokens for the dashboard — high-contrast terminal palette.

use ratatui::style::{Color, Modifier, Style};

use stockdash_client::types::StockStatus;

pub fn accent() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn positive() -> Style {
    Style::default().fg(Color::Green)
}

pub fn negative() -> Style {
    Style::default().fg(Color::Red)
}

pub fn warning() -> Style {
    Style::default().fg(Color::Yellow)
}

pub fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

pub fn cursor_row() -> Style {
    Style::default()
        .bg(Color::Rgb(40, 40, 48))
        .add_modifier(Modifier::BOLD)
}

/// Verdict coloring mirrors the verdict scale the backend emits.
pub fn verdict(verdict: Option<&str>) -> Style {
    match verdict {
        Some("Strong Buy") => positive().add_modifier(Modifier::BOLD),
        Some("Buy") => positive(),
        Some("Strong Sell") => negative().add_modifier(Modifier::BOLD),
        Some("Sell") => negative(),
        Some("Neutral") => Style::default().fg(Color::Gray),
        _ => muted(),
    }
}

pub fn stock_status(status: StockStatus) -> Style {
    match status {
        StockStatus::Pending => muted(),
        StockStatus::Analyzing => accent(),
        StockStatus::Completed => positive(),
        StockStatus::Failed => negative(),
    }
}
