//! Top-level UI layout — active panel plus a one-line status bar.

pub mod all_stocks_panel;
pub mod status_bar;
pub mod watchlist_panel;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, Panel};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    // Split: main area + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    draw_panel(f, chunks[0], app);
    status_bar::render(f, chunks[1], app);

    if app.show_errors {
        render_error_history(f, chunks[0], app);
    }
}

/// Draw the active panel with its border.
fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} ", panel.label()))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match panel {
        Panel::Watchlist => watchlist_panel::render(f, inner, app),
        Panel::AllStocks => all_stocks_panel::render(f, inner, app),
    }
}

/// Error history overlay, newest last.
fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(70, 60, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::warning())
        .title(format!(" Errors ({}) ", app.errors.len()));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let lines: Vec<Line> = if app.errors.is_empty() {
        vec![Line::styled("no errors this session", theme::muted())]
    } else {
        let skip = app.errors.len().saturating_sub(inner.height as usize);
        app.errors
            .iter()
            .skip(skip)
            .map(|e| {
                Line::styled(
                    format!(
                        "{} [{}] {}",
                        e.timestamp.format("%H:%M:%S"),
                        e.context,
                        e.message
                    ),
                    theme::negative(),
                )
            })
            .collect()
    };
    f.render_widget(Paragraph::new(lines), inner);
}

/// Compute a centered rect for overlays.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
