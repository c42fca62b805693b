//! Watchlist panel — selection checkboxes, verdicts, live job progress.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Gauge, Paragraph, Row, Table};
use ratatui::Frame;

use stockdash_core::slot::Slot;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let has_progress = app.progress.contains_key(&Slot::Watchlist)
        || app.progress.contains_key(&Slot::SingleTicker);

    let constraints = if has_progress {
        vec![Constraint::Length(3), Constraint::Min(1)]
    } else {
        vec![Constraint::Min(1)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut table_area = chunks[0];
    if has_progress {
        render_progress(f, chunks[0], app);
        table_area = chunks[1];
    }

    render_table(f, table_area, app);
}

fn render_progress(f: &mut Frame, area: Rect, app: &AppState) {
    let progress = app
        .progress
        .get(&Slot::Watchlist)
        .or_else(|| app.progress.get(&Slot::SingleTicker));
    let Some(slot_progress) = progress else {
        return;
    };
    let p = &slot_progress.progress;

    let label = format!(
        "{:?}: {}% ({}/{} stocks, {} ok, {} failed)",
        slot_progress.status, p.percentage, p.completed, p.total, p.successful, p.failed
    );
    let gauge = Gauge::default()
        .ratio(f64::from(p.percentage.min(100)) / 100.0)
        .label(label)
        .gauge_style(theme::accent());
    f.render_widget(gauge, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &AppState) {
    if app.watchlist.rows.is_empty() {
        let hint = if app.watchlist.loading {
            "Loading watchlist..."
        } else {
            "Watchlist is empty."
        };
        f.render_widget(Paragraph::new(hint).style(theme::muted()), area);
        return;
    }

    let header = Row::new(vec!["", "Symbol", "Name", "Verdict", "Score"])
        .style(theme::muted())
        .bottom_margin(1);

    let rows = app.watchlist.rows.iter().enumerate().map(|(i, row)| {
        let mark = if app.watch_selection.contains(&row.symbol) {
            "[x]"
        } else {
            "[ ]"
        };
        let verdict_text = match (&row.verdict, row.has_analysis) {
            (Some(v), _) => v.clone(),
            (None, false) => "not analyzed".to_string(),
            (None, true) => "-".to_string(),
        };
        let score_text = row
            .score
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "-".to_string());

        let cells = vec![
            Cell::from(mark),
            Cell::from(row.symbol.clone()),
            Cell::from(row.name.clone().unwrap_or_default()),
            Cell::from(Span::styled(
                verdict_text,
                theme::verdict(row.verdict.as_deref()),
            )),
            Cell::from(score_text),
        ];

        let table_row = Row::new(cells);
        if i == app.watchlist.cursor {
            table_row.style(theme::cursor_row())
        } else {
            table_row
        }
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Length(12),
        Constraint::Min(20),
        Constraint::Length(14),
        Constraint::Length(7),
    ];
    let mut table = Table::new(rows, widths).header(header);
    if app.watchlist.stale {
        table = table.footer(Row::new(vec![Line::from(Span::styled(
            "showing cached data, refreshing...",
            theme::warning(),
        ))]));
    }
    f.render_widget(table, area);
}
