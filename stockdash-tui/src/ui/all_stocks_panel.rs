//! All-stocks panel — filterable universe table with bulk-run progress.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::Span;
use ratatui::widgets::{Cell, Gauge, Paragraph, Row, Table};
use ratatui::Frame;

use stockdash_core::slot::Slot;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let has_progress = app.progress.contains_key(&Slot::AllStocks);

    let mut constraints = vec![Constraint::Length(1)]; // search line
    if has_progress {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_search(f, chunks[0], app);
    let table_area = if has_progress {
        render_progress(f, chunks[1], app);
        chunks[2]
    } else {
        chunks[1]
    };
    render_table(f, table_area, app);
}

fn render_search(f: &mut Frame, area: Rect, app: &AppState) {
    let style = if app.all_stocks.searching {
        theme::accent()
    } else {
        theme::muted()
    };
    let visible = app.visible_stocks().len();
    let total = app.all_stocks.stocks.len();
    let stale = if app.all_stocks.stale {
        "  [cached, refreshing...]"
    } else {
        ""
    };
    let text = format!(
        "/{}  ({visible} of {total} stocks, {} selected){stale}",
        app.all_stocks.search,
        app.stock_selection.len()
    );
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn render_progress(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(slot_progress) = app.progress.get(&Slot::AllStocks) else {
        return;
    };
    let p = &slot_progress.progress;

    let eta = p.eta.as_deref().unwrap_or("unknown");
    let label = format!(
        "{:?}: {}% ({}/{} analyzed, {} in flight, {} failed, {} pending) ETA: {eta}",
        slot_progress.status, p.percentage, p.completed, p.total, p.analyzing, p.failed, p.pending
    );
    let gauge = Gauge::default()
        .ratio(f64::from(p.percentage.min(100)) / 100.0)
        .label(label)
        .gauge_style(theme::accent());
    f.render_widget(gauge, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &AppState) {
    let visible = app.visible_stocks();
    if visible.is_empty() {
        let hint = if app.all_stocks.loading {
            "Loading all stocks..."
        } else if app.all_stocks.stocks.is_empty() {
            "No universe loaded — press 'i' to initialize."
        } else {
            "No stocks match the search."
        };
        f.render_widget(Paragraph::new(hint).style(theme::muted()), area);
        return;
    }

    let header = Row::new(vec![
        "", "Symbol", "Name", "Status", "Score", "Verdict", "Entry", "Target",
    ])
    .style(theme::muted())
    .bottom_margin(1);

    let rows = visible.iter().enumerate().map(|(i, stock)| {
        let mark = if app.stock_selection.contains(&stock.yahoo_symbol) {
            "[x]"
        } else {
            "[ ]"
        };
        let fmt_money = |v: Option<f64>| {
            v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".to_string())
        };

        let cells = vec![
            Cell::from(mark),
            Cell::from(stock.symbol.clone()),
            Cell::from(stock.name.clone()),
            Cell::from(Span::styled(
                format!("{:?}", stock.status).to_lowercase(),
                theme::stock_status(stock.status),
            )),
            Cell::from(
                stock
                    .score
                    .map(|s| format!("{s:.1}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::from(Span::styled(
                stock.verdict.clone().unwrap_or_else(|| "-".to_string()),
                theme::verdict(stock.verdict.as_deref()),
            )),
            Cell::from(fmt_money(stock.entry)),
            Cell::from(fmt_money(stock.target)),
        ];

        let table_row = Row::new(cells);
        if i == app.all_stocks.cursor {
            table_row.style(theme::cursor_row())
        } else {
            table_row
        }
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Length(10),
        Constraint::Min(18),
        Constraint::Length(10),
        Constraint::Length(7),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(9),
    ];
    f.render_widget(Table::new(rows, widths).header(header), area);
}
