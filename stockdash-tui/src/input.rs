//! Keyboard input dispatch — global keys, then panel-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use stockdash_core::slot::Slot;

use crate::app::{AppState, Panel};
use crate::worker::WorkerCommand;

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // Search input consumes keys first.
    if app.all_stocks.searching {
        handle_search_key(app, key);
        return;
    }

    // Error history overlay consumes keys while open.
    if app.show_errors {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e')) {
            app.show_errors = false;
        }
        return;
    }

    // Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('e') => {
            app.show_errors = true;
            return;
        }
        KeyCode::Char('x') => {
            let slot = app.active_panel.slot();
            app.send(WorkerCommand::Cancel { slot });
            return;
        }
        KeyCode::Char('1') => {
            app.active_panel = Panel::Watchlist;
            return;
        }
        KeyCode::Char('2') => {
            app.active_panel = Panel::AllStocks;
            return;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.active_panel = app.active_panel.next();
            return;
        }
        KeyCode::Char('r') => {
            match app.active_panel {
                Panel::Watchlist => app.send(WorkerCommand::RefreshWatchlist),
                Panel::AllStocks => app.send(WorkerCommand::RefreshAllStocks),
            }
            return;
        }
        _ => {}
    }

    match app.active_panel {
        Panel::Watchlist => handle_watchlist_key(app, key),
        Panel::AllStocks => handle_all_stocks_key(app, key),
    }
}

fn handle_watchlist_key(app: &mut AppState, key: KeyEvent) {
    let row_count = app.watchlist.rows.len();
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
            if row_count > 0 {
                app.watchlist.cursor = (app.watchlist.cursor + 1).min(row_count - 1);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.watchlist.cursor = app.watchlist.cursor.saturating_sub(1);
        }
        KeyCode::Char(' ') => {
            if let Some(row) = app.watchlist.rows.get(app.watchlist.cursor) {
                let symbol = row.symbol.clone();
                app.watch_selection.toggle(&symbol);
            }
        }
        KeyCode::Char('a') => {
            let symbols: Vec<String> =
                app.watchlist.rows.iter().map(|r| r.symbol.clone()).collect();
            app.watch_selection.select_all(symbols);
        }
        KeyCode::Char('n') => app.watch_selection.clear(),
        KeyCode::Enter => {
            if app.watch_selection.is_empty() {
                app.set_warning("select at least one stock to analyze");
                return;
            }
            let tickers = app.watch_selection.to_sorted_vec();
            app.send(WorkerCommand::Submit {
                slot: Slot::Watchlist,
                tickers,
            });
        }
        KeyCode::Char('d') => {
            if let Some(row) = app.watchlist.rows.get(app.watchlist.cursor) {
                let symbol = row.symbol.clone();
                app.send(WorkerCommand::RemoveStock { symbol });
            }
        }
        _ => {}
    }
}

fn handle_all_stocks_key(app: &mut AppState, key: KeyEvent) {
    let row_count = app.visible_stocks().len();
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
            if row_count > 0 {
                app.all_stocks.cursor = (app.all_stocks.cursor + 1).min(row_count - 1);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.all_stocks.cursor = app.all_stocks.cursor.saturating_sub(1);
        }
        KeyCode::Char('/') => {
            app.all_stocks.searching = true;
        }
        KeyCode::Char(' ') => {
            let symbol = app
                .visible_stocks()
                .get(app.all_stocks.cursor)
                .map(|s| s.yahoo_symbol.clone());
            if let Some(symbol) = symbol {
                app.stock_selection.toggle(&symbol);
            }
        }
        // Select-all is scoped to the filtered rows only.
        KeyCode::Char('a') => {
            let visible = app.visible_symbols();
            app.stock_selection.select_all(visible);
        }
        KeyCode::Char('n') => app.stock_selection.clear(),
        KeyCode::Enter => {
            if app.stock_selection.is_empty() {
                app.set_warning("select at least one stock to analyze");
                return;
            }
            let tickers = app.stock_selection.to_sorted_vec();
            app.send(WorkerCommand::Submit {
                slot: Slot::AllStocks,
                tickers,
            });
        }
        // Analyze the full universe: empty symbol list means "all".
        KeyCode::Char('A') => {
            app.send(WorkerCommand::Submit {
                slot: Slot::AllStocks,
                tickers: Vec::new(),
            });
        }
        KeyCode::Char('i') => app.send(WorkerCommand::InitializeAllStocks),
        _ => {}
    }
}

fn handle_search_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.all_stocks.searching = false;
        }
        KeyCode::Backspace => {
            app.all_stocks.search.pop();
            app.all_stocks.cursor = 0;
        }
        KeyCode::Char(c) => {
            app.all_stocks.search.push(c);
            app.all_stocks.cursor = 0;
        }
        _ => {}
    }
}
