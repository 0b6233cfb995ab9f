//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, background task events, and periodic ticks.

use crate::app::{App, AppEvent};
use anyhow::Result;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::input::handle_input;
use super::render::render;

/// Quiet period after the last keystroke before the filter is re-applied.
pub(super) const FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

/// Result of handling a key press event.
pub enum Action {
    /// Keep running.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Runs the TUI application event loop.
///
/// Uses `tokio::select!` over:
/// - terminal input from crossterm's async event stream
/// - `AppEvent`s from load and bulk-action tasks
/// - a 250ms tick for status expiry and the debounced filter
///
/// A panic hook restores the terminal before unwinding.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    // Install panic hook BEFORE setting up terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

    // On non-Unix platforms these become pending futures that never complete
    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        if app.clear_expired_status() {
            app.needs_redraw = true;
        }

        // Drain pending task results so a reload is shown even during rapid input
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            handle_app_event(app, event, &event_tx);
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        app.needs_redraw = true;
                        match handle_input(app, key.code, key.modifiers, &event_tx) {
                            Ok(Action::Quit) => break,
                            Ok(Action::Continue) => {}
                            Err(e) => app.set_status(format!("Error: {}", e)),
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event, &event_tx);
            }

            _ = tick_interval.tick() => {
                handle_tick(app);
            }
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

/// Apply the typed filter once the user has paused typing.
pub(super) fn handle_tick(app: &mut App) {
    if !app.filter_mode {
        return;
    }
    if let Some(last_keystroke) = app.filter_debounce {
        if last_keystroke.elapsed() >= FILTER_DEBOUNCE {
            app.filter_debounce = None;
            let query = app.filter_input.clone();
            app.set_filter_query(&query);
            tracing::debug!(query = %query, matched = app.view.matched, "Applied debounced filter");
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::CategorySource;
    use crate::config::Config;
    use crate::tree::Category;
    use std::path::PathBuf;
    use tokio::time::{self, Instant};

    fn filtering_app() -> App {
        let mut app = App::new(
            CategorySource::File(PathBuf::from("/nonexistent.json")),
            &Config::default(),
        );
        app.viewport_height = 10;
        app.set_categories(vec![
            Category::new("1", None, "Garden"),
            Category::new("2", Some("1"), "Tools"),
            Category::new("3", None, "Kitchen"),
        ]);
        app
    }

    #[tokio::test]
    async fn test_tick_waits_for_debounce() {
        time::pause();
        let mut app = filtering_app();
        app.filter_mode = true;
        app.filter_input = "tools".to_string();
        app.filter_debounce = Some(Instant::now());

        handle_tick(&mut app);
        assert!(app.filter.query.is_none());

        time::advance(FILTER_DEBOUNCE).await;
        handle_tick(&mut app);
        assert_eq!(app.filter.query.as_deref(), Some("tools"));
        assert!(app.filter_debounce.is_none());
        assert_eq!(app.view.matched, 1);
    }

    #[tokio::test]
    async fn test_tick_ignored_outside_filter_mode() {
        time::pause();
        let mut app = filtering_app();
        app.filter_input = "tools".to_string();
        app.filter_debounce = Some(Instant::now());
        time::advance(FILTER_DEBOUNCE).await;

        handle_tick(&mut app);
        assert!(app.filter.query.is_none());
    }
}
