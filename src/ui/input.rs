//! Input handling for the TUI.
//!
//! Overlays capture keys first (help, then the confirm dialog), then the
//! filter prompt, then the keybinding registry for the category table.

use crate::api::BulkAction;
use crate::app::{App, AppEvent, ConfirmAction};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::util::MAX_FILTER_QUERY_LENGTH;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::helpers::{spawn_bulk_action, spawn_load};
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if app.show_help {
        return Ok(handle_help_input(app, code));
    }

    if app.pending_confirm.is_some() {
        return Ok(handle_confirm_input(app, code, event_tx));
    }

    if app.filter_mode {
        return Ok(handle_filter_input(app, code));
    }

    handle_tree_input(app, code, modifiers, event_tx)
}

/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

fn handle_confirm_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(ConfirmAction::BulkDelete { ids }) = app.pending_confirm.take() {
                spawn_bulk_action(app, BulkAction::Delete, ids, event_tx);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_confirm = None;
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Action::Continue
}

/// Typing in the filter prompt.
///
/// Each edit restarts the debounce timer; the tick handler applies the query
/// once typing pauses. Enter applies it at once, Esc drops the text query.
fn handle_filter_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc => {
            app.filter_debounce = None;
            app.filter_mode = false;
            app.filter_input.clear();
            app.set_filter_query("");
        }
        KeyCode::Enter => {
            // Clear before applying so the tick handler cannot re-run it
            app.filter_debounce = None;
            app.filter_mode = false;
            let query = app.filter_input.clone();
            app.set_filter_query(&query);
            if app.filter.query.is_some() {
                app.set_status(format!("{} matching categories", app.view.matched));
            }
        }
        KeyCode::Backspace => {
            app.filter_input.pop();
            app.filter_debounce = Some(Instant::now());
        }
        KeyCode::Char(c) => {
            if app.filter_input.len() >= MAX_FILTER_QUERY_LENGTH {
                app.set_status(format!(
                    "Filter at max length ({} chars)",
                    MAX_FILTER_QUERY_LENGTH
                ));
                return Action::Continue;
            }
            app.filter_input.push(c);
            app.filter_debounce = Some(Instant::now());
        }
        _ => {}
    }
    Action::Continue
}

fn handle_tree_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Tree)
    else {
        return Ok(Action::Continue);
    };

    match action {
        KbAction::Quit => return Ok(Action::Quit),
        KbAction::Back => {
            if !app.filter.is_empty() {
                app.clear_filter();
                app.set_status("Filter cleared");
            }
        }
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        KbAction::CycleTheme => {
            let name = app.cycle_theme();
            app.set_status(format!("Theme: {}", name));
        }
        KbAction::Reload => {
            if app.loading {
                app.set_status("Already loading...");
            } else {
                app.set_status("Reloading categories...");
                spawn_load(app, event_tx);
            }
        }

        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::PageDown => app.page_down(),
        KbAction::PageUp => app.page_up(),
        KbAction::JumpTop => app.jump_top(),
        KbAction::JumpBottom => app.jump_bottom(),

        KbAction::Expand => app.expand_current(),
        KbAction::Collapse => app.collapse_current(),
        KbAction::ToggleExpand => app.toggle_expand_current(),
        KbAction::ExpandAll => app.expand_all(),
        KbAction::CollapseAll => app.collapse_all(),

        KbAction::ToggleSelect => app.toggle_select_current(),
        KbAction::SelectAll => app.select_all(),
        KbAction::SelectNone => {
            app.select_none();
            app.set_status("Selection cleared");
        }

        KbAction::EnterFilter => {
            app.filter_mode = true;
            app.filter_input = app.filter.query.clone().unwrap_or_default();
            app.filter_debounce = None;
        }
        KbAction::CycleStatusFilter => {
            let status = app.cycle_status_filter();
            app.set_status(format!("Status filter: {}", status.label()));
        }
        KbAction::ClearFilter => {
            app.clear_filter();
            app.set_status("Filter cleared");
        }

        KbAction::BulkDelete => {
            let ids = app.selected_ids();
            if ids.is_empty() {
                app.set_status("Nothing selected");
            } else if app.source.client().is_none() {
                app.set_status("Bulk actions need an API connection (--api-url)");
            } else {
                app.pending_confirm = Some(ConfirmAction::BulkDelete { ids });
            }
        }
        KbAction::BulkActivate => start_bulk(app, BulkAction::Activate, event_tx),
        KbAction::BulkDeactivate => start_bulk(app, BulkAction::Deactivate, event_tx),
    }
    Ok(Action::Continue)
}

fn start_bulk(app: &mut App, action: BulkAction, event_tx: &mpsc::Sender<AppEvent>) {
    let ids = app.selected_ids();
    if ids.is_empty() {
        app.set_status("Nothing selected");
        return;
    }
    spawn_bulk_action(app, action, ids, event_tx);
}
