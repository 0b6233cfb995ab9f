//! Background task event processing.

use crate::api::BulkAction;
use crate::app::{App, AppEvent};
use tokio::sync::mpsc;

use super::helpers::spawn_load;

/// Apply the result of a background task to the app state.
pub(super) fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::CategoriesLoaded {
            generation,
            categories,
        } => {
            if generation != app.load_generation {
                tracing::debug!(
                    generation,
                    current = app.load_generation,
                    "Ignoring stale category load"
                );
                return;
            }
            app.loading = false;
            app.load_handle = None;

            let count = categories.len();
            app.set_categories(categories);
            tracing::info!(count, rows = app.rows().len(), "Categories loaded");

            match &app.tree_error {
                Some(e) => app.set_status(format!("Loaded {} categories ({})", count, e)),
                None => app.set_status(format!("Loaded {} categories", count)),
            }
        }
        AppEvent::LoadFailed { generation, error } => {
            if generation != app.load_generation {
                return;
            }
            app.loading = false;
            app.load_handle = None;
            app.set_status(format!("Load failed: {}", error));
        }
        AppEvent::BulkActionComplete(outcome) => {
            app.bulk_in_flight = None;
            tracing::info!(
                action = outcome.action.verb(),
                requested = outcome.requested,
                affected = outcome.affected,
                "Bulk action complete"
            );
            if outcome.action == BulkAction::Delete {
                app.select_none();
            }
            app.set_status(format!(
                "{} {} of {} categories",
                outcome.action.past_tense(),
                outcome.affected,
                outcome.requested
            ));
            // Pick up the backend's view of what changed
            spawn_load(app, event_tx);
        }
        AppEvent::BulkActionFailed { action, error } => {
            app.bulk_in_flight = None;
            app.set_status(format!("Bulk {} failed: {}", action.verb(), error));
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task = task, error = %error, "Background task panicked");
            match task {
                "load_categories" => {
                    app.loading = false;
                    app.load_handle = None;
                }
                "bulk_action" => app.bulk_in_flight = None,
                _ => {}
            }
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}
