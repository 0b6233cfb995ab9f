//! Background task spawning shared by the input and event handlers.

use crate::api::BulkAction;
use crate::app::{App, AppEvent};
use crate::tree::CategoryId;
use futures::FutureExt;
use ratatui::layout::Rect;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Run a future, converting a panic inside it into an error message.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic payload".to_string()
            }
        })
}

/// Start (or restart) loading the category list.
///
/// A previous load still in flight is aborted; its generation no longer
/// matches, so a late result is ignored as well.
pub(super) fn spawn_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(handle) = app.load_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous category load");
    }

    app.load_generation = app.load_generation.wrapping_add(1);
    let generation = app.load_generation;
    app.loading = true;

    let source = Arc::clone(&app.source);
    let tx = event_tx.clone();
    tracing::debug!(generation, source = %source.describe(), "Spawning category load");

    app.load_handle = Some(tokio::spawn(async move {
        let tx_panic = tx.clone();
        let outcome = catch_task_panic(async {
            let event = match source.fetch().await {
                Ok(categories) => AppEvent::CategoriesLoaded {
                    generation,
                    categories,
                },
                Err(e) => {
                    let error = format!("{:#}", e);
                    tracing::error!(error = %error, "Category load failed");
                    AppEvent::LoadFailed { generation, error }
                }
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, event = "CategoriesLoaded", "Channel send failed (receiver dropped)");
            }
        })
        .await;

        if let Err(panic_msg) = outcome {
            tracing::error!(task = "load_categories", error = %panic_msg, "Background task panicked");
            let _ = tx_panic
                .send(AppEvent::TaskPanicked {
                    task: "load_categories",
                    error: panic_msg,
                })
                .await;
        }
    }));
}

/// Send a bulk request for `ids` in the background.
///
/// Refused when the list came from a file, or while another bulk request
/// is still running.
pub(super) fn spawn_bulk_action(
    app: &mut App,
    action: BulkAction,
    ids: Vec<CategoryId>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(client) = app.source.client() else {
        app.set_status("Bulk actions need an API connection (--api-url)");
        return;
    };
    if let Some(running) = app.bulk_in_flight {
        app.set_status(format!("A bulk {} is still running", running.verb()));
        return;
    }

    app.bulk_in_flight = Some(action);
    app.set_status(format!(
        "Sending {} for {} categories...",
        action.verb(),
        ids.len()
    ));
    tracing::info!(action = action.verb(), count = ids.len(), "Spawning bulk action");

    let tx = event_tx.clone();
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        let outcome = catch_task_panic(async {
            let event = match client.bulk_action(action, &ids).await {
                Ok(outcome) => AppEvent::BulkActionComplete(outcome),
                Err(e) => {
                    tracing::error!(error = %e, action = action.verb(), "Bulk action failed");
                    AppEvent::BulkActionFailed {
                        action,
                        error: e.to_string(),
                    }
                }
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, event = "BulkAction", "Channel send failed (receiver dropped)");
            }
        })
        .await;

        if let Err(panic_msg) = outcome {
            tracing::error!(task = "bulk_action", error = %panic_msg, "Background task panicked");
            let _ = tx_panic
                .send(AppEvent::TaskPanicked {
                    task: "bulk_action",
                    error: panic_msg,
                })
                .await;
        }
    });
}

/// A rectangle covering the given percentage of `area`, centered in it.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// A fixed-size rectangle centered in `area`, shrunk to leave a margin.
pub(super) fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_message() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        assert_eq!(centered_rect(80, 80, area), Rect::new(10, 5, 80, 40));
        assert_eq!(centered_box(50, 7, area), Rect::new(25, 21, 50, 7));
    }
}
