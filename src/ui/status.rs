use crate::app::App;
use crate::keybindings::Action;
use ratatui::{layout::Rect, style::Style, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Actions advertised in the idle status bar, with their short labels.
const HINT_ACTIONS: [(Action, &str); 7] = [
    (Action::ToggleSelect, "select"),
    (Action::Expand, "open"),
    (Action::EnterFilter, "filter"),
    (Action::BulkDelete, "delete"),
    (Action::Reload, "reload"),
    (Action::ShowHelp, "help"),
    (Action::Quit, "quit"),
];

/// Status bar text, in priority order: filter prompt, running work, the
/// latest status message, then key hints. The flag marks error styling.
pub(super) fn status_text(app: &App) -> (Cow<'_, str>, bool) {
    if app.filter_mode {
        return (
            Cow::Owned(format!(
                "Filter: {}_  | ENTER apply | ESC cancel",
                app.filter_input
            )),
            false,
        );
    }
    if let Some((msg, _)) = &app.status_message {
        let is_error = msg.starts_with("Error") || msg.contains("failed");
        return (Cow::Borrowed(msg.as_ref()), is_error);
    }
    if app.loading {
        return (
            Cow::Owned(format!("Loading categories from {}...", app.source.describe())),
            false,
        );
    }
    if let Some(action) = app.bulk_in_flight {
        return (Cow::Owned(format!("Running bulk {}...", action.verb())), false);
    }
    if let Some(e) = &app.tree_error {
        return (Cow::Owned(format!("Hierarchy error: {}", e)), true);
    }

    let hints: Vec<String> = HINT_ACTIONS
        .iter()
        .filter_map(|(action, label)| {
            app.keybindings
                .key_hint(*action)
                .map(|key| format!("[{}]{}", key, label))
        })
        .collect();
    let position = if app.rows().is_empty() {
        String::new()
    } else {
        format!("{}/{}  ", app.cursor + 1, app.rows().len())
    };
    (Cow::Owned(format!("{}{}", position, hints.join(" "))), false)
}

/// Render the status bar
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let (text, is_error) = status_text(app);
    let style: Style = if is_error {
        app.theme.status_error
    } else if app.filter_mode {
        app.theme.status_bar.patch(app.theme.filter_prompt)
    } else {
        app.theme.status_bar
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}
