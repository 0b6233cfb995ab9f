//! Help overlay: scrollable keybinding table.
//!
//! Shows the live bindings, including config overrides, grouped by context.

use crate::app::App;
use crate::keybindings::Context;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

use super::helpers::centered_rect;

/// Context display order for the help screen.
const CONTEXT_ORDER: [Context; 2] = [Context::Global, Context::Tree];

/// Keys of the filter prompt. These are fixed rather than rebindable.
const FILTER_KEYS: [(&str, &str); 3] = [
    ("Enter", "Apply the filter"),
    ("Esc", "Cancel and drop the text filter"),
    ("Backspace", "Delete the last character"),
];

/// Section title row. The label goes in the wide action column so the
/// narrow key column never clips it.
fn section_header(label: &str, style: Style) -> Row<'static> {
    Row::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("-- {} --", label),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ])
    .style(style)
}

/// Render the help overlay on top of the table.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    let overlay = centered_rect(80, 80, area);
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let bindings = app.keybindings.all_bindings();
    let mut rows: Vec<Row> = Vec::new();

    for ctx in CONTEXT_ORDER {
        let ctx_bindings: Vec<_> = bindings.iter().filter(|(c, _, _, _)| *c == ctx).collect();
        if ctx_bindings.is_empty() {
            continue;
        }

        rows.push(section_header(ctx.label(), app.theme.header));
        for (_, key_str, _action, description) in ctx_bindings {
            rows.push(Row::new(vec![
                format!("  {}", key_str),
                description.to_string(),
            ]));
        }
        rows.push(Row::new(vec![String::new(), String::new()]));
    }

    rows.push(section_header("Filter prompt", app.theme.header));
    for (key, description) in FILTER_KEYS {
        rows.push(Row::new(vec![format!("  {}", key), description.to_string()]));
    }

    let total_rows = rows.len();

    // -2 border -1 header
    let visible_height = overlay.height.saturating_sub(3) as usize;
    let max_scroll = total_rows.saturating_sub(visible_height);
    let scroll = app.help_scroll_offset.min(max_scroll);
    let visible_rows: Vec<Row> = rows.into_iter().skip(scroll).take(visible_height).collect();

    let title = if max_scroll > 0 {
        format!(
            " Help ({}/{}) ",
            scroll.saturating_add(1),
            max_scroll.saturating_add(1)
        )
    } else {
        " Help (? to close) ".to_string()
    };

    let widths = [Constraint::Length(16), Constraint::Min(20)];

    let table = Table::new(visible_rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.overlay_border)
                .title(title),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                )
                .bottom_margin(1),
        )
        .style(app.theme.row_normal);

    f.render_widget(table, overlay);

    if max_scroll > 0 && scroll < max_scroll {
        let hint = Line::from(vec![Span::styled(
            " j/k to scroll, ? or Esc to close ",
            app.theme.column_meta,
        )]);
        let hint_area = Rect {
            x: overlay.x + 1,
            y: overlay.y + overlay.height.saturating_sub(1),
            width: overlay.width.saturating_sub(2),
            height: 1,
        };
        f.render_widget(Paragraph::new(hint), hint_area);
    }
}
