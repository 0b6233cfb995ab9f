//! Category table widget.
//!
//! Only the rows inside the viewport are turned into spans, so very large
//! catalogues render in constant time per frame.

use crate::app::{App, VisibleRow};
use crate::theme::ColorPalette;
use crate::tree::SelectionState;
use crate::util::{display_width, fit_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const MARKER_WIDTH: usize = 4;
const SLUG_WIDTH: usize = 22;
const STATUS_WIDTH: usize = 9;
const PRODUCTS_WIDTH: usize = 9;
const UPDATED_WIDTH: usize = 8;

/// Narrower than this, the slug column is dropped.
const SLUG_MIN_TABLE_WIDTH: usize = 72;

/// Format a timestamp relative to `now`: minutes, hours, days, then a date.
pub(super) fn format_relative_time(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = timestamp else {
        return String::new();
    };

    let diff = (now - ts).num_seconds();
    if diff < 0 {
        return "now".to_string();
    }
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }
    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }
    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }
    ts.format("%b %d").to_string()
}

/// Column widths for a table body of a given width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Columns {
    pub name: usize,
    pub slug: usize,
}

impl Columns {
    pub(super) fn for_width(width: usize) -> Self {
        let fixed = MARKER_WIDTH + STATUS_WIDTH + PRODUCTS_WIDTH + UPDATED_WIDTH;
        let slug = if width >= SLUG_MIN_TABLE_WIDTH {
            SLUG_WIDTH
        } else {
            0
        };
        Self {
            name: width.saturating_sub(fixed + slug).max(1),
            slug,
        }
    }
}

fn header_line(columns: Columns, palette: &ColorPalette) -> Line<'static> {
    let mut text = String::new();
    text.push_str(&fit_to_width("Sel", MARKER_WIDTH));
    text.push_str(&fit_to_width("Name", columns.name));
    if columns.slug > 0 {
        text.push_str(&fit_to_width("Slug", columns.slug));
    }
    text.push_str(&fit_to_width("Status", STATUS_WIDTH));
    text.push_str(&format!("{:>w$} ", "Products", w = PRODUCTS_WIDTH - 1));
    text.push_str(&fit_to_width("Updated", UPDATED_WIDTH));
    Line::from(Span::styled(text, palette.header))
}

/// Build one table line.
pub(super) fn row_line(
    row: &VisibleRow,
    state: SelectionState,
    is_cursor: bool,
    columns: Columns,
    palette: &ColorPalette,
    now: DateTime<Utc>,
) -> Line<'static> {
    let expander = match (row.has_children, row.is_expanded) {
        (true, true) => "▾ ",
        (true, false) => "▸ ",
        (false, _) => "  ",
    };

    // Guide and expander eat into the name column
    let lead = display_width(&row.guide) + display_width(expander);
    let name_width = columns.name.saturating_sub(lead);

    let name_style = if row.matched {
        palette.row_match
    } else if state == SelectionState::Selected {
        palette.row_selected
    } else if !row.is_active {
        palette.row_inactive
    } else {
        palette.row_normal
    };
    let (status_text, status_style) = if row.is_active {
        ("active", palette.status_active)
    } else {
        ("inactive", palette.status_inactive)
    };
    let products = row
        .product_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut spans = vec![
        Span::styled(
            fit_to_width(state.marker(), MARKER_WIDTH),
            palette.checkbox(state),
        ),
        Span::styled(row.guide.clone(), palette.guide),
        Span::styled(expander, palette.expander),
        Span::styled(fit_to_width(&row.name, name_width), name_style),
    ];
    if columns.slug > 0 {
        spans.push(Span::styled(
            fit_to_width(&row.slug, columns.slug),
            palette.column_slug,
        ));
    }
    spans.push(Span::styled(fit_to_width(status_text, STATUS_WIDTH), status_style));
    spans.push(Span::styled(
        format!("{:>w$} ", products, w = PRODUCTS_WIDTH - 1),
        palette.column_meta,
    ));
    spans.push(Span::styled(
        fit_to_width(&format_relative_time(row.updated_at, now), UPDATED_WIDTH),
        palette.column_meta,
    ));

    let line = Line::from(spans);
    if is_cursor {
        line.style(palette.row_cursor)
    } else {
        line
    }
}

fn title(app: &App) -> String {
    let mut title = format!(" Categories ({}) ", app.categories.len());
    if !app.filter.is_empty() {
        let query = app.filter.query.as_deref().unwrap_or("");
        title.push_str(&format!(
            "- filter '{}' status {} - {} matched ",
            query,
            app.filter.status.label(),
            app.view.matched
        ));
    }
    if !app.selected.is_empty() {
        title.push_str(&format!("- {} selected ", app.selected.len()));
    }
    title
}

/// Render the category table. Also records the viewport height on `app` so
/// paging and scrolling match what is on screen.
pub(super) fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.panel_border)
        .title(title(app));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height < 2 || inner.width < 1 {
        return;
    }

    let columns = Columns::for_width(inner.width as usize);
    app.viewport_height = (inner.height - 1) as usize;
    app.ensure_cursor_visible();

    let mut lines = Vec::with_capacity(inner.height as usize);
    lines.push(header_line(columns, &app.theme));

    if app.rows().is_empty() {
        let message = if app.loading {
            "Loading categories..."
        } else if !app.filter.is_empty() {
            "No categories match the filter"
        } else {
            "No categories"
        };
        lines.push(Line::from(Span::styled(message, app.theme.column_meta)));
    } else {
        let now = Utc::now();
        for index in app.visible_range() {
            let row = &app.rows()[index];
            lines.push(row_line(
                row,
                app.state_of(&row.id),
                index == app.cursor,
                columns,
                &app.theme,
                now,
            ));
        }
    }

    f.render_widget(Paragraph::new(lines).style(Style::default()), inner);
}
