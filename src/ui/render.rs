//! Frame layout and overlay dispatch.

use crate::app::{App, ConfirmAction};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::helpers::centered_box;
use super::{help, status, tree_table};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 50;
pub(super) const MIN_HEIGHT: u16 = 8;

/// Main render function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    tree_table::render(f, app, chunks[0]);
    status::render(f, app, chunks[1]);

    if app.show_help {
        help::render(f, app);
    }

    if let Some(ref confirm) = app.pending_confirm {
        render_confirm_overlay(f, app, confirm);
    }
}

/// Render the confirmation dialog centered on screen.
fn render_confirm_overlay(f: &mut Frame, app: &App, confirm: &ConfirmAction) {
    let area = f.area();

    let (headline, detail) = match confirm {
        ConfirmAction::BulkDelete { ids } => (
            format!("Delete {} selected categories?", ids.len()),
            "This cannot be undone.",
        ),
    };

    let overlay = centered_box(50, 7, area);
    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let lines = vec![
        Line::from(Span::styled(headline, app.theme.confirm_warning)),
        Line::from(""),
        Line::from(detail),
        Line::from(""),
        Line::from("(y) Confirm  (n/Esc) Cancel"),
    ];
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.overlay_border)
                .title(" Confirm "),
        )
        .alignment(Alignment::Center)
        .style(app.theme.row_normal);

    f.render_widget(paragraph, overlay);
}
