//! Theme system for the TUI.
//!
//! `ThemeVariant` picks a palette; `ColorPalette` maps every semantic role of
//! the category table to a ratatui `Style`.

use ratatui::style::{Color, Modifier, Style};

use crate::tree::SelectionState;

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// Styles for every visual element of the category table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    // -- Table rows --
    pub header: Style,
    pub row_normal: Style,
    pub row_cursor: Style,
    pub row_selected: Style,
    pub row_inactive: Style,
    pub row_match: Style,

    // -- Row decorations --
    pub guide: Style,
    pub expander: Style,
    pub checkbox_selected: Style,
    pub checkbox_partial: Style,
    pub checkbox_empty: Style,
    pub column_slug: Style,
    pub column_meta: Style,
    pub status_active: Style,
    pub status_inactive: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub status_error: Style,
    pub filter_prompt: Style,
    pub panel_border: Style,
    pub overlay_border: Style,
    pub confirm_warning: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            row_normal: Style::default(),
            row_cursor: Style::default().bg(Color::DarkGray).fg(Color::White),
            row_selected: Style::default().fg(Color::LightGreen),
            row_inactive: Style::default().fg(Color::Gray),
            row_match: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),

            guide: Style::default().fg(Color::DarkGray),
            expander: Style::default().fg(Color::Cyan),
            checkbox_selected: Style::default().fg(Color::Green),
            checkbox_partial: Style::default().fg(Color::Yellow),
            checkbox_empty: Style::default().fg(Color::DarkGray),
            column_slug: Style::default().fg(Color::Cyan),
            column_meta: Style::default().fg(Color::DarkGray),
            status_active: Style::default().fg(Color::Green),
            status_inactive: Style::default().fg(Color::Red),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            filter_prompt: Style::default().fg(Color::Yellow),
            panel_border: Style::default(),
            overlay_border: Style::default().fg(Color::Cyan),
            confirm_warning: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        }
    }

    fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            row_normal: Style::default().fg(Color::Black),
            row_cursor: Style::default().bg(Color::Blue).fg(Color::White),
            row_selected: Style::default().fg(Color::Green),
            row_inactive: Style::default().fg(Color::DarkGray),
            row_match: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),

            guide: Style::default().fg(Color::Gray),
            expander: Style::default().fg(Color::Blue),
            checkbox_selected: Style::default().fg(Color::Green),
            checkbox_partial: Style::default().fg(Color::Magenta),
            checkbox_empty: Style::default().fg(Color::DarkGray),
            column_slug: Style::default().fg(Color::Blue),
            column_meta: Style::default().fg(Color::DarkGray),
            status_active: Style::default().fg(Color::Green),
            status_inactive: Style::default().fg(Color::Red),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            filter_prompt: Style::default().fg(Color::Magenta),
            panel_border: Style::default().fg(Color::DarkGray),
            overlay_border: Style::default().fg(Color::Blue),
            confirm_warning: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Style of a tri-state checkbox marker.
    pub fn checkbox(&self, state: SelectionState) -> Style {
        match state {
            SelectionState::Selected => self.checkbox_selected,
            SelectionState::Indeterminate => self.checkbox_partial,
            SelectionState::Unselected => self.checkbox_empty,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_cursor_row_is_highlighted() {
        let palette = ThemeVariant::Dark.palette();
        assert_eq!(
            palette.row_cursor,
            Style::default().bg(Color::DarkGray).fg(Color::White)
        );
    }

    #[test]
    fn light_palette_differs_from_dark() {
        let dark = ThemeVariant::Dark.palette();
        let light = ThemeVariant::Light.palette();
        assert_ne!(dark.row_cursor, light.row_cursor);
        assert_ne!(dark.status_bar, light.status_bar);
    }

    #[test]
    fn checkbox_style_follows_state() {
        let palette = ThemeVariant::Dark.palette();
        assert_eq!(
            palette.checkbox(SelectionState::Selected),
            palette.checkbox_selected
        );
        assert_eq!(
            palette.checkbox(SelectionState::Indeterminate),
            palette.checkbox_partial
        );
        assert_eq!(
            palette.checkbox(SelectionState::Unselected),
            palette.checkbox_empty
        );
    }

    #[test]
    fn variant_from_str_name() {
        assert_eq!(ThemeVariant::from_str_name("dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name("LIGHT"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("neon"), None);
    }

    #[test]
    fn variant_cycles() {
        assert_eq!(ThemeVariant::Dark.next(), ThemeVariant::Light);
        assert_eq!(ThemeVariant::Light.next().name(), "Dark");
    }
}
