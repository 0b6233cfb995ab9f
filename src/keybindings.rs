//! Keybinding registry: maps key events to actions, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Back,
    NavDown,
    NavUp,
    PageDown,
    PageUp,
    JumpTop,
    JumpBottom,
    Expand,
    Collapse,
    ToggleExpand,
    ExpandAll,
    CollapseAll,
    ToggleSelect,
    SelectAll,
    SelectNone,
    EnterFilter,
    CycleStatusFilter,
    ClearFilter,
    Reload,
    BulkDelete,
    BulkActivate,
    BulkDeactivate,
    CycleTheme,
    ShowHelp,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::Back => "Dismiss / clear filter",
            Self::NavDown => "Move down",
            Self::NavUp => "Move up",
            Self::PageDown => "Half page down",
            Self::PageUp => "Half page up",
            Self::JumpTop => "Jump to first row",
            Self::JumpBottom => "Jump to last row",
            Self::Expand => "Expand category",
            Self::Collapse => "Collapse / go to parent",
            Self::ToggleExpand => "Toggle expansion",
            Self::ExpandAll => "Expand all",
            Self::CollapseAll => "Collapse all",
            Self::ToggleSelect => "Toggle selection (with subtree)",
            Self::SelectAll => "Select all",
            Self::SelectNone => "Clear selection",
            Self::EnterFilter => "Filter by name or slug",
            Self::CycleStatusFilter => "Cycle status filter",
            Self::ClearFilter => "Clear all filters",
            Self::Reload => "Reload categories",
            Self::BulkDelete => "Delete selected",
            Self::BulkActivate => "Activate selected",
            Self::BulkDeactivate => "Deactivate selected",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Tree,
}

impl Context {
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Tree => "Category table",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Terminals report `G` as Shift+g or as plain `G`; the character
    /// already carries the case, so Shift is dropped for char keys.
    fn normalized(self) -> Self {
        match self.code {
            KeyCode::Char(_) => Self::new(self.code, self.modifiers.difference(KeyModifiers::SHIFT)),
            _ => self,
        }
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Up", "Down", "Left", "Right",
///   "Backspace", "Space", "Home", "End", "PageUp", "PageDown"
/// - Modifier combos: "Ctrl+d"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "backspace" => Some(KeyCode::Backspace),
        "space" => Some(KeyCode::Char(' ')),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "pageup" => Some(KeyCode::PageUp),
        "pagedown" => Some(KeyCode::PageDown),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|n| n.parse::<u8>().ok())
    {
        if (1..=12).contains(&n) {
            return Some(KeySpec::plain(KeyCode::F(n)));
        }
        return None;
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::ch(c)),
        _ => None,
    }
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

/// Default bindings, in help-screen order.
const DEFAULT_BINDINGS: &[(Context, KeySpec, Action)] = &[
    // Global
    (Context::Global, KeySpec::ch('q'), Action::Quit),
    (Context::Global, KeySpec::plain(KeyCode::Esc), Action::Back),
    (Context::Global, KeySpec::ch('?'), Action::ShowHelp),
    (Context::Global, KeySpec::ch('T'), Action::CycleTheme),
    (Context::Global, KeySpec::ch('r'), Action::Reload),
    // Navigation
    (Context::Tree, KeySpec::ch('j'), Action::NavDown),
    (Context::Tree, KeySpec::plain(KeyCode::Down), Action::NavDown),
    (Context::Tree, KeySpec::ch('k'), Action::NavUp),
    (Context::Tree, KeySpec::plain(KeyCode::Up), Action::NavUp),
    (Context::Tree, KeySpec::ctrl('d'), Action::PageDown),
    (Context::Tree, KeySpec::plain(KeyCode::PageDown), Action::PageDown),
    (Context::Tree, KeySpec::ctrl('u'), Action::PageUp),
    (Context::Tree, KeySpec::plain(KeyCode::PageUp), Action::PageUp),
    (Context::Tree, KeySpec::ch('g'), Action::JumpTop),
    (Context::Tree, KeySpec::plain(KeyCode::Home), Action::JumpTop),
    (Context::Tree, KeySpec::ch('G'), Action::JumpBottom),
    (Context::Tree, KeySpec::plain(KeyCode::End), Action::JumpBottom),
    // Expansion
    (Context::Tree, KeySpec::ch('l'), Action::Expand),
    (Context::Tree, KeySpec::plain(KeyCode::Right), Action::Expand),
    (Context::Tree, KeySpec::ch('h'), Action::Collapse),
    (Context::Tree, KeySpec::plain(KeyCode::Left), Action::Collapse),
    (Context::Tree, KeySpec::plain(KeyCode::Enter), Action::ToggleExpand),
    (Context::Tree, KeySpec::ch('E'), Action::ExpandAll),
    (Context::Tree, KeySpec::ch('C'), Action::CollapseAll),
    // Selection
    (Context::Tree, KeySpec::ch(' '), Action::ToggleSelect),
    (Context::Tree, KeySpec::ch('a'), Action::SelectAll),
    (Context::Tree, KeySpec::ch('n'), Action::SelectNone),
    // Filtering
    (Context::Tree, KeySpec::ch('/'), Action::EnterFilter),
    (Context::Tree, KeySpec::ch('s'), Action::CycleStatusFilter),
    (Context::Tree, KeySpec::ch('x'), Action::ClearFilter),
    // Bulk actions
    (Context::Tree, KeySpec::ch('d'), Action::BulkDelete),
    (Context::Tree, KeySpec::ch('+'), Action::BulkActivate),
    (Context::Tree, KeySpec::ch('-'), Action::BulkDeactivate),
];

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts;
/// lookups fall back to `Context::Global`.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings for help screen enumeration
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::with_capacity(DEFAULT_BINDINGS.len()),
            bindings: Vec::with_capacity(DEFAULT_BINDINGS.len()),
        };
        for &(context, key, action) in DEFAULT_BINDINGS {
            registry.bind(context, key, action);
        }
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        let key = key.normalized();
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    /// Apply user overrides from the config `[keybindings]` table.
    ///
    /// Keys in the map are action names (e.g. "toggle_select"), values are
    /// key strings (e.g. "x", "Ctrl+d", "F5"). An override replaces every
    /// default key of that action, in the same contexts.
    ///
    /// Returns warnings for unknown action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        // Sorted so that conflicting overrides resolve the same way every run
        let mut entries: Vec<_> = overrides.iter().collect();
        entries.sort();

        for (action_name, key_str) in entries {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = Vec::new();
            for (ctx, _, _) in self.bindings.iter().filter(|(_, _, a)| *a == action) {
                if !contexts.contains(ctx) {
                    contexts.push(*ctx);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a key, trying `context` first and then Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers).normalized();

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }
        if context != Context::Global {
            return self.lookup.get(&(Context::Global, key)).copied();
        }
        None
    }

    /// First key bound to `action`, formatted for hints.
    pub fn key_hint(&self, action: Action) -> Option<String> {
        self.bindings
            .iter()
            .find(|(_, _, a)| *a == action)
            .map(|(_, key, _)| format_key(key))
    }

    /// (context, key display string, action, description), in binding order.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().replace('-', "_").as_str() {
        "quit" => Some(Action::Quit),
        "back" => Some(Action::Back),
        "nav_down" | "down" => Some(Action::NavDown),
        "nav_up" | "up" => Some(Action::NavUp),
        "page_down" => Some(Action::PageDown),
        "page_up" => Some(Action::PageUp),
        "jump_top" | "top" => Some(Action::JumpTop),
        "jump_bottom" | "bottom" => Some(Action::JumpBottom),
        "expand" => Some(Action::Expand),
        "collapse" => Some(Action::Collapse),
        "toggle_expand" => Some(Action::ToggleExpand),
        "expand_all" => Some(Action::ExpandAll),
        "collapse_all" => Some(Action::CollapseAll),
        "toggle_select" | "select" => Some(Action::ToggleSelect),
        "select_all" => Some(Action::SelectAll),
        "select_none" | "clear_selection" => Some(Action::SelectNone),
        "filter" | "enter_filter" => Some(Action::EnterFilter),
        "status_filter" | "cycle_status_filter" => Some(Action::CycleStatusFilter),
        "clear_filter" => Some(Action::ClearFilter),
        "reload" | "refresh" => Some(Action::Reload),
        "delete" | "bulk_delete" => Some(Action::BulkDelete),
        "activate" | "bulk_activate" => Some(Action::BulkActivate),
        "deactivate" | "bulk_deactivate" => Some(Action::BulkDeactivate),
        "theme" | "cycle_theme" => Some(Action::CycleTheme),
        "help" | "show_help" => Some(Action::ShowHelp),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quit_and_help() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Global),
            Some(Action::Quit)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('?'), KeyModifiers::NONE, Context::Tree),
            Some(Action::ShowHelp)
        );
    }

    #[test]
    fn test_tree_keys() {
        let reg = KeybindingRegistry::new();
        let tree = |code| reg.action_for_key(code, KeyModifiers::NONE, Context::Tree);
        assert_eq!(tree(KeyCode::Char('j')), Some(Action::NavDown));
        assert_eq!(tree(KeyCode::Up), Some(Action::NavUp));
        assert_eq!(tree(KeyCode::Char('l')), Some(Action::Expand));
        assert_eq!(tree(KeyCode::Left), Some(Action::Collapse));
        assert_eq!(tree(KeyCode::Enter), Some(Action::ToggleExpand));
        assert_eq!(tree(KeyCode::Char(' ')), Some(Action::ToggleSelect));
        assert_eq!(tree(KeyCode::Char('a')), Some(Action::SelectAll));
        assert_eq!(tree(KeyCode::Char('n')), Some(Action::SelectNone));
        assert_eq!(tree(KeyCode::Char('d')), Some(Action::BulkDelete));
    }

    #[test]
    fn test_tree_keys_not_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('j'), KeyModifiers::NONE, Context::Global),
            None
        );
    }

    #[test]
    fn test_shift_is_ignored_for_chars() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('G'), KeyModifiers::SHIFT, Context::Tree),
            Some(Action::JumpBottom)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('E'), KeyModifiers::NONE, Context::Tree),
            Some(Action::ExpandAll)
        );
    }

    #[test]
    fn test_ctrl_modifiers() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('d'), KeyModifiers::CONTROL, Context::Tree),
            Some(Action::PageDown)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('u'), KeyModifiers::CONTROL, Context::Tree),
            Some(Action::PageUp)
        );
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::F(12), KeyModifiers::NONE, Context::Tree),
            None
        );
    }

    #[test]
    fn test_apply_overrides_replaces_all_keys() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("nav_down".to_string(), "Ctrl+n".to_string())]);

        assert!(reg.apply_overrides(&overrides).is_empty());

        assert_eq!(
            reg.action_for_key(KeyCode::Char('j'), KeyModifiers::NONE, Context::Tree),
            None
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Down, KeyModifiers::NONE, Context::Tree),
            None
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('n'), KeyModifiers::CONTROL, Context::Tree),
            Some(Action::NavDown)
        );
    }

    #[test]
    fn test_apply_overrides_warnings() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([
            ("launch_rockets".to_string(), "q".to_string()),
            ("quit".to_string(), "Ctrl+Alt+Q".to_string()),
        ]);

        let warnings = reg.apply_overrides(&overrides);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("Unknown action")));
        assert!(warnings.iter().any(|w| w.contains("Cannot parse key")));
        // Failed override leaves the default in place
        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Global),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(parse_key_string("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(parse_key_string("space"), Some(KeySpec::ch(' ')));
        assert_eq!(parse_key_string("PageDown"), Some(KeySpec::plain(KeyCode::PageDown)));
        assert_eq!(parse_key_string("F5"), Some(KeySpec::plain(KeyCode::F(5))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("Ctrl+d"), Some(KeySpec::ctrl('d')));
        assert_eq!(parse_key_string("x"), Some(KeySpec::ch('x')));
        assert_eq!(parse_key_string("F"), Some(KeySpec::ch('F')));
        assert_eq!(parse_key_string("xyz"), None);
    }

    #[test]
    fn test_format_key_display() {
        assert_eq!(format_key(&KeySpec::ch(' ')), "Space");
        assert_eq!(format_key(&KeySpec::ctrl('d')), "Ctrl+d");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::F(5))), "F5");
    }

    #[test]
    fn test_key_hint_and_bindings() {
        let reg = KeybindingRegistry::new();
        assert_eq!(reg.key_hint(Action::ToggleSelect).as_deref(), Some("Space"));
        assert_eq!(reg.all_bindings().len(), DEFAULT_BINDINGS.len());
    }

    #[test]
    fn test_parse_action_name_accepts_dashes() {
        assert_eq!(parse_action_name("select-all"), Some(Action::SelectAll));
        assert_eq!(parse_action_name("Expand_All"), Some(Action::ExpandAll));
        assert_eq!(parse_action_name("nope"), None);
    }
}
