use crate::api::{read_category_file, BulkAction, BulkOutcome, CategoryClient};
use crate::config::Config;
use crate::keybindings::KeybindingRegistry;
use crate::theme::{ColorPalette, ThemeVariant};
use crate::tree::{
    build_tree, flatten, guide_prefix, select_all, select_none, selection_states,
    toggle_selection, Category, CategoryFilter, CategoryId, ExpansionState,
    HierarchyError, SelectionState, StatusFilter, TreeNode,
};
use crate::util::strip_control_chars;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;

/// How long a status message stays on screen.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Category Source
// ============================================================================

/// Where the category list comes from.
pub enum CategorySource {
    Api(Arc<CategoryClient>),
    File(PathBuf),
}

impl CategorySource {
    /// Fetch the full flat list.
    pub async fn fetch(&self) -> Result<Vec<Category>> {
        match self {
            Self::Api(client) => client
                .list_categories()
                .await
                .context("Failed to fetch categories"),
            Self::File(path) => {
                let path = path.clone();
                let display = path.display().to_string();
                tokio::task::spawn_blocking(move || read_category_file(&path))
                    .await
                    .context("Category file reader stopped")?
                    .with_context(|| format!("Failed to load {}", display))
            }
        }
    }

    pub fn client(&self) -> Option<Arc<CategoryClient>> {
        match self {
            Self::Api(client) => Some(Arc::clone(client)),
            Self::File(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Api(client) => client.base_url().to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

// ============================================================================
// Visible Rows
// ============================================================================

/// One rendered line of the category table, detached from the forest it was
/// flattened from.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub depth: usize,
    pub guide: String,
    pub has_children: bool,
    pub is_expanded: bool,
    pub is_active: bool,
    pub product_count: Option<u64>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Matched the active filter itself (rather than being a kept ancestor).
    pub matched: bool,
}

impl VisibleRow {
    fn from_node(node: &TreeNode, matched: bool) -> Self {
        Self {
            id: node.id().to_owned(),
            parent_id: node.parent_id().map(str::to_owned),
            name: strip_control_chars(&node.category.name).into_owned(),
            slug: strip_control_chars(&node.category.slug).into_owned(),
            depth: node.depth,
            guide: guide_prefix(node),
            has_children: node.has_children,
            is_expanded: node.is_expanded,
            is_active: node.category.active(),
            product_count: node.category.product_count,
            updated_at: node.category.updated_at,
            matched,
        }
    }
}

/// Cached result of the last rebuild.
#[derive(Debug, Default)]
pub struct TreeView {
    pub rows: Vec<VisibleRow>,
    pub states: HashMap<CategoryId, SelectionState>,
    /// Records kept by the filter (matches plus their ancestors).
    pub kept: usize,
    pub matched: usize,
}

// ============================================================================
// Confirmation Dialog
// ============================================================================

/// Pending confirmation for destructive operations.
pub enum ConfirmAction {
    BulkDelete { ids: Vec<CategoryId> },
}

// ============================================================================
// Background Events
// ============================================================================

/// Events from background tasks
pub enum AppEvent {
    CategoriesLoaded {
        generation: u64,
        categories: Vec<Category>,
    },
    LoadFailed {
        generation: u64,
        error: String,
    },
    BulkActionComplete(BulkOutcome),
    BulkActionFailed {
        action: BulkAction,
        error: String,
    },
    /// A background task panicked.
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub source: Arc<CategorySource>,

    pub theme_variant: ThemeVariant,
    pub theme: ColorPalette,
    pub keybindings: KeybindingRegistry,

    // Data
    /// Flat list as last loaded. Wrapped in Arc so reload tasks can hand it
    /// over without copying.
    pub categories: Arc<Vec<Category>>,
    pub expansion: ExpansionState,
    pub selected: HashSet<CategoryId>,
    pub filter: CategoryFilter,

    // Derived
    pub view: TreeView,
    /// Malformed hierarchy reported by the last rebuild.
    pub tree_error: Option<HierarchyError>,

    // Limits
    pub max_depth: usize,
    pub page_size: usize,
    pub expand_all_on_load: bool,

    // Cursor and viewport
    pub cursor: usize,
    pub scroll_offset: usize,
    /// Rows that fit in the table body; updated by the renderer.
    pub viewport_height: usize,

    // Filter input
    pub filter_mode: bool,
    pub filter_input: String,
    /// Debounce timer for live filtering while typing
    pub filter_debounce: Option<Instant>,

    // Background work
    pub loading: bool,
    pub load_generation: u64,
    pub load_handle: Option<tokio::task::JoinHandle<()>>,
    pub bulk_in_flight: Option<BulkAction>,

    // Chrome
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub show_help: bool,
    pub help_scroll_offset: usize,
    pub pending_confirm: Option<ConfirmAction>,
}

impl App {
    pub fn new(source: CategorySource, config: &Config) -> Self {
        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, falling back to dark");
            ThemeVariant::Dark
        });

        let mut keybindings = KeybindingRegistry::new();
        let warnings = keybindings.apply_overrides(&config.keybindings);
        for warning in &warnings {
            tracing::warn!(%warning, "Keybinding override rejected");
        }

        let mut app = Self {
            source: Arc::new(source),
            theme_variant,
            theme: theme_variant.palette(),
            keybindings,
            categories: Arc::new(Vec::new()),
            expansion: ExpansionState::new(),
            selected: select_none(),
            filter: CategoryFilter::default(),
            view: TreeView::default(),
            tree_error: None,
            max_depth: config.max_depth.max(1),
            page_size: config.page_size.max(1),
            expand_all_on_load: config.expand_all_on_load,
            cursor: 0,
            scroll_offset: 0,
            viewport_height: 0,
            filter_mode: false,
            filter_input: String::new(),
            filter_debounce: None,
            loading: false,
            load_generation: 0,
            load_handle: None,
            bulk_in_flight: None,
            status_message: None,
            needs_redraw: true,
            show_help: false,
            help_scroll_offset: 0,
            pending_confirm: None,
        };

        if let Some(first) = warnings.into_iter().next() {
            app.set_status(first);
        }
        app
    }

    // ------------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------------

    /// Cycle to the next theme variant and return its name.
    pub fn cycle_theme(&mut self) -> &'static str {
        self.theme_variant = self.theme_variant.next();
        self.theme = self.theme_variant.palette();
        self.needs_redraw = true;
        self.theme_variant.name()
    }

    // ------------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------------

    /// Replace the flat list after a (re)load.
    ///
    /// Expansion and selection ids that no longer exist are dropped.
    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = Arc::new(categories);

        let pruned_expansion = self.expansion.retain_known(&self.categories);
        let known: HashSet<&str> = self.categories.iter().map(|c| c.id.as_str()).collect();
        let before = self.selected.len();
        self.selected.retain(|id| known.contains(id.as_str()));
        let pruned_selection = before - self.selected.len();

        if pruned_expansion > 0 || pruned_selection > 0 {
            tracing::debug!(
                pruned_expansion,
                pruned_selection,
                "Dropped stale ids after reload"
            );
        }

        if self.expand_all_on_load {
            self.expansion
                .expand_all_within_depth(&self.categories, self.max_depth);
        }
        self.reveal_filter_matches();
        self.rebuild_view();
    }

    /// Rebuild the visible rows and selection badges from current state.
    ///
    /// The cursor stays on the same category when it is still visible.
    pub fn rebuild_view(&mut self) {
        let anchor = self.current_row().map(|r| r.id.clone());

        let (view, error) = self.compute_view();
        if let Some(e) = &error {
            tracing::warn!(error = %e, "Category hierarchy is malformed");
        }
        self.view = view;
        self.tree_error = error;

        if let Some(id) = anchor {
            if let Some(pos) = self.row_index(&id) {
                self.cursor = pos;
            }
        }
        self.clamp_cursor();
        self.needs_redraw = true;
    }

    fn compute_view(&self) -> (TreeView, Option<HierarchyError>) {
        let outcome = match self.filter.apply(&self.categories) {
            Ok(outcome) => outcome,
            Err(e) => return (TreeView::default(), Some(e)),
        };
        let forest = match build_tree(&outcome.categories, self.expansion.as_set()) {
            Ok(forest) => forest,
            Err(e) => return (TreeView::default(), Some(e)),
        };

        // Badges span the whole catalogue, not just the rows the filter keeps
        let (states, error) = match selection_states(&self.categories, &self.selected) {
            Ok(states) => (states, None),
            Err(e) => (HashMap::new(), Some(e)),
        };

        let filtering = !self.filter.is_empty();
        let rows = flatten(&forest)
            .into_iter()
            .map(|node| VisibleRow::from_node(node, filtering && outcome.matched.contains(node.id())))
            .collect();

        let view = TreeView {
            rows,
            states,
            kept: outcome.categories.len(),
            matched: outcome.matched.len(),
        };
        (view, error)
    }

    /// Expand the ancestors of text-query matches so the matches are visible.
    /// A status filter alone reveals nothing, and ancestors past the depth
    /// limit stay collapsed.
    fn reveal_filter_matches(&mut self) {
        if self.filter.query.is_none() {
            return;
        }
        match self.filter.apply(&self.categories) {
            Ok(outcome) => {
                self.expansion.expand_within_depth(
                    &self.categories,
                    &outcome.reveal,
                    self.max_depth,
                );
            }
            Err(e) => tracing::debug!(error = %e, "Skipping filter reveal"),
        }
    }

    // ------------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------------

    pub fn rows(&self) -> &[VisibleRow] {
        &self.view.rows
    }

    pub fn current_row(&self) -> Option<&VisibleRow> {
        self.view.rows.get(self.cursor)
    }

    pub fn row_index(&self, id: &str) -> Option<usize> {
        self.view.rows.iter().position(|r| r.id == id)
    }

    pub fn state_of(&self, id: &str) -> SelectionState {
        self.view
            .states
            .get(id)
            .copied()
            .unwrap_or(SelectionState::Unselected)
    }

    fn clamp_cursor(&mut self) {
        let max_index = self.view.rows.len().saturating_sub(1);
        self.cursor = self.cursor.min(max_index);
        self.ensure_cursor_visible();
    }

    /// Keep the cursor inside the viewport, scrolling as little as possible.
    pub fn ensure_cursor_visible(&mut self) {
        let height = self.viewport_height.max(1);
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + height {
            self.scroll_offset = self.cursor + 1 - height;
        }
        let max_offset = self.view.rows.len().saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Row range currently on screen.
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        let start = self.scroll_offset.min(self.view.rows.len());
        let end = (start + self.viewport_height).min(self.view.rows.len());
        start..end
    }

    fn move_cursor_to(&mut self, index: usize) {
        self.cursor = index;
        self.clamp_cursor();
    }

    pub fn nav_down(&mut self) {
        if !self.view.rows.is_empty() {
            self.move_cursor_to(self.cursor.saturating_add(1));
        }
    }

    pub fn nav_up(&mut self) {
        self.move_cursor_to(self.cursor.saturating_sub(1));
    }

    pub fn page_down(&mut self) {
        if !self.view.rows.is_empty() {
            self.move_cursor_to(self.cursor.saturating_add(self.page_size));
        }
    }

    pub fn page_up(&mut self) {
        self.move_cursor_to(self.cursor.saturating_sub(self.page_size));
    }

    pub fn jump_top(&mut self) {
        self.move_cursor_to(0);
    }

    pub fn jump_bottom(&mut self) {
        self.move_cursor_to(self.view.rows.len().saturating_sub(1));
    }

    // ------------------------------------------------------------------------
    // Expansion
    // ------------------------------------------------------------------------

    /// Expand the current row, or step into its first child when it is
    /// already open.
    pub fn expand_current(&mut self) {
        let Some(row) = self.current_row() else {
            return;
        };
        if !row.has_children {
            return;
        }
        if row.is_expanded {
            self.nav_down();
            return;
        }
        if row.depth + 1 >= self.max_depth {
            self.set_status(format!("Maximum depth ({}) reached", self.max_depth));
            return;
        }
        let id = row.id.clone();
        self.expansion.expand(&id);
        self.rebuild_view();
    }

    /// Collapse the current row, or move to its parent when it is already
    /// collapsed (or a leaf).
    pub fn collapse_current(&mut self) {
        let Some(row) = self.current_row() else {
            return;
        };
        if row.is_expanded {
            let id = row.id.clone();
            self.expansion.collapse(&id);
            self.rebuild_view();
        } else if let Some(parent) = row.parent_id.clone() {
            if let Some(pos) = self.row_index(&parent) {
                self.move_cursor_to(pos);
            }
        }
    }

    pub fn toggle_expand_current(&mut self) {
        match self.current_row() {
            Some(row) if row.is_expanded => self.collapse_current(),
            Some(_) => self.expand_current(),
            None => {}
        }
    }

    pub fn expand_all(&mut self) {
        self.expansion
            .expand_all_within_depth(&self.categories, self.max_depth);
        self.rebuild_view();
        self.set_status(format!("Expanded {} categories", self.expansion.len()));
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
        self.rebuild_view();
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    /// Toggle the current row together with its whole subtree.
    pub fn toggle_select_current(&mut self) {
        let Some(id) = self.current_row().map(|r| r.id.clone()) else {
            return;
        };
        match toggle_selection(&self.categories, &id, &self.selected) {
            Ok(next) => {
                self.selected = next;
                self.rebuild_view();
            }
            Err(e) => {
                tracing::warn!(error = %e, id = %id, "Selection toggle refused");
                self.set_status(format!("Error: {}", e));
            }
        }
    }

    pub fn select_all(&mut self) {
        self.selected = select_all(&self.categories);
        self.rebuild_view();
        self.set_status(format!("Selected {} categories", self.selected.len()));
    }

    pub fn select_none(&mut self) {
        self.selected = select_none();
        self.rebuild_view();
    }

    /// Selected ids in catalogue order, each once.
    pub fn selected_ids(&self) -> Vec<CategoryId> {
        let mut seen = HashSet::with_capacity(self.selected.len());
        self.categories
            .iter()
            .filter(|c| self.selected.contains(&c.id) && seen.insert(c.id.as_str()))
            .map(|c| c.id.clone())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------------

    /// Apply a new text query (blank clears it).
    pub fn set_filter_query(&mut self, query: &str) {
        let query = query.trim();
        self.filter.query = (!query.is_empty()).then(|| query.to_string());
        self.reveal_filter_matches();
        self.rebuild_view();
    }

    pub fn cycle_status_filter(&mut self) -> StatusFilter {
        self.filter.status = self.filter.status.next();
        self.reveal_filter_matches();
        self.rebuild_view();
        self.filter.status
    }

    pub fn clear_filter(&mut self) {
        self.filter = CategoryFilter::default();
        self.filter_input.clear();
        self.filter_debounce = None;
        self.rebuild_view();
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear status message if expired. Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

/// Abort an in-flight load when the app goes away.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.load_handle.take() {
            handle.abort();
            tracing::debug!("Aborted category load task on App drop");
        }
    }
}
