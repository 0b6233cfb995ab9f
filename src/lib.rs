//! Category tree builder, selection engine and terminal admin table for a
//! shop catalogue.
//!
//! - [`tree`] - pure tree building, traversal and tri-state selection
//! - [`api`] - REST client and payload parsing
//! - [`config`] - TOML configuration
//! - [`app`] / [`ui`] - the interactive tree-table

pub mod api;
pub mod app;
pub mod config;
pub mod keybindings;
pub mod theme;
pub mod tree;
pub mod ui;
pub mod util;
