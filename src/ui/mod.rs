//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Frame layout and overlays
//! - `helpers` - Background task spawning and layout helpers
//! - `tree_table` - Category table widget
//! - `help` - Keybinding help overlay
//! - `status` - Status bar widget

mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;
mod tree_table;

pub use loop_runner::{run, Action};

