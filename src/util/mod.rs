//! Text helpers for terminal rendering.
//!
//! ```
//! use catalog_tree::util::{display_width, fit_to_width, strip_control_chars};
//!
//! let name = strip_control_chars("\x1b[1mGarden\x1b[0m");
//! assert_eq!(name, "Garden");
//! assert_eq!(display_width(&fit_to_width(&name, 10)), 10);
//! ```

mod text;

pub use text::{display_width, fit_to_width, strip_control_chars, truncate_to_width};

/// Maximum length of the filter query typed in the UI.
pub const MAX_FILTER_QUERY_LENGTH: usize = 128;
