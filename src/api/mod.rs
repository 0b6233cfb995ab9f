//! Catalogue backend access.
//!
//! - [`payload`] - parsing category lists from files or response bodies
//! - [`client`] - the HTTP client for listing categories and bulk actions

pub mod client;
pub mod payload;

pub use client::{
    build_http_client, validate_base_url, ApiError, BulkAction, BulkOutcome, CategoryClient,
};
pub use payload::{parse_category_payload, read_category_file, PayloadError, MAX_PAYLOAD_SIZE};
