use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::tree::Category;

/// Maximum payload accepted from a file or a response body (10 MB).
pub const MAX_PAYLOAD_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Category payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Category payload too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Failed to read category file: {0}")]
    Io(#[from] std::io::Error),
}

/// Shapes the backend is known to answer with.
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryPayload {
    Bare(Vec<Category>),
    Data { data: Vec<Category> },
    Named { categories: Vec<Category> },
}

/// Parse a category list from a bare JSON array or a `{ "data": [...] }` /
/// `{ "categories": [...] }` envelope.
pub fn parse_category_payload(body: &str) -> Result<Vec<Category>, PayloadError> {
    if body.len() > MAX_PAYLOAD_SIZE {
        return Err(PayloadError::TooLarge {
            size: body.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    // Try the bare array first so a malformed record reports a precise error
    // instead of serde's generic untagged-enum message.
    if body.trim_start().starts_with('[') {
        return Ok(serde_json::from_str::<Vec<Category>>(body)?);
    }

    let payload: CategoryPayload = serde_json::from_str(body)?;
    Ok(match payload {
        CategoryPayload::Bare(list)
        | CategoryPayload::Data { data: list }
        | CategoryPayload::Named { categories: list } => list,
    })
}

/// Read and parse a category export from disk.
pub fn read_category_file(path: &Path) -> Result<Vec<Category>, PayloadError> {
    let size = std::fs::metadata(path)?.len();
    if size > MAX_PAYLOAD_SIZE as u64 {
        return Err(PayloadError::TooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    let body = std::fs::read_to_string(path)?;
    let categories = parse_category_payload(&body)?;
    tracing::info!(path = %path.display(), count = categories.len(), "Read category file");
    Ok(categories)
}
