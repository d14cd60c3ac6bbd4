//! Shared types used by the extractor, the gallery cache and CLI output.
//!
//! [`ImageRecord`] is what the transport layer serializes to JSON, so its
//! serde representation is part of the external interface:
//! `{ "id": 1, "src": "...", "category": "all", "caption": "..." }`.

use serde::{Deserialize, Serialize};

/// Category assigned to every scraped image. The album page carries no
/// tagging, so the gallery filter only ever sees this one value.
pub const DEFAULT_CATEGORY: &str = "all";

/// Caption assigned to every scraped image.
pub const DEFAULT_CAPTION: &str = "Impact Moment";

/// A single gallery image projected from the shared album page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// 1-based position in first-appearance order. Stable within one refresh.
    pub id: u32,
    /// Image URL with the size suffix applied. Unique within one refresh.
    #[serde(rename = "src")]
    pub source_url: String,
    pub category: String,
    pub caption: String,
}

impl ImageRecord {
    /// Build the record at 1-based `id` for an already-normalized URL.
    pub fn new(id: u32, source_url: String, caption: &str) -> Self {
        Self {
            id,
            source_url,
            category: DEFAULT_CATEGORY.to_string(),
            caption: caption.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_source_url_as_src() {
        let record = ImageRecord::new(3, "https://host/p=w1200".into(), DEFAULT_CAPTION);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "src": "https://host/p=w1200",
                "category": "all",
                "caption": "Impact Moment",
            })
        );
    }

    #[test]
    fn new_uses_uniform_category() {
        let record = ImageRecord::new(1, "u".into(), "Custom");
        assert_eq!(record.category, DEFAULT_CATEGORY);
        assert_eq!(record.caption, "Custom");
    }
}
