//! Image-reference extraction from the shared album page.
//!
//! The album is a public share page, not an API: the only stable signal in
//! its markup is the URL shape of the photo host. [`PatternExtractor`] scans
//! the raw bytes for that shape, deduplicates in first-seen order and projects
//! each hit into an [`ImageRecord`].
//!
//! The matching rule sits behind the [`Extractor`] trait so it can be replaced
//! when the host changes its markup without touching the cache.
//!
//! Zero matches is an error ([`ExtractionError::NoImagesFound`]). A page that
//! suddenly yields nothing is far more likely to be a scraping breakage (or a
//! revoked share link) than an intentionally emptied album, and reporting it
//! as a failure lets the cache keep serving the last good snapshot.

use regex::bytes::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;

use crate::types::ImageRecord;

/// Base URLs of photos in a Google Photos shared album. The trailing
/// `=w..-h..` sizing parameters are not part of the match, so differently
/// sized references to the same photo collapse to one base URL.
pub const GOOGLE_PHOTOS_PATTERN: &str =
    r"https://lh3\.googleusercontent\.com/pw/[a-zA-Z0-9\-_]{50,}";

static GOOGLE_PHOTOS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(GOOGLE_PHOTOS_PATTERN).expect("built-in pattern must compile"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no images found in album page")]
    NoImagesFound,
    #[error("invalid image URL pattern: {0}")]
    InvalidPattern(String),
}

/// Turns a fetched album page into the ordered list of gallery images.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &[u8]) -> Result<Vec<ImageRecord>, ExtractionError>;
}

/// Regex-based extractor for a fixed photo-host URL shape.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    pattern: Regex,
    size_suffix: String,
    caption: String,
}

impl PatternExtractor {
    /// Extractor for Google Photos shared albums.
    pub fn google_photos(size_suffix: &str, caption: &str) -> Self {
        Self {
            pattern: GOOGLE_PHOTOS.clone(),
            size_suffix: size_suffix.to_string(),
            caption: caption.to_string(),
        }
    }

    /// Extractor for an arbitrary URL pattern.
    pub fn with_pattern(
        pattern: &str,
        size_suffix: &str,
        caption: &str,
    ) -> Result<Self, ExtractionError> {
        let pattern =
            Regex::new(pattern).map_err(|e| ExtractionError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            pattern,
            size_suffix: size_suffix.to_string(),
            caption: caption.to_string(),
        })
    }

    /// Distinct matches in order of first appearance.
    fn unique_matches<'h>(&self, html: &'h [u8]) -> Vec<&'h [u8]> {
        let mut seen = HashSet::new();
        self.pattern
            .find_iter(html)
            .map(|m| m.as_bytes())
            .filter(|url| seen.insert(*url))
            .collect()
    }
}

impl Extractor for PatternExtractor {
    fn extract(&self, html: &[u8]) -> Result<Vec<ImageRecord>, ExtractionError> {
        let matches = self.unique_matches(html);
        if matches.is_empty() {
            return Err(ExtractionError::NoImagesFound);
        }

        Ok(matches
            .into_iter()
            .enumerate()
            .map(|(index, base)| {
                let source_url = format!("{}{}", String::from_utf8_lossy(base), self.size_suffix);
                ImageRecord::new(index as u32 + 1, source_url, &self.caption)
            })
            .collect())
    }
}
