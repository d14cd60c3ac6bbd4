//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Gallery
//!
//! ```text
//! Gallery (3 photos, refreshed)
//!     Etag: 9f86d081884c7d65...
//! 001 Impact Moment
//!     Source: https://lh3.googleusercontent.com/pw/AF1Qip...=w1200
//! 002 Impact Moment
//!     Source: https://lh3.googleusercontent.com/pw/AF1Qip...=w1200
//! ```
//!
//! `--json` prints the records as a JSON array instead, in the same shape
//! the transport layer serves: `[{"id", "src", "category", "caption"}]`.
//!
//! ## Compose
//!
//! ```text
//! donation-certificate → donation-certificate-DN-2025-001.png
//!     Type: image/png (48213 bytes)
//!     Photo: placeholder
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Logs go to stderr, so stdout
//! stays parseable.

use std::path::Path;

use crate::cache::{Lookup, SnapshotSource};
use crate::config::AppConfig;
use crate::credentials::{Document, DocumentKind};
use crate::types::ImageRecord;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: u32) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn source_label(source: SnapshotSource) -> &'static str {
    match source {
        SnapshotSource::Cache => "cached",
        SnapshotSource::Refreshed => "refreshed",
        SnapshotSource::Stale => "stale, refresh failed",
    }
}

// ============================================================================
// Gallery
// ============================================================================

pub fn format_gallery(lookup: &Lookup) -> Vec<String> {
    let images = lookup.snapshot.images();
    let mut lines = vec![
        format!(
            "Gallery ({} photos, {})",
            images.len(),
            source_label(lookup.source)
        ),
        format!("{}Etag: {}", indent(1), lookup.snapshot.etag()),
    ];
    for image in images {
        lines.push(format!("{} {}", format_index(image.id), image.caption));
        lines.push(format!("{}Source: {}", indent(1), image.source_url));
    }
    lines
}

pub fn print_gallery(lookup: &Lookup) {
    for line in format_gallery(lookup) {
        println!("{}", line);
    }
}

/// The records as the transport layer serializes them.
pub fn format_gallery_json(images: &[ImageRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(images)
}

// ============================================================================
// Compose
// ============================================================================

pub fn format_document(kind: DocumentKind, document: &Document, written_to: &Path) -> Vec<String> {
    vec![
        format!("{} → {}", kind, written_to.display()),
        format!(
            "{}Type: {} ({} bytes)",
            indent(1),
            document.content_type,
            document.bytes.len()
        ),
        format!(
            "{}Photo: {}",
            indent(1),
            if document.photo_embedded {
                "embedded"
            } else {
                "placeholder"
            }
        ),
    ]
}

pub fn print_document(kind: DocumentKind, document: &Document, written_to: &Path) {
    for line in format_document(kind, document, written_to) {
        println!("{}", line);
    }
}

// ============================================================================
// Config
// ============================================================================

pub fn format_config_summary(config: &AppConfig, path: &Path) -> Vec<String> {
    vec![
        format!("Config OK: {}", path.display()),
        format!("{}Album: {}", indent(1), config.gallery.album_url),
        format!(
            "{}Cache TTL: {}s, album timeout: {}s, photo timeout: {}s",
            indent(1),
            config.gallery.ttl_secs,
            config.gallery.fetch_timeout_secs,
            config.credentials.photo_timeout_secs
        ),
        format!(
            "{}Fonts: {}{}",
            indent(1),
            if config.credentials.load_system_fonts {
                "system"
            } else {
                "no system fonts"
            },
            config
                .credentials
                .font_dirs
                .iter()
                .map(|d| format!(", {}", d.display()))
                .collect::<String>()
        ),
    ]
}

pub fn print_config_summary(config: &AppConfig, path: &Path) {
    for line in format_config_summary(config, path) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheSnapshot;
    use crate::types::DEFAULT_CAPTION;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn lookup(source: SnapshotSource) -> Lookup {
        let images = vec![
            ImageRecord::new(1, "https://h/a=w1200".into(), DEFAULT_CAPTION),
            ImageRecord::new(2, "https://h/b=w1200".into(), DEFAULT_CAPTION),
        ];
        Lookup {
            snapshot: Arc::new(CacheSnapshot::new(images, Instant::now())),
            source,
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn gallery_lists_images_with_sources() {
        let lines = format_gallery(&lookup(SnapshotSource::Refreshed));
        assert_eq!(lines[0], "Gallery (2 photos, refreshed)");
        assert!(lines[1].starts_with("    Etag: "));
        assert_eq!(lines[2], "001 Impact Moment");
        assert_eq!(lines[3], "    Source: https://h/a=w1200");
        assert_eq!(lines[4], "002 Impact Moment");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn gallery_header_flags_stale_snapshot() {
        let lines = format_gallery(&lookup(SnapshotSource::Stale));
        assert_eq!(lines[0], "Gallery (2 photos, stale, refresh failed)");
    }

    #[test]
    fn gallery_json_uses_wire_shape() {
        let json = format_gallery_json(lookup(SnapshotSource::Cache).snapshot.images()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["src"], "https://h/a=w1200");
        assert_eq!(value[1]["id"], 2);
        assert_eq!(value[1]["category"], "all");
    }

    #[test]
    fn document_summary() {
        let doc = Document {
            bytes: vec![0; 42],
            content_type: "image/png",
            file_name: "id-card-7.png".into(),
            photo_embedded: false,
        };
        let lines = format_document(DocumentKind::IdCard, &doc, Path::new("out/id-card-7.png"));
        assert_eq!(
            lines,
            vec![
                "id-card → out/id-card-7.png",
                "    Type: image/png (42 bytes)",
                "    Photo: placeholder",
            ]
        );
    }

    #[test]
    fn config_summary_lists_font_dirs() {
        let mut config = AppConfig::default();
        config.credentials.load_system_fonts = false;
        config.credentials.font_dirs = vec![PathBuf::from("/opt/fonts")];
        let lines = format_config_summary(&config, Path::new("config.toml"));
        assert_eq!(lines[0], "Config OK: config.toml");
        assert_eq!(lines[3], "    Fonts: no system fonts, /opt/fonts");
    }
}
