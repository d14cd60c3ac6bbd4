//! Credential Composer: subject + layout → finished document.
//!
//! ```text
//! layout_for(kind) → canvas check → static zones → photo slot → subject zones → finalize
//! ```
//!
//! The photo fetch is the only suspension point and the only recoverable
//! failure: [`fetch_photo`] errors are logged and become a placeholder. The
//! errors that do abort composition are the structural ones, an unknown
//! document kind and a canvas that cannot be allocated.
//!
//! Documents are built as SVG. [`OutputFormat::Svg`] returns that markup
//! directly; [`OutputFormat::Png`] rasterizes it with `resvg` at the
//! configured scale. The font database is loaded once per composer and
//! shared by every render.

use maud::html;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::calculations::scaled_dimensions;
use super::layout::{
    DocumentKind, LayoutError, LayoutSpec, RuleSpan, SubjectField, TextContent, ZoneKind,
    layout_for,
};
use super::markup::{self, FittedText, FontFamilies, fit_text};
use super::photo::{PhotoError, fetch_photo, render_photo_slot};
use super::subject::CredentialSubject;
use crate::config::CredentialsConfig;
use crate::fetch::Fetcher;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error(transparent)]
    UnknownKind(#[from] LayoutError),
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
    #[error("render failed: {0}")]
    Render(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!("unknown output format {other:?} (expected png or svg)")),
        }
    }
}

/// A finished credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// Suggested download name, `<kind>-<identifier>.<ext>`.
    pub file_name: String,
    /// Whether the subject photo made it into the document.
    pub photo_embedded: bool,
}

/// Rendering settings, usually taken from `[credentials]`.
#[derive(Debug, Clone)]
pub struct ComposerSettings {
    pub photo_timeout: Duration,
    pub font_family: String,
    pub serif_font_family: String,
    pub render_scale: f32,
}

impl From<&CredentialsConfig> for ComposerSettings {
    fn from(config: &CredentialsConfig) -> Self {
        Self {
            photo_timeout: config.photo_timeout(),
            font_family: config.font_family.clone(),
            serif_font_family: config.serif_font_family.clone(),
            render_scale: config.render_scale,
        }
    }
}

/// DejaVu faces compiled into the binary (licence in `fonts/LICENSE-DejaVu`).
const BUNDLED_FONTS: [&[u8]; 4] = [
    include_bytes!("../../fonts/DejaVuSans.ttf"),
    include_bytes!("../../fonts/DejaVuSans-Bold.ttf"),
    include_bytes!("../../fonts/DejaVuSerif.ttf"),
    include_bytes!("../../fonts/DejaVuSerif-Bold.ttf"),
];

/// Family the generic `sans-serif` resolves to when nothing else matches.
pub const FALLBACK_SANS: &str = "DejaVu Sans";
pub const FALLBACK_SERIF: &str = "DejaVu Serif";

/// The bundled faces only. Every family list ends in one of these, so text
/// is drawn even on a host with no fonts installed.
pub fn bundled_fonts() -> fontdb::Database {
    let mut db = fontdb::Database::new();
    for data in BUNDLED_FONTS {
        db.load_font_data(data.to_vec());
    }
    db.set_sans_serif_family(FALLBACK_SANS);
    db.set_serif_family(FALLBACK_SERIF);
    db
}

/// Font database for a composer: the bundled faces, system fonts
/// when enabled, plus every configured directory.
pub fn load_fonts(config: &CredentialsConfig) -> fontdb::Database {
    let mut db = bundled_fonts();
    if config.load_system_fonts {
        db.load_system_fonts();
    }
    for dir in &config.font_dirs {
        db.load_fonts_dir(dir);
    }
    debug!(faces = db.len(), "font database loaded");
    db
}

/// Stateless per call; safe to share across concurrent requests.
pub struct Composer<F> {
    fetcher: F,
    fonts: Arc<fontdb::Database>,
    settings: ComposerSettings,
}

impl<F: Fetcher> Composer<F> {
    pub fn new(fetcher: F, fonts: fontdb::Database, settings: ComposerSettings) -> Self {
        Self {
            fetcher,
            fonts: Arc::new(fonts),
            settings,
        }
    }

    pub fn from_config(fetcher: F, config: &CredentialsConfig) -> Self {
        Self::new(fetcher, load_fonts(config), config.into())
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    /// Compose `subject` as a PNG.
    pub async fn compose(&self, subject: &CredentialSubject) -> Result<Document, ComposeError> {
        self.compose_as(subject, OutputFormat::Png).await
    }

    pub async fn compose_as(
        &self,
        subject: &CredentialSubject,
        format: OutputFormat,
    ) -> Result<Document, ComposeError> {
        let layout = layout_for(subject.kind);
        let (px_width, px_height) = self.canvas_size(layout)?;

        let fonts = FontFamilies {
            sans: &self.settings.font_family,
            serif: &self.settings.serif_font_family,
        };
        let slot = &layout.photo_slot;
        let photo_px = (slot.size * self.settings.render_scale).ceil() as u32;
        let photo = fetch_photo(
            &self.fetcher,
            subject.photo_url.as_deref(),
            photo_px,
            self.settings.photo_timeout,
        )
        .await;
        match &photo {
            Ok(_) => {}
            Err(PhotoError::Missing) => debug!(kind = %subject.kind, "no photo URL, using placeholder"),
            Err(e) => warn!(kind = %subject.kind, error = %e, "photo unavailable, using placeholder"),
        }

        let name = name_text(layout, subject);
        let body = html! {
            // Static zones in layout order
            @for zone in layout.zones.iter().filter(|z| !z.is_subject_bound()) {
                @match zone.kind {
                    ZoneKind::Band(style) => (markup::band(zone.geometry, &style)),
                    ZoneKind::Rule(style) => (markup::rule(zone.geometry, &style, None)),
                    ZoneKind::Text { content, style } => {
                        @if let TextContent::Static(s) = content {
                            (markup::text(zone.geometry, &fit_text(s, &style, zone.geometry.width), &style, fonts))
                        }
                    }
                }
            }
            (render_photo_slot(slot, photo.as_ref(), fonts.sans))
            // Subject fields
            @for zone in layout.zones.iter().filter(|z| z.is_subject_bound()) {
                @match zone.kind {
                    ZoneKind::Rule(style) => (markup::rule(zone.geometry, &style, name.as_ref())),
                    ZoneKind::Text { content: TextContent::Field { field, prefix }, style } => {
                        @let raw = format!("{prefix}{}", subject.field(field));
                        (markup::text(zone.geometry, &fit_text(&raw, &style, zone.geometry.width), &style, fonts))
                    }
                    _ => {}
                }
            }
        };
        let svg = markup::svg_document(layout.canvas_width, layout.canvas_height, body);

        let bytes = match format {
            OutputFormat::Svg => svg.into_bytes(),
            OutputFormat::Png => self.rasterize(&svg, px_width, px_height)?,
        };
        debug!(kind = %subject.kind, %format, bytes = bytes.len(), "document composed");

        Ok(Document {
            bytes,
            content_type: format.content_type(),
            file_name: document_file_name(subject.kind, &subject.identifier, format),
            photo_embedded: photo.is_ok(),
        })
    }

    fn canvas_size(&self, layout: &LayoutSpec) -> Result<(u32, u32), ComposeError> {
        let (width, height) = scaled_dimensions(
            layout.canvas_width,
            layout.canvas_height,
            self.settings.render_scale,
        );
        if width == 0 || height == 0 {
            return Err(ComposeError::Canvas { width, height });
        }
        Ok((width, height))
    }

    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Vec<u8>, ComposeError> {
        let options = usvg::Options {
            fontdb: self.fonts.clone(),
            font_family: self.settings.font_family.clone(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| ComposeError::Render(e.to_string()))?;

        let mut pixmap = Pixmap::new(width, height).ok_or(ComposeError::Canvas { width, height })?;
        let scale = self.settings.render_scale;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| ComposeError::Encode(e.to_string()))
    }
}

/// The fitted display name, when the layout draws a rule under it.
fn name_text(layout: &LayoutSpec, subject: &CredentialSubject) -> Option<FittedText> {
    let follows_name = layout.zones.iter().any(|z| {
        matches!(
            z.kind,
            ZoneKind::Rule(style) if matches!(
                style.span,
                RuleSpan::UnderField { field: SubjectField::DisplayName, .. }
            )
        )
    });
    if !follows_name {
        return None;
    }
    layout.zones.iter().find_map(|z| match z.kind {
        ZoneKind::Text {
            content:
                TextContent::Field {
                    field: SubjectField::DisplayName,
                    prefix,
                },
            style,
        } => {
            let raw = format!("{prefix}{}", subject.field(SubjectField::DisplayName));
            Some(fit_text(&raw, &style, z.geometry.width))
        }
        _ => None,
    })
}

/// `<kind>-<identifier>.<ext>`, with the identifier reduced to
/// `[A-Za-z0-9_-]` so it is safe in a path or a `Content-Disposition` header.
pub fn document_file_name(kind: DocumentKind, identifier: &str, format: OutputFormat) -> String {
    let mut id = String::with_capacity(identifier.len());
    for c in identifier.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            id.push(c);
        } else if !id.ends_with('-') {
            id.push('-');
        }
    }
    let id = id.trim_matches('-');
    if id.is_empty() {
        format!("{kind}.{}", format.extension())
    } else {
        format!("{kind}-{id}.{}", format.extension())
    }
}
