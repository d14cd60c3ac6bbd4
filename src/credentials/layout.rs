//! Fixed geometry for each credential document.
//!
//! A [`LayoutSpec`] is pure data: canvas size, the photo slot, and an ordered
//! list of zones. Zones are painted in list order, so later zones overlay
//! earlier ones (a rule drawn after a band sits on top of it). Zones whose
//! content comes from the subject ([`TextContent::Field`],
//! [`RuleSpan::UnderField`]) are painted in a second pass after the photo.
//!
//! Coordinates are in points with the origin at the top-left corner. The
//! composer scales the whole canvas uniformly when rasterizing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("unknown document kind {0:?} (expected one of: id-card, donation-certificate, patron-certificate)")]
    UnknownKind(String),
}

/// The credential documents the composer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    IdCard,
    DonationCertificate,
    PatronCertificate,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::IdCard,
        DocumentKind::DonationCertificate,
        DocumentKind::PatronCertificate,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            DocumentKind::IdCard => "id-card",
            DocumentKind::DonationCertificate => "donation-certificate",
            DocumentKind::PatronCertificate => "patron-certificate",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DocumentKind {
    type Err = LayoutError;

    /// Accepts the kebab-case slug, case-insensitively, with `_` or `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| LayoutError::UnknownKind(s.to_string()))
    }
}

/// Axis-aligned rectangle in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Square region reserved for the subject photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoSlot {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub corner_radius: f32,
    /// Frame drawn around the slot: colour and stroke width.
    pub frame: Option<(&'static str, f32)>,
}

/// Values taken from the credential subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectField {
    DisplayName,
    Identifier,
    IssuedAt,
    Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextContent {
    Static(&'static str),
    /// Subject value, rendered after `prefix`.
    Field {
        field: SubjectField,
        prefix: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Typeface {
    Sans,
    Serif,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    /// Smallest size the text may shrink to when it does not fit the zone
    /// width. `None` keeps the size fixed.
    pub min_size: Option<f32>,
    pub color: &'static str,
    pub bold: bool,
    pub italic: bool,
    pub typeface: Typeface,
    pub align: TextAlign,
    pub letter_spacing: f32,
    pub uppercase: bool,
}

impl TextStyle {
    const fn sans(size: f32, color: &'static str) -> Self {
        Self {
            size,
            min_size: None,
            color,
            bold: false,
            italic: false,
            typeface: Typeface::Sans,
            align: TextAlign::Start,
            letter_spacing: 0.0,
            uppercase: false,
        }
    }

    const fn serif(size: f32, color: &'static str) -> Self {
        Self {
            typeface: Typeface::Serif,
            ..Self::sans(size, color)
        }
    }

    const fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    const fn italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }

    const fn centered(self) -> Self {
        Self {
            align: TextAlign::Middle,
            ..self
        }
    }

    const fn end(self) -> Self {
        Self {
            align: TextAlign::End,
            ..self
        }
    }

    const fn shrink_to(self, min: f32) -> Self {
        Self {
            min_size: Some(min),
            ..self
        }
    }

    const fn spaced(self, letter_spacing: f32) -> Self {
        Self {
            letter_spacing,
            ..self
        }
    }

    const fn upper(self) -> Self {
        Self {
            uppercase: true,
            ..self
        }
    }
}

/// Filled and/or stroked rounded rectangle. A square with a corner radius of
/// half its side is a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandStyle {
    pub fill: Option<&'static str>,
    pub stroke: Option<(&'static str, f32)>,
    pub corner_radius: f32,
}

impl BandStyle {
    const fn fill(color: &'static str) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            corner_radius: 0.0,
        }
    }

    const fn rounded(self, corner_radius: f32) -> Self {
        Self {
            corner_radius,
            ..self
        }
    }

    const fn stroked(self, color: &'static str, width: f32) -> Self {
        Self {
            stroke: Some((color, width)),
            ..self
        }
    }

    const fn outline(color: &'static str, width: f32) -> Self {
        Self {
            fill: None,
            stroke: Some((color, width)),
            corner_radius: 0.0,
        }
    }
}

/// How long a rule is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleSpan {
    /// The zone width.
    Fixed,
    /// The rendered width of a subject field plus `padding` on each side,
    /// centred in the zone and never wider than it.
    UnderField { field: SubjectField, padding: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleStyle {
    pub color: &'static str,
    pub span: RuleSpan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneKind {
    Band(BandStyle),
    Rule(RuleStyle),
    Text {
        content: TextContent,
        style: TextStyle,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub kind: ZoneKind,
    pub geometry: Rect,
}

impl Zone {
    /// Whether painting this zone needs the subject.
    pub fn is_subject_bound(&self) -> bool {
        matches!(
            self.kind,
            ZoneKind::Text {
                content: TextContent::Field { .. },
                ..
            } | ZoneKind::Rule(RuleStyle {
                span: RuleSpan::UnderField { .. },
                ..
            })
        )
    }

    fn band(geometry: Rect, style: BandStyle) -> Self {
        Self {
            kind: ZoneKind::Band(style),
            geometry,
        }
    }

    fn rule(geometry: Rect, color: &'static str) -> Self {
        Self {
            kind: ZoneKind::Rule(RuleStyle {
                color,
                span: RuleSpan::Fixed,
            }),
            geometry,
        }
    }

    fn text(geometry: Rect, text: &'static str, style: TextStyle) -> Self {
        Self {
            kind: ZoneKind::Text {
                content: TextContent::Static(text),
                style,
            },
            geometry,
        }
    }

    fn field(geometry: Rect, field: SubjectField, prefix: &'static str, style: TextStyle) -> Self {
        Self {
            kind: ZoneKind::Text {
                content: TextContent::Field { field, prefix },
                style,
            },
            geometry,
        }
    }
}

/// Immutable geometry of one document kind.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSpec {
    pub kind: DocumentKind,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub photo_slot: PhotoSlot,
    pub zones: Vec<Zone>,
}

/// Layout for `kind`. Pure lookup.
pub fn layout_for(kind: DocumentKind) -> &'static LayoutSpec {
    match kind {
        DocumentKind::IdCard => &ID_CARD,
        DocumentKind::DonationCertificate => &DONATION_CERTIFICATE,
        DocumentKind::PatronCertificate => &PATRON_CERTIFICATE,
    }
}

/// Layout for a kind given as text, e.g. from a request parameter.
pub fn layout_named(kind: &str) -> Result<&'static LayoutSpec, LayoutError> {
    kind.parse().map(layout_for)
}

pub const ORG_NAME: &str = "VISWA VIGNANA VAARADHI";
pub const TAGLINE: &str = "foundation for a better tomorrow";

mod palette {
    pub const TEAL: &str = "#006D63";
    pub const TEAL_MID: &str = "#00867D";
    pub const TEAL_DARK: &str = "#004D40";
    pub const CERT_TEAL: &str = "#0d7c74";
    pub const CREAM: &str = "#FDFBEB";
    pub const PAPER: &str = "#fdfdfd";
    pub const WHITE: &str = "#FFFFFF";
    pub const NEAR_BLACK: &str = "#111827";
    pub const DARK_TEXT: &str = "#1F2937";
    pub const BODY_TEXT: &str = "#333333";
    pub const GOLD: &str = "#D4AF37";
    pub const GOLD_DARK: &str = "#B8860B";
}

use palette::*;

static ID_CARD: LazyLock<LayoutSpec> = LazyLock::new(|| {
    const W: f32 = 242.0;
    const HEADER_H: f32 = 105.0;
    let sans = TextStyle::sans;

    LayoutSpec {
        kind: DocumentKind::IdCard,
        canvas_width: 242,
        canvas_height: 380,
        photo_slot: PhotoSlot {
            x: (W - 80.0) / 2.0,
            y: HEADER_H + 28.0,
            size: 80.0,
            corner_radius: 14.0,
            frame: Some((TEAL_MID, 3.0)),
        },
        zones: vec![
            // Header
            Zone::band(Rect::new(0.0, 0.0, W, HEADER_H), BandStyle::fill(CREAM)),
            Zone::band(
                Rect::new(W / 2.0 - 20.0, 10.0, 40.0, 7.0),
                BandStyle::fill(NEAR_BLACK).rounded(3.5),
            ),
            Zone::band(
                Rect::new(10.0, 24.0, 60.0, 60.0),
                BandStyle::fill(TEAL).rounded(30.0),
            ),
            Zone::text(
                Rect::new(10.0, 46.0, 60.0, 16.0),
                "VVV",
                sans(16.0, WHITE).bold().centered(),
            ),
            Zone::text(
                Rect::new(76.0, 36.0, 160.0, 16.0),
                ORG_NAME,
                sans(14.0, TEAL).bold().shrink_to(9.0),
            ),
            Zone::text(
                Rect::new(76.0, 58.0, 160.0, 10.0),
                TAGLINE,
                sans(8.5, TEAL).italic(),
            ),
            // Divider and body
            Zone::band(Rect::new(0.0, HEADER_H, W, 5.0), BandStyle::fill(TEAL_MID)),
            Zone::band(
                Rect::new(0.0, HEADER_H + 5.0, W, 380.0 - HEADER_H - 5.0),
                BandStyle::fill(WHITE),
            ),
            Zone::text(
                Rect::new(0.0, HEADER_H + 12.0, W, 11.0),
                "DIGITAL IDENTITY CARD",
                sans(10.5, TEAL_MID).bold().centered(),
            ),
            // Identifier and issue date
            Zone::text(
                Rect::new(18.0, HEADER_H + 121.0, 100.0, 9.0),
                "ID NO.:",
                sans(8.5, TEAL_MID).bold(),
            ),
            Zone::field(
                Rect::new(18.0, HEADER_H + 133.0, 110.0, 11.0),
                SubjectField::Identifier,
                "",
                sans(11.0, DARK_TEXT).bold().shrink_to(7.0),
            ),
            Zone::text(
                Rect::new(130.0, HEADER_H + 121.0, 94.0, 9.0),
                "ISSUED ON:",
                sans(8.5, TEAL_MID).bold().end(),
            ),
            Zone::field(
                Rect::new(130.0, HEADER_H + 133.0, 94.0, 11.0),
                SubjectField::IssuedAt,
                "",
                sans(11.0, DARK_TEXT).bold().end().shrink_to(7.0),
            ),
            // Name and role
            Zone::rule(Rect::new(18.0, HEADER_H + 152.0, W - 36.0, 1.5), TEAL_MID),
            Zone::field(
                Rect::new(18.0, HEADER_H + 160.0, W - 36.0, 15.0),
                SubjectField::DisplayName,
                "",
                sans(15.0, TEAL_DARK).bold().upper().shrink_to(9.0),
            ),
            Zone::field(
                Rect::new(18.0, HEADER_H + 179.0, W - 36.0, 10.0),
                SubjectField::Role,
                "",
                sans(10.0, TEAL).upper().shrink_to(7.0),
            ),
            // Signature block
            Zone::rule(Rect::new(18.0, HEADER_H + 221.0, 80.0, 1.0), TEAL_MID),
            Zone::text(
                Rect::new(18.0, HEADER_H + 224.0, 80.0, 9.0),
                "PRESIDENT",
                sans(9.0, TEAL_DARK).bold(),
            ),
            Zone::text(
                Rect::new(100.0, HEADER_H + 225.0, W - 118.0, 7.0),
                "VISWAVIGNANAVAARADHI.ORG",
                sans(7.0, TEAL).bold().end(),
            ),
            // Footer
            Zone::band(Rect::new(14.0, 348.0, W - 28.0, 15.0), BandStyle::fill(TEAL_MID)),
            Zone::text(
                Rect::new(14.0, 352.5, W - 28.0, 6.0),
                "BRIDGING THE GAP THROUGH EDUCATION AND EMPOWERMENT",
                sans(5.8, WHITE).bold().centered(),
            ),
            Zone::text(
                Rect::new(0.0, 367.0, W, 7.0),
                "REGISTERED OFFICE: VISAKHAPATNAM, ANDHRA PRADESH",
                sans(7.0, TEAL_MID).bold().centered().shrink_to(5.0),
            ),
        ],
    }
});

/// A4 landscape certificate; the two certificate kinds differ only in wording.
fn certificate(
    kind: DocumentKind,
    title: &'static str,
    presented: &'static str,
    recognition: &'static str,
) -> LayoutSpec {
    const W: f32 = 842.0;
    const H: f32 = 595.0;
    let serif = TextStyle::serif;

    LayoutSpec {
        kind,
        canvas_width: 842,
        canvas_height: 595,
        photo_slot: PhotoSlot {
            x: 80.0,
            y: 450.0,
            size: 90.0,
            corner_radius: 12.0,
            frame: Some((CERT_TEAL, 2.0)),
        },
        zones: vec![
            Zone::band(Rect::new(0.0, 0.0, W, H), BandStyle::fill(PAPER)),
            Zone::band(
                Rect::new(40.0, 40.0, W - 80.0, H - 80.0),
                BandStyle::outline(CERT_TEAL, 8.0),
            ),
            // Header
            Zone::text(
                Rect::new(60.0, 80.0, W - 120.0, 42.0),
                ORG_NAME,
                serif(42.0, CERT_TEAL).bold().centered().spaced(1.0).shrink_to(28.0),
            ),
            Zone::text(
                Rect::new(60.0, 134.0, W - 120.0, 20.0),
                TAGLINE,
                serif(20.0, CERT_TEAL).centered().spaced(3.0),
            ),
            Zone::text(
                Rect::new(60.0, 205.0, W - 120.0, 60.0),
                title,
                serif(60.0, CERT_TEAL).bold().centered().spaced(1.0).shrink_to(30.0),
            ),
            Zone::text(
                Rect::new(60.0, 298.0, W - 120.0, 22.0),
                presented,
                serif(22.0, BODY_TEXT).centered(),
            ),
            // Recipient
            Zone::field(
                Rect::new(71.0, 340.0, W - 142.0, 52.0),
                SubjectField::DisplayName,
                "",
                serif(52.0, CERT_TEAL).bold().centered().upper().shrink_to(24.0),
            ),
            Zone {
                kind: ZoneKind::Rule(RuleStyle {
                    color: CERT_TEAL,
                    span: RuleSpan::UnderField {
                        field: SubjectField::DisplayName,
                        padding: 50.0,
                    },
                }),
                geometry: Rect::new(71.0, 403.0, W - 142.0, 3.0),
            },
            Zone::text(
                Rect::new(60.0, 422.0, W - 120.0, 18.0),
                recognition,
                serif(18.0, BODY_TEXT).centered().shrink_to(12.0),
            ),
            // Certificate number and date, beside the photo
            Zone::field(
                Rect::new(185.0, 470.0, 170.0, 12.0),
                SubjectField::Identifier,
                "Certificate No. ",
                serif(12.0, BODY_TEXT).shrink_to(8.0),
            ),
            Zone::field(
                Rect::new(185.0, 490.0, 170.0, 12.0),
                SubjectField::IssuedAt,
                "Issued on ",
                serif(12.0, BODY_TEXT),
            ),
            // Seal
            Zone::band(
                Rect::new(W / 2.0 - 55.0, 460.0, 110.0, 110.0),
                BandStyle::fill(GOLD).rounded(55.0).stroked(GOLD_DARK, 2.0),
            ),
            Zone::band(
                Rect::new(W / 2.0 - 48.0, 467.0, 96.0, 96.0),
                BandStyle::outline(WHITE, 1.0).rounded(48.0),
            ),
            Zone::text(
                Rect::new(W / 2.0 - 35.0, 500.0, 70.0, 9.0),
                "OFFICIAL",
                serif(9.0, WHITE).bold().centered(),
            ),
            Zone::text(
                Rect::new(W / 2.0 - 35.0, 512.0, 70.0, 9.0),
                "SEAL",
                serif(9.0, WHITE).bold().centered(),
            ),
            // Signature
            Zone::rule(Rect::new(W - 280.0, 508.5, 220.0, 3.0), CERT_TEAL),
            Zone::text(
                Rect::new(W - 280.0, 522.0, 220.0, 22.0),
                "PRESIDENT",
                serif(22.0, CERT_TEAL).bold().centered(),
            ),
        ],
    }
}

static DONATION_CERTIFICATE: LazyLock<LayoutSpec> = LazyLock::new(|| {
    certificate(
        DocumentKind::DonationCertificate,
        "CERTIFICATE OF APPRECIATION",
        "This certificate is gratefully presented to",
        "in appreciation of their generous donation towards the mission of VVV",
    )
});

static PATRON_CERTIFICATE: LazyLock<LayoutSpec> = LazyLock::new(|| {
    certificate(
        DocumentKind::PatronCertificate,
        "CERTIFICATE OF PATRONAGE",
        "This certificate is proudly presented to",
        "in recognition of their invaluable contribution to the vision of VVV",
    )
});
