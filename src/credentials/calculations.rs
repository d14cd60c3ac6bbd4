//! Pure calculation functions for credential geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Text measurement is an estimate from per-glyph average advances rather
//! than real font metrics: the renderer's fonts depend on the host, but the
//! fit decisions (and therefore the document bytes) must not.

/// Average glyph advance as a fraction of the font size.
const REGULAR_ADVANCE: f32 = 0.55;
const BOLD_ADVANCE: f32 = 0.62;

/// Font size decrement when shrinking text to fit.
const SHRINK_STEP: f32 = 0.5;

/// Pixel rectangle inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centred region of `source` with the aspect ratio of `target`.
///
/// Cropping to this region and then scaling to `target` fills the target
/// without stretching.
pub fn calculate_center_crop(source: (u32, u32), target: (u32, u32)) -> CropRect {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    let (width, height) = if src_aspect > tgt_aspect {
        // Source is wider: keep full height, trim the sides
        let w = (src_h as f64 * tgt_aspect).round() as u32;
        (w.clamp(1, src_w), src_h)
    } else {
        // Source is taller: keep full width, trim top and bottom
        let h = (src_w as f64 / tgt_aspect).round() as u32;
        (src_w, h.clamp(1, src_h))
    };

    CropRect {
        x: (src_w - width) / 2,
        y: (src_h - height) / 2,
        width,
        height,
    }
}

/// Raster dimensions for a canvas drawn at `scale`.
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        (width as f32 * scale).round() as u32,
        (height as f32 * scale).round() as u32,
    )
}

/// Estimated advance width of `text` at `size`.
pub fn estimate_text_width(text: &str, size: f32, bold: bool, letter_spacing: f32) -> f32 {
    let glyphs = text.chars().count() as f32;
    if glyphs == 0.0 {
        return 0.0;
    }
    let advance = if bold { BOLD_ADVANCE } else { REGULAR_ADVANCE };
    glyphs * size * advance + (glyphs - 1.0) * letter_spacing
}

/// Shrink `size` in half-point steps until `text` fits `max_width`, never
/// below `min_size`.
///
/// # Examples
/// ```
/// # use vaaradhi::credentials::calculations::fit_font_size;
/// // Short text keeps its size
/// assert_eq!(fit_font_size("ASHA", 200.0, 15.0, 9.0, true, 0.0), 15.0);
///
/// // Long text stops at the floor
/// assert_eq!(fit_font_size(&"W".repeat(100), 200.0, 15.0, 9.0, true, 0.0), 9.0);
/// ```
pub fn fit_font_size(
    text: &str,
    max_width: f32,
    size: f32,
    min_size: f32,
    bold: bool,
    letter_spacing: f32,
) -> f32 {
    let mut current = size;
    while current > min_size && estimate_text_width(text, current, bold, letter_spacing) > max_width
    {
        current = (current - SHRINK_STEP).max(min_size);
    }
    current
}

/// Horizontal extent `(x, width)` of a rule under text of `text_width`,
/// padded on both sides and centred within `[zone_x, zone_x + zone_width]`.
pub fn underline_span(text_width: f32, padding: f32, zone_x: f32, zone_width: f32) -> (f32, f32) {
    let width = (text_width + padding * 2.0).min(zone_width);
    (zone_x + (zone_width - width) / 2.0, width)
}
