//! Zone → SVG markup.
//!
//! Each zone kind has one rendering function; [`svg_document`] wraps the
//! painted zones in the root element. Text is interpolated through `maud`, so
//! subject values are XML-escaped and cannot inject markup.
//!
//! Text zones anchor by alignment (`start`, `middle`, `end`) and sit on a
//! baseline derived from the zone box, so a shrunk line stays vertically
//! centred where the full-size line would have been.

use maud::{Markup, PreEscaped, html};

use super::calculations::{estimate_text_width, fit_font_size, underline_span};
use super::layout::{BandStyle, Rect, RuleSpan, RuleStyle, TextAlign, TextStyle, Typeface};

/// Font family lists handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct FontFamilies<'a> {
    pub sans: &'a str,
    pub serif: &'a str,
}

impl FontFamilies<'_> {
    pub fn for_typeface(&self, typeface: Typeface) -> &str {
        match typeface {
            Typeface::Sans => self.sans,
            Typeface::Serif => self.serif,
        }
    }
}

/// A line of text after case transformation and size fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedText {
    pub text: String,
    pub size: f32,
    /// Estimated advance width at `size`.
    pub width: f32,
}

/// Apply the style's case transform and shrink the text to `max_width` if
/// the style allows it.
pub fn fit_text(raw: &str, style: &TextStyle, max_width: f32) -> FittedText {
    let text = if style.uppercase {
        raw.to_uppercase()
    } else {
        raw.to_string()
    };
    let size = match style.min_size {
        Some(min) => fit_font_size(
            &text,
            max_width,
            style.size,
            min,
            style.bold,
            style.letter_spacing,
        ),
        None => style.size,
    };
    let width = estimate_text_width(&text, size, style.bold, style.letter_spacing);
    FittedText { text, size, width }
}

pub fn band(geometry: Rect, style: &BandStyle) -> Markup {
    html! {
        rect x=(geometry.x) y=(geometry.y) width=(geometry.width) height=(geometry.height)
            rx=[(style.corner_radius > 0.0).then_some(style.corner_radius)]
            fill=(style.fill.unwrap_or("none"))
            stroke=[style.stroke.map(|(color, _)| color)]
            stroke-width=[style.stroke.map(|(_, width)| width)] {}
    }
}

/// A rule. `under` is the fitted text the rule follows, for
/// [`RuleSpan::UnderField`] rules.
pub fn rule(geometry: Rect, style: &RuleStyle, under: Option<&FittedText>) -> Markup {
    let (x, width) = match (style.span, under) {
        (RuleSpan::UnderField { padding, .. }, Some(text)) => {
            underline_span(text.width, padding, geometry.x, geometry.width)
        }
        _ => (geometry.x, geometry.width),
    };
    html! {
        rect x=(x) y=(geometry.y) width=(width) height=(geometry.height) fill=(style.color) {}
    }
}

pub fn text(geometry: Rect, fitted: &FittedText, style: &TextStyle, fonts: FontFamilies) -> Markup {
    let (x, anchor) = match style.align {
        TextAlign::Start => (geometry.x, "start"),
        TextAlign::Middle => (geometry.x + geometry.width / 2.0, "middle"),
        TextAlign::End => (geometry.x + geometry.width, "end"),
    };
    let baseline = geometry.y + geometry.height / 2.0 + fitted.size * 0.35;
    html! {
        text x=(x) y=(baseline) text-anchor=(anchor)
            font-family=(fonts.for_typeface(style.typeface)) font-size=(fitted.size)
            font-weight=[style.bold.then_some("bold")]
            font-style=[style.italic.then_some("italic")]
            letter-spacing=[(style.letter_spacing > 0.0).then_some(style.letter_spacing)]
            fill=(style.color) {
            (fitted.text)
        }
    }
}

/// Root `<svg>` element of `width` x `height` points.
pub fn svg_document(width: u32, height: u32, body: Markup) -> String {
    html! {
        (PreEscaped(r#"<?xml version="1.0" encoding="UTF-8"?>"#))
        svg xmlns="http://www.w3.org/2000/svg" width=(width) height=(height)
            viewBox=(format!("0 0 {width} {height}")) {
            (body)
        }
    }
    .into_string()
}
