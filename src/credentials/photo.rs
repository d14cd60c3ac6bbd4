//! Subject photo handling.
//!
//! A photo goes through two steps with very different failure policies:
//!
//! 1. [`fetch_photo`] retrieves and prepares the image. Every failure here
//!    (no URL, network, timeout, undecodable bytes) is a [`PhotoError`].
//! 2. [`render_photo_slot`] draws the slot. It takes the outcome of step 1
//!    and never fails: a photo is clipped into the slot, anything else gets
//!    the neutral placeholder of the same geometry.
//!
//! Prepared photos are re-encoded as PNG at the slot's raster size, so the
//! document embeds a small square image rather than the original upload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use maud::{Markup, html};
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;

use super::calculations::calculate_center_crop;
use super::layout::PhotoSlot;
use crate::fetch::{FetchError, Fetcher};

pub const PLACEHOLDER_FILL: &str = "#E5E7EB";
pub const PLACEHOLDER_TEXT: &str = "#9CA3AF";

const CLIP_ID: &str = "photo-slot";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    #[error("no photo URL")]
    Missing,
    #[error("photo fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("photo could not be decoded: {0}")]
    Decode(String),
    #[error("photo could not be re-encoded: {0}")]
    Encode(String),
}

/// A photo cropped to a square and encoded as PNG, ready to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPhoto {
    png: Vec<u8>,
    size: u32,
}

impl SlotPhoto {
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// Edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

/// Fetch the photo at `url` and prepare it for a slot of `px` pixels.
pub async fn fetch_photo<F: Fetcher>(
    fetcher: &F,
    url: Option<&str>,
    px: u32,
    timeout: Duration,
) -> Result<SlotPhoto, PhotoError> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(PhotoError::Missing)?;
    let bytes = fetcher.fetch(url, timeout).await?;
    prepare_photo(&bytes, px)
}

/// Decode `bytes`, center-crop to a square and scale to `px` x `px`.
pub fn prepare_photo(bytes: &[u8], px: u32) -> Result<SlotPhoto, PhotoError> {
    let px = px.max(1);
    let img = image::load_from_memory(bytes).map_err(|e| PhotoError::Decode(e.to_string()))?;

    let crop = calculate_center_crop((img.width(), img.height()), (px, px));
    let square = img
        .crop_imm(crop.x, crop.y, crop.width, crop.height)
        .resize_exact(px, px, FilterType::Lanczos3);

    // PNG has no float channels; normalise to 8-bit RGBA.
    let rgba = DynamicImage::ImageRgba8(square.to_rgba8());
    let mut png = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| PhotoError::Encode(e.to_string()))?;

    Ok(SlotPhoto { png, size: px })
}

/// Draw the photo slot: the photo clipped to the rounded slot, or the
/// placeholder when there is no photo.
pub fn render_photo_slot(
    slot: &PhotoSlot,
    photo: Result<&SlotPhoto, &PhotoError>,
    font_family: &str,
) -> Markup {
    html! {
        @match photo {
            Ok(photo) => {
                defs {
                    clipPath id=(CLIP_ID) {
                        rect x=(slot.x) y=(slot.y) width=(slot.size) height=(slot.size)
                            rx=(slot.corner_radius) {}
                    }
                }
                image x=(slot.x) y=(slot.y) width=(slot.size) height=(slot.size)
                    href=(photo.data_uri()) clip-path=(format!("url(#{CLIP_ID})"))
                    preserveAspectRatio="xMidYMid slice" {}
            }
            Err(_) => {
                rect x=(slot.x) y=(slot.y) width=(slot.size) height=(slot.size)
                    rx=(slot.corner_radius) fill=(PLACEHOLDER_FILL) {}
                text x=(slot.x + slot.size / 2.0) y=(slot.y + slot.size / 2.0 + slot.size * 0.05)
                    text-anchor="middle" font-family=(font_family) font-size=(slot.size * 0.14)
                    font-weight="bold" fill=(PLACEHOLDER_TEXT) {
                    "PHOTO"
                }
            }
        }
        @if let Some((color, width)) = slot.frame {
            rect x=(slot.x) y=(slot.y) width=(slot.size) height=(slot.size)
                rx=(slot.corner_radius) fill="none" stroke=(color) stroke-width=(width) {}
        }
    }
}
