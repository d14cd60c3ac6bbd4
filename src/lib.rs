//! # Vaaradhi
//!
//! The engineering core behind the Viswa Vignana Vaaradhi foundation site:
//! a gallery synced from a shared photo album, and the credential documents
//! (volunteer ID cards, donation and patronage certificates) issued to the
//! people in it.
//!
//! Everything else on the site (pages, forms, payments, sign-in) is a
//! transport layer that calls into two entry points:
//!
//! ```text
//! GalleryCache::get_images()   →  [{id, src, category, caption}, ...]  | CacheError
//! Composer::compose(subject)   →  Document { bytes, content_type, .. } | ComposeError
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | One bounded GET of a remote page or image (`Fetcher` trait, `reqwest` backend) |
//! | [`extract`] | Album page → ordered, de-duplicated image records |
//! | [`cache`] | Time-bounded, single-flight snapshot cache with stale-on-error fallback |
//! | [`credentials`] | Layouts, subjects, photo handling and document composition |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`types`] | `ImageRecord`, the gallery's wire shape |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stale Beats Empty
//!
//! The album is a share page on a host we do not control, not an API. Any
//! refresh can fail: timeouts, rate limits, or a markup change that makes
//! the scraper find nothing. Once the gallery has shown photos it keeps
//! showing the last good set until a refresh succeeds. Only a cold start
//! with a failing host surfaces an error.
//!
//! ## A Credential Without a Photo Is Still a Credential
//!
//! Subject photos come from arbitrary URLs. A fetch that fails, times out or
//! returns something that is not an image becomes a neutral placeholder in
//! the photo slot. Composition only fails for structural reasons (unknown
//! document kind, canvas allocation), never because of the network.
//!
//! ## Layouts Are Data
//!
//! Each document kind is one immutable [`credentials::LayoutSpec`]: canvas
//! size, photo slot, and an ordered list of zones. The composer is generic
//! over zones; adding a document kind means adding a layout, not code paths.
//!
//! ## SVG First, Raster Second
//!
//! Documents are built as SVG with [Maud](https://maud.lambda.xyz/) (subject
//! text is auto-escaped) and rasterized with `resvg`. Both are pure Rust, so
//! the binary needs no headless browser or PDF toolchain, and the SVG is
//! available as an output format in its own right.
//!
//! ## Timeouts Are Short
//!
//! Both outbound fetches are bounded to single-digit seconds (enforced by
//! config validation). A slow host degrades into the stale-cache or
//! placeholder path instead of holding the caller's request open.

pub mod cache;
pub mod config;
pub mod credentials;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
