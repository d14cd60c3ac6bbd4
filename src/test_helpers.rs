//! Shared test utilities for the vaaradhi test suite.
//!
//! Provides a scripted [`Fetcher`] mock, album page builders, and credential
//! fixtures, so cache and composer tests never touch the network.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fetcher = MockFetcher::scripted(vec![
//!     Ok(album_html(&[&photo_url('a'), &photo_url('b')]).into()),
//!     Err(FetchError::Timeout(Duration::from_secs(5))),
//! ]);
//! // ... first fetch returns the page, second times out, later ones fail.
//! assert_eq!(fetcher.call_count(), 0);
//! ```

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use crate::credentials::{CredentialSubject, DocumentKind};
use crate::fetch::{FetchError, Fetcher};

// =========================================================================
// Mock fetcher
// =========================================================================

/// [`Fetcher`] that returns scripted results in order and records every URL.
///
/// Once the script is exhausted, fetches fail with a network error (or
/// repeat the `always` result).
pub struct MockFetcher {
    script: Mutex<VecDeque<Result<Bytes, FetchError>>>,
    always: Option<Result<Bytes, FetchError>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn scripted(results: Vec<Result<Bytes, FetchError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            always: None,
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Every fetch returns `result`.
    pub fn always(result: Result<Bytes, FetchError>) -> Self {
        Self {
            always: Some(result),
            ..Self::scripted(Vec::new())
        }
    }

    /// Delay each response by `delay` (tokio time, so paused clocks apply).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Record the call and take its result. Happens before any delay, so a
    /// cancelled fetch still counts and still consumes its script entry.
    fn next(&self, url: &str) -> Result<Bytes, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.always.clone())
            .unwrap_or_else(|| Err(FetchError::Network("mock script exhausted".into())))
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<Bytes, FetchError> {
        let result = self.next(url);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

// =========================================================================
// Album pages
// =========================================================================

/// A photo base URL shaped like the album host's, with a token of `c`s.
pub fn photo_url(c: char) -> String {
    format!(
        "https://lh3.googleusercontent.com/pw/AF1Qip{}",
        c.to_string().repeat(60)
    )
}

/// A share page embedding each URL the way the host does: in image tags
/// and again in an inline data blob.
pub fn album_html(urls: &[&str]) -> String {
    let mut html = String::from("<!doctype html><html><head><title>Shared album</title></head><body>");
    for url in urls {
        html.push_str(&format!("<div><img src=\"{url}=w400-h300-no\"></div>"));
    }
    html.push_str("<script>AF_initDataCallback({data:[");
    for url in urls {
        html.push_str(&format!("[\"{url}\",1200,900],"));
    }
    html.push_str("]});</script></body></html>");
    html
}

// =========================================================================
// Credentials
// =========================================================================

/// A subject with no photo URL, issued on 7 March 2025.
pub fn sample_subject(kind: DocumentKind) -> CredentialSubject {
    let issued = Utc.with_ymd_and_hms(2025, 3, 7, 9, 0, 0).unwrap();
    CredentialSubject::new(kind, "A. Kumar", "DN-2025-001", issued)
}

/// PNG bytes of a `width` x `height` gradient.
pub fn synthetic_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}
