//! Time-bounded gallery cache with stale-on-error fallback.
//!
//! The gallery mirrors a shared photo album that we do not control. Fetching
//! and scraping it on every request would hammer the host and make the
//! gallery go blank whenever the host hiccups, so this module keeps one
//! in-memory snapshot and refreshes it lazily.
//!
//! # Policy
//!
//! | State | Behaviour of [`GalleryCache::lookup`] |
//! |---|---|
//! | Fresh (`age < ttl`) | Serve the snapshot, no network call |
//! | Stale / Empty | One refresh: fetch album page, extract images |
//! | Refresh OK | Replace the snapshot wholesale, serve it |
//! | Refresh failed, snapshot exists | Serve the old snapshot unchanged |
//! | Refresh failed, no snapshot | [`CacheError::Unavailable`] |
//!
//! A failed refresh does not touch `fetched_at`, so the next request tries
//! again instead of waiting out another full TTL.
//!
//! # Concurrency
//!
//! Refreshes are single-flight. Callers that find the snapshot stale queue
//! on `refresh_lock`; the first one through performs the round trip. Every
//! completed refresh bumps an attempt counter, and a caller that acquires the
//! lock after the counter moved shares that outcome instead of fetching
//! again. A burst of N requests against a stale cache therefore costs one
//! album fetch, whether it succeeds or fails.
//!
//! The snapshot is only swapped after a complete, successful refresh. If the
//! refreshing future is dropped (caller cancelled), neither the snapshot nor
//! the attempt counter changes and the next caller simply refreshes.
//!
//! # Timestamps
//!
//! Snapshot ages use [`tokio::time::Instant`] so tests can drive the TTL
//! with a paused clock.

use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::GalleryConfig;
use crate::extract::{ExtractionError, Extractor, PatternExtractor};
use crate::fetch::{FetchError, Fetcher};
use crate::types::ImageRecord;

/// Why a refresh produced no new snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("album fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("album extraction failed: {0}")]
    Extract(#[from] ExtractionError),
}

impl RefreshError {
    /// Whether the next refresh could succeed without anything changing on
    /// our side. A page that no longer yields photos is not transient.
    pub fn is_transient(&self) -> bool {
        match self {
            RefreshError::Fetch(err) => err.is_transient(),
            RefreshError::Extract(_) => false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// No snapshot has ever been fetched and the refresh failed.
    #[error("gallery unavailable: {0}")]
    Unavailable(#[source] RefreshError),
}

/// One successful refresh: the image list and when it was fetched.
///
/// Never mutated after construction; callers receive shared references.
#[derive(Debug)]
pub struct CacheSnapshot {
    images: Vec<ImageRecord>,
    fetched_at: Instant,
}

impl CacheSnapshot {
    pub fn new(images: Vec<ImageRecord>, fetched_at: Instant) -> Self {
        Self { images, fetched_at }
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }

    /// SHA-256 over the image URLs, for conditional responses.
    pub fn etag(&self) -> String {
        let mut hasher = Sha256::new();
        for image in &self.images {
            hasher.update(image.source_url.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Observable cache state, e.g. for a health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Empty,
    Fresh,
    Stale,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheStatus::Empty => "empty",
            CacheStatus::Fresh => "fresh",
            CacheStatus::Stale => "stale",
        })
    }
}

/// Where the snapshot returned by a lookup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Served from a fresh snapshot without a refresh.
    Cache,
    /// Produced by a refresh (this caller's or one it waited on).
    Refreshed,
    /// A refresh failed; the previous snapshot was served.
    Stale,
}

/// Result of [`GalleryCache::lookup`].
#[derive(Debug, Clone)]
pub struct Lookup {
    pub snapshot: Arc<CacheSnapshot>,
    pub source: SnapshotSource,
}

/// Where and how often the album is fetched.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub album_url: String,
    pub ttl: Duration,
    pub fetch_timeout: Duration,
}

impl From<&GalleryConfig> for CacheSettings {
    fn from(config: &GalleryConfig) -> Self {
        Self {
            album_url: config.album_url.clone(),
            ttl: config.ttl(),
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<CacheSnapshot>>,
    /// Completed refreshes, successful or not.
    attempts: u64,
    /// Outcome of the most recent refresh, if it failed.
    last_failure: Option<RefreshError>,
}

/// Single-snapshot album cache. One instance per service, shared by handlers.
pub struct GalleryCache<F, E> {
    fetcher: F,
    extractor: E,
    settings: CacheSettings,
    state: RwLock<CacheState>,
    refresh_lock: Mutex<()>,
}

impl<F: Fetcher> GalleryCache<F, PatternExtractor> {
    /// Cache over the configured album using the Google Photos extractor.
    pub fn from_config(fetcher: F, config: &GalleryConfig) -> Self {
        let extractor = PatternExtractor::google_photos(&config.size_suffix, &config.caption);
        Self::new(fetcher, extractor, CacheSettings::from(config))
    }
}

impl<F: Fetcher, E: Extractor> GalleryCache<F, E> {
    pub fn new(fetcher: F, extractor: E, settings: CacheSettings) -> Self {
        Self {
            fetcher,
            extractor,
            settings,
            state: RwLock::new(CacheState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// The current snapshot, without triggering a refresh.
    pub async fn peek(&self) -> Option<Arc<CacheSnapshot>> {
        self.state.read().await.snapshot.clone()
    }

    pub async fn status(&self) -> CacheStatus {
        match self.peek().await {
            None => CacheStatus::Empty,
            Some(s) if s.is_fresh(Instant::now(), self.settings.ttl) => CacheStatus::Fresh,
            Some(_) => CacheStatus::Stale,
        }
    }

    /// Content hash of the current snapshot, if any.
    pub async fn etag(&self) -> Option<String> {
        self.peek().await.map(|s| s.etag())
    }

    /// Gallery images, refreshing first if the snapshot is stale or absent.
    pub async fn get_images(&self) -> Result<Arc<CacheSnapshot>, CacheError> {
        self.lookup().await.map(|l| l.snapshot)
    }

    /// Like [`get_images`](Self::get_images), also reporting where the
    /// snapshot came from.
    pub async fn lookup(&self) -> Result<Lookup, CacheError> {
        let (current, seen_attempts) = {
            let state = self.state.read().await;
            (state.snapshot.clone(), state.attempts)
        };
        if let Some(snapshot) = current
            && snapshot.is_fresh(Instant::now(), self.settings.ttl)
        {
            debug!(images = snapshot.images().len(), "gallery cache hit");
            return Ok(Lookup {
                snapshot,
                source: SnapshotSource::Cache,
            });
        }

        let _refresh = self.refresh_lock.lock().await;

        {
            let state = self.state.read().await;
            if state.attempts != seen_attempts {
                // Someone else refreshed while we queued; share their outcome.
                match (&state.snapshot, &state.last_failure) {
                    (Some(snapshot), None) => {
                        return Ok(Lookup {
                            snapshot: snapshot.clone(),
                            source: SnapshotSource::Refreshed,
                        });
                    }
                    (Some(snapshot), Some(_)) => {
                        return Ok(Lookup {
                            snapshot: snapshot.clone(),
                            source: SnapshotSource::Stale,
                        });
                    }
                    (None, Some(err)) => return Err(CacheError::Unavailable(err.clone())),
                    (None, None) => {}
                }
            }
        }

        let outcome = self.refresh().await;

        let mut state = self.state.write().await;
        state.attempts += 1;
        match outcome {
            Ok(images) => {
                info!(images = images.len(), "gallery refreshed");
                let snapshot = Arc::new(CacheSnapshot::new(images, Instant::now()));
                state.snapshot = Some(snapshot.clone());
                state.last_failure = None;
                Ok(Lookup {
                    snapshot,
                    source: SnapshotSource::Refreshed,
                })
            }
            Err(err) => {
                state.last_failure = Some(err.clone());
                match &state.snapshot {
                    Some(previous) => {
                        if err.is_transient() {
                            warn!(error = %err, "gallery refresh failed, serving previous snapshot");
                        } else {
                            error!(error = %err, "gallery refresh failed persistently, serving previous snapshot");
                        }
                        Ok(Lookup {
                            snapshot: previous.clone(),
                            source: SnapshotSource::Stale,
                        })
                    }
                    None => {
                        error!(error = %err, "gallery refresh failed with no snapshot to fall back to");
                        Err(CacheError::Unavailable(err))
                    }
                }
            }
        }
    }

    /// One fetch + extract round trip. No retries.
    async fn refresh(&self) -> Result<Vec<ImageRecord>, RefreshError> {
        debug!(url = %self.settings.album_url, "refreshing gallery from album");
        let html = self
            .fetcher
            .fetch(&self.settings.album_url, self.settings.fetch_timeout)
            .await?;
        Ok(self.extractor.extract(&html)?)
    }
}
