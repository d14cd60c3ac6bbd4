//! Service configuration.
//!
//! Loaded from a single `config.toml`. The file is sparse: user values are
//! merged over the stock defaults ([`merge_toml`]), unknown keys are rejected
//! to catch typos, and the merged result is validated before use.
//!
//! ## Configuration Options
//!
//! ```toml
//! [gallery]
//! album_url = "https://photos.google.com/share/..."
//! ttl_secs = 900                  # Snapshot freshness window
//! fetch_timeout_secs = 5          # Album page fetch timeout
//! size_suffix = "=w1200"          # Appended to each photo base URL
//! caption = "Impact Moment"
//!
//! [credentials]
//! photo_timeout_secs = 6          # Subject photo fetch timeout
//! font_family = "Helvetica, Arial, Liberation Sans, DejaVu Sans, sans-serif"
//! serif_font_family = "Times New Roman, Liberation Serif, DejaVu Serif, serif"
//! render_scale = 2.0              # Raster pixels per layout point
//! font_dirs = []                  # Extra font directories for rendering
//! load_system_fonts = true
//!
//! [http]
//! user_agent = "vaaradhi/<version>"
//! max_body_bytes = 10485760       # Larger responses are refused
//! ```
//!
//! Outbound timeouts are capped at single-digit seconds: a slow album host or
//! photo server must degrade into the stale-cache or placeholder path quickly
//! rather than stall the request that triggered it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::parse_absolute_url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Shared album the gallery is synced from.
pub const DEFAULT_ALBUM_URL: &str = "https://photos.google.com/share/AF1QipPxjMKZ5PJIc9G2sIfqlIzcdNXj_3107jg2arKy56YpzC5csr6jz9MFiwOzQaBOiw?pli=1&key=TTNpd1lIRUZ1QnVHZ3Z1SUEzZ3FCbnpPY3hBSFpR";

/// Upper bound (exclusive) for any outbound timeout, in seconds.
const MAX_TIMEOUT_SECS: u64 = 10;

/// Accepted range for `credentials.render_scale`.
const RENDER_SCALE_RANGE: std::ops::RangeInclusive<f32> = 0.5..=4.0;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Album sync and cache settings.
    pub gallery: GalleryConfig,
    /// Credential rendering settings.
    pub credentials: CredentialsConfig,
    /// Outbound HTTP client settings.
    pub http: HttpConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_absolute_url(&self.gallery.album_url)
            .map_err(|e| ConfigError::Validation(format!("gallery.album_url: {e}")))?;
        if self.gallery.ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "gallery.ttl_secs must be non-zero".into(),
            ));
        }
        check_timeout("gallery.fetch_timeout_secs", self.gallery.fetch_timeout_secs)?;
        check_timeout(
            "credentials.photo_timeout_secs",
            self.credentials.photo_timeout_secs,
        )?;
        if !RENDER_SCALE_RANGE.contains(&self.credentials.render_scale) {
            return Err(ConfigError::Validation(format!(
                "credentials.render_scale must be between {} and {}",
                RENDER_SCALE_RANGE.start(),
                RENDER_SCALE_RANGE.end()
            )));
        }
        if self.gallery.size_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "gallery.size_suffix must not be empty".into(),
            ));
        }
        if self.http.max_body_bytes == 0 {
            return Err(ConfigError::Validation(
                "http.max_body_bytes must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn check_timeout(key: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 || secs >= MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "{key} must be between 1 and {}",
            MAX_TIMEOUT_SECS - 1
        )));
    }
    Ok(())
}

/// Album sync and cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Public share URL of the album page.
    pub album_url: String,
    /// How long a snapshot is served without a refresh.
    pub ttl_secs: u64,
    /// Total timeout for fetching the album page.
    pub fetch_timeout_secs: u64,
    /// Sizing parameter appended to each photo base URL.
    pub size_suffix: String,
    /// Caption given to every image.
    pub caption: String,
}

impl GalleryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            album_url: DEFAULT_ALBUM_URL.to_string(),
            ttl_secs: 15 * 60,
            fetch_timeout_secs: 5,
            size_suffix: "=w1200".to_string(),
            caption: crate::types::DEFAULT_CAPTION.to_string(),
        }
    }
}

/// Credential rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Total timeout for fetching a subject photo.
    pub photo_timeout_secs: u64,
    /// CSS-style font family list for sans-serif text.
    pub font_family: String,
    /// CSS-style font family list for certificate serif text.
    pub serif_font_family: String,
    /// Raster pixels per layout point for PNG output.
    pub render_scale: f32,
    /// Extra directories scanned for fonts.
    pub font_dirs: Vec<PathBuf>,
    /// Whether the system font directories are scanned. The bundled DejaVu
    /// faces are loaded either way.
    pub load_system_fonts: bool,
}

impl CredentialsConfig {
    pub fn photo_timeout(&self) -> Duration {
        Duration::from_secs(self.photo_timeout_secs)
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            photo_timeout_secs: 6,
            font_family: "Helvetica, Arial, Liberation Sans, DejaVu Sans, sans-serif".to_string(),
            serif_font_family: "Times New Roman, Liberation Serif, DejaVu Serif, serif"
                .to_string(),
            render_scale: 2.0,
            font_dirs: Vec::new(),
            load_system_fonts: true,
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Responses with a larger body are refused rather than truncated.
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("vaaradhi/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`.
///
/// A missing file yields the stock defaults; an unreadable or invalid file
/// is an error.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> String {
    format!(
        r##"# Vaaradhi Configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Gallery sync
# ---------------------------------------------------------------------------
[gallery]
# Public share link of the photo album the gallery mirrors.
album_url = "{album_url}"

# Seconds a fetched snapshot is served before the album is fetched again.
# A failed refresh keeps serving the previous snapshot.
ttl_secs = 900

# Timeout for fetching the album page (1-9 seconds).
fetch_timeout_secs = 5

# Sizing parameter appended to every photo URL.
size_suffix = "=w1200"

# Caption shown for every photo.
caption = "Impact Moment"

# ---------------------------------------------------------------------------
# Credentials (ID cards, certificates)
# ---------------------------------------------------------------------------
[credentials]
# Timeout for fetching a subject photo (1-9 seconds). On failure the photo
# slot gets a placeholder; the document is still produced.
photo_timeout_secs = 6

# Font family list used for sans-serif text.
font_family = "Helvetica, Arial, Liberation Sans, DejaVu Sans, sans-serif"

# Font family list used for certificate serif text.
serif_font_family = "Times New Roman, Liberation Serif, DejaVu Serif, serif"

# Raster pixels per layout point for PNG output (0.5-4.0).
render_scale = 2.0

# Extra directories to load fonts from.
font_dirs = []

# Scan the system font directories. DejaVu Sans/Serif are built in.
load_system_fonts = true

# ---------------------------------------------------------------------------
# Outbound HTTP
# ---------------------------------------------------------------------------
[http]
user_agent = "{user_agent}"

# Responses larger than this are refused.
max_body_bytes = 10485760
"##,
        album_url = DEFAULT_ALBUM_URL,
        user_agent = HttpConfig::default().user_agent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.gallery.ttl(), Duration::from_secs(900));
        assert_eq!(config.gallery.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.gallery.size_suffix, "=w1200");
        assert_eq!(config.gallery.caption, "Impact Moment");
        assert_eq!(config.credentials.photo_timeout(), Duration::from_secs(6));
        assert!(config.credentials.load_system_fonts);
        assert_eq!(config.credentials.render_scale, 2.0);
        assert_eq!(config.http.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let config: AppConfig = toml::from_str(
            r#"
[gallery]
ttl_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(config.gallery.ttl_secs, 60);
        // Unspecified values keep their defaults
        assert_eq!(config.gallery.fetch_timeout_secs, 5);
        assert_eq!(config.credentials.photo_timeout_secs, 6);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.gallery.album_url, DEFAULT_ALBUM_URL);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[gallery]
album_url = "https://albums.example/share/xyz"
caption = "Field Visit"

[credentials]
font_dirs = ["/opt/fonts"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.gallery.album_url, "https://albums.example/share/xyz");
        assert_eq!(config.gallery.caption, "Field Visit");
        assert_eq!(config.credentials.font_dirs, vec![PathBuf::from("/opt/fonts")]);
        assert_eq!(config.gallery.ttl_secs, 900);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[gallery]\nfetch_timeout_secs = 30\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_zero_ttl() {
        let mut config = AppConfig::default();
        config.gallery.ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_timeout_boundaries() {
        let mut config = AppConfig::default();
        config.credentials.photo_timeout_secs = 9;
        assert!(config.validate().is_ok());
        config.credentials.photo_timeout_secs = 10;
        assert!(config.validate().is_err());
        config.credentials.photo_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_relative_album_url() {
        let mut config = AppConfig::default();
        config.gallery.album_url = "/share/abc".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gallery.album_url"));
    }

    #[test]
    fn validate_render_scale_range() {
        let mut config = AppConfig::default();
        config.credentials.render_scale = 4.0;
        assert!(config.validate().is_ok());
        config.credentials.render_scale = 0.1;
        assert!(config.validate().is_err());
        config.credentials.render_scale = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_empty_size_suffix() {
        let mut config = AppConfig::default();
        config.gallery.size_suffix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_body_cap() {
        let mut config = AppConfig::default();
        config.http.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Merge tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\nz = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        let a = merged.get("a").unwrap();
        assert_eq!(a.get("x").unwrap().as_integer(), Some(1));
        assert_eq!(a.get("y").unwrap().as_integer(), Some(3));
        assert_eq!(a.get("z").unwrap().as_integer(), Some(4));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let merged = merge_toml(toml::Value::Integer(1), toml::Value::Integer(2));
        assert_eq!(merged.as_integer(), Some(2));
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str("[gallery]\nttl = 5\n").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_section_rejected() {
        let overlay: toml::Value = toml::from_str("[payments]\nkey = \"x\"\n").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let value: toml::Value = toml::from_str(&stock_config_toml()).unwrap();
        let config = resolve_config(Some(value)).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.gallery.album_url, defaults.gallery.album_url);
        assert_eq!(config.gallery.ttl_secs, defaults.gallery.ttl_secs);
        assert_eq!(config.gallery.size_suffix, defaults.gallery.size_suffix);
        assert_eq!(config.credentials.font_family, defaults.credentials.font_family);
        assert_eq!(
            config.credentials.serif_font_family,
            defaults.credentials.serif_font_family
        );
        assert_eq!(config.credentials.render_scale, defaults.credentials.render_scale);
        assert_eq!(config.http.user_agent, defaults.http.user_agent);
        assert_eq!(config.http.max_body_bytes, defaults.http.max_body_bytes);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        for section in ["gallery", "credentials", "http"] {
            assert!(value.get(section).is_some(), "missing [{section}]");
        }
    }
}
