//! Configuration types for image localisation.
//!
//! Every knob lives in [`LocalizeConfig`], built via its
//! [`LocalizeConfigBuilder`]. The defaults reproduce the classic behaviour:
//! links hosted on `amazonaws`, 25-character hash names, files under
//! `images/`, a `links.txt` manifest, and 1024 px / quality 85 when
//! optimisation is requested.

use crate::error::LocalizeError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Substring a link must contain to be picked up by the extractor.
pub const DEFAULT_HOST_MARKER: &str = "amazonaws";
/// Local subdirectory that receives downloaded images.
pub const DEFAULT_IMAGES_DIR: &str = "images";
/// File the extracted links are written to.
pub const DEFAULT_MANIFEST: &str = "links.txt";
/// Number of hex characters of the SHA-256 digest kept in filenames.
pub const DEFAULT_HASH_LEN: usize = 25;
/// Bounding box (both axes) for optimised images, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;
/// JPEG quality used when optimising.
pub const DEFAULT_QUALITY: u8 = 85;
/// Appended to the input path (minus its extension) to form the output path.
pub const OUTPUT_SUFFIX: &str = "_local_images.md";

/// Configuration for a localisation run.
///
/// Built via [`LocalizeConfig::builder()`] or using
/// [`LocalizeConfig::default()`].
///
/// # Example
/// ```rust
/// use mdlocal::LocalizeConfig;
///
/// let config = LocalizeConfig::builder()
///     .optimize(true)
///     .max_dimension(800)
///     .build()
///     .unwrap();
/// assert!(config.optimize);
/// ```
#[derive(Clone)]
pub struct LocalizeConfig {
    /// Decode, downscale and re-encode each image instead of saving the raw
    /// bytes. Default: false.
    pub optimize: bool,

    /// Longest allowed edge after optimisation. Default: 1024.
    ///
    /// Images already inside the box keep their size; nothing is upscaled.
    pub max_dimension: u32,

    /// JPEG quality (1–100) used when optimising. Default: 85.
    ///
    /// PNG output ignores this and uses the best lossless compression level.
    pub quality: u8,

    /// Hex characters of the SHA-256 digest kept in each filename. Range: 8–64.
    /// Default: 25 (~100 bits).
    pub hash_len: usize,

    /// Substring that identifies image links worth localising.
    /// Default: `amazonaws`.
    pub host_marker: String,

    /// Directory all relative outputs are resolved against. Default: `.`.
    pub work_dir: PathBuf,

    /// Images subdirectory, relative to `work_dir`. Also the prefix written
    /// into the document (`images/<file>`). Default: `images`.
    pub images_dir: String,

    /// Manifest file, relative to `work_dir`. Default: `links.txt`.
    pub manifest_file: PathBuf,

    /// Explicit output path. If None, derived from the input path.
    pub output_path: Option<PathBuf>,

    /// Per-request timeout in seconds. If None, the transport default applies
    /// (no timeout).
    pub timeout_secs: Option<u64>,

    /// Per-link progress events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for LocalizeConfig {
    fn default() -> Self {
        Self {
            optimize: false,
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_QUALITY,
            hash_len: DEFAULT_HASH_LEN,
            host_marker: DEFAULT_HOST_MARKER.to_string(),
            work_dir: PathBuf::from("."),
            images_dir: DEFAULT_IMAGES_DIR.to_string(),
            manifest_file: PathBuf::from(DEFAULT_MANIFEST),
            output_path: None,
            timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for LocalizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizeConfig")
            .field("optimize", &self.optimize)
            .field("max_dimension", &self.max_dimension)
            .field("quality", &self.quality)
            .field("hash_len", &self.hash_len)
            .field("host_marker", &self.host_marker)
            .field("work_dir", &self.work_dir)
            .field("images_dir", &self.images_dir)
            .field("manifest_file", &self.manifest_file)
            .field("output_path", &self.output_path)
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn LocalizeProgressCallback>"),
            )
            .finish()
    }
}

impl LocalizeConfig {
    /// Create a new builder for `LocalizeConfig`.
    pub fn builder() -> LocalizeConfigBuilder {
        LocalizeConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory the image files are written into.
    pub fn images_path(&self) -> PathBuf {
        self.work_dir.join(&self.images_dir)
    }

    /// Where the link manifest is written.
    pub fn manifest_path(&self) -> PathBuf {
        self.work_dir.join(&self.manifest_file)
    }

    /// Prefix used for local references in the rewritten document.
    ///
    /// Always forward-slash separated so the Markdown stays portable.
    pub fn link_prefix(&self) -> String {
        self.images_dir.replace('\\', "/")
    }
}

/// Builder for [`LocalizeConfig`].
#[derive(Debug)]
pub struct LocalizeConfigBuilder {
    config: LocalizeConfig,
}

impl LocalizeConfigBuilder {
    pub fn optimize(mut self, v: bool) -> Self {
        self.config.optimize = v;
        self
    }

    pub fn max_dimension(mut self, px: u32) -> Self {
        self.config.max_dimension = px.max(1);
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q.clamp(1, 100);
        self
    }

    pub fn hash_len(mut self, n: usize) -> Self {
        self.config.hash_len = n;
        self
    }

    pub fn host_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.host_marker = marker.into();
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn images_dir(mut self, dir: impl Into<String>) -> Self {
        let dir: String = dir.into();
        self.config.images_dir = dir.trim_end_matches(['/', '\\']).to_string();
        self
    }

    pub fn manifest_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.manifest_file = path.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = Some(path.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<LocalizeConfig, LocalizeError> {
        let c = &self.config;
        if !(8..=64).contains(&c.hash_len) {
            return Err(LocalizeError::InvalidConfig(format!(
                "hash length must be 8–64 hex characters, got {}",
                c.hash_len
            )));
        }
        if c.host_marker.is_empty() || c.host_marker.chars().any(char::is_whitespace) {
            return Err(LocalizeError::InvalidConfig(format!(
                "host marker must be a non-empty string without whitespace, got {:?}",
                c.host_marker
            )));
        }
        if c.images_dir.is_empty() {
            return Err(LocalizeError::InvalidConfig(
                "images directory must not be empty".into(),
            ));
        }
        if c.timeout_secs == Some(0) {
            return Err(LocalizeError::InvalidConfig(
                "timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
