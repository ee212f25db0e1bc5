//! Local filenames: truncated SHA-256 of the link text plus an extension.
//!
//! The name depends on nothing but the link string, so re-running over the
//! same document yields the same files. Remote names are never reused; S3
//! keys routinely contain characters and lengths that make poor local paths.

use sha2::{Digest, Sha256};
use std::fmt;

/// Image extensions the extractor and namer recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageExtension {
    Jpg,
    Jpeg,
    Heic,
    Png,
}

impl ImageExtension {
    /// Search order used by [`detect_extension`].
    pub const ALL: [ImageExtension; 4] = [
        ImageExtension::Jpg,
        ImageExtension::Jpeg,
        ImageExtension::Heic,
        ImageExtension::Png,
    ];

    /// Used when a link carries no recognised extension.
    pub const FALLBACK: ImageExtension = ImageExtension::Jpg;

    /// Lowercase extension including the leading dot.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageExtension::Jpg => ".jpg",
            ImageExtension::Jpeg => ".jpeg",
            ImageExtension::Heic => ".heic",
            ImageExtension::Png => ".png",
        }
    }

    /// The `image` crate encoder for this extension, if it has one.
    pub fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            ImageExtension::Jpg | ImageExtension::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageExtension::Png => Some(image::ImageFormat::Png),
            ImageExtension::Heic => None,
        }
    }

    /// Extension to name and encode a re-encoded image with.
    ///
    /// `.heic` has no encoder, so optimised HEIC links (often JPEGs under a
    /// `.heic` key) are written as [`ImageExtension::FALLBACK`] instead.
    pub fn reencode_target(self) -> ImageExtension {
        if self.image_format().is_some() {
            self
        } else {
            ImageExtension::FALLBACK
        }
    }
}

impl fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Find the first recognised extension anywhere in `link` (case-insensitive).
///
/// Falls back to [`ImageExtension::FALLBACK`] when none occurs.
pub fn detect_extension(link: &str) -> ImageExtension {
    let lower = link.to_ascii_lowercase();
    ImageExtension::ALL
        .iter()
        .filter_map(|ext| lower.find(ext.as_str()).map(|pos| (pos, *ext)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, ext)| ext)
        .unwrap_or(ImageExtension::FALLBACK)
}

/// Lowercase hex SHA-256 of `link`, truncated to `hash_len` characters.
pub fn link_hash(link: &str, hash_len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(hash_len);
    digest
}

/// Filename for the local copy of `link`: `<hash prefix><extension>`.
pub fn local_filename(link: &str, hash_len: usize) -> String {
    format!("{}{}", link_hash(link, hash_len), detect_extension(link))
}
