//! Error types for the mdlocal library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`LocalizeError`] — **Fatal**: the run cannot proceed at all (input
//!   document missing, manifest or output not writable, bad configuration).
//!   Returned as `Err(LocalizeError)` from the top-level `localize*` functions.
//!
//! * [`LinkError`] — **Non-fatal**: a single link failed (DNS failure, reset
//!   connection, undecodable image) but every other link is unaffected.
//!   Stored inside [`crate::output::LinkOutcome::Failed`] so callers can
//!   report it and move on.
//!
//! A non-200 HTTP status is neither: it is a silent skip, recorded as
//! [`crate::output::LinkOutcome::Skipped`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mdlocal library.
///
/// Per-link failures use [`LinkError`] and never surface here.
#[derive(Debug, Error)]
pub enum LocalizeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input document was not found at the given path.
    #[error("Input document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the document.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the document.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid UTF-8 text.
    #[error("Input document '{path}' is not valid UTF-8 text")]
    InvalidUtf8 { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not write the link manifest.
    #[error("Failed to write link manifest '{path}': {source}")]
    ManifestWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create the local images directory.
    #[error("Failed to create images directory '{path}': {source}")]
    ImagesDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the rewritten document.
    #[error("Failed to write output document '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed (TLS backend init etc.).
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single link.
///
/// The run logs it, leaves the link's remote URL in the document, and
/// continues with the next link. There are no retries.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum LinkError {
    /// Transport-level failure: DNS, connect, TLS, reset.
    #[error("{reason}")]
    Fetch { link: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { link: String, secs: u64 },

    /// The connection failed while the response body was streaming.
    #[error("response body interrupted: {reason}")]
    Body { link: String, reason: String },

    /// The fetched bytes could not be decoded as an image.
    #[error("cannot decode image: {reason}")]
    Decode { link: String, reason: String },

    /// The decoded image could not be re-encoded for the target extension.
    #[error("cannot encode image as {extension}: {reason}")]
    Encode {
        link: String,
        extension: String,
        reason: String,
    },

    /// The local asset file could not be written.
    #[error("cannot write '{path}': {reason}")]
    Write {
        link: String,
        path: PathBuf,
        reason: String,
    },
}

impl LinkError {
    /// The link this error belongs to.
    pub fn link(&self) -> &str {
        match self {
            LinkError::Fetch { link, .. }
            | LinkError::Timeout { link, .. }
            | LinkError::Body { link, .. }
            | LinkError::Decode { link, .. }
            | LinkError::Encode { link, .. }
            | LinkError::Write { link, .. } => link,
        }
    }
}
