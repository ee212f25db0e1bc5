//! Progress-callback trait for per-link localisation events.
//!
//! Inject an [`Arc<dyn LocalizeProgressCallback>`] via
//! [`crate::config::LocalizeConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the link list. The CLI uses this to
//! print its per-link lines above a progress bar; library callers can forward
//! events anywhere without the library knowing how they are displayed.
//!
//! # Example
//!
//! ```rust
//! use mdlocal::{LocalAsset, LocalizeConfig, LocalizeProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     saved: AtomicUsize,
//! }
//!
//! impl LocalizeProgressCallback for CountingCallback {
//!     fn on_link_saved(&self, index: usize, total: usize, asset: &LocalAsset) {
//!         self.saved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{index}/{total} → {}", asset.filename);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { saved: AtomicUsize::new(0) });
//!
//! let config = LocalizeConfig::builder()
//!     .progress_callback(counter as Arc<dyn LocalizeProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::LinkError;
use crate::output::{LinkOutcome, LocalAsset};
use std::sync::Arc;

/// Called by the orchestrator as it processes each link.
///
/// Links are processed strictly one at a time, in document order, so events
/// arrive in order. Implementations are still `Send + Sync` so a config can be
/// shared with other tasks. All methods default to no-ops.
pub trait LocalizeProgressCallback: Send + Sync {
    /// Called once after extraction, before the first fetch.
    ///
    /// # Arguments
    /// * `total_links` — number of links found (duplicates included)
    fn on_run_start(&self, total_links: usize) {
        let _ = total_links;
    }

    /// Called just before a link is fetched.
    ///
    /// # Arguments
    /// * `index` — 1-based position in the link list
    /// * `total` — number of links in the run
    /// * `link`  — the remote URL
    fn on_link_start(&self, index: usize, total: usize, link: &str) {
        let _ = (index, total, link);
    }

    /// Called when a link was downloaded (and optimised, if enabled) and
    /// written to disk.
    fn on_link_saved(&self, index: usize, total: usize, asset: &LocalAsset) {
        let _ = (index, total, asset);
    }

    /// Called when the server answered with anything but 200.
    fn on_link_skipped(&self, index: usize, total: usize, link: &str, status: u16) {
        let _ = (index, total, link, status);
    }

    /// Called when a link repeats one already handled in this run. It is not
    /// fetched again; `first` is the outcome of its first occurrence, which
    /// also decides how this occurrence is rewritten.
    fn on_link_duplicate(&self, index: usize, total: usize, link: &str, first: &LinkOutcome) {
        let _ = (index, total, link, first);
    }

    /// Called when fetching, decoding, encoding or writing failed.
    fn on_link_failed(&self, index: usize, total: usize, error: &LinkError) {
        let _ = (index, total, error);
    }

    /// Called once after every link has been attempted.
    ///
    /// # Arguments
    /// * `total_links` — links found
    /// * `saved`       — links that produced a local asset
    fn on_run_complete(&self, total_links: usize, saved: usize) {
        let _ = (total_links, saved);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl LocalizeProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::LocalizeConfig`].
pub type ProgressCallback = Arc<dyn LocalizeProgressCallback>;
