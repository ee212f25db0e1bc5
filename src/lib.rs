//! # mdlocal
//!
//! Download the remote images a Markdown document links to and rewrite the
//! document to point at the local copies.
//!
//! ## Why this crate?
//!
//! Notes exported from hosted editors reference images through signed,
//! expiring object-storage URLs. Once those links rot the document loses its
//! figures. This crate pulls every such image next to the document, names it
//! by a hash of its URL and produces a copy of the document that only uses
//! relative paths.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document.md
//!  │
//!  ├─ 1. Read      UTF-8 text from disk
//!  ├─ 2. Extract   URLs containing the host marker with an image extension
//!  ├─ 3. Manifest  links.txt, one link per line
//!  ├─ 4. Fetch     sequential HTTP GET; only 200 counts
//!  ├─ 5. Store     images/<sha256 prefix>.<ext>, optionally resized
//!  └─ 6. Rewrite   document_local_images.md with local paths
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdlocal::{localize, LocalizeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LocalizeConfig::builder().optimize(true).build()?;
//!     let output = localize("notes.md", &config).await?;
//!     println!("Total links found: {}", output.stats.total_links);
//!     eprintln!("saved {} / failed {}", output.stats.saved, output.stats.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mdlocal` binary (clap + anyhow + tracing-subscriber + indicatif + serde_json) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! mdlocal = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod localize;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{LocalizeConfig, LocalizeConfigBuilder};
pub use error::{LinkError, LocalizeError};
pub use localize::{list_links, localize, localize_document, localize_sync, localize_with_fetcher};
pub use output::{LinkOutcome, LinkResult, LocalAsset, LocalizeOutput, RunStats};
pub use pipeline::extract::{extract_links, LinkExtractor};
pub use pipeline::fetch::{FetchResponse, Fetcher, HttpFetcher};
pub use pipeline::name::local_filename;
pub use progress::{LocalizeProgressCallback, NoopProgressCallback, ProgressCallback};
