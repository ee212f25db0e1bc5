//! Result types produced by a localisation run.

use crate::error::LinkError;
use serde::Serialize;
use std::path::PathBuf;

/// A downloaded image stored under the local images directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalAsset {
    /// The remote URL the asset was fetched from.
    pub link: String,
    /// `<hash prefix><extension>`, e.g. `3f1a…9c.jpg`.
    pub filename: String,
    /// The reference written into the document: `images/<filename>`.
    pub relative_path: String,
    /// Where the file was written on disk.
    pub path: PathBuf,
    /// Size of the file on disk.
    pub bytes_written: u64,
    /// True when the image was decoded, bounded and re-encoded.
    pub optimized: bool,
    /// Final pixel dimensions; only known for optimised images.
    pub dimensions: Option<(u32, u32)>,
}

/// What happened to one link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkOutcome {
    /// Fetched with status 200 and written to disk; the document now points at it.
    Saved(LocalAsset),
    /// The server answered with a non-200 status. Nothing was written and the
    /// remote URL stays in the document.
    Skipped { status: u16 },
    /// The same link text was already handled earlier in this run.
    Duplicate,
    /// Fetching, decoding, encoding or writing failed.
    Failed { error: LinkError },
}

impl LinkOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, LinkOutcome::Saved(_))
    }
}

/// One entry per extracted link, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkResult {
    /// 1-based position in the link list.
    pub index: usize,
    pub link: String,
    pub outcome: LinkOutcome,
}

impl LinkResult {
    /// The saved asset, if this link produced one.
    pub fn asset(&self) -> Option<&LocalAsset> {
        match &self.outcome {
            LinkOutcome::Saved(asset) => Some(asset),
            _ => None,
        }
    }

    /// The failure, if this link failed.
    pub fn error(&self) -> Option<&LinkError> {
        match &self.outcome {
            LinkOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Links extracted from the document, duplicates included.
    pub total_links: usize,
    pub saved: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub failed: usize,
    /// Sum of `bytes_written` over all saved assets.
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl RunStats {
    /// Tally outcomes from a finished link list.
    pub fn from_results(results: &[LinkResult], duration_ms: u64) -> Self {
        let mut stats = RunStats {
            total_links: results.len(),
            duration_ms,
            ..Default::default()
        };
        for r in results {
            match &r.outcome {
                LinkOutcome::Saved(asset) => {
                    stats.saved += 1;
                    stats.bytes_written += asset.bytes_written;
                }
                LinkOutcome::Skipped { .. } => stats.skipped += 1,
                LinkOutcome::Duplicate => stats.duplicates += 1,
                LinkOutcome::Failed { .. } => stats.failed += 1,
            }
        }
        stats
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct LocalizeOutput {
    /// The rewritten document text.
    #[serde(skip)]
    pub document: String,
    /// Every extracted link, in extraction order (the manifest contents).
    pub links: Vec<String>,
    /// Per-link outcomes, same order as `links`.
    pub results: Vec<LinkResult>,
    pub stats: RunStats,
    pub manifest_path: PathBuf,
    /// Where the rewritten document was written; None for in-memory runs.
    pub output_path: Option<PathBuf>,
}

impl LocalizeOutput {
    /// Iterate over the assets that were written in this run.
    pub fn assets(&self) -> impl Iterator<Item = &LocalAsset> {
        self.results.iter().filter_map(LinkResult::asset)
    }
}
