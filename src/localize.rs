//! Orchestration: the single linear pass over a document's image links.
//!
//! ```text
//! read ──▶ extract ──▶ manifest ──▶ images/ ──▶ per link ──▶ rewrite ──▶ write
//!                                                 │
//!                        fetch ─▶ 200? ─▶ name ─▶ optimise? ─▶ store
//! ```
//!
//! Links are handled strictly one after another. A link that fails is
//! recorded as [`LinkOutcome::Failed`] and the run moves on; only errors
//! touching the document, manifest or images directory abort it.

use crate::config::{LocalizeConfig, DEFAULT_HOST_MARKER};
use crate::error::{LinkError, LocalizeError};
use crate::output::{LinkOutcome, LinkResult, LocalAsset, LocalizeOutput, RunStats};
use crate::pipeline::extract::LinkExtractor;
use crate::pipeline::fetch::{Fetcher, HttpFetcher};
use crate::pipeline::{input, name, optimize, rewrite, store};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Localise the images of a document on disk, fetching over HTTP.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`  — path of the Markdown (or any text) document
/// * `config` — run configuration
///
/// # Returns
/// `Ok(LocalizeOutput)` once the rewritten document has been written, even
/// if every link failed (check `output.stats`).
///
/// # Errors
/// Returns `Err(LocalizeError)` only for fatal errors:
/// - document missing, unreadable or not UTF-8
/// - manifest, images directory or output document not writable
/// - invalid configuration
pub async fn localize(
    input: impl AsRef<Path>,
    config: &LocalizeConfig,
) -> Result<LocalizeOutput, LocalizeError> {
    let fetcher = HttpFetcher::new(config.timeout_secs)?;
    localize_with_fetcher(input, &fetcher, config).await
}

/// [`localize`] with a caller-supplied [`Fetcher`].
pub async fn localize_with_fetcher<F: Fetcher>(
    input: impl AsRef<Path>,
    fetcher: &F,
    config: &LocalizeConfig,
) -> Result<LocalizeOutput, LocalizeError> {
    let input = input.as_ref();
    info!("Starting localisation: {}", input.display());

    // ── Step 1: Read document ────────────────────────────────────────────
    let document = input::read_document(input).await?;

    // ── Steps 2–6: Extract, fetch, store, rewrite ────────────────────────
    let mut output = localize_document(&document, fetcher, config).await?;

    // ── Step 7: Write rewritten document ─────────────────────────────────
    let output_path = config
        .output_path
        .clone()
        .unwrap_or_else(|| input::derive_output_path(input));
    store::write_output_document(&output_path, &output.document).await?;
    info!("Wrote {}", output_path.display());

    output.output_path = Some(output_path);
    Ok(output)
}

/// Localise the images of an in-memory document.
///
/// Writes the manifest and the image files but not the document; the
/// rewritten text is returned in [`LocalizeOutput::document`].
pub async fn localize_document<F: Fetcher>(
    document: &str,
    fetcher: &F,
    config: &LocalizeConfig,
) -> Result<LocalizeOutput, LocalizeError> {
    let start = Instant::now();

    // ── Step 2: Extract links ────────────────────────────────────────────
    let extractor = resolve_extractor(config)?;
    let spans = extractor.find_spans(document);
    let links: Vec<String> = spans
        .iter()
        .map(|span| document[span.clone()].to_string())
        .collect();
    info!("Found {} links", links.len());

    // ── Step 3: Manifest ─────────────────────────────────────────────────
    let manifest_path = config.manifest_path();
    store::write_manifest(&manifest_path, &links).await?;

    // ── Step 4: Images directory ─────────────────────────────────────────
    store::ensure_images_dir(&config.images_path()).await?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(links.len());
    }

    // ── Step 5: Process links, one at a time ─────────────────────────────
    let total = links.len();
    // link → position in `results` of its first occurrence
    let mut first_seen: HashMap<&str, usize> = HashMap::with_capacity(total);
    let mut results: Vec<LinkResult> = Vec::with_capacity(total);
    let mut substitutions: Vec<(String, String)> = Vec::new();

    for (i, link) in links.iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_link_start(index, total, link);
        }

        let outcome = match first_seen.get(link.as_str()) {
            Some(&first) => {
                debug!("Link {} of {} repeats link {}: {}", index, total, first + 1, link);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_link_duplicate(index, total, link, &results[first].outcome);
                }
                LinkOutcome::Duplicate
            }
            None => {
                first_seen.insert(link.as_str(), i);
                let outcome = process_link(fetcher, link, config).await;
                report(config, index, total, link, &outcome);
                outcome
            }
        };

        if let LinkOutcome::Saved(ref asset) = outcome {
            substitutions.push((asset.link.clone(), asset.relative_path.clone()));
        }
        results.push(LinkResult {
            index,
            link: link.clone(),
            outcome,
        });
    }

    // ── Step 6: Rewrite ──────────────────────────────────────────────────
    let document = rewrite::rewrite_document(document, &spans, &substitutions);

    let stats = RunStats::from_results(&results, start.elapsed().as_millis() as u64);
    info!(
        "Localisation complete: {}/{} links saved, {} skipped, {} failed, {}ms",
        stats.saved, stats.total_links, stats.skipped, stats.failed, stats.duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, stats.saved);
    }

    Ok(LocalizeOutput {
        document,
        links,
        results,
        stats,
        manifest_path,
        output_path: None,
    })
}

/// Synchronous wrapper around [`localize`].
///
/// Creates a temporary single-threaded tokio runtime internally.
pub fn localize_sync(
    input: impl AsRef<Path>,
    config: &LocalizeConfig,
) -> Result<LocalizeOutput, LocalizeError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LocalizeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(localize(input, config))
}

/// Extract the links of a document without fetching or writing anything.
pub async fn list_links(
    input: impl AsRef<Path>,
    config: &LocalizeConfig,
) -> Result<Vec<String>, LocalizeError> {
    let document = input::read_document(input.as_ref()).await?;
    Ok(resolve_extractor(config)?.extract(&document))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Reuse the precompiled default pattern unless a custom marker is set.
fn resolve_extractor(config: &LocalizeConfig) -> Result<Cow<'static, LinkExtractor>, LocalizeError> {
    if config.host_marker == DEFAULT_HOST_MARKER {
        return Ok(Cow::Borrowed(LinkExtractor::default_marker()));
    }
    LinkExtractor::new(&config.host_marker)
        .map(Cow::Owned)
        .map_err(|e| LocalizeError::InvalidConfig(format!("host marker pattern: {e}")))
}

/// Fetch one link and turn every per-link fault into an outcome.
async fn process_link<F: Fetcher>(fetcher: &F, link: &str, config: &LocalizeConfig) -> LinkOutcome {
    match fetch_and_store(fetcher, link, config).await {
        Ok(outcome) => outcome,
        Err(error) => {
            warn!("Failed to download {}: {}", link, error);
            LinkOutcome::Failed { error }
        }
    }
}

async fn fetch_and_store<F: Fetcher>(
    fetcher: &F,
    link: &str,
    config: &LocalizeConfig,
) -> Result<LinkOutcome, LinkError> {
    let response = fetcher.fetch(link).await?;
    if response.status != 200 {
        debug!("Skipping {}: HTTP {}", link, response.status);
        return Ok(LinkOutcome::Skipped {
            status: response.status,
        });
    }

    let extension = name::detect_extension(link);
    let extension = if config.optimize {
        extension.reencode_target()
    } else {
        extension
    };
    let filename = format!("{}{}", name::link_hash(link, config.hash_len), extension);
    let path = config.images_path().join(&filename);

    let (bytes_written, dimensions) = if config.optimize {
        let raw = response.into_bytes().await?;
        let image = optimize::optimize_image_blocking(
            link,
            raw,
            extension,
            config.max_dimension,
            config.quality,
        )
        .await?;
        let dimensions = (image.width, image.height);
        let written = store::write_bytes_atomic(&path, link, image.bytes).await?;
        (written, Some(dimensions))
    } else {
        let written = store::write_stream(&path, link, response.body).await?;
        (written, None)
    };

    debug!("Saved {} → {} ({} bytes)", link, path.display(), bytes_written);

    Ok(LinkOutcome::Saved(LocalAsset {
        link: link.to_string(),
        relative_path: format!("{}/{}", config.link_prefix(), filename),
        filename,
        path,
        bytes_written,
        optimized: config.optimize,
        dimensions,
    }))
}

fn report(config: &LocalizeConfig, index: usize, total: usize, link: &str, outcome: &LinkOutcome) {
    let Some(ref cb) = config.progress_callback else {
        return;
    };
    match outcome {
        LinkOutcome::Saved(asset) => cb.on_link_saved(index, total, asset),
        LinkOutcome::Skipped { status } => cb.on_link_skipped(index, total, link, *status),
        LinkOutcome::Duplicate => {}
        LinkOutcome::Failed { error } => cb.on_link_failed(index, total, error),
    }
}
