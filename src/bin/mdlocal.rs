//! CLI binary for mdlocal.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `LocalizeConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mdlocal::{
    list_links, localize, LinkError, LinkOutcome, LocalAsset, LocalizeConfig,
    LocalizeProgressCallback, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// `{wide_msg}` shows the link currently being fetched.
const BAR_TEMPLATE: &str = "{spinner:.cyan} {prefix:.bold}  \
     [{bar:42.green/238}] {pos:>3}/{len} links  ⏱ {elapsed_precise}  {wide_msg:.dim}";

/// Prints one line per link. With a terminal the lines go above a live
/// progress bar; otherwise they are plain stdout lines.
struct CliProgressCallback {
    bar: Option<ProgressBar>,
    optimize: bool,
}

impl CliProgressCallback {
    fn new(show_bar: bool, optimize: bool) -> Arc<Self> {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Downloading");
            bar
        });
        Arc::new(Self { bar, optimize })
    }

    /// `ProgressBar::println` is a no-op when the bar is hidden (no TTY), so
    /// fall back to stdout there.
    fn line(&self, text: String) {
        match self.bar {
            Some(ref bar) if !bar.is_hidden() => bar.println(text),
            _ => println!("{text}"),
        }
    }

    fn saved(&self, index: usize, total: usize, filename: &str) {
        let verb = if self.optimize {
            "Downloaded, optimized, and replaced"
        } else {
            "Downloaded and replaced"
        };
        self.line(format!("{verb} file {index} of {total}: {filename}"));
    }

    fn tick(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }
}

impl LocalizeProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_links: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_length(total_links as u64);
            bar.enable_steady_tick(Duration::from_millis(80));
        }
    }

    fn on_link_start(&self, _index: usize, _total: usize, link: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(link.to_string());
        }
    }

    fn on_link_saved(&self, index: usize, total: usize, asset: &LocalAsset) {
        self.saved(index, total, &asset.filename);
        self.tick();
    }

    fn on_link_skipped(&self, _index: usize, _total: usize, _link: &str, _status: u16) {
        self.tick();
    }

    /// Repeats echo the first occurrence so the `i of n` count stays gapless
    /// for saved and failed links.
    fn on_link_duplicate(&self, index: usize, total: usize, link: &str, first: &LinkOutcome) {
        match first {
            LinkOutcome::Saved(asset) => self.saved(index, total, &asset.filename),
            LinkOutcome::Failed { error } => {
                self.line(format!("Failed to download {link}: {error}"))
            }
            LinkOutcome::Skipped { .. } | LinkOutcome::Duplicate => {}
        }
        self.tick();
    }

    fn on_link_failed(&self, _index: usize, _total: usize, error: &LinkError) {
        self.line(format!("Failed to download {}: {}", error.link(), error));
        self.tick();
    }

    fn on_run_complete(&self, _total_links: usize, _saved: usize) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download every linked image next to the document
  mdlocal notes.md

  # Also shrink images to at most 1024 px and re-encode at quality 85
  mdlocal notes.md --optimize

  # Custom output document and images directory
  mdlocal notes.md -o site/notes.md --images-dir site/assets

  # Links hosted somewhere else
  mdlocal --host-marker cdn.example.com notes.md

  # Show which links would be downloaded, without downloading
  mdlocal --list-only notes.md

  # Machine-readable summary
  mdlocal --json notes.md > report.json

OUTPUTS:
  links.txt                    every matched link, one per line
  images/                      downloaded files, named <sha256 prefix>.<ext>
  <input>_local_images.md      the document with links replaced

ENVIRONMENT VARIABLES:
  RUST_LOG                     Log filter, e.g. RUST_LOG=mdlocal=debug
"#;

/// Download remote images referenced by a Markdown file and rewrite it to use local copies.
#[derive(Parser, Debug)]
#[command(
    name = "mdlocal",
    version,
    about = "Download remote images referenced by a Markdown file and rewrite it to use local copies",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown (or any text) file to process.
    input: PathBuf,

    /// Resize images to fit the maximum dimension and re-encode them.
    #[arg(long)]
    optimize: bool,

    /// Write the rewritten document here instead of <input>_local_images.md.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for downloaded images, also used as the link prefix.
    #[arg(long, default_value = mdlocal::config::DEFAULT_IMAGES_DIR)]
    images_dir: String,

    /// File receiving the list of matched links.
    #[arg(long, default_value = mdlocal::config::DEFAULT_MANIFEST)]
    manifest: PathBuf,

    /// Substring a URL must contain to be localised.
    #[arg(long, default_value = mdlocal::config::DEFAULT_HOST_MARKER)]
    host_marker: String,

    /// Longest side after --optimize, in pixels.
    #[arg(long, default_value_t = mdlocal::config::DEFAULT_MAX_DIMENSION)]
    max_dimension: u32,

    /// JPEG quality after --optimize (1–100).
    #[arg(long, default_value_t = mdlocal::config::DEFAULT_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Number of hex digits of the URL hash used in file names (8–64).
    #[arg(long, default_value_t = mdlocal::config::DEFAULT_HASH_LEN)]
    hash_len: usize,

    /// Per-request timeout in seconds (default: none).
    #[arg(long)]
    timeout: Option<u64>,

    /// Print matched links and exit without downloading.
    #[arg(long)]
    list_only: bool,

    /// Output structured JSON (LocalizeOutput) instead of console lines.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Per-link lines already tell the user what happened; keep library
    // INFO logs out of the way unless asked for.
    let print_lines = !cli.quiet && !cli.json;
    let show_progress = print_lines && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || print_lines {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if print_lines {
        let cb = CliProgressCallback::new(show_progress, cli.optimize);
        Some(cb as Arc<dyn LocalizeProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list_only {
        let links = list_links(&cli.input, &config)
            .await
            .with_context(|| format!("Failed to read {}", cli.input.display()))?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&links).context("Failed to serialise links")?
            );
        } else {
            for link in &links {
                println!("{link}");
            }
            if !cli.quiet {
                println!("Total links found: {}", links.len());
            }
        }
        return Ok(());
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let output = localize(&cli.input, &config)
        .await
        .context("Localisation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        println!("Total links found: {}", output.stats.total_links);
        if let Some(ref path) = output.output_path {
            eprintln!(
                "{}  {}/{} saved  {}ms  →  {}",
                if output.stats.failed == 0 {
                    green("✔")
                } else {
                    red("⚠")
                },
                output.stats.saved,
                output.stats.total_links,
                output.stats.duration_ms,
                bold(&path.display().to_string()),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `LocalizeConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<LocalizeConfig> {
    let mut builder = LocalizeConfig::builder()
        .optimize(cli.optimize)
        .max_dimension(cli.max_dimension)
        .quality(cli.quality)
        .hash_len(cli.hash_len)
        .host_marker(cli.host_marker.clone())
        .images_dir(cli.images_dir.clone())
        .manifest_file(cli.manifest.clone());

    if let Some(ref output) = cli.output {
        builder = builder.output_path(output.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
