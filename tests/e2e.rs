//! End-to-end tests for mdlocal.
//!
//! Every test works in its own temporary directory. Network behaviour comes
//! either from an in-process stub [`Fetcher`] or from a local `httpmock`
//! server, so nothing leaves the machine.
//!
//! Mock URLs carry the host marker in their path
//! (`http://127.0.0.1:PORT/bucket.amazonaws/photo.png`) so the default
//! extractor picks them up.

use httpmock::prelude::*;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mdlocal::{
    local_filename, localize, localize_sync, localize_with_fetcher, FetchResponse, Fetcher,
    LinkError, LinkOutcome, LocalAsset, LocalizeConfig, LocalizeError, LocalizeProgressCallback,
};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs through the test harness; `RUST_LOG=mdlocal=debug`
/// shows them with `--nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Serves canned `(status, body)` pairs; unknown links fail like a DNS error.
#[derive(Default)]
struct StubFetcher {
    responses: HashMap<String, (u16, Vec<u8>)>,
}

impl StubFetcher {
    fn with(mut self, link: &str, status: u16, body: &[u8]) -> Self {
        self.responses
            .insert(link.to_string(), (status, body.to_vec()));
        self
    }
}

impl Fetcher for StubFetcher {
    async fn fetch(&self, link: &str) -> Result<FetchResponse, LinkError> {
        match self.responses.get(link) {
            Some((status, body)) => Ok(FetchResponse::from_bytes(*status, body.clone())),
            None => Err(LinkError::Fetch {
                link: link.to_string(),
                reason: "no such host".into(),
            }),
        }
    }
}

/// Temp dir holding `doc.md` with `content`; config writes into the same dir.
fn workspace(content: &str) -> (TempDir, PathBuf, LocalizeConfig) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("doc.md");
    std::fs::write(&input, content).unwrap();
    let config = LocalizeConfig::builder()
        .work_dir(dir.path())
        .build()
        .unwrap();
    (dir, input, config)
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn image_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir.join("images"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 200, 90])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn sha256_prefix(text: &str, len: usize) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))[..len].to_string()
}

// ── Stub-fetcher scenarios ───────────────────────────────────────────────────

#[tokio::test]
async fn document_example_is_localised() {
    let link = "https://bucket.amazonaws.com/photo.jpg?x=1";
    let doc = format!("see ![img]({link}) here");
    let (dir, input, config) = workspace(&doc);
    let fetcher = StubFetcher::default().with(link, 200, b"fixed jpeg bytes");

    let output = localize_with_fetcher(&input, &fetcher, &config)
        .await
        .unwrap();

    assert_eq!(output.stats.total_links, 1);
    assert_eq!(read(dir.path().join("links.txt")), link);

    let filename = format!("{}.jpg", sha256_prefix(link, 25));
    let files = image_files(dir.path());
    assert_eq!(files, vec![dir.path().join("images").join(&filename)]);
    assert_eq!(std::fs::read(&files[0]).unwrap(), b"fixed jpeg bytes");

    let out_path = dir.path().join("doc_local_images.md");
    assert_eq!(output.output_path.as_deref(), Some(out_path.as_path()));
    assert_eq!(read(&out_path), format!("see ![img](images/{filename}) here"));
    assert_eq!(read(&input), doc, "input must not be modified");
}

#[tokio::test]
async fn document_without_links_is_copied_verbatim() {
    let doc = "# Title\n\nNo remote images, only ![local](images/x.png).\n";
    let (dir, input, config) = workspace(doc);

    let output = localize_with_fetcher(&input, &StubFetcher::default(), &config)
        .await
        .unwrap();

    assert_eq!(output.stats.total_links, 0);
    assert_eq!(read(dir.path().join("links.txt")), "");
    assert!(dir.path().join("images").is_dir());
    assert!(image_files(dir.path()).is_empty());
    assert_eq!(read(dir.path().join("doc_local_images.md")), doc);
}

#[tokio::test]
async fn manifest_lists_every_occurrence_in_order() {
    let a = "https://b.amazonaws.com/a.png";
    let b = "https://b.amazonaws.com/b.jpeg";
    let doc = format!("{b}\n{a}\n{b}\n");
    let (dir, input, config) = workspace(&doc);
    let fetcher = StubFetcher::default()
        .with(a, 200, b"A")
        .with(b, 200, b"B");

    let output = localize_with_fetcher(&input, &fetcher, &config)
        .await
        .unwrap();

    assert_eq!(read(dir.path().join("links.txt")), format!("{b}\n{a}\n{b}"));
    assert_eq!(output.stats.total_links, 3);
    assert_eq!(output.stats.saved, 2);
    assert_eq!(output.stats.duplicates, 1);
    assert_eq!(image_files(dir.path()).len(), 2);

    let rewritten = read(dir.path().join("doc_local_images.md"));
    assert!(!rewritten.contains("amazonaws"), "{rewritten}");
}

#[tokio::test]
async fn mixed_outcomes_leave_unsaved_links_in_place() {
    let ok = "https://b.amazonaws.com/ok.png";
    let missing = "https://b.amazonaws.com/missing.png";
    let broken = "https://b.amazonaws.com/broken.png";
    let doc = format!("![1]({ok}) ![2]({missing}) ![3]({broken})");
    let (dir, input, config) = workspace(&doc);
    let fetcher = StubFetcher::default()
        .with(ok, 200, b"ok")
        .with(missing, 403, b"AccessDenied");

    let output = localize_with_fetcher(&input, &fetcher, &config)
        .await
        .unwrap();

    assert!(output.results[0].outcome.is_saved());
    assert_eq!(output.results[1].outcome, LinkOutcome::Skipped { status: 403 });
    assert!(matches!(
        output.results[2].outcome,
        LinkOutcome::Failed { .. }
    ));

    let rewritten = read(dir.path().join("doc_local_images.md"));
    assert!(!rewritten.contains(ok));
    assert!(rewritten.contains(missing));
    assert!(rewritten.contains(broken));
    assert_eq!(image_files(dir.path()).len(), 1);
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl LocalizeProgressCallback for RecordingCallback {
    fn on_run_start(&self, total_links: usize) {
        self.events.lock().unwrap().push(format!("start {total_links}"));
    }
    fn on_link_saved(&self, index: usize, total: usize, asset: &LocalAsset) {
        self.events
            .lock()
            .unwrap()
            .push(format!("saved {index}/{total} {}", asset.filename));
    }
    fn on_link_skipped(&self, index: usize, total: usize, _link: &str, status: u16) {
        self.events
            .lock()
            .unwrap()
            .push(format!("skipped {index}/{total} {status}"));
    }
    fn on_link_failed(&self, index: usize, total: usize, error: &LinkError) {
        self.events
            .lock()
            .unwrap()
            .push(format!("failed {index}/{total} {}", error.link()));
    }
    fn on_run_complete(&self, total_links: usize, saved: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete {saved}/{total_links}"));
    }
}

#[tokio::test]
async fn progress_events_follow_document_order() {
    let a = "https://b.amazonaws.com/a.png";
    let b = "https://b.amazonaws.com/b.png";
    let c = "https://b.amazonaws.com/c.png";
    let (dir, input, _) = workspace(&format!("{a} {b} {c}"));
    let recorder = Arc::new(RecordingCallback::default());
    let config = LocalizeConfig::builder()
        .work_dir(dir.path())
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let fetcher = StubFetcher::default().with(a, 200, b"a").with(b, 500, b"");

    localize_with_fetcher(&input, &fetcher, &config)
        .await
        .unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 3".to_string(),
            format!("saved 1/3 {}", local_filename(a, 25)),
            "skipped 2/3 500".to_string(),
            format!("failed 3/3 {c}"),
            "complete 1/3".to_string(),
        ]
    );
}

#[tokio::test]
async fn explicit_output_path_is_honoured() {
    let (dir, input, _) = workspace("no links");
    let target = dir.path().join("site").join("index.md");
    let config = LocalizeConfig::builder()
        .work_dir(dir.path())
        .output_path(&target)
        .build()
        .unwrap();

    let output = localize_with_fetcher(&input, &StubFetcher::default(), &config)
        .await
        .unwrap();

    assert_eq!(output.output_path, Some(target.clone()));
    assert_eq!(read(&target), "no links");
    assert!(!dir.path().join("doc_local_images.md").exists());
}

#[tokio::test]
async fn missing_input_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = LocalizeConfig::builder()
        .work_dir(dir.path())
        .build()
        .unwrap();

    let err = localize_with_fetcher(dir.path().join("nope.md"), &StubFetcher::default(), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, LocalizeError::FileNotFound { .. }), "got {err:?}");
    assert!(!dir.path().join("links.txt").exists());
}

#[tokio::test]
async fn unwritable_manifest_is_fatal() {
    let (dir, input, _) = workspace("https://b.amazonaws.com/a.png");
    let config = LocalizeConfig::builder()
        .work_dir(dir.path())
        .manifest_file("no/such/dir/links.txt")
        .build()
        .unwrap();

    let err = localize_with_fetcher(&input, &StubFetcher::default(), &config)
        .await
        .unwrap_err();

    assert!(
        matches!(err, LocalizeError::ManifestWriteFailed { .. }),
        "got {err:?}"
    );
}

#[test]
fn filenames_do_not_collide_across_a_corpus() {
    let names: HashSet<String> = (0..2000)
        .map(|i| local_filename(&format!("https://b.amazonaws.com/u/{i}/img.png?sig={i}"), 25))
        .collect();
    assert_eq!(names.len(), 2000);
}

// ── Real HTTP (httpmock) ─────────────────────────────────────────────────────

#[tokio::test]
async fn http_bytes_are_stored_unmodified() {
    init_tracing();
    let server = MockServer::start_async().await;
    let body: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/bucket.amazonaws/photo.png");
            then.status(200)
                .header("Content-Type", "image/png")
                .body(body.clone());
        })
        .await;

    let link = server.url("/bucket.amazonaws/photo.png");
    let (dir, input, config) = workspace(&format!("![p]({link})"));

    let output = localize(&input, &config).await.unwrap();

    mock.assert_async().await;
    let asset = output.assets().next().expect("one saved asset");
    assert_eq!(asset.bytes_written, body.len() as u64);
    assert_eq!(std::fs::read(&asset.path).unwrap(), body);
    assert!(!asset.optimized);
    assert_eq!(
        read(dir.path().join("doc_local_images.md")),
        format!("![p](images/{})", asset.filename)
    );
}

#[tokio::test]
async fn http_non_200_is_left_alone() {
    init_tracing();
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/bucket.amazonaws/expired.jpg");
            then.status(403).body("<Error>AccessDenied</Error>");
        })
        .await;

    let link = server.url("/bucket.amazonaws/expired.jpg");
    let doc = format!("![x]({link})");
    let (dir, input, config) = workspace(&doc);

    let output = localize(&input, &config).await.unwrap();

    mock.assert_async().await;
    assert_eq!(output.results[0].outcome, LinkOutcome::Skipped { status: 403 });
    assert!(image_files(dir.path()).is_empty());
    assert_eq!(read(dir.path().join("doc_local_images.md")), doc);
}

#[tokio::test]
async fn http_optimise_bounds_dimensions() {
    init_tracing();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/bucket.amazonaws/wide.png");
            then.status(200).body(png(3000, 1500));
        })
        .await;

    let link = server.url("/bucket.amazonaws/wide.png");
    let (dir, input, _) = workspace(&format!("![w]({link})"));
    let config = LocalizeConfig::builder()
        .work_dir(dir.path())
        .optimize(true)
        .build()
        .unwrap();

    let output = localize(&input, &config).await.unwrap();

    let asset = output.assets().next().expect("saved");
    assert!(asset.optimized);
    assert_eq!(asset.dimensions, Some((1024, 512)));
    let stored = image::open(&asset.path).unwrap();
    assert_eq!((stored.width(), stored.height()), (1024, 512));
}

#[tokio::test]
async fn http_undecodable_image_fails_when_optimising() {
    init_tracing();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/bucket.amazonaws/html.jpg");
            then.status(200).body("<html>not an image</html>");
        })
        .await;

    let link = server.url("/bucket.amazonaws/html.jpg");
    let (dir, input, _) = workspace(&link);
    let config = LocalizeConfig::builder()
        .work_dir(dir.path())
        .optimize(true)
        .build()
        .unwrap();

    let output = localize(&input, &config).await.unwrap();

    let error = output.results[0].error().expect("decode failure");
    assert!(matches!(error, LinkError::Decode { .. }), "got {error:?}");
    assert!(image_files(dir.path()).is_empty());
    assert_eq!(read(dir.path().join("doc_local_images.md")), link);
}

#[tokio::test]
async fn connection_refused_is_a_link_failure() {
    init_tracing();
    // Port 1 is reserved and never listening on test machines.
    let link = "http://127.0.0.1:1/bucket.amazonaws/photo.png";
    let (dir, input, config) = workspace(link);

    let output = localize(&input, &config).await.unwrap();

    assert_eq!(output.stats.failed, 1);
    assert!(matches!(
        output.results[0].error(),
        Some(LinkError::Fetch { .. })
    ));
    assert_eq!(read(dir.path().join("doc_local_images.md")), link);
}

#[test]
fn sync_wrapper_runs_its_own_runtime() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/bucket.amazonaws/s.jpeg");
        then.status(200).body("jpeg");
    });

    let link = server.url("/bucket.amazonaws/s.jpeg");
    let (dir, input, config) = workspace(&link);

    let output = localize_sync(&input, &config).unwrap();

    assert_eq!(output.stats.saved, 1);
    let filename = format!("{}.jpeg", sha256_prefix(&link, 25));
    assert_eq!(read(dir.path().join("doc_local_images.md")), format!("images/{filename}"));
}
