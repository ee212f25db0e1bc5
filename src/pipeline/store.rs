//! Disk output: images directory, asset files, manifest and final document.
//!
//! Raw downloads are streamed chunk by chunk straight into the target file.
//! Optimised images are already fully in memory, so they go through a
//! tempfile in the same directory and are persisted with a rename.
//! Either way a failed link does not leave a truncated file behind.

use crate::error::{LinkError, LocalizeError};
use crate::pipeline::fetch::BodyStream;
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Create the images directory (and parents) if absent.
pub async fn ensure_images_dir(path: &Path) -> Result<(), LocalizeError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| LocalizeError::ImagesDirFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Write every link, one per line, in extraction order. Overwrites.
pub async fn write_manifest(path: &Path, links: &[String]) -> Result<(), LocalizeError> {
    tokio::fs::write(path, links.join("\n"))
        .await
        .map_err(|e| LocalizeError::ManifestWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!("Wrote manifest {} ({} links)", path.display(), links.len());
    Ok(())
}

/// Write the rewritten document via temp file + rename.
pub async fn write_output_document(path: &Path, text: &str) -> Result<(), LocalizeError> {
    let write_err = |e: std::io::Error| LocalizeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, text).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Stream `body` into `path` unmodified. Returns the number of bytes written.
///
/// On any chunk or write error the partial file is removed.
pub async fn write_stream(path: &Path, link: &str, mut body: BodyStream) -> Result<u64, LinkError> {
    let write_err = |e: std::io::Error| LinkError::Write {
        link: link.to_string(),
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut file = tokio::fs::File::create(path).await.map_err(write_err)?;
    let mut written = 0u64;

    let result: Result<(), LinkError> = async {
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        Ok::<(), LinkError>(())
    }
    .await;

    if let Err(e) = result {
        drop(file);
        if let Err(rm) = tokio::fs::remove_file(path).await {
            warn!("Could not remove partial file {}: {}", path.display(), rm);
        }
        return Err(e);
    }

    Ok(written)
}

/// Write `bytes` to `path` atomically (tempfile in the same directory, then
/// persist). Returns the number of bytes written.
pub async fn write_bytes_atomic(path: &Path, link: &str, bytes: Vec<u8>) -> Result<u64, LinkError> {
    let target: PathBuf = path.to_path_buf();
    let len = bytes.len() as u64;

    let outcome = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await;

    let reason = match outcome {
        Ok(Ok(())) => return Ok(len),
        Ok(Err(e)) => e.to_string(),
        Err(join) => format!("write task panicked: {join}"),
    };
    Err(LinkError::Write {
        link: link.to_string(),
        path: path.to_path_buf(),
        reason,
    })
}
