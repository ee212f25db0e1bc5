//! Input resolution: read the document and decide where the result goes.

use crate::config::OUTPUT_SUFFIX;
use crate::error::LocalizeError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read the whole document as UTF-8 text.
pub async fn read_document(path: &Path) -> Result<String, LocalizeError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => LocalizeError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => LocalizeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => LocalizeError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let text = String::from_utf8(bytes).map_err(|_| LocalizeError::InvalidUtf8 {
        path: path.to_path_buf(),
    })?;

    debug!("Read {} ({} bytes)", path.display(), text.len());
    Ok(text)
}

/// `<input without its extension>_local_images.md`, next to the input.
///
/// `notes.md` → `notes_local_images.md`, `docs/post.markdown` →
/// `docs/post_local_images.md`, `README` → `README_local_images.md`.
pub fn derive_output_path(input: &Path) -> PathBuf {
    let stem = if input.extension().is_some() {
        input.with_extension("")
    } else {
        input.to_path_buf()
    };
    let mut name = stem.into_os_string();
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}
