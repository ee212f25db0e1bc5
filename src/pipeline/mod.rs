//! Pipeline stages for localising a document's remote images.
//!
//! Each submodule implements exactly one step and is tested on its own.
//! [`crate::localize`] drives them in order.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ fetch ──▶ name ──▶ optimize? ──▶ store ──▶ rewrite
//! (read)    (regex)    (HTTP)   (sha256)  (image)       (disk)    (replace)
//! ```
//!
//! 1. [`input`]    — read the document as UTF-8; derive the output path
//! 2. [`extract`]  — find every image URL containing the host marker
//! 3. [`fetch`]    — HTTP GET behind the [`fetch::Fetcher`] trait; the only
//!    stage with network I/O
//! 4. [`name`]     — content-independent file name from a hash of the URL
//! 5. [`optimize`] — optional decode/resize/re-encode; runs in
//!    `spawn_blocking` because it is CPU-bound
//! 6. [`store`]    — manifest, images directory, asset files, final document
//! 7. [`rewrite`]  — literal replacement of saved links with local paths

pub mod extract;
pub mod fetch;
pub mod input;
pub mod name;
pub mod optimize;
pub mod rewrite;
pub mod store;
