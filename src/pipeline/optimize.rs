//! Image optimisation: decode → bound to a box → re-encode at reduced quality.
//!
//! ## Which encoder?
//!
//! The output format follows the filename extension chosen by
//! [`crate::pipeline::name`], never the source format. A PNG served under a
//! `.jpg` URL is decoded by content sniffing and written as JPEG, so the file
//! on disk always matches its name. JPEG has no alpha channel; transparent
//! inputs are flattened to RGB first. `.heic` has no encoder in the `image`
//! crate and fails with [`LinkError::Encode`] here; the orchestrator avoids
//! that by naming optimised HEIC links via
//! [`ImageExtension::reencode_target`], which yields `.jpg`.
//!
//! ## Why spawn_blocking?
//!
//! Decoding and resizing a 12-megapixel photo takes long enough to stall the
//! runtime thread. It runs on the blocking pool and the orchestrator awaits
//! it before moving to the next link.

use crate::error::LinkError;
use crate::pipeline::name::ImageExtension;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ImageFormat};
use tracing::debug;

/// An encoded image ready to be written to disk.
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Shrink `img` so neither side exceeds `max_dimension`, keeping the aspect
/// ratio. Images already inside the box are returned untouched.
pub fn bound_dimensions(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    if img.width() <= max_dimension && img.height() <= max_dimension {
        return img;
    }
    img.thumbnail(max_dimension, max_dimension)
}

/// Encode `img` with the encoder implied by `extension`.
///
/// JPEG uses `quality`; PNG uses best compression with adaptive filtering.
pub fn encode_for_extension(
    img: &DynamicImage,
    extension: ImageExtension,
    quality: u8,
) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    match extension.image_format() {
        Some(ImageFormat::Jpeg) => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            rgb.write_with_encoder(encoder).map_err(|e| e.to_string())?;
        }
        Some(ImageFormat::Png) => {
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(encoder).map_err(|e| e.to_string())?;
        }
        _ => return Err("no encoder available for this format".to_string()),
    }
    Ok(buf)
}

/// Decode `bytes`, bound them to `max_dimension` and re-encode for `extension`.
pub fn optimize_image(
    link: &str,
    bytes: &[u8],
    extension: ImageExtension,
    max_dimension: u32,
    quality: u8,
) -> Result<OptimizedImage, LinkError> {
    let img = image::load_from_memory(bytes).map_err(|e| LinkError::Decode {
        link: link.to_string(),
        reason: e.to_string(),
    })?;
    let (src_w, src_h) = (img.width(), img.height());

    let img = bound_dimensions(img, max_dimension);
    let encoded = encode_for_extension(&img, extension, quality).map_err(|reason| {
        LinkError::Encode {
            link: link.to_string(),
            extension: extension.to_string(),
            reason,
        }
    })?;

    debug!(
        "Optimised {}: {}x{} → {}x{}, {} → {} bytes",
        link,
        src_w,
        src_h,
        img.width(),
        img.height(),
        bytes.len(),
        encoded.len()
    );

    Ok(OptimizedImage {
        bytes: encoded,
        width: img.width(),
        height: img.height(),
    })
}

/// [`optimize_image`] on the blocking thread pool.
pub async fn optimize_image_blocking(
    link: &str,
    bytes: Vec<u8>,
    extension: ImageExtension,
    max_dimension: u32,
    quality: u8,
) -> Result<OptimizedImage, LinkError> {
    let owned_link = link.to_string();
    tokio::task::spawn_blocking(move || {
        optimize_image(&owned_link, &bytes, extension, max_dimension, quality)
    })
    .await
    .map_err(|e| LinkError::Decode {
        link: link.to_string(),
        reason: format!("image task panicked: {e}"),
    })?
}
