//! Capture sources: typed input and QR photos
//!
//! Each capture yields zero or one code. Nothing detected is `None`,
//! which callers report as "no code", never as an invalid code.

use std::path::Path;

use image::GrayImage;

use crate::error::{CheckinError, CheckinResult};

/// Trim captured text, mapping empty input to `None`
#[must_use]
pub fn normalize(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decode the first readable QR code in an image file
///
/// # Errors
/// Returns `DecodeFailure` if the file cannot be opened or is not an image
pub fn decode_image(path: &Path) -> CheckinResult<Option<String>> {
    let img = image::open(path)
        .map_err(|e| CheckinError::DecodeFailure(format!("Cannot read {}: {e}", path.display())))?
        .to_luma8();

    let decoded = decode_luma(&img);
    match &decoded {
        Some(code) => tracing::info!(path = %path.display(), code, "QR detected"),
        None => tracing::info!(path = %path.display(), "No QR detected"),
    }
    Ok(decoded)
}

/// Decode the first readable QR code in a greyscale image
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn decode_luma(img: &GrayImage) -> Option<String> {
    let (width, height) = img.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| img.get_pixel(x as u32, y as u32)[0],
    );

    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_, content)) => {
                if let Some(code) = normalize(&content) {
                    return Some(code);
                }
            }
            Err(e) => tracing::debug!(error = %e, "Skipping undecodable QR grid"),
        }
    }
    None
}
