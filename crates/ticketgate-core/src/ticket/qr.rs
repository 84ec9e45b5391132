//! QR image generation

use std::fs;
use std::path::Path;

use image::{GrayImage, Luma};
use qrcode::{Color, QrCode};

use crate::error::{CheckinError, CheckinResult};

/// Pixels per QR module
pub const MODULE_PX: u32 = 10;

/// Light border around the symbol, in modules
pub const QUIET_ZONE: u32 = 2;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Render a code as a black-on-white QR image
///
/// # Errors
/// Returns `RenderFailure` if the code does not fit in a QR symbol
pub fn render(code: &str) -> CheckinResult<GrayImage> {
    let qr = QrCode::new(code.as_bytes())
        .map_err(|e| CheckinError::RenderFailure(format!("Cannot encode '{code}' as QR: {e}")))?;

    let modules = u32::try_from(qr.width())
        .map_err(|_| CheckinError::RenderFailure(format!("QR for '{code}' is too large")))?;
    let side = (modules + 2 * QUIET_ZONE) * MODULE_PX;
    let mut img = GrayImage::from_pixel(side, side, LIGHT);

    for (index, color) in (0u32..).zip(qr.to_colors()) {
        if !matches!(color, Color::Dark) {
            continue;
        }
        let left = (index % modules + QUIET_ZONE) * MODULE_PX;
        let top = (index / modules + QUIET_ZONE) * MODULE_PX;
        for y in top..top + MODULE_PX {
            for x in left..left + MODULE_PX {
                img.put_pixel(x, y, DARK);
            }
        }
    }

    Ok(img)
}

/// Render a code and save it as a PNG, creating the parent directory
///
/// # Errors
/// Returns `RenderFailure` if encoding fails, or an I/O error if the file cannot be written
pub fn write_png(code: &str, path: &Path) -> CheckinResult<GrayImage> {
    let img = render(code)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CheckinError::io(parent, &e))?;
    }
    img.save(path).map_err(|e| {
        CheckinError::RenderFailure(format!("Cannot save QR image {}: {e}", path.display()))
    })?;

    tracing::debug!(code, path = %path.display(), "Wrote QR image");
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_has_quiet_zone() {
        let img = render("1-Alice").unwrap();
        let (width, height) = img.dimensions();
        assert_eq!(width, height);
        assert_eq!(width % MODULE_PX, 0);

        // Border is light, the finder pattern corner just inside it is dark
        let border = QUIET_ZONE * MODULE_PX;
        assert_eq!(*img.get_pixel(border - 1, border - 1), LIGHT);
        assert_eq!(*img.get_pixel(border, border), DARK);
    }

    #[test]
    fn test_longer_codes_need_larger_symbols() {
        let short = render("1-Al").unwrap();
        let long = render(&"9".repeat(300)).unwrap();
        assert!(long.width() > short.width());
    }
}
