//! Image encoding: `DynamicImage` → bytes in the requested [`ImageFormat`].
//!
//! pdfium hands back RGBA bitmaps rendered onto an opaque white background.
//! The alpha channel carries no information, and the JPEG encoder refuses
//! RGBA input outright, so every page is flattened to 8-bit RGB first.

use crate::config::ImageFormat;
use crate::error::Pdf2ImgError;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page.
///
/// `page_num` is only used to label errors.
pub fn encode_page(
    img: &DynamicImage,
    format: ImageFormat,
    page_num: usize,
) -> Result<Vec<u8>, Pdf2ImgError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), format.as_image_format())
        .map_err(|e| Pdf2ImgError::EncodeFailed {
            page: page_num,
            format: format.to_string(),
            detail: e.to_string(),
        })?;

    debug!(
        "Encoded page {} → {} bytes {}",
        page_num,
        buf.len(),
        format
    );
    Ok(buf)
}
