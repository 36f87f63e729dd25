//! Image decoding into a [`PixelBuffer`].
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces an RGBA
//! buffer. Filters never see container formats; this is the one place
//! raw bytes turn into pixels.

use crate::types::{PipelineError, PixelBuffer};

/// Decode raw image bytes into an RGBA [`PixelBuffer`].
///
/// Supports whatever the `image` crate was built with (PNG, JPEG, BMP,
/// WebP). Images without an alpha channel come back fully opaque.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`PipelineError::ZeroDimensions`] if the image has no pixels.
pub fn decode_rgba(bytes: &[u8]) -> Result<PixelBuffer, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let image = image::load_from_memory(bytes)?;
    log::debug!(
        "decoded {} bytes into {}x{} {:?}",
        bytes.len(),
        image.width(),
        image.height(),
        image.color(),
    );
    PixelBuffer::from_rgba(image.to_rgba8())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode_rgba(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode_rgba(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn png_decodes_pixel_exact() {
        let img = image::RgbaImage::from_fn(5, 3, |x, y| {
            image::Rgba([x as u8 * 40, y as u8 * 80, 7, 200])
        });
        let buffer = decode_rgba(&encode_png(&img)).unwrap();
        assert_eq!(buffer.width(), 5);
        assert_eq!(buffer.height(), 3);
        assert_eq!(buffer.samples(), img.as_raw().as_slice());
    }

    #[test]
    fn rgb_source_becomes_opaque() {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ExtendedColorType::Rgb8)
            .unwrap();

        let buffer = decode_rgba(&buf).unwrap();
        assert_eq!(buffer.pixel(1, 1), Some([1, 2, 3, 255]));
    }
}
