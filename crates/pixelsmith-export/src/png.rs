//! PNG export serializer.
//!
//! Re-encodes a [`PixelBuffer`] as an 8-bit RGBA PNG. PNG is lossless,
//! so decoding the output yields the exact samples that went in.

use image::ImageEncoder;
use image::codecs::png::PngEncoder;

use pixelsmith_pipeline::PixelBuffer;

use crate::ExportError;

/// Encode `buffer` as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if the encoder rejects the buffer.
pub fn to_png(buffer: &PixelBuffer) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        buffer.samples(),
        buffer.width(),
        buffer.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    log::debug!(
        "encoded {}x{} buffer as {} PNG bytes",
        buffer.width(),
        buffer.height(),
        bytes.len(),
    );
    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn output_has_png_signature() {
        let buffer = PixelBuffer::blank(3, 2).unwrap();
        let bytes = to_png(&buffer).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n']));
    }

    #[test]
    fn decoded_output_matches_input() {
        let samples: Vec<u8> = (0..4 * 5 * 3).map(|i| (i * 7 % 256) as u8).collect();
        let buffer = PixelBuffer::from_raw(5, 3, samples).unwrap();
        let decoded = image::load_from_memory(&to_png(&buffer).unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.dimensions(), (5, 3));
        assert_eq!(decoded.as_raw().as_slice(), buffer.samples());
    }

    #[test]
    fn single_pixel_round_trips() {
        let buffer = PixelBuffer::from_raw(1, 1, vec![1, 2, 3, 4]).unwrap();
        let decoded = image::load_from_memory(&to_png(&buffer).unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [1, 2, 3, 4]);
    }
}
