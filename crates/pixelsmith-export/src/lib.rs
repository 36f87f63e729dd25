//! pixelsmith-export: Pure format serializers (sans-IO)
//!
//! Converts a processed [`PixelBuffer`] into downloadable artifacts.
//! Supports PNG (lossless re-encode) and SVG (the PNG embedded in an
//! `<image>` element).

pub mod png;
pub mod svg;

use std::fmt;

use pixelsmith_pipeline::PixelBuffer;

pub use png::to_png;
pub use svg::{SvgMetadata, to_svg};

/// Errors that can occur while serializing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The PNG encoder rejected the buffer.
    #[error("failed to encode PNG: {0}")]
    PngEncode(#[from] image::ImageError),
}

/// A supported export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Raster PNG.
    Png,
    /// SVG wrapping an embedded PNG.
    Svg,
}

impl ExportFormat {
    /// Every format, in menu order.
    pub const ALL: [Self; 2] = [Self::Png, Self::Svg];

    /// Suggested download filename.
    #[must_use]
    pub const fn filename(self) -> &'static str {
        match self {
            Self::Png => "pixel-art.png",
            Self::Svg => "pixel-art.svg",
        }
    }

    /// MIME type of the serialized bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serialized export ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    format: ExportFormat,
    bytes: Vec<u8>,
}

impl ExportArtifact {
    /// The format these bytes are in.
    #[must_use]
    pub const fn format(&self) -> ExportFormat {
        self.format
    }

    /// Borrow the serialized bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the serialized bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Serialize `buffer` in `format` without SVG metadata.
///
/// The buffer is only read; a failed export leaves it untouched.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if PNG encoding fails (both
/// formats encode a PNG).
pub fn export(buffer: &PixelBuffer, format: ExportFormat) -> Result<ExportArtifact, ExportError> {
    export_with_metadata(buffer, format, &SvgMetadata::default())
}

/// Serialize `buffer` in `format`, embedding `metadata` when the format
/// is SVG. PNG ignores `metadata`.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if PNG encoding fails.
pub fn export_with_metadata(
    buffer: &PixelBuffer,
    format: ExportFormat,
    metadata: &SvgMetadata<'_>,
) -> Result<ExportArtifact, ExportError> {
    let bytes = match format {
        ExportFormat::Png => to_png(buffer)?,
        ExportFormat::Svg => to_svg(buffer, metadata)?.into_bytes(),
    };
    Ok(ExportArtifact { format, bytes })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!(ExportFormat::Png.filename(), "pixel-art.png");
        assert_eq!(ExportFormat::Svg.filename(), "pixel-art.svg");
        assert_eq!(ExportFormat::Png.mime_type(), "image/png");
        assert_eq!(ExportFormat::Svg.mime_type(), "image/svg+xml");
        assert_eq!(ExportFormat::Svg.to_string(), "svg");
    }

    #[test]
    fn filename_ends_with_extension() {
        for format in ExportFormat::ALL {
            assert!(format.filename().ends_with(format.extension()));
        }
    }

    #[test]
    fn artifact_carries_format() {
        let buffer = PixelBuffer::blank(2, 2).unwrap();
        for format in ExportFormat::ALL {
            let artifact = export(&buffer, format).unwrap();
            assert_eq!(artifact.format(), format);
            assert!(!artifact.as_bytes().is_empty());
        }
    }

    #[test]
    fn svg_artifact_is_utf8() {
        let buffer = PixelBuffer::blank(2, 2).unwrap();
        let bytes = export(&buffer, ExportFormat::Svg).unwrap().into_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("<svg"));
    }

    #[test]
    fn png_ignores_metadata() {
        let buffer = PixelBuffer::blank(2, 2).unwrap();
        let meta = SvgMetadata {
            title: Some("ignored"),
            ..SvgMetadata::default()
        };
        let plain = export(&buffer, ExportFormat::Png).unwrap();
        let with_meta = export_with_metadata(&buffer, ExportFormat::Png, &meta).unwrap();
        assert_eq!(plain, with_meta);
    }
}
