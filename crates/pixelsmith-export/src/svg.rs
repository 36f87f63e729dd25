//! SVG export serializer.
//!
//! Wraps a [`PixelBuffer`] in an SVG document using the [`svg`] crate.
//! The document is not vector art: it holds a single `<image>` element
//! whose `href` is the buffer encoded as a base64 PNG data URI, sized to
//! the buffer so the `viewBox` maps one user unit to one pixel.
//!
//! Nearest-neighbor rendering is requested both as the
//! `image-rendering` presentation attribute and as inline CSS, so the
//! blocks stay crisp when a viewer scales the document.
//!
//! Optional [`SvgMetadata`] embeds `<title>`, `<desc>` and a
//! `<metadata>` element carrying the filter parameters.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use base64::{Engine as _, engine::general_purpose};
use svg::Document;
use svg::node::element::{Description, Element, Image, Title};
use svg::node::{Node, Text};

use pixelsmith_pipeline::PixelBuffer;

use crate::ExportError;

/// Namespace URI for the `<pixelsmith:parameters>` metadata element.
pub const METADATA_NAMESPACE: &str = "https://pixelsmith.rs/ns/1";

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped by the `svg`
/// crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized `FilterParameters` JSON, emitted inside a
    /// `<metadata>` element wrapped in a namespaced
    /// `<pixelsmith:parameters>` element.
    pub parameters_json: Option<&'a str>,
}

/// Build the `data:image/png;base64,...` URI for `png`.
#[must_use]
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png))
}

/// Serialize `buffer` into an SVG document embedding it as a PNG.
///
/// The root element carries `width`, `height` and
/// `viewBox="0 0 width height"` equal to the buffer dimensions.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if the embedded raster cannot be
/// encoded.
pub fn to_svg(buffer: &PixelBuffer, metadata: &SvgMetadata<'_>) -> Result<String, ExportError> {
    let w = buffer.width();
    let h = buffer.height();
    let png = crate::png::to_png(buffer)?;

    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(parameters_json) = metadata.parameters_json {
        let mut parameters_el = Element::new("pixelsmith:parameters");
        parameters_el.assign("xmlns:pixelsmith", METADATA_NAMESPACE);
        parameters_el.append(Text::new(parameters_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(parameters_el);
        doc = doc.add(metadata_el);
    }

    let image = Image::new()
        .set("x", 0)
        .set("y", 0)
        .set("width", w)
        .set("height", h)
        .set("href", png_data_uri(&png))
        .set("image-rendering", "pixelated")
        .set("style", "image-rendering:pixelated");
    doc = doc.add(image);

    log::debug!("wrapped {w}x{h} buffer in SVG ({} PNG bytes)", png.len());

    // The svg crate omits the XML declaration, so we prepend it.
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n"))
}
