//! Element-type icons.
//!
//! Threat-model documents embed one base64 image per element type. The
//! [`IconCatalog`] maps type names to that text; icons are transcoded to PNG
//! and embedded in the SVG as `data:` URIs only when a shape is drawn.

use std::{collections::HashMap, io::Cursor};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::ImageFormat;
use log::trace;
use svg::node::element as svg_element;
use thiserror::Error;

use crate::geometry::Rect;

/// Opacity of every icon drawn into the diagram.
pub const ICON_OPACITY: f32 = 0.2;

/// Failure to turn an embedded icon into PNG.
#[derive(Debug, Error)]
pub enum IconError {
    #[error("icon `{name}` is not valid base64: {source}")]
    Base64 {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("icon `{name}` could not be transcoded: {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

/// Element type name → base64 image text.
#[derive(Debug, Clone, Default)]
pub struct IconCatalog {
    icons: HashMap<String, String>,
}

impl IconCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the icon of an element type, replacing any earlier entry.
    ///
    /// Blank image text registers the type without an icon.
    pub fn insert(&mut self, type_name: impl Into<String>, image_source: impl Into<String>) {
        self.icons.insert(type_name.into(), image_source.into());
    }

    /// Returns the base64 image text of a type, or `None` if the type has no icon.
    pub fn get(&self, type_name: &str) -> Option<&str> {
        self.icons
            .get(type_name)
            .map(String::as_str)
            .filter(|source| !source.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Transcodes the icon of `type_name` into a PNG data URI.
    pub fn data_uri(&self, type_name: &str) -> Result<Option<String>, IconError> {
        self.get(type_name)
            .map(|source| png_data_uri(type_name, source))
            .transpose()
    }
}

/// Decodes base64 image text and re-encodes the image as PNG.
///
/// Any format the `image` crate recognizes is accepted; documents written
/// by threat-modeling tools use JPEG.
pub fn transcode_to_png(name: &str, image_source: &str) -> Result<Vec<u8>, IconError> {
    let compact: String = image_source.split_whitespace().collect();
    let bytes = STANDARD.decode(compact).map_err(|source| IconError::Base64 {
        name: name.to_string(),
        source,
    })?;

    let image_error = |source| IconError::Image {
        name: name.to_string(),
        source,
    };
    let image = image::load_from_memory(&bytes).map_err(image_error)?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(image_error)?;

    trace!(name = name, input_bytes = bytes.len(), png_bytes = png.len(); "Transcoded icon");
    Ok(png)
}

/// Transcodes an icon and wraps it as `data:image/png;base64,...`.
pub fn png_data_uri(name: &str, image_source: &str) -> Result<String, IconError> {
    let png = transcode_to_png(name, image_source)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Builds the translucent `<image>` element for an icon placed at `rect`.
pub fn icon_element(data_uri: &str, rect: Rect) -> svg_element::Image {
    svg_element::Image::new()
        .set("href", data_uri)
        .set("x", rect.left())
        .set("y", rect.top())
        .set("width", rect.width())
        .set("height", rect.height())
        .set("opacity", ICON_OPACITY)
}
