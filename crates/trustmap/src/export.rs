//! Export of mapped threat models to SVG and PNG.
//!
//! # Pipeline Position
//!
//! ```text
//! Document Text
//!     ↓ parse (trustmap-parser)
//! ThreatModel
//!     ↓ structure
//! Groups
//!     ↓ export (this module)
//! SVG + PNG
//! ```
//!
//! Elements are drawn on an oversized canvas. The serialized drawing is
//! then read back, the bounding box of its vector paths is measured and
//! padded, and the document is cropped to that box before it is rasterized.
//!
//! # Error Handling
//!
//! Export operations return [`Error`]. It converts into
//! [`TrustmapError::Export`] at the crate boundary.
//!
//! [`TrustmapError::Export`]: crate::TrustmapError::Export

pub mod bbox;
pub mod raster;
pub mod svg;

use trustmap_core::geometry::Bounds;

/// The two synchronized artifacts of a render pass.
#[derive(Debug, Clone)]
pub struct Rendered {
    svg: String,
    png: Vec<u8>,
    viewport: Bounds,
}

impl Rendered {
    pub(crate) fn new(svg: String, png: Vec<u8>, viewport: Bounds) -> Self {
        Self { svg, png, viewport }
    }

    /// The cropped SVG document.
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// PNG bytes of the same drawing.
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// The padded content box used as `viewBox` of the SVG.
    pub fn viewport(&self) -> Bounds {
        self.viewport
    }

    pub fn into_parts(self) -> (String, Vec<u8>, Bounds) {
        (self.svg, self.png, self.viewport)
    }
}

/// Errors that can occur during export.
///
/// This type is converted into [`TrustmapError::Export`] at the crate
/// boundary via the [`From`] implementation in [`crate::error`].
///
/// [`TrustmapError::Export`]: crate::TrustmapError::Export
#[derive(Debug)]
pub enum Error {
    /// The rendered SVG could not be read back.
    Reparse(String),
    /// A raster of the given size could not be allocated.
    PixmapAlloc { width: u32, height: u32 },
    /// PNG encoding failed.
    PngEncode(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reparse(msg) => write!(f, "Failed to read back rendered SVG: {msg}"),
            Self::PixmapAlloc { width, height } => {
                write!(f, "Failed to allocate a {width}x{height} raster")
            }
            Self::PngEncode(msg) => write!(f, "Failed to encode PNG: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
