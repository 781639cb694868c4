//! Drawing primitives for threat-model diagrams.
//!
//! Shapes and curves implement [`Drawable`]: given a [`RenderContext`] they
//! produce SVG nodes sorted into [`RenderLayer`]s. The exporter merges the
//! outputs of every element and flattens them back to front.

mod flow;
mod icon;
mod layer;
mod shape;
mod stroke;
mod text;

pub use flow::{FlowLabelLayout, quadratic_path_data};
pub use icon::{ICON_OPACITY, IconCatalog, IconError, icon_element, png_data_uri, transcode_to_png};
pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use shape::ANNOTATION_INDENT;
pub use stroke::{StrokeDefinition, StrokeStyle};
pub use text::{
    EMBEDDED_FONT, EMBEDDED_FONT_FAMILY, TextAnchor, TextBlock, TextDefinition, font_database,
    measure_line, wrap_text, wrap_with,
};

/// Shared inputs of a render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Element-type icons of the document
    pub icons: &'a IconCatalog,
    /// Base text style; boundaries and trust lines recolor it
    pub text: &'a TextDefinition,
}

impl<'a> RenderContext<'a> {
    pub fn new(icons: &'a IconCatalog, text: &'a TextDefinition) -> Self {
        Self { icons, text }
    }
}

/// A diagram element that can render itself.
pub trait Drawable {
    /// Renders the element into layered SVG nodes.
    ///
    /// Fails only when an embedded icon cannot be transcoded.
    fn render_to_layers(&self, ctx: &RenderContext<'_>) -> Result<LayeredOutput, IconError>;
}
