//! SVG document assembly and autocrop.

use log::{debug, info};
use svg::Document;

use trustmap_core::{
    draw::{Drawable, LayeredOutput, RenderContext, TextDefinition},
    geometry::{Bounds, Insets},
};
use trustmap_parser::ThreatModel;

use super::bbox;
use crate::{TrustmapError, config::RenderConfig};

/// An SVG document cropped to its content.
#[derive(Debug, Clone)]
pub struct CroppedSvg {
    pub document: String,
    pub viewport: Bounds,
}

/// Draws every element of `model` onto the canvas and crops the result.
///
/// # Errors
///
/// Fails when an icon cannot be transcoded or the drawing cannot be
/// measured.
pub fn render_document(
    model: &ThreatModel,
    text: &TextDefinition,
    config: &RenderConfig,
) -> Result<CroppedSvg, TrustmapError> {
    let output = draw_elements(model, text)?;
    debug!(nodes = output.len(); "Elements drawn");

    let canvas = Document::new()
        .set("width", config.canvas_width())
        .set("height", config.canvas_height())
        .set(
            "viewBox",
            (0.0, 0.0, config.canvas_width(), config.canvas_height()),
        );
    let canvas = output
        .render()
        .into_iter()
        .fold(canvas, |document, node| document.add(node));

    let viewport = crop_box(&canvas.to_string(), config.padding())?;
    debug!(
        min_x = viewport.min_x(),
        min_y = viewport.min_y(),
        width = viewport.width(),
        height = viewport.height();
        "Autocrop bounds"
    );

    let document = canvas
        .set(
            "viewBox",
            (
                viewport.min_x(),
                viewport.min_y(),
                viewport.width(),
                viewport.height(),
            ),
        )
        .set("width", viewport.width())
        .set("height", viewport.height());

    info!(width = viewport.width(), height = viewport.height(); "SVG document rendered");
    Ok(CroppedSvg {
        document: document.to_string(),
        viewport,
    })
}

/// Shapes first, in arena order, then curves in document order. Layer
/// sorting puts everything in its final stacking order.
fn draw_elements(
    model: &ThreatModel,
    text: &TextDefinition,
) -> Result<LayeredOutput, TrustmapError> {
    let ctx = RenderContext::new(model.icons(), text);
    let mut output = LayeredOutput::new();
    for (_, shape) in model.shapes().iter() {
        output.merge(shape.render_to_layers(&ctx)?);
    }
    for curve in model.curves() {
        output.merge(curve.render_to_layers(&ctx)?);
    }
    Ok(output)
}

/// Padded bounds of the vector content of a serialized drawing.
///
/// An empty drawing crops to the padding box around the origin.
pub fn crop_box(svg: &str, padding: f32) -> Result<Bounds, TrustmapError> {
    let content = bbox::path_bounds(svg)?.unwrap_or_default();
    Ok(content.add_padding(Insets::uniform(padding)))
}
