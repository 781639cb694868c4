//! Rendering of rectangular diagram elements.
//!
//! Every [`ShapeRecord`] draws an outline that depends on its kind, its
//! display name, and (for data stores, external interactors and processes)
//! the icon of its element type.

use svg::node::element as svg_element;

use crate::{
    apply_stroke,
    color::Color,
    draw::{
        Drawable, IconError, LayeredOutput, RenderContext, RenderLayer, StrokeDefinition,
        TextAnchor, TextBlock, icon::icon_element,
    },
    geometry::Rect,
    model::{ShapeKind, ShapeRecord},
};

/// Left text indent of annotations.
pub const ANNOTATION_INDENT: f32 = 20.0;

/// Gap between an icon or a boundary name and the shape edge.
const EDGE_GAP: f32 = 5.0;

const MIN_ICON_SIZE: f32 = 40.0;
const MAX_ICON_SIZE: f32 = 90.0;

/// Stroke width of data-store and external-interactor outlines.
const THIN_STROKE: f32 = 0.1;

impl ShapeRecord {
    /// Whether the name is centered inside the shape.
    pub fn is_text_centered(&self) -> bool {
        !matches!(self.kind(), ShapeKind::Annotation)
    }

    /// Horizontal offset of left-aligned text from the shape's left edge.
    pub fn left_indent(&self) -> f32 {
        match self.kind() {
            ShapeKind::Annotation => ANNOTATION_INDENT,
            _ => 0.0,
        }
    }

    /// Maximum pixel width of one line of the name.
    pub fn text_line_width(&self) -> f32 {
        self.rect().width() - self.left_indent()
    }

    /// The layer this shape's nodes are drawn on.
    pub fn layer(&self) -> RenderLayer {
        match self.kind() {
            ShapeKind::Boundary => RenderLayer::Boundary,
            ShapeKind::Annotation => RenderLayer::Annotation,
            ShapeKind::DataStore | ShapeKind::ExternalInteractor | ShapeKind::Process => {
                RenderLayer::Node
            }
        }
    }

    /// Square area reserved for the type icon, or `None` for kinds without icons.
    ///
    /// The side is `height / 2.5` clamped to `[40, 90]`. Processes center the
    /// icon; other nodes place it in the bottom-right corner.
    pub fn icon_rect(&self) -> Option<Rect> {
        let rect = self.rect();
        let size = (rect.height() / 2.5).clamp(MIN_ICON_SIZE, MAX_ICON_SIZE);
        match self.kind() {
            ShapeKind::Boundary | ShapeKind::Annotation => None,
            ShapeKind::Process => {
                let center = rect.center();
                Some(Rect::new(
                    center.x() - size / 2.0,
                    center.y() - size / 2.0,
                    size,
                    size,
                ))
            }
            ShapeKind::DataStore | ShapeKind::ExternalInteractor => Some(Rect::new(
                rect.right() - size - EDGE_GAP,
                rect.bottom() - size - EDGE_GAP,
                size,
                size,
            )),
        }
    }

    /// Appends the display name, if any.
    pub fn add_text(&self, ctx: &RenderContext<'_>, output: &mut LayeredOutput) {
        if self.name().trim().is_empty() {
            return;
        }
        let rect = self.rect();

        let text = match self.kind() {
            ShapeKind::Boundary => {
                let style = ctx.text.with_color(boundary_color());
                let block = TextBlock::wrapped(&style, self.name(), rect.width() - 2.0 * EDGE_GAP);
                block.render_hanging(
                    &style,
                    rect.right() - EDGE_GAP,
                    rect.top() + EDGE_GAP,
                    TextAnchor::End,
                )
            }
            _ if self.is_text_centered() => {
                let block = TextBlock::wrapped(ctx.text, self.name(), self.text_line_width());
                let center = rect.center();
                block.render(ctx.text, center.x(), center.y(), TextAnchor::Middle)
            }
            _ => {
                let block = TextBlock::wrapped(ctx.text, self.name(), self.text_line_width());
                block.render(
                    ctx.text,
                    rect.left() + self.left_indent(),
                    rect.center().y(),
                    TextAnchor::Start,
                )
            }
        };

        output.add_to_layer(self.layer(), Box::new(text));
    }

    /// Appends the type icon when the catalog has one for this shape's type.
    pub fn add_icon(
        &self,
        ctx: &RenderContext<'_>,
        output: &mut LayeredOutput,
    ) -> Result<(), IconError> {
        let Some(area) = self.icon_rect() else {
            return Ok(());
        };
        if let Some(uri) = ctx.icons.data_uri(self.type_name())? {
            output.add_to_layer(self.layer(), Box::new(icon_element(&uri, area)));
        }
        Ok(())
    }

    fn add_outline(&self, output: &mut LayeredOutput) {
        let rect = self.rect();
        let black = Color::default();
        let layer = self.layer();

        match self.kind() {
            ShapeKind::Boundary => {
                let stroke = StrokeDefinition::dashed(boundary_color(), 1.0);
                let outline = apply_stroke!(rectangle(rect), &stroke).set("fill", "none");
                output.add_to_layer(layer, Box::new(outline));
            }
            ShapeKind::DataStore => {
                let stroke = StrokeDefinition::solid(black, THIN_STROKE);
                let outline = apply_stroke!(rectangle(rect), &stroke).set("fill", "white");
                let mid = rect.center().y();
                let divider = svg_element::Line::new()
                    .set("x1", rect.left())
                    .set("y1", mid)
                    .set("x2", rect.right())
                    .set("y2", mid);
                let divider = apply_stroke!(divider, &stroke);
                output.add_to_layer(layer, Box::new(outline));
                output.add_to_layer(layer, Box::new(divider));
            }
            ShapeKind::ExternalInteractor => {
                let stroke = StrokeDefinition::solid(black, THIN_STROKE);
                let outline = apply_stroke!(rectangle(rect), &stroke).set("fill", "white");
                output.add_to_layer(layer, Box::new(outline));
            }
            ShapeKind::Process => {
                let center = rect.center();
                let ellipse = svg_element::Ellipse::new()
                    .set("cx", center.x())
                    .set("cy", center.y())
                    .set("rx", rect.width() / 2.0)
                    .set("ry", rect.height() / 2.0)
                    .set("fill", "white");
                let ellipse = apply_stroke!(ellipse, &StrokeDefinition::default());
                output.add_to_layer(layer, Box::new(ellipse));
            }
            ShapeKind::Annotation => {
                let outline = rectangle(rect).set("fill", "white").set("opacity", 0);
                output.add_to_layer(layer, Box::new(outline));
            }
        }
    }
}

impl Drawable for ShapeRecord {
    fn render_to_layers(&self, ctx: &RenderContext<'_>) -> Result<LayeredOutput, IconError> {
        let mut output = LayeredOutput::new();
        self.add_outline(&mut output);
        self.add_text(ctx, &mut output);
        self.add_icon(ctx, &mut output)?;
        Ok(output)
    }
}

fn rectangle(rect: Rect) -> svg_element::Rectangle {
    svg_element::Rectangle::new()
        .set("x", rect.left())
        .set("y", rect.top())
        .set("width", rect.width())
        .set("height", rect.height())
}

fn boundary_color() -> Color {
    Color::new("red").unwrap_or_default()
}
