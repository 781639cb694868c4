//! Rendering of data flows and trust lines.
//!
//! Both curve kinds draw the same quadratic path. Data flows add arrowheads,
//! a filled label box below the handle and an optional type icon; trust
//! lines are dashed red with a bare red label.

use svg::node::element as svg_element;

use crate::{
    apply_stroke,
    color::Color,
    curve::{ARROWHEAD_SAMPLES, QuadraticCurve},
    draw::{
        Drawable, IconError, LayeredOutput, RenderContext, RenderLayer, StrokeDefinition,
        TextAnchor, TextBlock, TextDefinition, icon::icon_element,
    },
    geometry::{Point, Rect},
    model::{CurveKind, CurveRecord},
};

/// Arrowhead glyph pointing along +x, positioned with a transform.
const ARROWHEAD_PATH: &str = "M12 0 L-5 -8 L0 0 L-5 8 Z";

/// Vertical gap between the handle and the label.
const LABEL_OFFSET: f32 = 20.0;

/// Minimum height of a flow label box, before its 2px margin.
const MIN_LABEL_BOX_HEIGHT: f32 = 27.0;

/// Minimum label height used to center trust-line labels.
const MIN_TRUST_LABEL_HEIGHT: f32 = 30.0;

const LABEL_FILL: &str = "#E2F4C3";
const FLOW_ICON_SIZE: f32 = 25.0;

/// Geometry of a data-flow label, all derived from the handle and text size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowLabelLayout {
    /// Background box
    pub frame: Rect,
    /// Start x of the label text
    pub text_x: f32,
    /// Vertical center shared by text and icon
    pub center_y: f32,
    /// Icon square, left of the text inside the box
    pub icon: Rect,
}

impl FlowLabelLayout {
    /// Lays out a label of `text` size below `handle`.
    pub fn new(handle: Point, text_width: f32, text_height: f32) -> Self {
        let half_width = text_width / 2.0;
        let height = text_height.max(MIN_LABEL_BOX_HEIGHT) + 2.0;
        let frame = Rect::new(
            handle.x() - half_width - 15.0,
            handle.y() + LABEL_OFFSET,
            text_width + 30.0,
            height,
        );
        let center_y = frame.center().y();
        let icon = Rect::new(
            handle.x() - half_width - 13.0,
            center_y - FLOW_ICON_SIZE / 2.0,
            FLOW_ICON_SIZE,
            FLOW_ICON_SIZE,
        );
        Self {
            frame,
            text_x: handle.x() - half_width + 13.0,
            center_y,
            icon,
        }
    }
}

impl CurveRecord {
    /// The layer this curve is drawn on.
    pub fn layer(&self) -> RenderLayer {
        match self.kind() {
            CurveKind::DataFlow => RenderLayer::Flow,
            CurveKind::TrustLine => RenderLayer::TrustLine,
        }
    }

    fn stroke(&self) -> StrokeDefinition {
        match self.kind() {
            CurveKind::DataFlow => StrokeDefinition::default(),
            CurveKind::TrustLine => StrokeDefinition::dashed(trust_line_color(), 1.0),
        }
    }

    fn add_path(&self, output: &mut LayeredOutput) {
        let path = svg_element::Path::new()
            .set("d", quadratic_path_data(self.curve()))
            .set("fill", "none");
        let path = apply_stroke!(path, &self.stroke());
        output.add_to_layer(self.layer(), Box::new(path));
    }

    fn add_arrowheads(&self, output: &mut LayeredOutput) {
        let curve = self.curve();
        for t in QuadraticCurve::sample_parameters(ARROWHEAD_SAMPLES) {
            let at = curve.point_at(t);
            let angle = curve.tangent_angle(t);
            let arrow = svg_element::Path::new()
                .set("d", ARROWHEAD_PATH)
                .set("fill", "black")
                .set(
                    "transform",
                    format!("translate({}, {}) rotate({})", at.x(), at.y(), angle),
                );
            output.add_to_layer(self.layer(), Box::new(arrow));
        }
    }

    fn label(&self, style: &TextDefinition) -> Option<TextBlock> {
        let block = TextBlock::unwrapped(style, self.name());
        (!block.is_empty()).then_some(block)
    }

    fn add_flow_label(
        &self,
        ctx: &RenderContext<'_>,
        output: &mut LayeredOutput,
    ) -> Result<(), IconError> {
        let block = self.label(ctx.text);
        let size = block.as_ref().map(TextBlock::size).unwrap_or_default();
        let layout = FlowLabelLayout::new(self.handle(), size.width(), size.height());

        if let Some(block) = &block {
            let frame = svg_element::Rectangle::new()
                .set("x", layout.frame.left())
                .set("y", layout.frame.top())
                .set("width", layout.frame.width())
                .set("height", layout.frame.height())
                .set("rx", 3.0)
                .set("fill", LABEL_FILL)
                .set("fill-opacity", 0.5);
            let frame = apply_stroke!(frame, &StrokeDefinition::default());
            output.add_to_layer(self.layer(), Box::new(frame));

            let text = block.render(ctx.text, layout.text_x, layout.center_y, TextAnchor::Start);
            output.add_to_layer(self.layer(), Box::new(text));
        }

        if let Some(uri) = ctx.icons.data_uri(self.type_name())? {
            output.add_to_layer(self.layer(), Box::new(icon_element(&uri, layout.icon)));
        }
        Ok(())
    }

    fn add_trust_label(&self, ctx: &RenderContext<'_>, output: &mut LayeredOutput) {
        let style = ctx.text.with_color(trust_line_color());
        let Some(block) = self.label(&style) else {
            return;
        };
        let size = block.size();
        let handle = self.handle();
        let x = handle.x() - size.width() / 2.0 + 13.0;
        let center_y = handle.y() + LABEL_OFFSET + size.height().max(MIN_TRUST_LABEL_HEIGHT) / 2.0;
        let text = block.render(&style, x, center_y, TextAnchor::Start);
        output.add_to_layer(self.layer(), Box::new(text));
    }
}

impl Drawable for CurveRecord {
    fn render_to_layers(&self, ctx: &RenderContext<'_>) -> Result<LayeredOutput, IconError> {
        let mut output = LayeredOutput::new();
        self.add_path(&mut output);
        match self.kind() {
            CurveKind::DataFlow => {
                self.add_flow_label(ctx, &mut output)?;
                self.add_arrowheads(&mut output);
            }
            CurveKind::TrustLine => self.add_trust_label(ctx, &mut output),
        }
        Ok(output)
    }
}

/// `M source Q control target` path data.
pub fn quadratic_path_data(curve: &QuadraticCurve) -> String {
    let (s, c, t) = (curve.source(), curve.control(), curve.target());
    format!(
        "M {} {} Q {} {} {} {}",
        s.x(),
        s.y(),
        c.x(),
        c.y(),
        t.x(),
        t.y()
    )
}

fn trust_line_color() -> Color {
    Color::new("red").unwrap_or_default()
}
