//! Stroke and line-style definitions.
//!
//! - [`StrokeDefinition`]: color, width and dash pattern of an outline
//! - [`StrokeStyle`]: solid or dashed
//! - [`apply_stroke!`](crate::apply_stroke!): applies a stroke to an SVG element
//!
//! ```
//! use trustmap_core::draw::StrokeDefinition;
//! use trustmap_core::color::Color;
//! use svg::node::element as svg_element;
//!
//! let stroke = StrokeDefinition::dashed(Color::new("red").unwrap(), 1.0);
//! let rect = svg_element::Rectangle::new().set("width", 100).set("height", 50);
//! let rect = trustmap_core::apply_stroke!(rect, &stroke);
//! ```

use crate::color::Color;

/// Line pattern of a stroke.
///
/// `Dashed` is the "4" pattern of trust boundaries and trust lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
}

impl StrokeStyle {
    /// Returns the SVG dasharray value for this style, or None for solid lines
    pub fn to_svg_value(self) -> Option<&'static str> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("4"),
        }
    }
}

/// A stroke definition for rendering lines and borders.
#[derive(Debug, Clone)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
}

impl StrokeDefinition {
    /// Creates a new solid stroke with the given color and width.
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            style: StrokeStyle::Solid,
        }
    }

    /// Creates a solid stroke (convenience constructor).
    pub fn solid(color: Color, width: f32) -> Self {
        Self::new(color, width)
    }

    /// Creates a dashed stroke (convenience constructor).
    pub fn dashed(color: Color, width: f32) -> Self {
        let mut stroke = Self::new(color, width);
        stroke.set_style(StrokeStyle::Dashed);
        stroke
    }

    /// Returns the stroke color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Returns the stroke width.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Returns the stroke style.
    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    /// Sets the stroke style.
    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self::new(Color::default(), 1.0)
    }
}

/// Apply all stroke attributes to an SVG element.
///
/// Sets color, opacity, width and, for non-solid styles, the dash pattern.
#[macro_export]
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color().to_string())
            .set("stroke-opacity", $stroke.color().alpha())
            .set("stroke-width", $stroke.width());

        if let Some(dasharray) = $stroke.style().to_svg_value() {
            elem = elem.set("stroke-dasharray", dasharray);
        }

        elem
    }};
}
