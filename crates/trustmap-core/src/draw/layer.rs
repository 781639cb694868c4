//! Layer-based rendering system for SVG output.
//!
//! Drawables do not append to the document directly. They push SVG nodes
//! into a [`LayeredOutput`] tagged with a [`RenderLayer`], and the output is
//! flattened in layer order at the end. This keeps boundaries behind nodes
//! and flows above everything else regardless of document order.
//!
//! # Example
//!
//! ```
//! # use trustmap_core::draw::{RenderLayer, LayeredOutput};
//! # use svg::node::element::Rectangle;
//!
//! let mut output = LayeredOutput::new();
//! output.add_to_layer(RenderLayer::Flow, Box::new(Rectangle::new()));
//! output.add_to_layer(RenderLayer::Boundary, Box::new(Rectangle::new()));
//!
//! // Boundary group first, then flow group
//! let svg_nodes = output.render();
//! assert_eq!(svg_nodes.len(), 2);
//! ```

use svg::node::element as svg_element;

/// Type alias for boxed SVG nodes.
pub type SvgNode = Box<dyn svg::Node>;

/// Rendering layers of a threat-model diagram.
///
/// The `Ord` derive uses declaration order, so the first variant renders
/// first (bottom) and the last variant renders last (top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Trust boundaries and their names
    Boundary,
    /// Data stores, external interactors and processes
    Node,
    /// Free-standing annotation text
    Annotation,
    /// Data-flow curves, arrowheads and label boxes
    Flow,
    /// Trust lines and their labels
    TrustLine,
}

impl RenderLayer {
    /// Returns the name written to the `data-layer` attribute.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boundary => "boundary",
            Self::Node => "node",
            Self::Annotation => "annotation",
            Self::Flow => "flow",
            Self::TrustLine => "trust-line",
        }
    }
}

/// SVG nodes grouped by rendering layer.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    items: Vec<(RenderLayer, SvgNode)>,
}

impl LayeredOutput {
    /// Creates a new empty `LayeredOutput`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single node to the specified layer.
    ///
    /// Nodes keep their insertion order within a layer.
    pub fn add_to_layer(&mut self, layer: RenderLayer, node: SvgNode) {
        self.items.push((layer, node));
    }

    /// Merges all nodes from another `LayeredOutput` into this one.
    pub fn merge(&mut self, other: LayeredOutput) {
        self.items.extend(other.items);
    }

    /// Returns `true` if there are no nodes in any layer.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of nodes across all layers.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Renders all layers to SVG groups, consuming the output.
    ///
    /// Each non-empty layer becomes an SVG `<g>` element with a `data-layer`
    /// attribute. Empty layers are skipped.
    pub fn render(mut self) -> Vec<SvgNode> {
        if self.is_empty() {
            return Vec::new();
        }

        // Stable sort keeps per-layer insertion order
        self.items.sort_by_key(|(layer, _)| *layer);

        let mut result = Vec::new();
        let mut current_layer = self.items[0].0;
        let mut current_group = svg_element::Group::new().set("data-layer", current_layer.name());

        for (layer, node) in self.items {
            if layer != current_layer {
                result.push(Box::new(current_group) as SvgNode);

                current_layer = layer;
                current_group = svg_element::Group::new().set("data-layer", layer.name());
            }

            current_group = current_group.add(node);
        }

        result.push(Box::new(current_group) as SvgNode);

        result
    }
}
