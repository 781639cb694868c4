//! Trustmap - Render threat-model documents as cropped SVG and PNG diagrams.
//!
//! Threat-model documents are read into a typed model, nodes are grouped
//! into the trust boundaries that enclose them, and every element is drawn
//! onto a canvas that is then cropped to its content. A conversion also
//! yields the cross-reference list pairing generated keys such as
//! `"Node 2"` with element names.

pub mod config;

mod error;
mod export;
mod structure;

pub use trustmap_core::{color, curve, draw, geometry, model};
pub use trustmap_parser::{Span, ThreatModel, error::ParseError};

pub use error::TrustmapError;
pub use export::{Rendered, bbox::path_bounds};
pub use structure::{GroupingError, Groups};

use std::io::Write;

use log::{debug, info, trace};

use config::AppConfig;
use model::{CrossReference, ShapeId};
use trustmap_parser::error::Diagnostic;

/// Builder for parsing and rendering threat-model diagrams.
///
/// # Examples
///
/// ```rust,no_run
/// use trustmap::{DiagramBuilder, config::AppConfig};
///
/// let source = std::fs::read_to_string("model.tm7").expect("readable document");
/// let builder = DiagramBuilder::new(AppConfig::default());
///
/// let diagram = builder.parse(&source).expect("Failed to parse");
/// let rendered = builder.render(&diagram).expect("Failed to render");
///
/// std::fs::write("model.svg", rendered.svg()).expect("writable");
/// std::fs::write("model.png", rendered.png()).expect("writable");
/// println!("{}", diagram.cross_reference_details());
/// ```
#[derive(Default)]
pub struct DiagramBuilder {
    config: AppConfig,
}

impl DiagramBuilder {
    /// Create a new diagram builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Parse document text and resolve its trust-boundary grouping.
    ///
    /// # Errors
    ///
    /// Returns [`TrustmapError::Parse`] for malformed documents and
    /// [`TrustmapError::Grouping`] if the containment relation cannot be
    /// resolved.
    pub fn parse(&self, source: &str) -> Result<Diagram, TrustmapError> {
        info!(bytes = source.len(); "Parsing threat model");

        let model = trustmap_parser::parse(source)
            .map_err(|err| TrustmapError::new_parse_error(err, source))?;
        Diagram::from_model(model)
    }

    /// Parse raw document bytes. See [`DiagramBuilder::parse`].
    ///
    /// # Errors
    ///
    /// Fails as [`DiagramBuilder::parse`] does, and on invalid UTF-8.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Diagram, TrustmapError> {
        info!(bytes = bytes.len(); "Parsing threat model");

        let model = trustmap_parser::parse_bytes(bytes).map_err(|err| {
            TrustmapError::new_parse_error(err, String::from_utf8_lossy(bytes))
        })?;
        Diagram::from_model(model)
    }

    /// Render a parsed diagram to a cropped SVG document and its PNG raster.
    ///
    /// # Errors
    ///
    /// Returns [`TrustmapError::Render`] when an icon cannot be transcoded,
    /// [`TrustmapError::Config`] for an invalid background color and
    /// [`TrustmapError::Export`] when rasterization fails.
    pub fn render(&self, diagram: &Diagram) -> Result<Rendered, TrustmapError> {
        let style = self.config.style();
        let background = style.background_color().map_err(TrustmapError::Config)?;
        let text = style.text_definition();

        info!(
            shapes = diagram.model.shapes().len(),
            curves = diagram.model.curves().len();
            "Rendering diagram"
        );
        let cropped = export::svg::render_document(&diagram.model, &text, self.config.render())?;

        let png = export::raster::svg_to_png(
            &cropped.document,
            self.config.render().raster_scale(),
            background.as_ref(),
        )?;
        info!(png_bytes = png.len(); "PNG rendered successfully");

        Ok(Rendered::new(cropped.document, png, cropped.viewport))
    }

    /// Parse and render `source`, then write the SVG and PNG to the sinks.
    ///
    /// Nothing is written unless both artifacts were produced.
    ///
    /// # Errors
    ///
    /// Fails as [`DiagramBuilder::parse`] and [`DiagramBuilder::render`] do,
    /// and with [`TrustmapError::Io`] if a sink cannot be written.
    pub fn convert(
        &self,
        source: &str,
        mut svg_sink: impl Write,
        mut png_sink: impl Write,
    ) -> Result<Vec<CrossReference>, TrustmapError> {
        let diagram = self.parse(source)?;
        let rendered = self.render(&diagram)?;

        svg_sink.write_all(rendered.svg().as_bytes())?;
        svg_sink.flush()?;
        png_sink.write_all(rendered.png())?;
        png_sink.flush()?;
        debug!("Artifacts written");

        Ok(diagram.cross_references().cloned().collect())
    }
}

/// A parsed threat model together with its resolved grouping.
#[derive(Debug, Clone)]
pub struct Diagram {
    model: ThreatModel,
    groups: Groups,
}

impl Diagram {
    /// Resolves the grouping of an already mapped model.
    ///
    /// # Errors
    ///
    /// Returns [`TrustmapError::Grouping`] if the containment relation
    /// cannot be resolved.
    pub fn from_model(model: ThreatModel) -> Result<Self, TrustmapError> {
        let groups = Groups::from_model(&model)?;
        trace!(groups:?; "Resolved groups");
        if !model.warnings().is_empty() {
            debug!(warnings = model.warnings().len(); "Model mapped with warnings");
        }
        Ok(Self { model, groups })
    }

    pub fn model(&self) -> &ThreatModel {
        &self.model
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    /// Cross-reference entries in document order.
    pub fn cross_references(&self) -> impl Iterator<Item = &CrossReference> {
        self.model.cross_references()
    }

    /// The cross-reference list as `key: label` lines.
    pub fn cross_reference_details(&self) -> String {
        self.cross_references()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Names of nodes that lie outside every trust boundary.
    pub fn ungrouped_node_names(&self) -> Vec<&str> {
        self.groups.ungrouped_node_names(&self.model)
    }

    /// Names of the free-standing annotations.
    pub fn label_names(&self) -> Vec<&str> {
        self.model
            .annotations()
            .iter()
            .filter_map(|&id| self.model.shape(id))
            .map(|shape| shape.name())
            .collect()
    }

    /// The innermost boundary enclosing a shape.
    pub fn parent_of(&self, id: ShapeId) -> Option<ShapeId> {
        self.groups.parent(id)
    }

    /// Warnings recorded while mapping the document.
    pub fn warnings(&self) -> &[Diagnostic] {
        self.model.warnings()
    }
}
