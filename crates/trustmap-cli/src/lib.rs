//! CLI logic for the Trustmap diagram tool.
//!
//! Reads a threat-model document, writes `<base>.svg` and `<base>.png`
//! next to each other and returns the cross-reference list of the diagram.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::{info, warn};

use trustmap::{Diagram, DiagramBuilder, Rendered, TrustmapError, model::CrossReference};

use error_adapter::warning_reportable;

/// Run the Trustmap CLI application
///
/// Both outputs are rendered in memory first; no file is left behind when
/// any stage fails.
///
/// # Errors
///
/// Returns `TrustmapError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed documents
/// - Icon transcoding and rasterization errors
pub fn run(args: &Args) -> Result<Vec<CrossReference>, TrustmapError> {
    info!(
        input_path = args.input_file,
        output_basename = args.output_basename;
        "Processing threat model"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let bytes = fs::read(&args.input_file)?;
    if !trustmap_parser::is_threat_model(&bytes) {
        warn!(input_path = args.input_file; "Input does not start with a ThreatModel element");
    }

    let builder = DiagramBuilder::new(app_config);
    let diagram = builder.parse_bytes(&bytes)?;

    report_warnings(&diagram, &bytes);
    for name in diagram.ungrouped_node_names() {
        warn!(node = name; "Node is not inside any trust boundary");
    }

    let rendered = builder.render(&diagram)?;

    let svg_path = args.svg_path();
    let png_path = args.png_path();
    write_artifacts(&svg_path, &png_path, &rendered)?;
    info!(svg_file = svg_path, png_file = png_path; "Diagram exported successfully");

    Ok(diagram.cross_references().cloned().collect())
}

/// Writes the SVG then the PNG, removing the SVG again if the PNG fails.
fn write_artifacts(svg_path: &str, png_path: &str, rendered: &Rendered) -> Result<(), TrustmapError> {
    fs::write(svg_path, rendered.svg())?;
    if let Err(err) = fs::write(png_path, rendered.png()) {
        if let Err(cleanup) = fs::remove_file(svg_path) {
            warn!(svg_file = svg_path, error:% = cleanup; "Failed to remove partial SVG output");
        }
        return Err(err.into());
    }
    Ok(())
}

/// Logs the mapping warnings of a diagram with document snippets.
fn report_warnings(diagram: &Diagram, bytes: &[u8]) {
    if diagram.warnings().is_empty() {
        return;
    }

    let src = String::from_utf8_lossy(bytes);
    let reporter = miette::GraphicalReportHandler::new();
    for warning in diagram.warnings() {
        let mut writer = String::new();
        match reporter.render_report(&mut writer, &warning_reportable(warning, &src)) {
            Ok(()) => warn!("{writer}"),
            Err(_) => warn!(code:? = warning.code(); "{}", warning.message()),
        }
    }
}
