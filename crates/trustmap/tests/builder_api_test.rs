use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use float_cmp::assert_approx_eq;
use image::{DynamicImage, ImageFormat, RgbImage};

use trustmap::{
    DiagramBuilder, TrustmapError,
    config::{AppConfig, RenderConfig, StyleConfig},
    path_bounds,
};

const MODEL_NS: &str = "http://schemas.datacontract.org/2004/07/ThreatModeling.Model";
const ABSTRACTS_NS: &str = "http://schemas.datacontract.org/2004/07/ThreatModeling.Model.Abstracts";
const ARRAYS_NS: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";
const KNOWLEDGE_BASE_NS: &str = "http://schemas.datacontract.org/2004/07/ThreatModeling.KnowledgeBase";

/// A minimal threat-model document with one drawing surface.
#[derive(Default)]
struct Document {
    element_types: Vec<(String, String)>,
    borders: Vec<String>,
    lines: Vec<String>,
}

impl Document {
    fn element_type(mut self, name: &str, image: &str) -> Self {
        self.element_types.push((name.to_owned(), image.to_owned()));
        self
    }

    fn shape(mut self, kind: &str, type_name: &str, name: &str, rect: [f32; 4]) -> Self {
        let [left, top, width, height] = rect;
        let geometry = format!(
            "<Height xmlns=\"{ABSTRACTS_NS}\">{height}</Height>\
             <Left xmlns=\"{ABSTRACTS_NS}\">{left}</Left>\
             <Top xmlns=\"{ABSTRACTS_NS}\">{top}</Top>\
             <Width xmlns=\"{ABSTRACTS_NS}\">{width}</Width>"
        );
        self.borders.push(entry(kind, type_name, name, &geometry));
        self
    }

    fn flow(mut self, name: &str, points: [f32; 6]) -> Self {
        let [hx, hy, sx, sy, tx, ty] = points;
        let geometry = format!(
            "<HandleX xmlns=\"{ABSTRACTS_NS}\">{hx}</HandleX>\
             <HandleY xmlns=\"{ABSTRACTS_NS}\">{hy}</HandleY>\
             <SourceX xmlns=\"{ABSTRACTS_NS}\">{sx}</SourceX>\
             <SourceY xmlns=\"{ABSTRACTS_NS}\">{sy}</SourceY>\
             <TargetX xmlns=\"{ABSTRACTS_NS}\">{tx}</TargetX>\
             <TargetY xmlns=\"{ABSTRACTS_NS}\">{ty}</TargetY>"
        );
        self.lines
            .push(entry("GE.DF", "Generic Data Flow", name, &geometry));
        self
    }

    fn build(self) -> String {
        let element_types: String = self
            .element_types
            .iter()
            .map(|(name, image)| {
                format!(
                    "<a:ElementType><a:Name>{name}</a:Name>\
                     <a:ImageSource>{image}</a:ImageSource></a:ElementType>"
                )
            })
            .collect();
        format!(
            "<ThreatModel xmlns=\"{MODEL_NS}\" xmlns:i=\"http://www.w3.org/2001/XMLSchema-instance\">\
             <DrawingSurfaceList><DrawingSurfaceModel>\
             <Header>Diagram 1</Header>\
             <Borders xmlns:a=\"{ARRAYS_NS}\">{}</Borders>\
             <Lines xmlns:a=\"{ARRAYS_NS}\">{}</Lines>\
             </DrawingSurfaceModel></DrawingSurfaceList>\
             <KnowledgeBase xmlns:a=\"{KNOWLEDGE_BASE_NS}\">\
             <a:GenericElements>{element_types}</a:GenericElements>\
             <a:StandardElements/>\
             </KnowledgeBase>\
             </ThreatModel>",
            self.borders.concat(),
            self.lines.concat(),
        )
    }
}

fn entry(kind: &str, type_name: &str, name: &str, geometry: &str) -> String {
    format!(
        "<a:KeyValueOfguidanyType>\
         <a:Value>\
         <GenericTypeId xmlns=\"{ABSTRACTS_NS}\">{kind}</GenericTypeId>\
         <Properties xmlns=\"{ABSTRACTS_NS}\">\
         <a:anyType xmlns:b=\"{KNOWLEDGE_BASE_NS}\">\
         <b:DisplayName>{type_name}</b:DisplayName><b:Name/><b:Value/>\
         </a:anyType>\
         <a:anyType xmlns:b=\"{KNOWLEDGE_BASE_NS}\">\
         <b:DisplayName>Name</b:DisplayName><b:Name/><b:Value>{name}</b:Value>\
         </a:anyType>\
         </Properties>\
         {geometry}\
         </a:Value>\
         </a:KeyValueOfguidanyType>"
    )
}

fn jpeg_base64() -> String {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, image::Rgb([30, 120, 200])));
    let mut jpeg = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();
    STANDARD.encode(jpeg)
}

fn web_document() -> String {
    Document::default()
        .shape("GE.TB.B", "Generic Trust Border Boundary", "Corporate", [0.0, 0.0, 500.0, 400.0])
        .shape("GE.P", "Generic Process", "Web App", [50.0, 50.0, 110.0, 110.0])
        .shape("GE.DS", "Generic Data Store", "Users DB", [250.0, 200.0, 140.0, 70.0])
        .shape("GE.EI", "Generic External Interactor", "Browser", [700.0, 100.0, 110.0, 60.0])
        .shape("GE.A", "Free Text Annotation", "Reviewed", [20.0, 450.0, 150.0, 40.0])
        .flow("HTTPS", [430.0, 60.0, 700.0, 130.0, 160.0, 105.0])
        .build()
}

#[test]
fn test_parse_exposes_cross_references_and_groups() {
    let builder = DiagramBuilder::default();
    let diagram = builder.parse(&web_document()).expect("Failed to parse");

    assert_eq!(
        diagram.cross_reference_details(),
        "Boundary 1: Corporate\nNode 2: Web App\nNode 3: Users DB\nNode 4: Browser\nAnnotation 5: Reviewed"
    );
    assert_eq!(diagram.ungrouped_node_names(), vec!["Browser"]);
    assert_eq!(diagram.label_names(), vec!["Reviewed"]);

    let model = diagram.model();
    let boundary = model.boundaries()[0];
    for &node in &model.nodes()[..2] {
        assert_eq!(diagram.parent_of(node), Some(boundary));
    }
    assert_eq!(diagram.parent_of(boundary), None);
    assert!(diagram.warnings().is_empty());
}

#[test]
fn test_nested_boundaries_in_any_order() {
    let source = Document::default()
        .shape("GE.TB.B", "Boundary", "Inner", [100.0, 100.0, 200.0, 200.0])
        .shape("GE.P", "Process", "Worker", [150.0, 150.0, 50.0, 50.0])
        .shape("GE.TB.B", "Boundary", "Outer", [0.0, 0.0, 500.0, 500.0])
        .build();

    let diagram = DiagramBuilder::default().parse(&source).unwrap();
    let model = diagram.model();
    let (inner, outer) = (model.boundaries()[0], model.boundaries()[1]);
    let worker = model.nodes()[0];

    assert_eq!(diagram.parent_of(worker), Some(inner));
    assert_eq!(diagram.parent_of(inner), Some(outer));
    assert_eq!(diagram.groups().depth(worker), 2);
    assert!(diagram.ungrouped_node_names().is_empty());
}

#[test]
fn test_unsupported_kind_is_reported_not_fatal() {
    let source = Document::default()
        .shape("GE.P", "Process", "First", [0.0, 0.0, 50.0, 50.0])
        .shape("GE.SE", "Stencil Ellipse", "Decoration", [100.0, 0.0, 50.0, 50.0])
        .shape("GE.DS", "Store", "Second", [200.0, 0.0, 50.0, 50.0])
        .build();

    let diagram = DiagramBuilder::default().parse(&source).unwrap();

    let keys: Vec<_> = diagram.cross_references().map(|entry| entry.key()).collect();
    assert_eq!(keys, vec!["Node 1", "Node 3"]);
    assert_eq!(diagram.warnings().len(), 1);
    assert!(diagram.warnings()[0].severity().is_warning());
}

#[test]
fn test_malformed_document_is_parse_error() {
    let err = DiagramBuilder::default()
        .parse("<ThreatModel xmlns=\"x\">")
        .unwrap_err();

    match err {
        TrustmapError::Parse { err, src } => {
            assert!(!err.diagnostics().is_empty());
            assert_eq!(src, "<ThreatModel xmlns=\"x\">");
        }
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn test_render_crops_to_padded_content() {
    let builder = DiagramBuilder::default();
    let diagram = builder.parse(&web_document()).unwrap();
    let rendered = builder.render(&diagram).expect("Failed to render");

    let viewport = rendered.viewport();
    let content = path_bounds(rendered.svg())
        .expect("rendered SVG is readable")
        .expect("rendered SVG draws paths");

    assert!(viewport.contains(&content));
    assert_approx_eq!(f32, content.min_x() - viewport.min_x(), 10.0, epsilon = 0.01);
    assert_approx_eq!(f32, content.min_y() - viewport.min_y(), 10.0, epsilon = 0.01);
    assert_approx_eq!(f32, viewport.max_x() - content.max_x(), 10.0, epsilon = 0.01);
    assert_approx_eq!(f32, viewport.max_y() - content.max_y(), 10.0, epsilon = 0.01);

    // Far smaller than the drawing canvas.
    assert!(viewport.width() < 1500.0);
    assert!(viewport.height() < 1500.0);
    assert!(rendered.svg().contains("data-layer=\"boundary\""));
    assert!(rendered.svg().contains("data-layer=\"flow\""));
}

#[test]
fn test_png_matches_svg_viewport() {
    let builder = DiagramBuilder::default();
    let diagram = builder.parse(&web_document()).unwrap();
    let rendered = builder.render(&diagram).unwrap();

    let png = image::load_from_memory(rendered.png()).expect("decodable PNG");
    let viewport = rendered.viewport();
    assert_eq!(png.width(), viewport.width().ceil() as u32);
    assert_eq!(png.height(), viewport.height().ceil() as u32);
}

#[test]
fn test_raster_scale_and_padding_from_config() {
    let config = AppConfig::new(
        StyleConfig::default(),
        RenderConfig::new(2000.0, 2000.0, 25.0, 2.0),
    );
    let builder = DiagramBuilder::new(config);
    let diagram = builder.parse(&web_document()).unwrap();
    let rendered = builder.render(&diagram).unwrap();

    let content = path_bounds(rendered.svg()).unwrap().unwrap();
    assert_approx_eq!(f32, content.min_x() - rendered.viewport().min_x(), 25.0, epsilon = 0.01);

    let png = image::load_from_memory(rendered.png()).unwrap();
    assert_eq!(png.width(), (rendered.viewport().width() * 2.0).ceil() as u32);
}

#[test]
fn test_jpeg_icon_is_embedded_as_png() {
    let source = Document::default()
        .element_type("Generic Process", &jpeg_base64())
        .shape("GE.P", "Generic Process", "Web App", [0.0, 0.0, 110.0, 110.0])
        .build();

    let builder = DiagramBuilder::default();
    let rendered = builder.render(&builder.parse(&source).unwrap()).unwrap();

    let svg = rendered.svg();
    let prefix = "data:image/png;base64,";
    let start = svg.find(prefix).expect("icon embedded") + prefix.len();
    let end = start + svg[start..].find('"').unwrap();
    let png = STANDARD.decode(&svg[start..end]).unwrap();

    let icon = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
    assert_eq!((icon.width(), icon.height()), (16, 16));
}

#[test]
fn test_convert_writes_both_sinks() {
    let mut svg = Vec::new();
    let mut png = Vec::new();

    let entries = DiagramBuilder::default()
        .convert(&web_document(), &mut svg, &mut png)
        .expect("Failed to convert");

    assert_eq!(entries.len(), 5);
    assert_eq!(entries[1].as_pair(), ("Node 2", "Web App"));
    assert!(String::from_utf8(svg).unwrap().starts_with("<svg"));
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[test]
fn test_convert_writes_nothing_on_failure() {
    let source = Document::default()
        .element_type("Generic Process", "not base64 at all!")
        .shape("GE.P", "Generic Process", "Web App", [0.0, 0.0, 110.0, 110.0])
        .build();
    let mut svg = Vec::new();
    let mut png = Vec::new();

    let err = DiagramBuilder::default()
        .convert(&source, &mut svg, &mut png)
        .unwrap_err();

    assert!(matches!(err, TrustmapError::Render(_)));
    assert!(svg.is_empty());
    assert!(png.is_empty());
}

#[test]
fn test_invalid_background_color_is_config_error() {
    let config = AppConfig::new(
        StyleConfig::new("Noto Sans", 11, Some("definitely-not-a-color".to_string())),
        RenderConfig::default(),
    );
    let builder = DiagramBuilder::new(config);
    let diagram = builder.parse(&web_document()).unwrap();

    assert!(matches!(
        builder.render(&diagram),
        Err(TrustmapError::Config(_))
    ));
}
