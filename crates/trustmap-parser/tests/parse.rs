use float_cmp::assert_approx_eq;

use trustmap_core::{
    geometry::Point,
    model::{CurveKind, ShapeKind},
};
use trustmap_parser::{
    error::{ErrorCode, Severity},
    parse, parse_bytes,
};

const MODEL_NS: &str = "http://schemas.datacontract.org/2004/07/ThreatModeling.Model";
const ABSTRACTS_NS: &str = "http://schemas.datacontract.org/2004/07/ThreatModeling.Model.Abstracts";
const ARRAYS_NS: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";
const KNOWLEDGE_BASE_NS: &str = "http://schemas.datacontract.org/2004/07/ThreatModeling.KnowledgeBase";

/// Builds threat-model documents in the shape desktop tools serialize them.
#[derive(Default)]
struct DocumentBuilder {
    generic_types: Vec<(String, String)>,
    standard_types: Vec<(String, String)>,
    borders: Vec<String>,
    lines: Vec<String>,
    extra_surfaces: usize,
}

impl DocumentBuilder {
    fn generic_type(mut self, name: &str, image: &str) -> Self {
        self.generic_types.push((name.to_owned(), image.to_owned()));
        self
    }

    fn standard_type(mut self, name: &str, image: &str) -> Self {
        self.standard_types.push((name.to_owned(), image.to_owned()));
        self
    }

    fn shape(mut self, kind: &str, type_name: &str, name: &str, rect: [&str; 4]) -> Self {
        let [left, top, width, height] = rect;
        let geometry = format!(
            "<Height xmlns=\"{ABSTRACTS_NS}\">{height}</Height>\
             <Left xmlns=\"{ABSTRACTS_NS}\">{left}</Left>\
             <Top xmlns=\"{ABSTRACTS_NS}\">{top}</Top>\
             <Width xmlns=\"{ABSTRACTS_NS}\">{width}</Width>"
        );
        let guid = format!("00000000-0000-0000-0000-{:012}", self.borders.len());
        self.borders.push(entry(&guid, kind, type_name, name, &geometry));
        self
    }

    fn curve(mut self, kind: &str, type_name: &str, name: &str, points: [f32; 6]) -> Self {
        let [hx, hy, sx, sy, tx, ty] = points;
        let geometry = format!(
            "<HandleX xmlns=\"{ABSTRACTS_NS}\">{hx}</HandleX>\
             <HandleY xmlns=\"{ABSTRACTS_NS}\">{hy}</HandleY>\
             <SourceX xmlns=\"{ABSTRACTS_NS}\">{sx}</SourceX>\
             <SourceY xmlns=\"{ABSTRACTS_NS}\">{sy}</SourceY>\
             <TargetX xmlns=\"{ABSTRACTS_NS}\">{tx}</TargetX>\
             <TargetY xmlns=\"{ABSTRACTS_NS}\">{ty}</TargetY>"
        );
        let guid = format!("10000000-0000-0000-0000-{:012}", self.lines.len());
        self.lines.push(entry(&guid, kind, type_name, name, &geometry));
        self
    }

    fn extra_surface(mut self) -> Self {
        self.extra_surfaces += 1;
        self
    }

    fn build(self) -> String {
        let element_types = |types: &[(String, String)]| -> String {
            types
                .iter()
                .map(|(name, image)| {
                    format!(
                        "<a:ElementType><a:Name>{name}</a:Name>\
                         <a:ImageSource>{image}</a:ImageSource></a:ElementType>"
                    )
                })
                .collect()
        };
        let surface = |header: &str, borders: &str, lines: &str| -> String {
            format!(
                "<DrawingSurfaceModel>\
                 <GenericTypeId xmlns=\"{ABSTRACTS_NS}\">DRAWINGSURFACE</GenericTypeId>\
                 <Header>{header}</Header>\
                 <Borders xmlns:a=\"{ARRAYS_NS}\">{borders}</Borders>\
                 <Lines xmlns:a=\"{ARRAYS_NS}\">{lines}</Lines>\
                 </DrawingSurfaceModel>"
            )
        };

        let mut surfaces = surface("Diagram 1", &self.borders.concat(), &self.lines.concat());
        for index in 0..self.extra_surfaces {
            let extra = self.borders.first().cloned().unwrap_or_default();
            surfaces.push_str(&surface(&format!("Diagram {}", index + 2), &extra, ""));
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <ThreatModel xmlns=\"{MODEL_NS}\" xmlns:i=\"http://www.w3.org/2001/XMLSchema-instance\">\n\
             <DrawingSurfaceList>{surfaces}</DrawingSurfaceList>\n\
             <KnowledgeBase xmlns:a=\"{KNOWLEDGE_BASE_NS}\">\
             <a:GenericElements>{}</a:GenericElements>\
             <a:StandardElements>{}</a:StandardElements>\
             </KnowledgeBase>\n\
             </ThreatModel>",
            element_types(&self.generic_types),
            element_types(&self.standard_types),
        )
    }
}

fn entry(guid: &str, kind: &str, type_name: &str, name: &str, geometry: &str) -> String {
    format!(
        "<a:KeyValueOfguidanyType>\
         <a:Key>{guid}</a:Key>\
         <a:Value i:type=\"Stencil\">\
         <GenericTypeId xmlns=\"{ABSTRACTS_NS}\">{kind}</GenericTypeId>\
         <Properties xmlns=\"{ABSTRACTS_NS}\">\
         <a:anyType xmlns:b=\"{KNOWLEDGE_BASE_NS}\">\
         <b:DisplayName>{type_name}</b:DisplayName><b:Name/><b:Value i:nil=\"true\"/>\
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

#[test]
fn test_maps_shapes_and_curves() {
    let source = DocumentBuilder::default()
        .shape("GE.TB.B", "Generic Trust Border Boundary", "Internet", ["0", "0", "400", "300"])
        .shape("GE.P", "Generic Process", "Web App", ["100", "200", "110", "60"])
        .shape("GE.A", "Free Text Annotation", "Reviewed", ["500", "10", "120", "40"])
        .curve("GE.DF", "Generic Data Flow", "HTTPS", [100.0, 100.0, 0.0, 0.0, 200.0, 0.0])
        .curve("GE.TB.L", "Generic Trust Line Boundary", "DMZ", [50.0, 50.0, 0.0, 0.0, 100.0, 0.0])
        .build();

    let model = parse(&source).expect("Failed to parse");

    assert_eq!(model.surface_name(), Some("Diagram 1"));
    assert_eq!(model.boundaries().len(), 1);
    assert_eq!(model.nodes().len(), 1);
    assert_eq!(model.annotations().len(), 1);
    assert_eq!(model.curves().len(), 2);
    assert!(model.warnings().is_empty());

    let process = &model.shapes()[model.nodes()[0]];
    assert_eq!(process.kind(), ShapeKind::Process);
    assert_eq!(process.type_name(), "Generic Process");
    assert_eq!(process.name(), "Web App");
    assert_eq!(process.guid(), Some("00000000-0000-0000-0000-000000000001"));

    let flow = model.flows().next().expect("one flow");
    assert_eq!(flow.kind(), CurveKind::DataFlow);
    assert_eq!(flow.name(), "HTTPS");
    assert_eq!(flow.curve().control(), Point::new(100.0, 200.0));
    assert_eq!(model.trust_lines().count(), 1);
}

#[test]
fn test_shape_geometry_is_inset() {
    let source = DocumentBuilder::default()
        .shape("GE.DS", "Generic Data Store", "Users", ["100", "200", "110", "60"])
        .build();

    let model = parse(&source).expect("Failed to parse");
    let rect = model.shapes()[model.nodes()[0]].rect();

    assert_approx_eq!(f32, rect.left(), 105.0);
    assert_approx_eq!(f32, rect.top(), 205.0);
    assert_approx_eq!(f32, rect.width(), 100.0);
    assert_approx_eq!(f32, rect.height(), 50.0);
}

#[test]
fn test_cross_references_share_one_counter() {
    let source = DocumentBuilder::default()
        .shape("GE.TB.B", "Boundary", "Internet", ["0", "0", "400", "300"])
        .shape("GE.EI", "Browser", "Client", ["10", "10", "100", "100"])
        .shape("GE.A", "Annotation", "Note", ["500", "10", "120", "40"])
        .shape("GE.DS", "Store", "Users DB", ["200", "10", "100", "100"])
        .curve("GE.DF", "Flow", "HTTPS", [0.0; 6])
        .build();

    let model = parse(&source).expect("Failed to parse");
    let entries: Vec<_> = model.cross_references().map(|e| e.as_pair()).collect();

    assert_eq!(
        entries,
        vec![
            ("Boundary 1", "Internet"),
            ("Node 2", "Client"),
            ("Annotation 3", "Note"),
            ("Node 4", "Users DB"),
        ]
    );
}

#[test]
fn test_unknown_kind_is_skipped_with_warning() {
    let source = DocumentBuilder::default()
        .shape("GE.P", "Generic Process", "A", ["0", "0", "100", "100"])
        .shape("GE.XYZ", "Mystery", "?", ["0", "0", "100", "100"])
        .shape("GE.P", "Generic Process", "B", ["200", "0", "100", "100"])
        .build();

    let model = parse(&source).expect("unknown kinds are not errors");

    let entries: Vec<_> = model.cross_references().map(|e| e.as_pair()).collect();
    assert_eq!(entries, vec![("Node 1", "A"), ("Node 3", "B")]);

    assert_eq!(model.warnings().len(), 1);
    let warning = &model.warnings()[0];
    assert_eq!(warning.severity(), Severity::Warning);
    assert_eq!(warning.code(), Some(ErrorCode::W300));
    assert!(warning.message().contains("GE.XYZ"));

    let span = warning.labels()[0].span();
    assert!(source[span.to_range()].contains("GE.XYZ"));
}

#[test]
fn test_standard_icons_override_generic() {
    let source = DocumentBuilder::default()
        .generic_type("Generic Process", "R0VORVJJQw==")
        .generic_type("Generic Data Store", "")
        .standard_type("Generic Process", "U1RBTkRBUkQ=")
        .build();

    let model = parse(&source).expect("Failed to parse");

    assert_eq!(model.icons().get("Generic Process"), Some("U1RBTkRBUkQ="));
    assert_eq!(model.icons().get("Generic Data Store"), None);
}

#[test]
fn test_only_first_surface_is_mapped() {
    let source = DocumentBuilder::default()
        .shape("GE.P", "Generic Process", "Only", ["0", "0", "100", "100"])
        .extra_surface()
        .extra_surface()
        .build();

    let model = parse(&source).expect("Failed to parse");

    assert_eq!(model.surface_name(), Some("Diagram 1"));
    assert_eq!(model.nodes().len(), 1);
}

#[test]
fn test_empty_name_is_allowed() {
    let source = DocumentBuilder::default()
        .shape("GE.P", "Generic Process", "", ["0", "0", "100", "100"])
        .build();

    let model = parse(&source).expect("Failed to parse");
    let entry = model.cross_references().next().expect("one entry");

    assert_eq!(entry.as_pair(), ("Node 1", ""));
}

#[test]
fn test_missing_geometry_is_malformed() {
    let source = DocumentBuilder::default()
        .shape("GE.P", "Generic Process", "A", ["0", "0", "100", "100"])
        .build()
        .replace(&format!("<Top xmlns=\"{ABSTRACTS_NS}\">0</Top>"), "");

    let err = parse(&source).expect_err("missing <Top> must fail");
    let diag = &err.diagnostics()[0];

    assert_eq!(diag.severity(), Severity::Error);
    assert_eq!(diag.code(), Some(ErrorCode::E101));
    assert!(diag.message().contains("Top"));
    assert!(source[diag.labels()[0].span().to_range()].starts_with("<a:Value"));
}

#[test]
fn test_missing_lines_section_is_malformed() {
    let source = DocumentBuilder::default()
        .build()
        .replace(&format!("<Lines xmlns:a=\"{ARRAYS_NS}\"></Lines>"), "");

    let err = parse(&source).expect_err("missing <Lines> must fail");

    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E101));
}

#[test]
fn test_missing_name_property_is_malformed() {
    let source = DocumentBuilder::default()
        .shape("GE.P", "Generic Process", "A", ["0", "0", "100", "100"])
        .build()
        .replace("<b:Value>A</b:Value>", "");

    let err = parse(&source).expect_err("display name slot is required");

    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E101));
}

#[test]
fn test_invalid_number_is_malformed() {
    let source = DocumentBuilder::default()
        .shape("GE.P", "Generic Process", "A", ["0", "wide", "100", "100"])
        .build();

    let err = parse(&source).expect_err("non-numeric geometry must fail");
    let diag = &err.diagnostics()[0];

    assert_eq!(diag.code(), Some(ErrorCode::E200));
    assert!(source[diag.labels()[0].span().to_range()].contains("wide"));
}

#[test]
fn test_no_surface_is_malformed() {
    let source = format!(
        "<ThreatModel xmlns=\"{MODEL_NS}\">\
         <DrawingSurfaceList/>\
         <KnowledgeBase xmlns:a=\"{KNOWLEDGE_BASE_NS}\">\
         <a:GenericElements/><a:StandardElements/>\
         </KnowledgeBase></ThreatModel>"
    );

    let err = parse(&source).expect_err("a surface is required");

    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E102));
}

#[test]
fn test_wrong_root_is_malformed() {
    let err = parse("<svg xmlns=\"http://www.w3.org/2000/svg\"/>").expect_err("not a threat model");

    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E100));
}

#[test]
fn test_xml_syntax_error() {
    let source = DocumentBuilder::default().build();
    let truncated = &source[..source.len() / 2];

    let err = parse(truncated).expect_err("truncated document");

    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E001));
    assert!(err.to_string().starts_with("error[E001]"));
}

#[test]
fn test_parse_bytes() {
    let source = DocumentBuilder::default()
        .shape("GE.P", "Generic Process", "Web App", ["0", "0", "100", "100"])
        .build();

    let model = parse_bytes(source.as_bytes()).expect("Failed to parse");
    assert_eq!(model.nodes().len(), 1);

    let mut bytes = source.into_bytes();
    bytes.insert(10, 0xFF);
    let err = parse_bytes(&bytes).expect_err("invalid UTF-8");
    let diag = &err.diagnostics()[0];
    assert_eq!(diag.code(), Some(ErrorCode::E002));
    assert_eq!(diag.labels()[0].span().start(), 10);
}
