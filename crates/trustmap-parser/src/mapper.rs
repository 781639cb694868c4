//! Maps the XML of a threat-model document onto a [`ThreatModel`].
//!
//! The document is a data-contract serialization: a `ThreatModel` root
//! holding a knowledge base of element types and a list of drawing surfaces.
//! Only the first surface is read. Its `Borders` section lists rectangular
//! elements and its `Lines` section lists curves; both are arrays of
//! `KeyValueOfguidanyType` entries whose `Value` carries the element.

use log::{debug, info, trace, warn};
use roxmltree::{Document, Node};

use trustmap_core::{
    draw::IconCatalog,
    geometry::{Point, Rect},
    model::{CurveKind, CurveRecord, ElementKind, ShapeKind, ShapeRecord},
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
    threat_model::ThreatModel,
};

const MODEL_NS: &str = "http://schemas.datacontract.org/2004/07/ThreatModeling.Model";
const ABSTRACTS_NS: &str = "http://schemas.datacontract.org/2004/07/ThreatModeling.Model.Abstracts";
const ARRAYS_NS: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";
const KNOWLEDGE_BASE_NS: &str = "http://schemas.datacontract.org/2004/07/ThreatModeling.KnowledgeBase";

const SUPPORTED_KINDS_HELP: &str =
    "supported kinds are GE.DS, GE.EI, GE.P, GE.A, GE.TB.B, GE.DF and GE.TB.L";

/// Maps `source` into a threat model, failing on the first malformed part.
pub(crate) fn map(source: &str) -> Result<ThreatModel> {
    let (text, offset) = match source.strip_prefix('\u{feff}') {
        Some(rest) => (rest, source.len() - rest.len()),
        None => (source, 0),
    };
    Mapper { source: text, offset }.map()
}

struct Mapper<'s> {
    source: &'s str,
    /// Bytes stripped from the front of the original input.
    offset: usize,
}

impl Mapper<'_> {
    fn map(&self) -> Result<ThreatModel> {
        let document = Document::parse(self.source).map_err(|err| self.syntax_error(&err))?;
        let root = document.root_element();
        if !root.has_tag_name((MODEL_NS, "ThreatModel")) {
            return Err(Diagnostic::error(format!(
                "unexpected root element `<{}>`",
                root.tag_name().name()
            ))
            .with_code(ErrorCode::E100)
            .with_label(self.start_tag_span(root), "expected `<ThreatModel>`")
            .with_help(format!(
                "the root element must be `ThreatModel` in the `{MODEL_NS}` namespace"
            )));
        }

        let knowledge_base = self.required_child(root, MODEL_NS, "KnowledgeBase")?;
        let icons = self.icon_catalog(knowledge_base)?;

        let surface_list = self.required_child(root, MODEL_NS, "DrawingSurfaceList")?;
        let mut surfaces = children(surface_list, MODEL_NS, "DrawingSurfaceModel");
        let surface = surfaces.next().ok_or_else(|| {
            Diagnostic::error("the document has no drawing surface")
                .with_code(ErrorCode::E102)
                .with_label(
                    self.start_tag_span(surface_list),
                    "expected a `<DrawingSurfaceModel>` inside",
                )
        })?;
        let ignored = surfaces.count();
        if ignored > 0 {
            debug!(ignored_surfaces = ignored; "Only the first drawing surface is mapped");
        }

        let mut model = ThreatModel::new(icons);
        if let Some(header) = child(surface, MODEL_NS, "Header") {
            let name = text_of(header);
            if !name.is_empty() {
                model.set_surface_name(name);
            }
        }

        let borders = self.required_child(surface, MODEL_NS, "Borders")?;
        for entry in children(borders, ARRAYS_NS, "KeyValueOfguidanyType") {
            if !self.map_entry(entry, &mut model)? {
                model.skip_index();
            }
        }

        let lines = self.required_child(surface, MODEL_NS, "Lines")?;
        for entry in children(lines, ARRAYS_NS, "KeyValueOfguidanyType") {
            self.map_entry(entry, &mut model)?;
        }

        info!(
            boundaries = model.boundaries().len(),
            nodes = model.nodes().len(),
            annotations = model.annotations().len(),
            curves = model.curves().len(),
            skipped = model.warnings().len();
            "Threat model mapped"
        );

        Ok(model)
    }

    /// Merges generic then standard element types, so standard entries win.
    fn icon_catalog(&self, knowledge_base: Node<'_, '_>) -> Result<IconCatalog> {
        let mut icons = IconCatalog::new();
        for section in ["GenericElements", "StandardElements"] {
            let list = self.required_child(knowledge_base, KNOWLEDGE_BASE_NS, section)?;
            for element_type in children(list, KNOWLEDGE_BASE_NS, "ElementType") {
                let name = self.required_child(element_type, KNOWLEDGE_BASE_NS, "Name")?;
                let image = self.required_child(element_type, KNOWLEDGE_BASE_NS, "ImageSource")?;
                icons.insert(text_of(name), text_of(image));
            }
        }
        debug!(element_types = icons.len(); "Icon catalog loaded");
        Ok(icons)
    }

    /// Maps one entry, returning `false` when its kind is unsupported.
    fn map_entry(&self, entry: Node<'_, '_>, model: &mut ThreatModel) -> Result<bool> {
        let guid = child(entry, ARRAYS_NS, "Key")
            .map(text_of)
            .filter(|guid| !guid.is_empty());
        let value = self.required_child(entry, ARRAYS_NS, "Value")?;
        let tag_node = self.required_child(value, ABSTRACTS_NS, "GenericTypeId")?;
        let tag = text_of(tag_node);

        let Some(kind) = ElementKind::from_tag(&tag) else {
            warn!(kind = tag.as_str(); "Skipping element of unsupported kind");
            model.push_warning(
                Diagnostic::warning(format!("unsupported element kind `{tag}`"))
                    .with_code(ErrorCode::W300)
                    .with_label(self.span(tag_node), "this element is skipped")
                    .with_help(SUPPORTED_KINDS_HELP),
            );
            return Ok(false);
        };

        let (type_name, name) = self.element_properties(value)?;
        match kind {
            ElementKind::Shape(kind) => self.map_shape(kind, value, type_name, name, guid, model)?,
            ElementKind::Curve(kind) => self.map_curve(kind, value, type_name, name, model)?,
        }
        Ok(true)
    }

    fn map_shape(
        &self,
        kind: ShapeKind,
        value: Node<'_, '_>,
        type_name: String,
        name: String,
        guid: Option<String>,
        model: &mut ThreatModel,
    ) -> Result<()> {
        let raw = Rect::new(
            self.number(value, "Left")?,
            self.number(value, "Top")?,
            self.number(value, "Width")?,
            self.number(value, "Height")?,
        );
        let mut shape = ShapeRecord::new(kind, type_name, name, raw);
        if let Some(guid) = guid {
            shape = shape.with_guid(guid);
        }
        let id = model.push_shape(shape);
        trace!(id = id.index(), kind = kind.tag(); "Shape mapped");
        Ok(())
    }

    fn map_curve(
        &self,
        kind: CurveKind,
        value: Node<'_, '_>,
        type_name: String,
        name: String,
        model: &mut ThreatModel,
    ) -> Result<()> {
        let handle = Point::new(self.number(value, "HandleX")?, self.number(value, "HandleY")?);
        let source = Point::new(self.number(value, "SourceX")?, self.number(value, "SourceY")?);
        let target = Point::new(self.number(value, "TargetX")?, self.number(value, "TargetY")?);
        model.push_curve(CurveRecord::new(
            kind, type_name, name, source, handle, target,
        ));
        trace!(kind = kind.tag(); "Curve mapped");
        Ok(())
    }

    /// Reads `(type name, display name)` from the element's property bag.
    ///
    /// The type name is the first child of the first `anyType` entry; the
    /// display name is the third child of the second one.
    fn element_properties(&self, value: Node<'_, '_>) -> Result<(String, String)> {
        let properties = self.required_child(value, ABSTRACTS_NS, "Properties")?;
        let entries: Vec<_> = children(properties, ARRAYS_NS, "anyType").collect();

        let type_name = entries
            .first()
            .and_then(|entry| entry.first_element_child())
            .ok_or_else(|| self.missing_property(properties, "element type name"))?;
        let name = entries
            .get(1)
            .and_then(|entry| entry.children().filter(Node::is_element).nth(2))
            .ok_or_else(|| self.missing_property(properties, "display name"))?;

        Ok((text_of(type_name), text_of(name)))
    }

    fn number(&self, parent: Node<'_, '_>, name: &str) -> Result<f32> {
        let node = self.required_child(parent, ABSTRACTS_NS, name)?;
        let text = text_of(node);
        text.parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                Diagnostic::error(format!("invalid number `{text}` in `<{name}>`"))
                    .with_code(ErrorCode::E200)
                    .with_label(self.span(node), "expected a finite number")
            })
    }

    fn required_child<'a, 'input>(
        &self,
        parent: Node<'a, 'input>,
        namespace: &str,
        name: &str,
    ) -> Result<Node<'a, 'input>> {
        child(parent, namespace, name).ok_or_else(|| {
            Diagnostic::error(format!("missing `<{name}>` element"))
                .with_code(ErrorCode::E101)
                .with_label(
                    self.start_tag_span(parent),
                    format!("expected inside this `<{}>`", parent.tag_name().name()),
                )
                .with_help(format!("`<{name}>` must be in the `{namespace}` namespace"))
        })
    }

    fn missing_property(&self, properties: Node<'_, '_>, what: &str) -> Diagnostic {
        Diagnostic::error(format!("missing {what} in element properties"))
            .with_code(ErrorCode::E101)
            .with_label(self.start_tag_span(properties), "in this property list")
            .with_help(
                "element properties list the type name in the first `anyType` \
                 and the display name as the third child of the second",
            )
    }

    fn syntax_error(&self, err: &roxmltree::Error) -> Diagnostic {
        let pos = err.pos();
        let start = byte_offset(self.source, pos.row, pos.col);
        let len = self.source[start..].chars().next().map_or(0, char::len_utf8);
        Diagnostic::error(format!("malformed XML: {err}"))
            .with_code(ErrorCode::E001)
            .with_label(Span::new(start..start + len).shift(self.offset), "here")
    }

    fn span(&self, node: Node<'_, '_>) -> Span {
        Span::new(node.range()).shift(self.offset)
    }

    /// The span of the element's start tag only.
    fn start_tag_span(&self, node: Node<'_, '_>) -> Span {
        let range = node.range();
        let end = self.source[range.clone()]
            .find('>')
            .map_or(range.end, |index| range.start + index + 1);
        Span::new(range.start..end).shift(self.offset)
    }
}

fn child<'a, 'input>(parent: Node<'a, 'input>, namespace: &str, name: &str) -> Option<Node<'a, 'input>> {
    parent
        .children()
        .find(|node| node.has_tag_name((namespace, name)))
}

fn children<'a, 'input>(
    parent: Node<'a, 'input>,
    namespace: &'static str,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    parent
        .children()
        .filter(move |node| node.has_tag_name((namespace, name)))
}

fn text_of(node: Node<'_, '_>) -> String {
    node.text().map(str::trim).unwrap_or_default().to_owned()
}

/// Converts a 1-based row and character column into a byte offset.
fn byte_offset(text: &str, row: u32, col: u32) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(row.saturating_sub(1) as usize)
        .map(str::len)
        .sum();
    let line = &text[line_start..];
    line.char_indices()
        .nth(col.saturating_sub(1) as usize)
        .map_or(text.len(), |(index, _)| line_start + index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_offset() {
        let text = "ab\ncdé\nf";
        assert_eq!(byte_offset(text, 1, 1), 0);
        assert_eq!(byte_offset(text, 2, 1), 3);
        assert_eq!(byte_offset(text, 2, 3), 5);
        assert_eq!(byte_offset(text, 3, 1), 8);
        assert_eq!(byte_offset(text, 9, 9), text.len());
    }

    #[test]
    fn test_start_tag_span() {
        let source = r#"<a x="1"><b/></a>"#;
        let document = Document::parse(source).expect("valid xml");
        let mapper = Mapper { source, offset: 0 };
        let span = mapper.start_tag_span(document.root_element());
        assert_eq!(span, Span::new(0..9));
    }

    #[test]
    fn test_syntax_error_points_into_source() {
        let diag = map("<ThreatModel><oops></ThreatModel>").expect_err("mismatched tags");
        assert_eq!(diag.code(), Some(ErrorCode::E001));
        let span = diag.labels()[0].span();
        assert!(span.start() > 0);
        assert!(span.end() <= 33);
    }

    #[test]
    fn test_bom_shifts_spans() {
        let diag = map("\u{feff}<Other/>").expect_err("wrong root");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert_eq!(diag.labels()[0].span(), Span::new(3..11));
    }
}
