//! The typed result of mapping a threat-model document.

use indexmap::IndexMap;

use trustmap_core::{
    draw::IconCatalog,
    model::{CrossReference, CurveKind, CurveRecord, ShapeArena, ShapeId, ShapeKind, ShapeRecord},
};

use crate::error::Diagnostic;

/// Shapes, curves and icons read from the first drawing surface of a
/// document.
///
/// Shapes are owned by an arena; boundaries, nodes and annotations are
/// ordered id lists into it, in document order. Each shape has exactly one
/// cross-reference entry, keyed by its id.
#[derive(Debug, Clone, Default)]
pub struct ThreatModel {
    surface_name: Option<String>,
    shapes: ShapeArena,
    boundaries: Vec<ShapeId>,
    nodes: Vec<ShapeId>,
    annotations: Vec<ShapeId>,
    curves: Vec<CurveRecord>,
    icons: IconCatalog,
    cross_references: IndexMap<ShapeId, CrossReference>,
    /// Running count of discovered border entries, keyed or not.
    next_index: usize,
    warnings: Vec<Diagnostic>,
}

impl ThreatModel {
    pub(crate) fn new(icons: IconCatalog) -> Self {
        Self {
            icons,
            ..Self::default()
        }
    }

    /// The `Header` text of the mapped surface.
    pub fn surface_name(&self) -> Option<&str> {
        self.surface_name.as_deref()
    }

    pub fn shapes(&self) -> &ShapeArena {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&ShapeRecord> {
        self.shapes.get(id)
    }

    pub fn boundaries(&self) -> &[ShapeId] {
        &self.boundaries
    }

    /// Data stores, external interactors and processes.
    pub fn nodes(&self) -> &[ShapeId] {
        &self.nodes
    }

    pub fn annotations(&self) -> &[ShapeId] {
        &self.annotations
    }

    /// All curves in document order.
    pub fn curves(&self) -> &[CurveRecord] {
        &self.curves
    }

    pub fn flows(&self) -> impl Iterator<Item = &CurveRecord> {
        self.curves_of(CurveKind::DataFlow)
    }

    pub fn trust_lines(&self) -> impl Iterator<Item = &CurveRecord> {
        self.curves_of(CurveKind::TrustLine)
    }

    pub fn icons(&self) -> &IconCatalog {
        &self.icons
    }

    /// Cross-reference entries in document order.
    pub fn cross_references(&self) -> impl Iterator<Item = &CrossReference> {
        self.cross_references.values()
    }

    pub fn cross_reference(&self, id: ShapeId) -> Option<&CrossReference> {
        self.cross_references.get(&id)
    }

    /// Warnings for content that was skipped while mapping.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub(crate) fn set_surface_name(&mut self, name: impl Into<String>) {
        self.surface_name = Some(name.into());
    }

    /// Stores a shape, files it under its category and assigns the next
    /// cross-reference key.
    pub(crate) fn push_shape(&mut self, shape: ShapeRecord) -> ShapeId {
        let kind = shape.kind();
        self.next_index += 1;
        let entry = CrossReference::new(kind.category(), self.next_index, shape.name());
        let id = self.shapes.insert(shape);
        match kind {
            ShapeKind::Boundary => self.boundaries.push(id),
            ShapeKind::Annotation => self.annotations.push(id),
            ShapeKind::DataStore | ShapeKind::ExternalInteractor | ShapeKind::Process => {
                self.nodes.push(id)
            }
        }
        self.cross_references.insert(id, entry);
        id
    }

    /// Consumes a key index for a border entry that is not represented.
    pub(crate) fn skip_index(&mut self) {
        self.next_index += 1;
    }

    pub(crate) fn push_curve(&mut self, curve: CurveRecord) {
        self.curves.push(curve);
    }

    pub(crate) fn push_warning(&mut self, warning: Diagnostic) {
        self.warnings.push(warning);
    }

    fn curves_of(&self, kind: CurveKind) -> impl Iterator<Item = &CurveRecord> {
        self.curves.iter().filter(move |curve| curve.kind() == kind)
    }
}
