//! Typed model of a threat-model diagram.
//!
//! Every diagram element carries an element-kind tag in the source document.
//! The recognized tags form the closed [`ElementKind`] sum type, which splits
//! into rectangular [`ShapeKind`]s and curved [`CurveKind`]s.
//!
//! Shapes live in a [`ShapeArena`] and are referenced by [`ShapeId`]. The
//! arena never removes entries, so an id stays valid for the lifetime of the
//! diagram and can key side tables such as the group relation.

use std::{fmt, ops::Index, str::FromStr};

use serde::Serialize;

use crate::{
    curve::QuadraticCurve,
    geometry::{Point, Rect},
};

/// Inset applied once to the raw document geometry of every shape.
pub const SHAPE_INSET: f32 = 5.0;

/// A recognized element-kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Shape(ShapeKind),
    Curve(CurveKind),
}

impl ElementKind {
    /// Parses a document element-kind tag such as `GE.P`.
    ///
    /// Returns `None` for tags this crate does not model.
    ///
    /// # Examples
    ///
    /// ```
    /// # use trustmap_core::model::{ElementKind, ShapeKind, CurveKind};
    /// assert_eq!(ElementKind::from_tag("GE.P"), Some(ElementKind::Shape(ShapeKind::Process)));
    /// assert_eq!(ElementKind::from_tag("GE.DF"), Some(ElementKind::Curve(CurveKind::DataFlow)));
    /// assert_eq!(ElementKind::from_tag("GE.XYZ"), None);
    /// ```
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag.trim() {
            "GE.DS" => Self::Shape(ShapeKind::DataStore),
            "GE.EI" => Self::Shape(ShapeKind::ExternalInteractor),
            "GE.P" => Self::Shape(ShapeKind::Process),
            "GE.A" => Self::Shape(ShapeKind::Annotation),
            "GE.TB.B" => Self::Shape(ShapeKind::Boundary),
            "GE.DF" => Self::Curve(CurveKind::DataFlow),
            "GE.TB.L" => Self::Curve(CurveKind::TrustLine),
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the document tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Shape(kind) => kind.tag(),
            Self::Curve(kind) => kind.tag(),
        }
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unsupported element kind `{s}`"))
    }
}

/// Rectangular element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    DataStore,
    ExternalInteractor,
    Process,
    Annotation,
    Boundary,
}

impl ShapeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::DataStore => "GE.DS",
            Self::ExternalInteractor => "GE.EI",
            Self::Process => "GE.P",
            Self::Annotation => "GE.A",
            Self::Boundary => "GE.TB.B",
        }
    }

    /// The cross-reference category this kind is listed under.
    pub fn category(&self) -> Category {
        match self {
            Self::Boundary => Category::Boundary,
            Self::Annotation => Category::Annotation,
            Self::DataStore | Self::ExternalInteractor | Self::Process => Category::Node,
        }
    }

    /// Returns true for data stores, external interactors and processes.
    pub fn is_node(&self) -> bool {
        self.category() == Category::Node
    }
}

/// Curved element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKind {
    DataFlow,
    TrustLine,
}

impl CurveKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::DataFlow => "GE.DF",
            Self::TrustLine => "GE.TB.L",
        }
    }
}

/// Cross-reference category label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Boundary,
    Node,
    Annotation,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Boundary => "Boundary",
            Self::Node => "Node",
            Self::Annotation => "Annotation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A rectangular diagram element: node, boundary or annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    kind: ShapeKind,
    type_name: String,
    name: String,
    guid: Option<String>,
    rect: Rect,
}

impl ShapeRecord {
    /// Creates a shape from raw document geometry.
    ///
    /// The stored rectangle is the raw one shrunk by [`SHAPE_INSET`] on
    /// every side.
    pub fn new(
        kind: ShapeKind,
        type_name: impl Into<String>,
        name: impl Into<String>,
        raw: Rect,
    ) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            name: name.into(),
            guid: None,
            rect: raw.inset(SHAPE_INSET),
        }
    }

    /// Attaches the document GUID of the element.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Element type display name, also the key into the icon catalog.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// Normalized geometry.
    pub fn rect(&self) -> Rect {
        self.rect
    }
}

/// A curved diagram element: data flow or trust line.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveRecord {
    kind: CurveKind,
    type_name: String,
    name: String,
    handle: Point,
    curve: QuadraticCurve,
}

impl CurveRecord {
    pub fn new(
        kind: CurveKind,
        type_name: impl Into<String>,
        name: impl Into<String>,
        source: Point,
        handle: Point,
        target: Point,
    ) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            name: name.into(),
            handle,
            curve: QuadraticCurve::from_handle(source, handle, target),
        }
    }

    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> Point {
        self.handle
    }

    pub fn curve(&self) -> &QuadraticCurve {
        &self.curve
    }
}

/// Stable index of a shape inside a [`ShapeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(usize);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only storage for shapes.
#[derive(Debug, Clone, Default)]
pub struct ShapeArena {
    shapes: Vec<ShapeRecord>,
}

impl ShapeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a shape and returns its id.
    pub fn insert(&mut self, shape: ShapeRecord) -> ShapeId {
        self.shapes.push(shape);
        ShapeId(self.shapes.len() - 1)
    }

    pub fn get(&self, id: ShapeId) -> Option<&ShapeRecord> {
        self.shapes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Iterates shapes with their ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &ShapeRecord)> {
        self.shapes
            .iter()
            .enumerate()
            .map(|(index, shape)| (ShapeId(index), shape))
    }
}

impl Index<ShapeId> for ShapeArena {
    type Output = ShapeRecord;

    fn index(&self, id: ShapeId) -> &Self::Output {
        &self.shapes[id.0]
    }
}

/// A `(key, display name)` pair identifying one diagram element.
///
/// Keys have the form `"<Category> <n>"` where `n` is a single 1-based
/// counter shared by boundaries, nodes and annotations in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossReference {
    key: String,
    name: String,
}

impl CrossReference {
    /// Builds the entry for the `index`-th (1-based) element of `category`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use trustmap_core::model::{Category, CrossReference};
    /// let entry = CrossReference::new(Category::Node, 3, "Web App");
    /// assert_eq!(entry.key(), "Node 3");
    /// assert_eq!(entry.to_string(), "Node 3: Web App");
    /// ```
    pub fn new(category: Category, index: usize, name: impl Into<String>) -> Self {
        Self {
            key: format!("{category} {index}"),
            name: name.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry as a `(key, name)` tuple.
    pub fn as_pair(&self) -> (&str, &str) {
        (&self.key, &self.name)
    }
}

impl fmt::Display for CrossReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.name)
    }
}
