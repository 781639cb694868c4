//! Containment structure of a mapped threat model.
//!
//! Nodes and boundaries are nested inside trust boundaries purely by
//! geometry. This module resolves that nesting into a parent relation
//! ([`Groups`]) that the pipeline queries for compliance findings such as
//! nodes placed outside every boundary.

mod grouping;

pub use grouping::{GroupingError, Groups};
