//! Incremental resolution of boundary membership.
//!
//! Elements are matched against boundaries pair by pair in input order, so an
//! element can first be assigned a loose boundary and only later meet a
//! tighter one. When that happens the tighter boundary is spliced into the
//! parent chain and then re-resolved against the boundary it displaced.
//!
//! Boundaries are grouped among themselves before nodes are grouped, which
//! makes the final relation independent of the order boundaries appear in
//! the document as long as boundaries nest properly (any two either nest or
//! are disjoint).

use log::{debug, trace};
use thiserror::Error;

use trustmap_core::model::{ShapeArena, ShapeId};
use trustmap_parser::ThreatModel;

/// Internal consistency failures of the grouping pass.
#[derive(Debug, Error)]
pub enum GroupingError {
    #[error("parent chain of shape {element} forms a cycle")]
    Cycle { element: ShapeId },

    #[error("re-grouping shape {element} nested deeper than {limit} boundaries")]
    DepthExceeded { element: ShapeId, limit: usize },
}

/// The resolved parent relation: for each shape, its innermost enclosing
/// boundary.
///
/// The relation is a forest. Annotations and shapes outside every boundary
/// have no parent.
#[derive(Debug, Clone, Default)]
pub struct Groups {
    parents: Vec<Option<ShapeId>>,
}

impl Groups {
    /// Groups the boundaries and nodes of a mapped model.
    pub fn from_model(model: &ThreatModel) -> Result<Self, GroupingError> {
        Self::resolve(model.shapes(), model.boundaries(), model.nodes())
    }

    /// Resolves the parent of every boundary and node.
    ///
    /// All boundaries are matched against all boundaries first, then all
    /// nodes against all boundaries.
    pub fn resolve(
        arena: &ShapeArena,
        boundaries: &[ShapeId],
        nodes: &[ShapeId],
    ) -> Result<Self, GroupingError> {
        let mut resolver = Resolver {
            arena,
            parents: vec![None; arena.len()],
            limit: boundaries.len(),
        };
        resolver.group_all(boundaries, boundaries)?;
        resolver.group_all(nodes, boundaries)?;

        let groups = Self {
            parents: resolver.parents,
        };
        debug!(
            grouped = groups.parents.iter().filter(|parent| parent.is_some()).count(),
            boundaries = boundaries.len(),
            nodes = nodes.len();
            "Grouping resolved"
        );
        Ok(groups)
    }

    /// The innermost boundary enclosing `id`.
    pub fn parent(&self, id: ShapeId) -> Option<ShapeId> {
        self.parents.get(id.index()).copied().flatten()
    }

    /// Enclosing boundaries of `id`, innermost first.
    pub fn ancestors(&self, id: ShapeId) -> Vec<ShapeId> {
        let mut ancestors = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            ancestors.push(parent);
            current = parent;
        }
        ancestors
    }

    /// Number of boundaries enclosing `id`.
    pub fn depth(&self, id: ShapeId) -> usize {
        self.ancestors(id).len()
    }

    pub fn is_grouped(&self, id: ShapeId) -> bool {
        self.parent(id).is_some()
    }

    /// Names of nodes that lie outside every boundary, in document order.
    pub fn ungrouped_node_names<'m>(&self, model: &'m ThreatModel) -> Vec<&'m str> {
        model
            .nodes()
            .iter()
            .filter(|&&id| !self.is_grouped(id))
            .map(|&id| model.shapes()[id].name())
            .collect()
    }
}

struct Resolver<'a> {
    arena: &'a ShapeArena,
    parents: Vec<Option<ShapeId>>,
    /// Bound on re-resolution depth: one level per boundary.
    limit: usize,
}

impl Resolver<'_> {
    fn group_all(&mut self, elements: &[ShapeId], boundaries: &[ShapeId]) -> Result<(), GroupingError> {
        for &element in elements {
            for &boundary in boundaries {
                self.link(element, boundary, 0)?;
            }
        }
        Ok(())
    }

    fn link(&mut self, element: ShapeId, boundary: ShapeId, depth: usize) -> Result<(), GroupingError> {
        if element == boundary || !self.contains(boundary, element) {
            return Ok(());
        }
        if depth > self.limit {
            return Err(GroupingError::DepthExceeded {
                element,
                limit: self.limit,
            });
        }

        // Anything already enclosing `boundary` can never be placed inside it.
        let boundary_chain = self.chain(boundary)?;
        if boundary_chain.contains(&element) {
            return Ok(());
        }

        if self.parents[element.index()].is_none() {
            self.set_parent(element, boundary)?;
            return Ok(());
        }

        let chain = self.chain(element)?;
        if chain.contains(&boundary) {
            return Ok(());
        }

        let splice_at = chain.iter().copied().find(|&ancestor| {
            !boundary_chain.contains(&ancestor)
                && self.contains(boundary, ancestor)
                && self.parents[ancestor.index()]
                    .is_none_or(|parent| !self.contains(boundary, parent))
        });

        if let Some(ancestor) = splice_at {
            let displaced = self.parents[ancestor.index()];
            trace!(
                shape = ancestor.index(),
                boundary = boundary.index(),
                displaced = displaced.map(ShapeId::index);
                "Splicing tighter boundary into parent chain"
            );
            self.set_parent(ancestor, boundary)?;
            if let Some(displaced) = displaced {
                self.link(boundary, displaced, depth + 1)?;
            }
        }
        Ok(())
    }

    fn set_parent(&mut self, element: ShapeId, boundary: ShapeId) -> Result<(), GroupingError> {
        self.parents[element.index()] = Some(boundary);
        self.chain(element).map(|_| ())
    }

    /// `start` followed by its ancestors, innermost first.
    fn chain(&self, start: ShapeId) -> Result<Vec<ShapeId>, GroupingError> {
        let mut chain = vec![start];
        let mut current = start;
        while let Some(parent) = self.parents[current.index()] {
            if chain.contains(&parent) {
                return Err(GroupingError::Cycle { element: start });
            }
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }

    fn contains(&self, outer: ShapeId, inner: ShapeId) -> bool {
        self.arena[outer].rect().contains(&self.arena[inner].rect())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use trustmap_core::{
        geometry::Rect,
        model::{ShapeKind, ShapeRecord},
    };

    use super::*;

    fn insert(arena: &mut ShapeArena, kind: ShapeKind, name: &str, rect: [f32; 4]) -> ShapeId {
        let [left, top, width, height] = rect;
        arena.insert(ShapeRecord::new(
            kind,
            "Type",
            name,
            Rect::new(left, top, width, height),
        ))
    }

    fn name_of(arena: &ShapeArena, id: Option<ShapeId>) -> Option<&str> {
        id.map(|id| arena[id].name())
    }

    #[test]
    fn test_nodes_outside_every_boundary_are_ungrouped() {
        let mut arena = ShapeArena::new();
        let boundary = insert(&mut arena, ShapeKind::Boundary, "Internal", [0.0, 0.0, 500.0, 500.0]);
        let a = insert(&mut arena, ShapeKind::Process, "A", [10.0, 10.0, 100.0, 100.0]);
        let b = insert(&mut arena, ShapeKind::DataStore, "B", [200.0, 200.0, 100.0, 100.0]);
        let c = insert(&mut arena, ShapeKind::ExternalInteractor, "C", [800.0, 0.0, 100.0, 100.0]);

        let groups = Groups::resolve(&arena, &[boundary], &[a, b, c]).unwrap();

        assert_eq!(groups.parent(a), Some(boundary));
        assert_eq!(groups.parent(b), Some(boundary));
        assert_eq!(groups.parent(c), None);
        assert_eq!(groups.parent(boundary), None);
    }

    #[test]
    fn test_late_outer_boundary_keeps_inner_parent() {
        // Document order: B2, N, B1 with B1 > B2 > N.
        let mut arena = ShapeArena::new();
        let b2 = insert(&mut arena, ShapeKind::Boundary, "B2", [100.0, 100.0, 300.0, 300.0]);
        let n = insert(&mut arena, ShapeKind::Process, "N", [150.0, 150.0, 100.0, 100.0]);
        let b1 = insert(&mut arena, ShapeKind::Boundary, "B1", [0.0, 0.0, 600.0, 600.0]);

        let groups = Groups::resolve(&arena, &[b2, b1], &[n]).unwrap();

        assert_eq!(groups.parent(n), Some(b2));
        assert_eq!(groups.parent(b2), Some(b1));
        assert_eq!(groups.parent(b1), None);
        assert_eq!(groups.ancestors(n), vec![b2, b1]);
        assert_eq!(groups.depth(n), 2);
    }

    #[test]
    fn test_late_inner_boundary_is_spliced_in() {
        let mut arena = ShapeArena::new();
        let b1 = insert(&mut arena, ShapeKind::Boundary, "B1", [0.0, 0.0, 600.0, 600.0]);
        let n = insert(&mut arena, ShapeKind::Process, "N", [150.0, 150.0, 100.0, 100.0]);
        let b2 = insert(&mut arena, ShapeKind::Boundary, "B2", [100.0, 100.0, 300.0, 300.0]);

        let groups = Groups::resolve(&arena, &[b1, b2], &[n]).unwrap();

        assert_eq!(groups.parent(n), Some(b2));
        assert_eq!(groups.parent(b2), Some(b1));
    }

    #[test]
    fn test_identical_boundaries_do_not_cycle() {
        let mut arena = ShapeArena::new();
        let a = insert(&mut arena, ShapeKind::Boundary, "A", [0.0, 0.0, 300.0, 300.0]);
        let b = insert(&mut arena, ShapeKind::Boundary, "B", [0.0, 0.0, 300.0, 300.0]);
        let n = insert(&mut arena, ShapeKind::Process, "N", [50.0, 50.0, 50.0, 50.0]);

        let groups = Groups::resolve(&arena, &[a, b], &[n]).unwrap();

        let nested = [groups.parent(a), groups.parent(b)];
        assert!(nested == [Some(b), None] || nested == [None, Some(a)]);
        assert_eq!(groups.depth(n), 2);
    }

    #[test]
    fn test_boundary_is_never_its_own_parent() {
        let mut arena = ShapeArena::new();
        let a = insert(&mut arena, ShapeKind::Boundary, "A", [0.0, 0.0, 300.0, 300.0]);

        let groups = Groups::resolve(&arena, &[a], &[]).unwrap();

        assert_eq!(groups.parent(a), None);
        assert!(groups.ancestors(a).is_empty());
    }

    #[test]
    fn test_overlapping_boundary_does_not_capture_partial_node() {
        let mut arena = ShapeArena::new();
        let left = insert(&mut arena, ShapeKind::Boundary, "Left", [0.0, 0.0, 300.0, 300.0]);
        let right = insert(&mut arena, ShapeKind::Boundary, "Right", [200.0, 0.0, 300.0, 300.0]);
        let n = insert(&mut arena, ShapeKind::Process, "N", [50.0, 50.0, 100.0, 100.0]);

        let groups = Groups::resolve(&arena, &[left, right], &[n]).unwrap();

        assert_eq!(groups.parent(n), Some(left));
        assert_eq!(groups.parent(left), None);
        assert_eq!(groups.parent(right), None);
    }

    /// Two disjoint towers of strictly nested boundaries with one node per
    /// tower at a chosen nesting depth.
    struct Towers {
        arena: ShapeArena,
        boundaries: Vec<ShapeId>,
        nodes: Vec<ShapeId>,
    }

    fn towers(depths: [usize; 2], node_depths: [usize; 2]) -> Towers {
        let mut arena = ShapeArena::new();
        let mut boundaries = Vec::new();
        let mut nodes = Vec::new();
        for (tower, (&depth, &node_depth)) in depths.iter().zip(&node_depths).enumerate() {
            let x = tower as f32 * 1000.0;
            for level in 0..depth {
                let offset = 20.0 * level as f32;
                let size = 400.0 - 40.0 * level as f32;
                boundaries.push(insert(
                    &mut arena,
                    ShapeKind::Boundary,
                    &format!("T{tower}B{level}"),
                    [x + offset, offset, size, size],
                ));
            }
            let node_depth = node_depth.min(depth);
            let rect = if node_depth == 0 {
                [x + 600.0, 0.0, 30.0, 30.0]
            } else {
                let offset = 20.0 * (node_depth - 1) as f32 + 2.0;
                [x + offset, offset, 30.0, 30.0]
            };
            nodes.push(insert(&mut arena, ShapeKind::Process, &format!("T{tower}N"), rect));
        }
        Towers {
            arena,
            boundaries,
            nodes,
        }
    }

    fn expected_parent(name: &str) -> Option<String> {
        // Names encode position: `T{tower}B{level}` sits inside level - 1.
        let (tower, rest) = name.split_at(2);
        match rest.strip_prefix('B') {
            Some(level) => {
                let level: usize = level.parse().ok()?;
                level.checked_sub(1).map(|parent| format!("{tower}B{parent}"))
            }
            None => None,
        }
    }

    /// Tower depths, node depths and a discovery order over all boundaries.
    fn tower_case() -> impl Strategy<Value = ([usize; 2], [usize; 2], Vec<usize>)> {
        ((1usize..5, 1usize..5), (0usize..5, 0usize..5)).prop_flat_map(
            |((left, right), (left_node, right_node))| {
                let order: Vec<usize> = (0..left + right).collect();
                (
                    Just([left, right]),
                    Just([left_node, right_node]),
                    Just(order).prop_shuffle(),
                )
            },
        )
    }

    proptest! {
        #[test]
        fn grouping_is_order_independent((depths, node_depths, order) in tower_case()) {
            let Towers { arena, boundaries, nodes } = towers(depths, node_depths);
            let boundaries: Vec<ShapeId> = order.iter().map(|&index| boundaries[index]).collect();

            let groups = Groups::resolve(&arena, &boundaries, &nodes).unwrap();

            for &boundary in &boundaries {
                let name = arena[boundary].name();
                prop_assert_eq!(
                    name_of(&arena, groups.parent(boundary)).map(str::to_owned),
                    expected_parent(name)
                );
            }

            for (tower, &node) in nodes.iter().enumerate() {
                let node_depth = node_depths[tower].min(depths[tower]);
                let expected = node_depth.checked_sub(1).map(|level| format!("T{tower}B{level}"));
                prop_assert_eq!(name_of(&arena, groups.parent(node)).map(str::to_owned), expected);
                prop_assert_eq!(groups.depth(node), node_depth);
            }
        }
    }
}
