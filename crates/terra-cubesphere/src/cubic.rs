//! Six face quadtrees sharing one set of LOD parameters.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use terra_math::DVec3;

use crate::error::validate;
use crate::{CubeFace, LodError, NodeId, QuadNode, Quadtree};

/// A branch that may be expanded into its four children.
#[derive(Clone, Copy, Debug)]
struct SplitCandidate {
    distance: f64,
    face: usize,
    id: NodeId,
}

impl PartialEq for SplitCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SplitCandidate {}

impl PartialOrd for SplitCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SplitCandidate {
    /// Reversed so the max-heap pops the nearest branch first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.face.cmp(&self.face))
            .then_with(|| other.id.index().cmp(&self.id.index()))
    }
}

/// One [`Quadtree`] per cube face, indexed by [`CubeFace::index`].
#[derive(Clone, Debug)]
pub struct CubicQuadtree {
    faces: [Quadtree; 6],
}

impl CubicQuadtree {
    /// Build the six single-node face trees for a planet.
    pub fn new(
        radius: f64,
        min_node_size: f64,
        split_threshold: f64,
        origin: DVec3,
    ) -> Result<Self, LodError> {
        validate(radius, min_node_size, split_threshold)?;
        let [a, b, c, d, e, f] = CubeFace::ALL
            .map(|face| Quadtree::new(face, radius, min_node_size, split_threshold, origin));
        Ok(Self {
            faces: [a?, b?, c?, d?, e?, f?],
        })
    }

    /// Refine every face toward `viewpoint`. Faces are independent.
    pub fn insert(&mut self, viewpoint: DVec3) {
        for tree in &mut self.faces {
            tree.insert(viewpoint);
        }
    }

    /// Leaves of every face, concatenated in face-index order.
    #[must_use]
    pub fn collect_leaves(&self) -> Vec<&QuadNode> {
        self.faces.iter().flat_map(Quadtree::collect_leaves).collect()
    }

    /// Leaves of the refined trees, cut back so there are at most
    /// `max_leaves` of them.
    ///
    /// Branches are expanded nearest-first by sphere-center distance to
    /// `viewpoint`. Where the budget runs out, a branch is returned as a
    /// single coarser node, so every face stays fully covered. The six roots
    /// are always returned, even when `max_leaves < 6`. Order matches
    /// [`collect_leaves`](Self::collect_leaves).
    #[must_use]
    pub fn collect_leaves_limited(&self, viewpoint: DVec3, max_leaves: usize) -> Vec<&QuadNode> {
        if self.leaf_count() <= max_leaves {
            return self.collect_leaves();
        }

        let mut expanded: Vec<Vec<bool>> = self.faces.iter().map(|t| vec![false; t.len()]).collect();
        let mut heap = BinaryHeap::new();
        let candidate = |face: usize, id: NodeId, node: &QuadNode| SplitCandidate {
            distance: node.sphere_center.distance(viewpoint),
            face,
            id,
        };
        for (face, tree) in self.faces.iter().enumerate() {
            let root = tree.root();
            if !root.is_leaf() {
                heap.push(candidate(face, NodeId::ROOT, root));
            }
        }

        let mut count = self.faces.len();
        while let Some(next) = heap.pop() {
            // Every split adds three nodes.
            if count + 3 > max_leaves {
                break;
            }
            count += 3;
            expanded[next.face][next.id.index()] = true;
            let tree = &self.faces[next.face];
            let Some(children) = tree.node(next.id).and_then(|n| n.children) else {
                continue;
            };
            for child in children {
                if let Some(node) = tree.node(child).filter(|n| !n.is_leaf()) {
                    heap.push(candidate(next.face, child, node));
                }
            }
        }

        let mut leaves = Vec::with_capacity(count);
        for (tree, expanded) in self.faces.iter().zip(&expanded) {
            let mut stack = vec![NodeId::ROOT];
            while let Some(id) = stack.pop() {
                let Some(node) = tree.node(id) else {
                    continue;
                };
                match node.children {
                    Some(children) if expanded[id.index()] => stack.extend(children.iter().rev()),
                    _ => leaves.push(node),
                }
            }
        }
        leaves
    }

    #[must_use]
    pub fn face(&self, face: CubeFace) -> &Quadtree {
        &self.faces[face.index()]
    }

    /// Per-face leaf counts in face-index order.
    #[must_use]
    pub fn leaf_counts(&self) -> [usize; 6] {
        let mut counts = [0; 6];
        for (count, tree) in counts.iter_mut().zip(&self.faces) {
            *count = tree.collect_leaves().len();
        }
        counts
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_counts().iter().sum()
    }
}
