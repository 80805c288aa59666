//! Per-face quadtree for view-dependent subdivision.
//!
//! The tree is ephemeral: it is built from scratch for a viewpoint, its
//! leaves are read out, and it is dropped. Nodes live in an arena owned by
//! the tree and refer to each other by [`NodeId`], so dropping the tree frees
//! every node at once.

use terra_math::{Box2, DMat4, DVec2, DVec3};

use crate::error::validate;
use crate::{ChunkKey, CubeFace, LodError};

/// Index of a node inside its [`Quadtree`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One square region of a cube face.
#[derive(Clone, Debug)]
pub struct QuadNode {
    /// Region in face-local 2D coordinates.
    pub bounds: Box2,
    /// Center of `bounds`.
    pub center: DVec2,
    /// Half of the node's edge length.
    pub half_size: f64,
    /// Node center projected onto the sphere in world space (origin applied).
    /// Used as the LOD distance proxy.
    pub sphere_center: DVec3,
    /// Children in bottom-left, bottom-right, top-left, top-right order.
    pub children: Option<[NodeId; 4]>,
    /// Owning face.
    pub face: CubeFace,
    /// Distance from the root (root = 0).
    pub depth: u32,
}

impl QuadNode {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Full edge length.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.half_size * 2.0
    }

    /// Geometric identity of this node.
    #[must_use]
    pub fn key(&self) -> ChunkKey {
        ChunkKey::new(self.face, self.center, self.size())
    }
}

/// Quadtree covering one cube face.
#[derive(Clone, Debug)]
pub struct Quadtree {
    face: CubeFace,
    size: f64,
    min_node_size: f64,
    split_threshold: f64,
    origin: DVec3,
    transform: DMat4,
    nodes: Vec<QuadNode>,
}

impl Quadtree {
    /// Create a single-node tree whose root spans `[-size, size]²` on `face`.
    ///
    /// `size` is the face half-extent, which is also the planet radius.
    pub fn new(
        face: CubeFace,
        size: f64,
        min_node_size: f64,
        split_threshold: f64,
        origin: DVec3,
    ) -> Result<Self, LodError> {
        validate(size, min_node_size, split_threshold)?;
        let mut tree = Self {
            face,
            size,
            min_node_size,
            split_threshold,
            origin,
            transform: face.local_to_world(size),
            nodes: Vec::new(),
        };
        tree.push_node(Box2::from_center_half_size(DVec2::ZERO, size), 0);
        Ok(tree)
    }

    fn push_node(&mut self, bounds: Box2, depth: u32) -> NodeId {
        let center = bounds.center();
        let on_cube = self
            .transform
            .transform_point3(DVec3::new(center.x, center.y, 0.0));
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(QuadNode {
            bounds,
            center,
            half_size: bounds.half_size(),
            sphere_center: on_cube.normalize() * self.size + self.origin,
            children: None,
            face: self.face,
            depth,
        });
        id
    }

    /// Refine the tree toward `viewpoint`.
    ///
    /// A node splits when the viewpoint is closer to its sphere center than
    /// `half_size × split_threshold` and it is still coarser than the minimum
    /// node size. Existing children are reused, so several viewpoints can be
    /// inserted into one tree.
    pub fn insert(&mut self, viewpoint: DVec3) {
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            let distance = node.sphere_center.distance(viewpoint);
            if distance >= node.half_size * self.split_threshold
                || node.half_size <= self.min_node_size
            {
                continue;
            }
            let children = match node.children {
                Some(children) => children,
                None => {
                    let quadrants = node.bounds.quadrants();
                    let depth = node.depth + 1;
                    let children = quadrants.map(|q| self.push_node(q, depth));
                    self.nodes[id.index()].children = Some(children);
                    children
                }
            };
            stack.extend(children.iter().rev());
        }
    }

    /// All leaves in pre-order (children visited bottom-left first).
    #[must_use]
    pub fn collect_leaves(&self) -> Vec<&QuadNode> {
        let mut leaves = Vec::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            match node.children {
                Some(children) => stack.extend(children.iter().rev()),
                None => leaves.push(node),
            }
        }
        leaves
    }

    /// Look up a node. Returns `None` for ids from another tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&QuadNode> {
        self.nodes.get(id.index())
    }

    #[must_use]
    pub fn root(&self) -> &QuadNode {
        &self.nodes[NodeId::ROOT.index()]
    }

    /// Total node count (branches and leaves).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deepest level reached (root-only tree = 0).
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// Face-to-world transform (relative to the planet center).
    #[must_use]
    pub fn transform(&self) -> DMat4 {
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos_z_tree() -> Quadtree {
        Quadtree::new(CubeFace::PosZ, 1000.0, 50.0, 1.5, DVec3::ZERO).unwrap()
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let cases = [
            (1000.0, 50.0, 0.0),
            (1000.0, 50.0, -1.0),
            (1000.0, 50.0, f64::NAN),
            (1000.0, 0.0, 1.5),
            (1000.0, 1000.0, 1.5),
            (0.0, 50.0, 1.5),
        ];
        for (size, min, threshold) in cases {
            assert!(
                Quadtree::new(CubeFace::PosX, size, min, threshold, DVec3::ZERO).is_err(),
                "accepted size={size} min={min} threshold={threshold}"
            );
        }
    }

    #[test]
    fn test_far_viewpoint_keeps_root_leaf() {
        let mut tree = pos_z_tree();
        tree.insert(DVec3::new(0.0, 0.0, 20_000.0));
        let leaves = tree.collect_leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].size(), 2000.0);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_root_sphere_center_is_on_face_axis() {
        let tree = Quadtree::new(CubeFace::NegX, 500.0, 10.0, 1.25, DVec3::new(1.0, 2.0, 3.0))
            .unwrap();
        assert_eq!(tree.root().sphere_center, DVec3::new(-499.0, 2.0, 3.0));
    }

    #[test]
    fn test_children_follow_quadrant_order() {
        let mut tree = pos_z_tree();
        tree.insert(DVec3::new(0.0, 0.0, 1300.0));
        let root = tree.root();
        let children = root.children.expect("root should split");
        let centers: Vec<DVec2> = children
            .iter()
            .map(|&id| tree.node(id).unwrap().center)
            .collect();
        assert_eq!(
            centers,
            vec![
                DVec2::new(-500.0, -500.0),
                DVec2::new(500.0, -500.0),
                DVec2::new(-500.0, 500.0),
                DVec2::new(500.0, 500.0),
            ]
        );
    }

    #[test]
    fn test_leaves_cover_face_exactly() {
        let mut tree = pos_z_tree();
        tree.insert(DVec3::new(100.0, -200.0, 1010.0));
        let area: f64 = tree
            .collect_leaves()
            .iter()
            .map(|leaf| leaf.size() * leaf.size())
            .sum();
        assert_eq!(area, 2000.0 * 2000.0);
    }

    #[test]
    fn test_leaves_never_finer_than_min_node_size() {
        let mut tree = pos_z_tree();
        tree.insert(DVec3::new(0.0, 0.0, 1000.5));
        for leaf in tree.collect_leaves() {
            assert!(
                leaf.half_size * 2.0 >= 50.0,
                "leaf {} is finer than the minimum",
                leaf.key()
            );
        }
        assert!(tree.depth() >= 4);
    }

    #[test]
    fn test_finest_leaves_sit_under_viewpoint() {
        let mut tree = pos_z_tree();
        tree.insert(DVec3::new(0.0, 0.0, 1010.0));
        let leaves = tree.collect_leaves();
        assert_eq!(leaves.len(), 52);
        let finest = leaves
            .iter()
            .map(|l| l.size())
            .fold(f64::INFINITY, f64::min);
        assert_eq!(finest, 62.5);
        let under: Vec<_> = leaves
            .iter()
            .filter(|l| l.bounds.contains(DVec2::ZERO))
            .collect();
        assert_eq!(under.len(), 4);
        assert!(under.iter().all(|l| l.size() == 62.5));
    }

    #[test]
    fn test_repeated_insert_is_idempotent() {
        let mut tree = pos_z_tree();
        let viewpoint = DVec3::new(300.0, 300.0, 1100.0);
        tree.insert(viewpoint);
        let first: Vec<ChunkKey> = tree.collect_leaves().iter().map(|l| l.key()).collect();
        tree.insert(viewpoint);
        let second: Vec<ChunkKey> = tree.collect_leaves().iter().map(|l| l.key()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_leaf_sizes_shrink_toward_viewpoint() {
        let mut tree = pos_z_tree();
        let viewpoint = DVec3::new(0.0, 0.0, 1010.0);
        tree.insert(viewpoint);
        let mut leaves: Vec<_> = tree.collect_leaves().into_iter().collect();
        leaves.sort_by(|a, b| {
            a.sphere_center
                .distance(viewpoint)
                .total_cmp(&b.sphere_center.distance(viewpoint))
        });
        let nearest = leaves.first().unwrap().size();
        let farthest = leaves.last().unwrap().size();
        assert!(nearest < farthest);
    }
}
