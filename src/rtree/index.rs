use crate::error::Result;
use crate::geometry::BBox;
use crate::rtree::builder::{pack, DEFAULT_NODE_CAPACITY};
use crate::rtree::RTreeBuilder;
use crate::scalar::Scalar;

/// Root sentinel for a tree built from no boxes.
pub(crate) const NIL: u32 = u32::MAX;

/// A node of the packed tree: its bounding box plus either the original box
/// index (leaf) or a run in the flat children array (internal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RTreeNode<N: Scalar> {
    pub bbox: BBox<N>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Leaf {
        item: u32,
    },
    Internal {
        children_start: u32,
        children_len: u32,
    },
}

/// An immutable, height-balanced R-tree over a sequence of boxes, packed
/// with the sort-tile-recursive algorithm.
///
/// Built once by [`RTree::build`] (or [`RTreeBuilder`]); never mutated.
/// Queries are pure functions of the tree and their arguments, so a tree
/// can be shared freely between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct RTree<N: Scalar> {
    pub(crate) boxes: Vec<BBox<N>>,
    pub(crate) nodes: Vec<RTreeNode<N>>,
    pub(crate) children: Vec<u32>,
    pub(crate) root: u32,
    pub(crate) node_capacity: usize,
}

impl<N: Scalar> RTree<N> {
    /// Bulk-load a tree from boxes with the default node capacity,
    /// preserving the input order as the index space.
    ///
    /// ## Errors
    ///
    /// - [`InvalidBox`][crate::PlaneIndexError::InvalidBox] when an input
    ///   box has max < min on an axis.
    pub fn build(boxes: Vec<BBox<N>>) -> Result<Self> {
        Self::build_with_node_capacity(boxes, DEFAULT_NODE_CAPACITY)
    }

    /// Bulk-load a tree from boxes, bounding the fan-out of every node by
    /// `node_capacity`.
    ///
    /// ## Errors
    ///
    /// - [`InvalidCapacity`][crate::PlaneIndexError::InvalidCapacity] when
    ///   `node_capacity < 2`.
    /// - [`InvalidBox`][crate::PlaneIndexError::InvalidBox] when an input
    ///   box has max < min on an axis.
    pub fn build_with_node_capacity(boxes: Vec<BBox<N>>, node_capacity: usize) -> Result<Self> {
        let mut builder = RTreeBuilder::new_with_node_capacity(node_capacity)?;
        builder.reserve(boxes.len());
        for bbox in &boxes {
            builder.add_box(*bbox)?;
        }
        Ok(builder.finish())
    }

    pub(crate) fn from_parts(boxes: Vec<BBox<N>>, node_capacity: usize) -> Self {
        let (nodes, children, root) = pack(&boxes, node_capacity);
        Self {
            boxes,
            nodes,
            children,
            root,
            node_capacity,
        }
    }

    /// The indexed boxes, in insertion order.
    pub fn boxes(&self) -> &[BBox<N>] {
        &self.boxes
    }

    /// The number of indexed boxes.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// The maximum number of children of any node.
    pub fn node_capacity(&self) -> usize {
        self.node_capacity
    }

    pub(crate) fn children_of(&self, children_start: u32, children_len: u32) -> &[u32] {
        let start = children_start as usize;
        &self.children[start..start + children_len as usize]
    }
}
