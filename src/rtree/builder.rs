use geo_traits::RectTrait;

use crate::error::{PlaneIndexError, Result};
use crate::geometry::BBox;
use crate::rtree::index::{NodeKind, RTree, RTreeNode, NIL};
use crate::scalar::Scalar;

/// Default node capacity in [`RTreeBuilder::new`].
pub const DEFAULT_NODE_CAPACITY: usize = 16;

/// A builder to create an [`RTree`] box by box.
///
/// ```
/// use plane_index::rtree::RTreeBuilder;
///
/// let mut builder = RTreeBuilder::new();
/// builder.add(0., 0., 2., 2.).unwrap();
/// builder.add(1., 1., 3., 3.).unwrap();
/// let tree = builder.finish();
/// assert_eq!(tree.len(), 2);
/// ```
#[derive(Debug)]
pub struct RTreeBuilder<N: Scalar> {
    boxes: Vec<BBox<N>>,
    node_capacity: usize,
}

impl<N: Scalar> Default for RTreeBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Scalar> RTreeBuilder<N> {
    /// Create a new builder with the default node capacity.
    pub fn new() -> Self {
        Self {
            boxes: Vec::new(),
            node_capacity: DEFAULT_NODE_CAPACITY,
        }
    }

    /// Create a new builder with the provided node capacity.
    ///
    /// ## Errors
    ///
    /// - [`InvalidCapacity`][PlaneIndexError::InvalidCapacity] when
    ///   `node_capacity < 2`.
    pub fn new_with_node_capacity(node_capacity: usize) -> Result<Self> {
        if node_capacity < 2 {
            return Err(PlaneIndexError::InvalidCapacity(node_capacity));
        }
        Ok(Self {
            boxes: Vec::new(),
            node_capacity,
        })
    }

    /// Reserve room for at least `additional` more boxes.
    pub fn reserve(&mut self, additional: usize) {
        self.boxes.reserve(additional);
    }

    /// Add a given rectangle to the index.
    ///
    /// This returns a positional index that provides a lookup back into the
    /// original data.
    ///
    /// ## Errors
    ///
    /// - [`InvalidBox`][PlaneIndexError::InvalidBox] when max < min on an
    ///   axis.
    #[inline]
    pub fn add(&mut self, min_x: N, min_y: N, max_x: N, max_y: N) -> Result<usize> {
        self.add_box(BBox::new(min_x, min_y, max_x, max_y))
    }

    /// Add a box to the index.
    #[inline]
    pub fn add_box(&mut self, bbox: BBox<N>) -> Result<usize> {
        bbox.validate()?;
        let index = self.boxes.len();
        self.boxes.push(bbox);
        Ok(index)
    }

    /// Add a rect to the index.
    #[inline]
    pub fn add_rect(&mut self, rect: &impl RectTrait<T = N>) -> Result<usize> {
        self.add_box(BBox::from_rect(rect))
    }

    /// Consume this builder, performing the sort-tile-recursive packing and
    /// generating an [`RTree`] ready for queries.
    pub fn finish(self) -> RTree<N> {
        RTree::from_parts(self.boxes, self.node_capacity)
    }
}

/// Pack `boxes` into a node arena bottom-up.
///
/// One leaf per box, in insertion order. While a level holds more than
/// `node_capacity` nodes it is sorted by x-center, cut into `⌈√P⌉` vertical
/// slabs (`P` parents pending), each slab sorted by y-center, and packed
/// into parents of `node_capacity` consecutive nodes; the last group of a
/// slab may be smaller. The survivors become the children of a single root.
///
/// The implementation is derived from [this
/// paper](https://ia600900.us.archive.org/27/items/nasa_techdoc_19970016975/19970016975.pdf).
pub(crate) fn pack<N: Scalar>(
    boxes: &[BBox<N>],
    node_capacity: usize,
) -> (Vec<RTreeNode<N>>, Vec<u32>, u32) {
    let num_items = boxes.len();
    if num_items == 0 {
        return (Vec::new(), Vec::new(), NIL);
    }

    // geometric series bound on the total node count across all levels
    let mut nodes: Vec<RTreeNode<N>> =
        Vec::with_capacity(num_items + num_items / (node_capacity - 1) + 2);
    for (index, bbox) in boxes.iter().enumerate() {
        nodes.push(RTreeNode {
            bbox: *bbox,
            kind: NodeKind::Leaf {
                item: index as u32,
            },
        });
    }

    let mut children: Vec<u32> = Vec::new();
    let mut level: Vec<u32> = (0..num_items as u32).collect();

    while level.len() > node_capacity {
        let parent_count = level.len().div_ceil(node_capacity);
        let slab_count = (parent_count as f64).sqrt().ceil() as usize;
        let slab_size = level.len().div_ceil(slab_count);

        sort_by_center(&mut level, &nodes, 0);

        let mut next_level = Vec::with_capacity(parent_count);
        for slab in level.chunks_mut(slab_size) {
            sort_by_center(slab, &nodes, 1);
            for group in slab.chunks(node_capacity) {
                next_level.push(make_parent(&mut nodes, &mut children, group));
            }
        }
        level = next_level;
    }

    let root = if level.len() == 1 {
        level[0]
    } else {
        make_parent(&mut nodes, &mut children, &level)
    };
    (nodes, children, root)
}

/// Sort a level slice by the bbox center on the given axis, ties by arena
/// index so packing is a pure function of the input sequence.
fn sort_by_center<N: Scalar>(level: &mut [u32], nodes: &[RTreeNode<N>], axis: u8) {
    let two = N::one() + N::one();
    level.sort_unstable_by(|&a, &b| {
        let bbox_a = &nodes[a as usize].bbox;
        let bbox_b = &nodes[b as usize].bbox;
        let center_a = (bbox_a.min_coord(axis) + bbox_a.max_coord(axis)) / two;
        let center_b = (bbox_b.min_coord(axis) + bbox_b.max_coord(axis)) / two;
        // We don't allow NaN. This should only panic on NaN
        center_a
            .partial_cmp(&center_b)
            .unwrap()
            .then_with(|| a.cmp(&b))
    });
}

/// Append a parent covering `group` to the arena and return its slot.
fn make_parent<N: Scalar>(
    nodes: &mut Vec<RTreeNode<N>>,
    children: &mut Vec<u32>,
    group: &[u32],
) -> u32 {
    let children_start = children.len() as u32;
    children.extend_from_slice(group);

    let mut bbox = nodes[group[0] as usize].bbox;
    for &child in &group[1..] {
        bbox = bbox.merge(&nodes[child as usize].bbox);
    }

    let slot = nodes.len() as u32;
    nodes.push(RTreeNode {
        bbox,
        kind: NodeKind::Internal {
            children_start,
            children_len: group.len() as u32,
        },
    });
    slot
}
