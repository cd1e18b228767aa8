use geo_traits::CoordTrait;

use crate::geometry::Point;
use crate::kdtree::index::{KdNode, KdTree, NIL};
use crate::scalar::Scalar;

/// A builder to create a [`KdTree`] point by point.
///
/// ```
/// use plane_index::kdtree::KdTreeBuilder;
///
/// let mut builder = KdTreeBuilder::new();
/// builder.add(0., 0.);
/// builder.add(1., 1.);
/// builder.add(2., 2.);
/// let tree = builder.finish();
/// assert_eq!(tree.len(), 3);
/// ```
#[derive(Debug)]
pub struct KdTreeBuilder<N: Scalar> {
    points: Vec<Point<N>>,
}

impl<N: Scalar> Default for KdTreeBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Scalar> KdTreeBuilder<N> {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new builder with room for the provided number of points.
    pub fn with_capacity(num_items: usize) -> Self {
        Self {
            points: Vec::with_capacity(num_items),
        }
    }

    /// Add a point to the index.
    ///
    /// This returns a positional index that provides a lookup back into the
    /// original data.
    #[inline]
    pub fn add(&mut self, x: N, y: N) -> usize {
        self.add_point(Point::new(x, y))
    }

    /// Add a point to the index.
    #[inline]
    pub fn add_point(&mut self, point: Point<N>) -> usize {
        let index = self.points.len();
        self.points.push(point);
        index
    }

    /// Add a coord to the index.
    #[inline]
    pub fn add_coord(&mut self, coord: &impl CoordTrait<T = N>) -> usize {
        self.add_point(Point::from_coord(coord))
    }

    /// Consume this builder, performing the median sort and generating a
    /// [`KdTree`] ready for queries.
    pub fn finish(self) -> KdTree<N> {
        KdTree::build(self.points)
    }
}

/// Build the node arena over `points`.
///
/// Median splits on alternating axes, driven by an explicit work stack so
/// deep trees cannot exhaust the call stack. Each range's median is selected
/// by the axis coordinate with ties broken by original index, which makes
/// the arena a pure function of the input sequence.
pub(crate) fn build_nodes<N: Scalar>(points: &[Point<N>]) -> (Vec<KdNode>, u32) {
    if points.is_empty() {
        return (Vec::new(), NIL);
    }

    let mut order: Vec<u32> = (0..points.len() as u32).collect();
    let mut nodes: Vec<KdNode> = Vec::with_capacity(points.len());
    let mut root = NIL;

    // (start, end, axis, parent slot, parent's left side) over `order`
    let mut stack: Vec<(usize, usize, u8, u32, bool)> = Vec::new();
    stack.push((0, points.len(), 0, NIL, false));

    while let Some((start, end, axis, parent, is_left)) = stack.pop() {
        if start == end {
            continue;
        }

        let mid = start + (end - start - 1) / 2;
        order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            let ca = points[a as usize].coord(axis);
            let cb = points[b as usize].coord(axis);
            // We don't allow NaN. This should only panic on NaN
            ca.partial_cmp(&cb).unwrap().then_with(|| a.cmp(&b))
        });

        let slot = nodes.len() as u32;
        nodes.push(KdNode {
            item: order[mid],
            left: NIL,
            right: NIL,
        });
        if parent == NIL {
            root = slot;
        } else if is_left {
            nodes[parent as usize].left = slot;
        } else {
            nodes[parent as usize].right = slot;
        }

        let child_axis = 1 - axis;
        stack.push((start, mid, child_axis, slot, true));
        stack.push((mid + 1, end, child_axis, slot, false));
    }

    (nodes, root)
}
