use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::{PlaneIndexError, Result};
use crate::geometry::{BBox, Point};
use crate::heap::{Candidate, CandidateHeap};
use crate::rtree::index::{NodeKind, RTree};
use crate::scalar::Scalar;

/// A node on the search frontier together with the distance from the query
/// point to its bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NodeDistance<N: Scalar> {
    bound: N,
    node: u32,
}

impl<N: Scalar> Eq for NodeDistance<N> {}

impl<N: Scalar> Ord for NodeDistance<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // We don't allow NaN. This should only panic on NaN
        self.bound
            .partial_cmp(&other.bound)
            .unwrap()
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl<N: Scalar> PartialOrd for NodeDistance<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N: Scalar> RTree<N> {
    /// Search for the index of the box nearest to `target`.
    ///
    /// Distance to a box is the squared distance to its closest point; zero
    /// when the target lies inside. Ties are broken by the lower insertion
    /// index.
    ///
    /// ```
    /// use plane_index::geometry::{BBox, Point};
    /// use plane_index::rtree::RTree;
    ///
    /// let boxes = (0..10).map(|i| {
    ///     let i = i as f64;
    ///     BBox::new(3. * i, 0., 3. * i + 2., 2.)
    /// });
    /// let tree = RTree::build(boxes.collect()).unwrap();
    /// assert_eq!(tree.nearest_index(&Point::new(7., 1.)).unwrap(), 2);
    /// ```
    pub fn nearest_index(&self, target: &Point<N>) -> Result<usize> {
        Ok(self.nearest_item(target)?.0)
    }

    /// Search for the box nearest to `target`.
    pub fn nearest_box(&self, target: &Point<N>) -> Result<BBox<N>> {
        Ok(self.nearest_item(target)?.1)
    }

    /// Search for the index and box nearest to `target`.
    pub fn nearest_item(&self, target: &Point<N>) -> Result<(usize, BBox<N>)> {
        if self.boxes.is_empty() {
            return Err(PlaneIndexError::EmptyTree);
        }
        let best = self.k_nearest(1, target);
        let candidate = best[0];
        Ok((candidate.index as usize, self.boxes[candidate.index as usize]))
    }

    /// Search for the indices of the `k` boxes nearest to `target`, in
    /// ascending distance order with ties broken by insertion index.
    ///
    /// When `k` exceeds the number of indexed boxes, all of them are
    /// returned.
    pub fn n_nearest_indices(&self, k: usize, target: &Point<N>) -> Result<Vec<usize>> {
        Ok(self
            .n_nearest(k, target)?
            .iter()
            .map(|candidate| candidate.index as usize)
            .collect())
    }

    /// Search for the `k` boxes nearest to `target`, in ascending distance
    /// order with ties broken by insertion index.
    pub fn n_nearest_boxes(&self, k: usize, target: &Point<N>) -> Result<Vec<BBox<N>>> {
        Ok(self
            .n_nearest(k, target)?
            .iter()
            .map(|candidate| self.boxes[candidate.index as usize])
            .collect())
    }

    /// Search for the indices and boxes of the `k` boxes nearest to
    /// `target`, in ascending distance order with ties broken by insertion
    /// index.
    pub fn n_nearest_items(&self, k: usize, target: &Point<N>) -> Result<Vec<(usize, BBox<N>)>> {
        Ok(self
            .n_nearest(k, target)?
            .iter()
            .map(|candidate| {
                (
                    candidate.index as usize,
                    self.boxes[candidate.index as usize],
                )
            })
            .collect())
    }

    fn n_nearest(&self, k: usize, target: &Point<N>) -> Result<Vec<Candidate<N>>> {
        if k == 0 {
            return Err(PlaneIndexError::InvalidNeighborCount);
        }
        if self.boxes.is_empty() {
            return Err(PlaneIndexError::EmptyTree);
        }
        Ok(self.k_nearest(k.min(self.boxes.len()), target))
    }

    /// Best-first branch-and-bound, the same engine as the k-d tree with
    /// node bounds supplied by box distances. A leaf's bound is the exact
    /// distance to its box, so popping a leaf feeds the accumulator
    /// directly.
    fn k_nearest(&self, k: usize, target: &Point<N>) -> Vec<Candidate<N>> {
        let mut best = CandidateHeap::new(k);
        let mut frontier = BinaryHeap::new();
        frontier.push(Reverse(NodeDistance {
            bound: self.nodes[self.root as usize].bbox.sq_dist_to_point(target),
            node: self.root,
        }));

        while let Some(Reverse(entry)) = frontier.pop() {
            if !best.accepts_bound(entry.bound) {
                break;
            }

            let node = &self.nodes[entry.node as usize];
            match node.kind {
                NodeKind::Leaf { item } => best.push(entry.bound, item),
                NodeKind::Internal {
                    children_start,
                    children_len,
                } => {
                    for &child in self.children_of(children_start, children_len) {
                        let bound = self.nodes[child as usize].bbox.sq_dist_to_point(target);
                        if best.accepts_bound(bound) {
                            frontier.push(Reverse(NodeDistance { bound, node: child }));
                        }
                    }
                }
            }
        }

        best.into_ascending()
    }

    /// Search for the indices of the boxes contained in the query box, in
    /// traversal order.
    ///
    /// ```
    /// use plane_index::geometry::BBox;
    /// use plane_index::rtree::RTree;
    ///
    /// let boxes = (1..=10).map(|i| {
    ///     let i = i as f64;
    ///     BBox::new(-i, 0., i, i)
    /// });
    /// let tree = RTree::build(boxes.collect()).unwrap();
    /// let mut found = tree.find_subsets_indices(&BBox::new(-3., 0., 3., 3.)).unwrap();
    /// found.sort();
    /// assert_eq!(found, vec![0, 1, 2]);
    /// ```
    pub fn find_subsets_indices(&self, query: &BBox<N>) -> Result<Vec<usize>> {
        Ok(self
            .find_subsets_items(query)?
            .iter()
            .map(|(index, _)| *index)
            .collect())
    }

    /// Search for the boxes contained in the query box, in traversal order.
    pub fn find_subsets(&self, query: &BBox<N>) -> Result<Vec<BBox<N>>> {
        Ok(self
            .find_subsets_items(query)?
            .iter()
            .map(|(_, bbox)| *bbox)
            .collect())
    }

    /// Search for the indices and boxes contained in the query box, in
    /// traversal order.
    pub fn find_subsets_items(&self, query: &BBox<N>) -> Result<Vec<(usize, BBox<N>)>> {
        query.validate()?;
        if self.boxes.is_empty() {
            return Err(PlaneIndexError::EmptyTree);
        }

        let mut result = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index as usize];
            if query.contains(&node.bbox) {
                // every descendant leaf qualifies, no further checks
                self.collect_leaves(node_index, &mut result);
            } else if let NodeKind::Internal {
                children_start,
                children_len,
            } = node.kind
            {
                if query.intersects(&node.bbox) {
                    stack.extend_from_slice(self.children_of(children_start, children_len));
                }
            }
        }
        Ok(result)
    }

    /// Search for the indices of the boxes containing the query box, in
    /// traversal order.
    pub fn find_supersets_indices(&self, query: &BBox<N>) -> Result<Vec<usize>> {
        Ok(self
            .find_supersets_items(query)?
            .iter()
            .map(|(index, _)| *index)
            .collect())
    }

    /// Search for the boxes containing the query box, in traversal order.
    pub fn find_supersets(&self, query: &BBox<N>) -> Result<Vec<BBox<N>>> {
        Ok(self
            .find_supersets_items(query)?
            .iter()
            .map(|(_, bbox)| *bbox)
            .collect())
    }

    /// Search for the indices and boxes containing the query box, in
    /// traversal order.
    pub fn find_supersets_items(&self, query: &BBox<N>) -> Result<Vec<(usize, BBox<N>)>> {
        query.validate()?;
        if self.boxes.is_empty() {
            return Err(PlaneIndexError::EmptyTree);
        }

        let mut result = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index as usize];
            // a superset leaf only lives under nodes that already cover the
            // query box
            if !node.bbox.contains(query) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { item } => {
                    result.push((item as usize, self.boxes[item as usize]));
                }
                NodeKind::Internal {
                    children_start,
                    children_len,
                } => {
                    stack.extend_from_slice(self.children_of(children_start, children_len));
                }
            }
        }
        Ok(result)
    }

    /// Search for the indices of the boxes intersecting the query box, in
    /// traversal order.
    pub fn find_box_indices(&self, query: &BBox<N>) -> Result<Vec<usize>> {
        Ok(self
            .find_box_items(query)?
            .iter()
            .map(|(index, _)| *index)
            .collect())
    }

    /// Search for the boxes intersecting the query box, in traversal order.
    pub fn find_box_boxes(&self, query: &BBox<N>) -> Result<Vec<BBox<N>>> {
        Ok(self
            .find_box_items(query)?
            .iter()
            .map(|(_, bbox)| *bbox)
            .collect())
    }

    /// Search for the indices and boxes intersecting the query box, in
    /// traversal order. Boxes are closed, so touching edges intersect.
    pub fn find_box_items(&self, query: &BBox<N>) -> Result<Vec<(usize, BBox<N>)>> {
        query.validate()?;
        if self.boxes.is_empty() {
            return Err(PlaneIndexError::EmptyTree);
        }

        let mut result = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index as usize];
            if !node.bbox.intersects(query) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { item } => {
                    result.push((item as usize, self.boxes[item as usize]));
                }
                NodeKind::Internal {
                    children_start,
                    children_len,
                } => {
                    stack.extend_from_slice(self.children_of(children_start, children_len));
                }
            }
        }
        Ok(result)
    }

    /// Push every leaf item under `node_index` onto `result`.
    fn collect_leaves(&self, node_index: u32, result: &mut Vec<(usize, BBox<N>)>) {
        let mut stack = vec![node_index];
        while let Some(node_index) = stack.pop() {
            match self.nodes[node_index as usize].kind {
                NodeKind::Leaf { item } => {
                    result.push((item as usize, self.boxes[item as usize]));
                }
                NodeKind::Internal {
                    children_start,
                    children_len,
                } => {
                    stack.extend_from_slice(self.children_of(children_start, children_len));
                }
            }
        }
    }
}
