use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tinyvec::TinyVec;

use crate::error::{PlaneIndexError, Result};
use crate::geometry::{abs_diff, BBox, Point};
use crate::heap::{Candidate, CandidateHeap};
use crate::kdtree::index::{KdTree, NIL};
use crate::scalar::Scalar;

/// A subtree on the search frontier together with a lower bound on the
/// distance from the query point to any point it contains.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SubtreeBound<N: Scalar> {
    bound: N,
    node: u32,
    axis: u8,
}

impl<N: Scalar> Eq for SubtreeBound<N> {}

impl<N: Scalar> Ord for SubtreeBound<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // We don't allow NaN. This should only panic on NaN
        self.bound
            .partial_cmp(&other.bound)
            .unwrap()
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl<N: Scalar> PartialOrd for SubtreeBound<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N: Scalar> KdTree<N> {
    /// Search for the index of the point nearest to `target`.
    ///
    /// Ties are broken by the lower insertion index.
    ///
    /// ```
    /// use plane_index::geometry::Point;
    /// use plane_index::kdtree::KdTree;
    ///
    /// let points = (0..10).map(|i| Point::new(i as f64, 0.)).collect();
    /// let tree = KdTree::build(points);
    /// assert_eq!(tree.nearest_index(&Point::new(3.4, 1.)).unwrap(), 3);
    /// ```
    pub fn nearest_index(&self, target: &Point<N>) -> Result<usize> {
        Ok(self.nearest_item(target)?.0)
    }

    /// Search for the point nearest to `target`.
    pub fn nearest_point(&self, target: &Point<N>) -> Result<Point<N>> {
        Ok(self.nearest_item(target)?.1)
    }

    /// Search for the index and point nearest to `target`.
    pub fn nearest_item(&self, target: &Point<N>) -> Result<(usize, Point<N>)> {
        if self.points.is_empty() {
            return Err(PlaneIndexError::EmptyTree);
        }
        let best = self.k_nearest(1, target);
        let candidate = best[0];
        Ok((candidate.index as usize, self.points[candidate.index as usize]))
    }

    /// Search for the indices of the `k` points nearest to `target`, in
    /// ascending distance order with ties broken by insertion index.
    ///
    /// When `k` exceeds the number of indexed points, all of them are
    /// returned.
    pub fn n_nearest_indices(&self, k: usize, target: &Point<N>) -> Result<Vec<usize>> {
        Ok(self
            .n_nearest(k, target)?
            .iter()
            .map(|candidate| candidate.index as usize)
            .collect())
    }

    /// Search for the `k` points nearest to `target`, in ascending distance
    /// order with ties broken by insertion index.
    pub fn n_nearest_points(&self, k: usize, target: &Point<N>) -> Result<Vec<Point<N>>> {
        Ok(self
            .n_nearest(k, target)?
            .iter()
            .map(|candidate| self.points[candidate.index as usize])
            .collect())
    }

    /// Search for the indices and points of the `k` points nearest to
    /// `target`, in ascending distance order with ties broken by insertion
    /// index.
    pub fn n_nearest_items(&self, k: usize, target: &Point<N>) -> Result<Vec<(usize, Point<N>)>> {
        Ok(self
            .n_nearest(k, target)?
            .iter()
            .map(|candidate| {
                (
                    candidate.index as usize,
                    self.points[candidate.index as usize],
                )
            })
            .collect())
    }

    fn n_nearest(&self, k: usize, target: &Point<N>) -> Result<Vec<Candidate<N>>> {
        if k == 0 {
            return Err(PlaneIndexError::InvalidNeighborCount);
        }
        if self.points.is_empty() {
            return Err(PlaneIndexError::EmptyTree);
        }
        Ok(self.k_nearest(k.min(self.points.len()), target))
    }

    /// Best-first branch-and-bound over the node arena.
    ///
    /// The frontier is a min-heap of subtrees keyed by their distance lower
    /// bound; the accumulator keeps the `k` best items seen so far. Once the
    /// accumulator is full and the cheapest frontier bound exceeds the worst
    /// accepted distance, no unexplored subtree can improve the result. An
    /// equal bound must still be explored: it may hold an equally distant
    /// item with a lower insertion index.
    fn k_nearest(&self, k: usize, target: &Point<N>) -> Vec<Candidate<N>> {
        let mut best = CandidateHeap::new(k);
        let mut frontier = BinaryHeap::new();
        frontier.push(Reverse(SubtreeBound {
            bound: N::zero(),
            node: self.root,
            axis: 0,
        }));

        while let Some(Reverse(entry)) = frontier.pop() {
            if !best.accepts_bound(entry.bound) {
                break;
            }

            let node = self.nodes[entry.node as usize];
            let point = self.points[node.item as usize];
            best.push(target.sq_dist(&point), node.item);

            let split = point.coord(entry.axis);
            let coordinate = target.coord(entry.axis);
            let planar = abs_diff(coordinate, split);
            let planar_sq = planar * planar;
            let far_bound = if planar_sq < entry.bound {
                entry.bound
            } else {
                planar_sq
            };

            // the child on the target's side of the splitting plane keeps
            // the parent bound; the far child is bounded by the plane
            let (left_bound, right_bound) = if coordinate < split {
                (entry.bound, far_bound)
            } else if split < coordinate {
                (far_bound, entry.bound)
            } else {
                (entry.bound, entry.bound)
            };

            let child_axis = 1 - entry.axis;
            if node.left != NIL && best.accepts_bound(left_bound) {
                frontier.push(Reverse(SubtreeBound {
                    bound: left_bound,
                    node: node.left,
                    axis: child_axis,
                }));
            }
            if node.right != NIL && best.accepts_bound(right_bound) {
                frontier.push(Reverse(SubtreeBound {
                    bound: right_bound,
                    node: node.right,
                    axis: child_axis,
                }));
            }
        }

        best.into_ascending()
    }

    /// Search for the indices of the points inside the closed query box, in
    /// traversal order.
    ///
    /// ```
    /// use plane_index::geometry::{BBox, Point};
    /// use plane_index::kdtree::KdTree;
    ///
    /// let points = (0..10).map(|i| Point::new(i as f64, i as f64)).collect();
    /// let tree = KdTree::build(points);
    /// let mut found = tree.find_box_indices(&BBox::new(2., 0., 5., 10.)).unwrap();
    /// found.sort();
    /// assert_eq!(found, vec![2, 3, 4, 5]);
    /// ```
    pub fn find_box_indices(&self, query: &BBox<N>) -> Result<Vec<usize>> {
        Ok(self
            .find_box_items(query)?
            .iter()
            .map(|(index, _)| *index)
            .collect())
    }

    /// Search for the points inside the closed query box, in traversal
    /// order.
    pub fn find_box_points(&self, query: &BBox<N>) -> Result<Vec<Point<N>>> {
        Ok(self
            .find_box_items(query)?
            .iter()
            .map(|(_, point)| *point)
            .collect())
    }

    /// Search for the indices and points inside the closed query box, in
    /// traversal order.
    pub fn find_box_items(&self, query: &BBox<N>) -> Result<Vec<(usize, Point<N>)>> {
        query.validate()?;
        if self.points.is_empty() {
            return Err(PlaneIndexError::EmptyTree);
        }

        let mut result = Vec::new();
        let mut stack: TinyVec<[(u32, u8); 32]> = TinyVec::new();
        stack.push((self.root, 0));

        while let Some((node_index, axis)) = stack.pop() {
            let node = self.nodes[node_index as usize];
            let point = self.points[node.item as usize];
            if query.contains_point(&point) {
                result.push((node.item as usize, point));
            }

            // prune subtrees whose half-plane cannot meet the query
            let split = point.coord(axis);
            let child_axis = 1 - axis;
            if node.left != NIL && query.min_coord(axis) <= split {
                stack.push((node.left, child_axis));
            }
            if node.right != NIL && split <= query.max_coord(axis) {
                stack.push((node.right, child_axis));
            }
        }

        Ok(result)
    }

    /// Search for the indices of the points within `radius` of `center`, in
    /// traversal order.
    pub fn find_ball_indices(&self, center: &Point<N>, radius: N) -> Result<Vec<usize>> {
        Ok(self
            .find_ball_items(center, radius)?
            .iter()
            .map(|(index, _)| *index)
            .collect())
    }

    /// Search for the points within `radius` of `center`, in traversal
    /// order.
    pub fn find_ball_points(&self, center: &Point<N>, radius: N) -> Result<Vec<Point<N>>> {
        Ok(self
            .find_ball_items(center, radius)?
            .iter()
            .map(|(_, point)| *point)
            .collect())
    }

    /// Search for the indices and points within `radius` of `center`, in
    /// traversal order.
    ///
    /// Membership compares squared distances against `radius * radius`, so
    /// the boundary of the ball is included.
    pub fn find_ball_items(&self, center: &Point<N>, radius: N) -> Result<Vec<(usize, Point<N>)>> {
        if radius < N::zero() {
            return Err(PlaneIndexError::InvalidRadius);
        }
        if self.points.is_empty() {
            return Err(PlaneIndexError::EmptyTree);
        }

        let radius_sq = radius * radius;
        let mut result = Vec::new();
        let mut stack: TinyVec<[(u32, u8); 32]> = TinyVec::new();
        stack.push((self.root, 0));

        while let Some((node_index, axis)) = stack.pop() {
            let node = self.nodes[node_index as usize];
            let point = self.points[node.item as usize];
            if center.sq_dist(&point) <= radius_sq {
                result.push((node.item as usize, point));
            }

            // the far side is reachable only when the splitting plane is
            // within the radius
            let split = point.coord(axis);
            let coordinate = center.coord(axis);
            let planar = abs_diff(coordinate, split);
            let planar_sq = planar * planar;
            let child_axis = 1 - axis;
            if node.left != NIL && (coordinate <= split || planar_sq <= radius_sq) {
                stack.push((node.left, child_axis));
            }
            if node.right != NIL && (split <= coordinate || planar_sq <= radius_sq) {
                stack.push((node.right, child_axis));
            }
        }

        Ok(result)
    }
}
