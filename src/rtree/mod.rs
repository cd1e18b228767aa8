//! An immutable, bulk-loaded R-tree over axis-aligned boxes.
//!
//! ## Creation
//!
//! Use [`RTree::build`] with the full input sequence, or an [`RTreeBuilder`]
//! when boxes arrive one at a time. Packing is sort-tile-recursive: each
//! level is sorted by x-center, cut into vertical slabs, sorted by y-center
//! within a slab, and grouped into parents of at most `node_capacity`
//! children.
//!
//! ## Search
//!
//! [`RTree::nearest_index`] and [`RTree::n_nearest_indices`] rank boxes by
//! their squared distance to a query point. [`RTree::find_box_indices`]
//! reports the boxes intersecting a query box, and
//! [`RTree::find_subsets_indices`]/[`RTree::find_supersets_indices`] the
//! boxes contained in, respectively containing, the query box.
//!
//! ## Example
//!
//! ```
//! use plane_index::geometry::{BBox, Point};
//! use plane_index::rtree::RTree;
//!
//! let tree = RTree::build(vec![
//!     BBox::new(0., 0., 2., 2.),
//!     BBox::new(1., 1., 3., 3.),
//!     BBox::new(5., 5., 6., 6.),
//! ])
//! .unwrap();
//!
//! assert_eq!(tree.nearest_index(&Point::new(4., 4.)).unwrap(), 1);
//! let mut hits = tree.find_box_indices(&BBox::new(2., 2., 5., 5.)).unwrap();
//! hits.sort();
//! assert_eq!(hits, vec![0, 1, 2]);
//! ```

mod builder;
mod index;
mod query;

pub use builder::{RTreeBuilder, DEFAULT_NODE_CAPACITY};
pub use index::RTree;

#[cfg(test)]
mod test;
