//! Immutable, bulk-loaded spatial indexes for the 2D plane.
//!
//! This crate provides two index structures over a finite input sequence:
//!
//! - [`KdTree`][kdtree::KdTree]: a balanced k-d tree over points, built by
//!   median splits on alternating axes.
//! - [`RTree`][rtree::RTree]: a packed R-tree over axis-aligned boxes, built
//!   by sort-tile-recursive (STR) bulk loading.
//!
//! Both are constructed once from the full input and never mutated. Queries
//! return the original items or their positions in the input sequence, and
//! are safe to run from any number of threads sharing the same tree.
//!
//! ## Example
//!
//! ```
//! use plane_index::geometry::{BBox, Point};
//! use plane_index::kdtree::KdTree;
//! use plane_index::rtree::RTree;
//!
//! let points = (0..20).map(|i| Point::new(-10. + i as f64, i as f64));
//! let tree = KdTree::build(points.collect());
//! assert_eq!(tree.nearest_index(&Point::new(0., 0.)).unwrap(), 5);
//!
//! let boxes = vec![
//!     BBox::new(0., 0., 2., 2.),
//!     BBox::new(1., 1., 3., 3.),
//!     BBox::new(5., 5., 6., 6.),
//! ];
//! let tree = RTree::build(boxes).unwrap();
//! assert_eq!(tree.nearest_index(&Point::new(4., 4.)).unwrap(), 1);
//! ```
//!
//! ## Coordinate types
//!
//! Both trees are generic over the coordinate type via [`Scalar`]. Float
//! `NaN` is not supported and may panic.

pub mod error;
pub mod geometry;
mod heap;
pub mod kdtree;
pub mod rtree;
mod scalar;

pub use error::{PlaneIndexError, Result};
pub use geometry::{BBox, Point};
pub use scalar::Scalar;
