//! An immutable, bulk-loaded k-d tree over points.
//!
//! ## Creation
//!
//! Use [`KdTree::build`] with the full input sequence, or a [`KdTreeBuilder`]
//! when points arrive one at a time. The position of a point in the input is
//! its index; every query reports items, indices, or both.
//!
//! ## Search
//!
//! [`KdTree::nearest_index`] and [`KdTree::n_nearest_indices`] answer exact
//! nearest-neighbor queries in ascending distance order, ties broken by the
//! lower insertion index. [`KdTree::find_box_indices`] reports the points
//! inside a closed query box and [`KdTree::find_ball_indices`] the points
//! within a radius of a center.
//!
//! ## Example
//!
//! ```
//! use plane_index::geometry::{BBox, Point};
//! use plane_index::kdtree::KdTree;
//!
//! let tree = KdTree::build(vec![
//!     Point::new(0., 0.),
//!     Point::new(1., 1.),
//!     Point::new(2., 2.),
//! ]);
//!
//! assert_eq!(tree.nearest_index(&Point::new(1.2, 0.9)).unwrap(), 1);
//! assert_eq!(
//!     tree.find_box_indices(&BBox::new(0.5, 0.5, 2.5, 2.5)).unwrap(),
//!     vec![1, 2]
//! );
//! ```

mod builder;
mod index;
mod query;

pub use builder::KdTreeBuilder;
pub use index::KdTree;
