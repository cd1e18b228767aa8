use std::fmt::Debug;

use num_traits::{Num, NumCast};

/// Coordinate types usable in the indexes of this crate.
///
/// Distances are kept in the same type as the coordinates (squared, never
/// rooted), so comparisons between distances and coordinates stay exact for
/// integer scalars.
pub trait Scalar: Num + NumCast + PartialOrd + Copy + Debug + Send + Sync {}

impl Scalar for i8 {}
impl Scalar for u8 {}
impl Scalar for i16 {}
impl Scalar for u16 {}
impl Scalar for i32 {}
impl Scalar for u32 {}
impl Scalar for i64 {}
impl Scalar for u64 {}
impl Scalar for f32 {}
impl Scalar for f64 {}
