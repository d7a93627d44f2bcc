//! Sampling volumes at continuous voxel indices.
//!
//! Only nearest-neighbour sampling is offered: label data must never be
//! blended into values that name no parcel.

pub mod trait_;
pub mod nearest;

pub use trait_::Interpolator;
pub use nearest::NearestNeighborInterpolator;
