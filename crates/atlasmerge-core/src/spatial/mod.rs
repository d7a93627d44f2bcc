//! Spatial types describing where voxels sit in physical space.
//!
//! Metadata is always expressed in `(x, y, z)` order, the order of the
//! NIfTI voxel axes, even though image tensors are stored `[Z, Y, X]`.

pub mod point;
pub mod vector;
pub mod spacing;
pub mod direction;

pub use point::Point;
pub use vector::Vector;
pub use spacing::Spacing;
pub use direction::Direction;

pub type Point3 = Point<3>;
pub type Vector3 = Vector<3>;
pub type Spacing3 = Spacing<3>;
pub type Direction3 = Direction<3>;
