//! Spatial transforms applied while resampling.

pub mod trait_;
pub mod identity;

pub use trait_::Transform;
pub use identity::IdentityTransform;
