//! Identity transform.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use super::trait_::Transform;

/// Leaves points where they are.
///
/// Atlases distributed in a common template space (MNI152 and friends) only
/// differ from the reference by their voxel grid, so resampling them needs
/// no spatial transform beyond the grid mapping itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl<B: Backend, const D: usize> Transform<B, D> for IdentityTransform {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        points
    }
}
