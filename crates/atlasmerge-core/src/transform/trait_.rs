//! Transform trait for mapping physical points between spaces.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// Maps points from output physical space into input physical space.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `D` - The spatial dimensionality
pub trait Transform<B: Backend, const D: usize> {
    /// Apply the transform to a batch of points `[N, D]`.
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2>;
}
