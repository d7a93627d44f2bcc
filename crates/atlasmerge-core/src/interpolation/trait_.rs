//! Interpolator trait.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// Samples a volume at continuous voxel indices.
///
/// # Type Parameters
/// * `B` - The Burn backend
pub trait Interpolator<B: Backend> {
    /// Sample `data` (`[Z, Y, X]`) at `indices` (`[N, 3]`, columns `x, y, z`).
    ///
    /// Returns the `N` sampled values.
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}
