//! Nearest-neighbour interpolation.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use super::trait_::Interpolator;

/// Nearest-neighbour interpolator.
///
/// Rounds each continuous index to the closest voxel. Indices outside the
/// volume are clamped onto its boundary, so sampling beyond the field of view
/// repeats the edge voxel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborInterpolator;

impl NearestNeighborInterpolator {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for NearestNeighborInterpolator {
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [nz, ny, nx] = data.dims();
        let n = indices.dims()[0];

        let x = indices.clone().slice([0..n, 0..1]).squeeze::<1>(1);
        let y = indices.clone().slice([0..n, 1..2]).squeeze::<1>(1);
        let z = indices.slice([0..n, 2..3]).squeeze::<1>(1);

        let x_i = x.round().clamp(0.0, (nx - 1) as f64).int();
        let y_i = y.round().clamp(0.0, (ny - 1) as f64).int();
        let z_i = z.round().clamp(0.0, (nz - 1) as f64).int();

        let flat = z_i * (ny * nx) as i32 + y_i * nx as i32 + x_i;
        data.clone().reshape([nz * ny * nx]).gather(0, flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::{Shape, TensorData};
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn labels_2x2x2() -> Tensor<TestBackend, 3> {
        // value = 1 + x + 2y + 4z
        let values: Vec<f32> = (1..=8).map(|v| v as f32).collect();
        Tensor::from_data(TensorData::new(values, Shape::new([2, 2, 2])), &Default::default())
    }

    #[test]
    fn test_nearest_samples_exact_voxels() {
        let device = Default::default();
        let indices = Tensor::<TestBackend, 2>::from_floats(
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 1.0]],
            &device,
        );
        let values = NearestNeighborInterpolator::new()
            .interpolate(&labels_2x2x2(), indices)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 8.0]);
    }

    #[test]
    fn test_nearest_rounds_and_never_blends() {
        let device = Default::default();
        let indices = Tensor::<TestBackend, 2>::from_floats(
            [[0.4, 0.4, 0.4], [0.6, 0.4, 0.6], [0.5001, 0.9, 0.1]],
            &device,
        );
        let values = NearestNeighborInterpolator::new()
            .interpolate(&labels_2x2x2(), indices)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_eq!(values, vec![1.0, 6.0, 4.0]);
    }

    #[test]
    fn test_nearest_clamps_outside_field_of_view() {
        let device = Default::default();
        let indices = Tensor::<TestBackend, 2>::from_floats(
            [[-3.0, 0.0, 0.0], [5.0, 5.0, 5.0]],
            &device,
        );
        let values = NearestNeighborInterpolator::new()
            .interpolate(&labels_2x2x2(), indices)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_eq!(values, vec![1.0, 8.0]);
    }
}
