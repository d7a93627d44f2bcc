//! Resample image filter.
//!
//! Resamples a volume onto a target grid by mapping every output voxel into
//! the input image and sampling it there.

use std::marker::PhantomData;
use burn::tensor::backend::Backend;
use tracing::debug;
use crate::error::Result;
use crate::image::{Image, ReferenceGrid};
use crate::interpolation::{Interpolator, NearestNeighborInterpolator};
use crate::transform::{IdentityTransform, Transform};

/// Resample image filter.
///
/// The transform maps Output Physical Space -> Input Physical Space.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `T` - The transform type
/// * `I` - The interpolator type
pub struct ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B, 3>,
    I: Interpolator<B>,
{
    grid: ReferenceGrid<3>,
    transform: T,
    interpolator: I,
    _phantom: PhantomData<B>,
}

impl<B, T, I> ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B, 3>,
    I: Interpolator<B>,
{
    /// Create a filter producing images on `grid`.
    pub fn onto_grid(grid: &ReferenceGrid<3>, transform: T, interpolator: I) -> Self {
        Self {
            grid: grid.clone(),
            transform,
            interpolator,
            _phantom: PhantomData,
        }
    }

    /// Apply filter to an input image.
    pub fn apply(&self, input: &Image<B, 3>) -> Result<Image<B, 3>> {
        let device = input.data().device();

        // output voxel -> output physical point -> input physical point -> input index
        let output_indices = self.grid.index_tensor::<B>(&device);
        let output_points = self.grid.index_to_world_tensor(output_indices);
        let input_points = self.transform.transform_points(output_points);
        let input_indices = input.world_to_index_tensor(input_points)?;

        let sampled = self.interpolator.interpolate(input.data(), input_indices);
        Image::from_grid(sampled.reshape(self.grid.shape()), &self.grid)
    }
}

/// Bring a label image onto `grid` with nearest-neighbour sampling.
///
/// Images already sampled on `grid` are returned untouched.
pub fn resample_labels<B: Backend>(image: Image<B, 3>, grid: &ReferenceGrid<3>, tolerance: f64) -> Result<Image<B, 3>> {
    if image.grid().matches(grid, tolerance) {
        debug!("image already on reference grid, skipping resample");
        return Ok(image);
    }
    debug!(
        "resampling {:?} -> {:?} (spacing {:?} -> {:?})",
        image.shape(),
        grid.shape(),
        image.spacing().to_array(),
        grid.spacing().to_array()
    );
    ResampleImageFilter::onto_grid(grid, IdentityTransform, NearestNeighborInterpolator::new()).apply(&image)
}
