//! Image type pairing voxel data with its sampling grid.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use crate::error::{MergeError, Result};
use crate::image::ReferenceGrid;
use crate::spatial::{Direction, Point, Spacing};

/// Voxel data with physical metadata.
///
/// Label atlases are held as float tensors so they can flow through the
/// same resampling path as any other volume; every label below 2^24 is
/// represented exactly.
///
/// # Coordinate Systems
/// * **Tensor order**: `[Z, Y, X]` for volumes, X fastest in memory
/// * **Metadata order**: origin, spacing and direction use `(x, y, z)`
///
/// # Examples
/// ```rust
/// use atlasmerge_core::Image;
/// use atlasmerge_core::image::ReferenceGrid;
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
///
/// type Backend = NdArray<f32>;
///
/// let device = Default::default();
/// let grid = ReferenceGrid::<3>::identity([4, 5, 6]).unwrap();
/// let data = Tensor::<Backend, 3>::zeros([4, 5, 6], &device);
/// let image = Image::from_grid(data, &grid).unwrap();
/// assert_eq!(image.shape(), [4, 5, 6]);
/// ```
#[derive(Debug, Clone)]
pub struct Image<B: Backend, const D: usize> {
    data: Tensor<B, D>,
    grid: ReferenceGrid<D>,
}

impl<B: Backend, const D: usize> Image<B, D> {
    /// Create an image from data and explicit metadata.
    pub fn new(
        data: Tensor<B, D>,
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Result<Self> {
        let grid = ReferenceGrid::new(data.dims(), origin, spacing, direction)?;
        Ok(Self { data, grid })
    }

    /// Place `data` on `grid`; the tensor shape must equal the grid shape.
    pub fn from_grid(data: Tensor<B, D>, grid: &ReferenceGrid<D>) -> Result<Self> {
        let shape = data.dims();
        if shape != grid.shape() {
            return Err(MergeError::shape_mismatch("<image>", &grid.shape(), &shape));
        }
        Ok(Self { data, grid: grid.clone() })
    }

    /// Build an image from voxel values laid out in tensor order.
    pub fn from_values(values: Vec<f32>, grid: &ReferenceGrid<D>, device: &B::Device) -> Result<Self> {
        if values.len() != grid.len() {
            return Err(MergeError::configuration(format!(
                "expected {} voxel values for grid {:?}, got {}",
                grid.len(),
                grid.shape(),
                values.len()
            )));
        }
        let data = Tensor::<B, D>::from_data(TensorData::new(values, Shape::new(grid.shape())), device);
        Ok(Self { data, grid: grid.clone() })
    }

    /// The voxel data tensor.
    pub fn data(&self) -> &Tensor<B, D> {
        &self.data
    }

    /// Consume the image, keeping only the tensor.
    pub fn into_data(self) -> Tensor<B, D> {
        self.data
    }

    /// The sampling grid.
    pub fn grid(&self) -> &ReferenceGrid<D> {
        &self.grid
    }

    pub fn origin(&self) -> &Point<D> {
        self.grid.origin()
    }

    pub fn spacing(&self) -> &Spacing<D> {
        self.grid.spacing()
    }

    pub fn direction(&self) -> &Direction<D> {
        self.grid.direction()
    }

    /// Tensor shape.
    pub fn shape(&self) -> [usize; D] {
        self.grid.shape()
    }

    /// Copy voxel values back to the host in tensor order.
    pub fn to_values(&self) -> Result<Vec<f32>> {
        self.data
            .to_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| MergeError::tensor(format!("{:?}", e)))
    }

    /// Map physical points `[N, D]` into this image's continuous indices.
    pub fn world_to_index_tensor(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        self.grid.world_to_index_tensor(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type Backend = NdArray<f32>;

    #[test]
    fn test_image_creation() {
        let device = Default::default();
        let data = Tensor::<Backend, 3>::zeros([10, 12, 14], &device);
        let origin = Point::new([1.0, 2.0, 3.0]);
        let spacing = Spacing::new([1.0, 1.5, 2.0]);

        let image = Image::new(data, origin, spacing, Direction::identity()).unwrap();

        assert_eq!(image.shape(), [10, 12, 14]);
        assert_eq!(image.origin(), &origin);
        assert_eq!(image.spacing(), &spacing);
        assert_eq!(image.direction(), &Direction::identity());
    }

    #[test]
    fn test_from_grid_rejects_wrong_shape() {
        let device = Default::default();
        let grid = ReferenceGrid::<3>::identity([4, 4, 4]).unwrap();
        let data = Tensor::<Backend, 3>::zeros([4, 4, 5], &device);
        let err = Image::from_grid(data, &grid).unwrap_err();
        assert!(matches!(err, MergeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_values_roundtrip_in_tensor_order() {
        let device = Default::default();
        let grid = ReferenceGrid::<3>::identity([2, 2, 3]).unwrap();
        let values: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let image = Image::<Backend, 3>::from_values(values.clone(), &grid, &device).unwrap();
        assert_eq!(image.to_values().unwrap(), values);

        let short = Image::<Backend, 3>::from_values(vec![0.0; 5], &grid, &device);
        assert!(matches!(short, Err(MergeError::Configuration(_))));
    }
}
