//! Sampling grids.
//!
//! A [`ReferenceGrid`] is everything about an image except its voxel values:
//! the tensor shape plus the physical placement of voxel centres.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Shape, Tensor, TensorData};
use crate::error::{MergeError, Result};
use crate::spatial::{Direction, Point, Spacing, Vector};

/// Default tolerance used when deciding whether two grids coincide.
pub const GRID_TOLERANCE: f64 = 1e-4;

/// Shape and physical metadata of a voxel grid.
///
/// `shape` is in tensor order (`[Z, Y, X]` for volumes); origin, spacing and
/// direction are in voxel-axis order (`x, y, z`).
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceGrid<const D: usize> {
    shape: [usize; D],
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
}

impl<const D: usize> ReferenceGrid<D> {
    /// Create a grid, rejecting empty shapes, non-positive spacing and
    /// singular orientation matrices.
    pub fn new(
        shape: [usize; D],
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Result<Self> {
        if shape.iter().any(|&n| n == 0) {
            return Err(MergeError::configuration(format!("grid shape {:?} has an empty axis", shape)));
        }
        if spacing.is_degenerate() {
            return Err(MergeError::configuration(format!("grid spacing {:?} is not positive", spacing.to_array())));
        }
        if direction.try_inverse().is_none() {
            return Err(MergeError::configuration("grid direction matrix is singular"));
        }
        Ok(Self { shape, origin, spacing, direction })
    }

    /// Unit-spaced, axis-aligned grid at the origin.
    pub fn identity(shape: [usize; D]) -> Result<Self> {
        Self::new(shape, Point::origin(), Spacing::uniform(1.0), Direction::identity())
    }

    pub fn shape(&self) -> [usize; D] {
        self.shape
    }

    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// Number of voxels.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` samples the same voxel centres, within `tolerance`.
    pub fn matches(&self, other: &Self, tolerance: f64) -> bool {
        self.shape == other.shape
            && self.origin.approx_eq(&other.origin, tolerance)
            && self.spacing.approx_eq(&other.spacing, tolerance)
            && self.direction.approx_eq(&other.direction, tolerance)
    }

    /// Physical position of a voxel given by its axis-ordered index.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn index_to_world(&self, index: [f64; D]) -> Point<D> {
        let mut scaled = Vector::<D>::zeros();
        for i in 0..D {
            scaled[i] = index[i] * self.spacing[i];
        }
        self.origin + self.direction * scaled
    }

    /// Continuous voxel indices `[N, D]` (axis order `x, y, z`) of every grid
    /// voxel, enumerated in tensor memory order.
    pub fn index_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let total = self.len();
        // tensor axes run [.., Y, X]; index columns run (x, y, ..)
        let mut columns: Vec<Tensor<B, 2>> = Vec::with_capacity(D);
        for axis in 0..D {
            let tensor_axis = D - 1 - axis;
            let extent = self.shape[tensor_axis];
            let inner: usize = self.shape[tensor_axis + 1..].iter().product();
            let outer = total / (extent * inner);
            let range = Tensor::<B, 1, Int>::arange(0..extent as i64, device)
                .reshape([1, extent, 1])
                .repeat(&[outer, 1, inner])
                .reshape([total])
                .float();
            columns.push(range.unsqueeze_dim::<2>(1));
        }
        Tensor::cat(columns, 1)
    }

    /// Map a batch of continuous indices `[N, D]` to physical points `[N, D]`.
    pub fn index_to_world_tensor<B: Backend>(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();

        // P = O + I @ M with M_rc = S_r * Dir_cr
        let mut m_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                m_data.push((self.spacing[r] * self.direction[(c, r)]) as f32);
            }
        }
        let m = Tensor::<B, 2>::from_data(TensorData::new(m_data, Shape::new([D, D])), &device);
        indices.matmul(m) + self.origin_tensor(&device)
    }

    /// Map a batch of physical points `[N, D]` to continuous indices `[N, D]`.
    pub fn world_to_index_tensor<B: Backend>(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let device = points.device();
        let inv_dir = self
            .direction
            .try_inverse()
            .ok_or_else(|| MergeError::resample("direction matrix is singular"))?;

        // I = (P - O) @ T with T_rc = (Dir^-1)_cr / S_c
        let mut t_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                t_data.push((inv_dir[(c, r)] / self.spacing[c]) as f32);
            }
        }
        let t = Tensor::<B, 2>::from_data(TensorData::new(t_data, Shape::new([D, D])), &device);
        Ok((points - self.origin_tensor(&device)).matmul(t))
    }

    fn origin_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let origin: Vec<f32> = (0..D).map(|i| self.origin[i] as f32).collect();
        Tensor::<B, 1>::from_data(TensorData::new(origin, Shape::new([D])), device).reshape([1, D])
    }
}
