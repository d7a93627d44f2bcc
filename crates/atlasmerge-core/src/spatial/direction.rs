//! Direction cosines of the voxel axes.

use nalgebra::SMatrix;
use super::Vector;

/// Orientation of the image axes in physical space.
///
/// Column `i` is the unit direction of voxel axis `i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    /// No rotation.
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    /// Build from the axis direction vectors.
    pub fn from_axes(axes: [Vector<D>; D]) -> Self {
        let columns: Vec<_> = axes.iter().map(|axis| axis.0).collect();
        Self(SMatrix::from_columns(&columns))
    }

    /// Inverse, when the matrix is not singular.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Element-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (0..D).all(|r| (0..D).all(|c| (self[(r, c)] - other[(r, c)]).abs() <= tolerance))
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, vector: Vector<D>) -> Self::Output {
        Vector(self.0 * vector.0)
    }
}
