//! Physical-space positions.

use nalgebra::Point as NaPoint;
use super::Vector;

/// A position in D-dimensional physical space (millimetres for NIfTI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<const D: usize>(pub NaPoint<f64, D>);

impl<const D: usize> Point<D> {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; D]) -> Self {
        Self(NaPoint::from(coords))
    }

    /// The point with all coordinates zero.
    pub fn origin() -> Self {
        Self(NaPoint::origin())
    }

    /// Coordinates as a plain array.
    pub fn to_array(&self) -> [f64; D] {
        std::array::from_fn(|i| self.0.coords[i])
    }

    /// Whether every coordinate lies within `tolerance` of `other`.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (0..D).all(|i| (self[i] - other[i]).abs() <= tolerance)
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0.coords - other.0.coords)
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, vector: Vector<D>) -> Self::Output {
        Self(self.0 + vector.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Point3 = Point<3>;

    #[test]
    fn test_point_arithmetic() {
        let p = Point3::new([1.0, 2.0, 3.0]);
        let q = Point3::new([4.0, 6.0, 8.0]);
        let d = q - p;
        assert_eq!(d, Vector::new([3.0, 4.0, 5.0]));
        assert_eq!(p + d, q);
    }

    #[test]
    fn test_point_approx_eq() {
        let p = Point3::new([-90.0, -126.0, -72.0]);
        let q = Point3::new([-90.00001, -126.0, -72.0]);
        assert!(p.approx_eq(&q, 1e-4));
        assert!(!p.approx_eq(&Point3::origin(), 1e-4));
        assert_eq!(p.to_array(), [-90.0, -126.0, -72.0]);
    }
}
