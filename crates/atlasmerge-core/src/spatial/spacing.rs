//! Voxel spacing.

use super::Vector;

/// Physical distance between adjacent voxels along each axis.
pub type Spacing<const D: usize> = Vector<D>;

impl<const D: usize> Spacing<D> {
    /// Same spacing along every axis.
    pub fn uniform(value: f64) -> Self {
        Vector::new([value; D])
    }

    /// Whether any axis has zero or negative extent.
    pub fn is_degenerate(&self) -> bool {
        (0..D).any(|i| self[i] <= 0.0 || !self[i].is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_uniform() {
        assert_eq!(Spacing::<3>::uniform(2.0), Spacing::new([2.0, 2.0, 2.0]));
    }

    #[test]
    fn test_spacing_degenerate() {
        assert!(!Spacing::<3>::new([1.0, 2.0, 3.0]).is_degenerate());
        assert!(Spacing::<3>::new([1.0, 0.0, 3.0]).is_degenerate());
        assert!(Spacing::<3>::new([1.0, f64::NAN, 3.0]).is_degenerate());
    }
}
