//! Error types for atlas merging.

use thiserror::Error;

/// Main error type for merge operations.
#[derive(Error, Debug)]
pub enum MergeError {
    /// Missing, empty or inconsistent inputs.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An atlas does not lie on the reference grid.
    #[error("Shape mismatch for atlas {atlas}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        atlas: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Offset labels no longer fit the label store.
    #[error("Label overflow in atlas {atlas}: merged label {max_label} exceeds limit {limit}")]
    Overflow {
        atlas: String,
        max_label: u64,
        limit: u64,
    },

    /// A voxel value that cannot be a parcel label.
    #[error("Invalid label in atlas {atlas}: {value}")]
    InvalidLabel { atlas: String, value: f64 },

    /// An atlas could not be mapped onto the reference grid.
    #[error("Resample error: {0}")]
    Resample(String),

    /// Tensor data could not be read back from the backend.
    #[error("Tensor error: {0}")]
    Tensor(String),
}

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

impl MergeError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a resample error.
    pub fn resample(msg: impl Into<String>) -> Self {
        Self::Resample(msg.into())
    }

    /// Create a tensor error.
    pub fn tensor(msg: impl Into<String>) -> Self {
        Self::Tensor(msg.into())
    }

    /// Create a shape mismatch error.
    pub fn shape_mismatch(atlas: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            atlas: atlas.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}
