//! Label images and the grids they are sampled on.

pub mod image;
pub mod grid;

pub use image::Image;
pub use grid::{ReferenceGrid, GRID_TOLERANCE};
