pub mod resample;

pub use resample::{resample_labels, ResampleImageFilter};
