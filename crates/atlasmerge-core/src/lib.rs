//! Core types for merging parcellation atlases.
//!
//! Atlases are label images: every voxel holds a non-negative integer naming
//! the parcel it belongs to, 0 meaning background. This crate models such
//! images on a [`burn`] backend, resamples them onto a reference grid with
//! nearest-neighbour sampling, and merges several of them into a single
//! atlas with collision-free labels.

pub mod error;
pub mod filter;
pub mod image;
pub mod interpolation;
pub mod merge;
pub mod spatial;
pub mod transform;

pub use error::{MergeError, Result};
pub use image::{Image, ReferenceGrid};
pub use merge::{AtlasInput, AtlasMerger, LabelTable, MergeConfig, MergedAtlas, NameSource, OverlapPolicy};
pub use spatial::{Direction, Point, Spacing, Vector};
