//! Combining several label atlases into one.
//!
//! Atlases are merged in input order. Each atlas's labels are shifted by a
//! running offset, the sum of the maximum labels of every atlas merged
//! before it, so label ranges never collide. Where atlases overlap in space
//! the [`OverlapPolicy`] decides which label a voxel keeps.

pub mod labels;
pub mod merger;
pub mod networks;
pub mod policy;

pub use labels::{resolve_name_sources, LabelEntry, LabelTable, LabelWidth, NameSource, MAX_LABEL};
pub use merger::{AtlasContribution, AtlasInput, AtlasMerger, MergeAccumulator, MergeConfig, MergedAtlas};
pub use networks::{network_names, YEO17_NETWORKS};
pub use policy::OverlapPolicy;
