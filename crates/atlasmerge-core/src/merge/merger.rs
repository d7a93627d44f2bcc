//! The atlas merger.

use std::collections::BTreeSet;
use burn::tensor::backend::Backend;
use burn::tensor::cast::ToElement;
use burn::tensor::Tensor;
use tracing::{debug, info, warn};
use crate::error::{MergeError, Result};
use crate::image::{Image, ReferenceGrid};
use super::labels::{LabelTable, LabelWidth, NameSource, MAX_LABEL};
use super::policy::OverlapPolicy;

/// Merge settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeConfig {
    pub overlap: OverlapPolicy,
}

/// One atlas, already resampled onto the reference grid.
#[derive(Debug, Clone)]
pub struct AtlasInput<B: Backend> {
    /// Path or identifier, used in messages.
    pub source: String,
    pub image: Image<B, 3>,
    pub names: NameSource,
}

/// What a single atlas added to the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasContribution {
    pub source: String,
    /// Added to every label of this atlas.
    pub offset: u32,
    /// Largest local label, 0 for an all-background atlas.
    pub max_label: u32,
    /// Distinct positive local labels.
    pub labels: BTreeSet<u32>,
    /// Voxels this atlas labelled in the output.
    pub voxels_written: usize,
    /// Foreground voxels that were already labelled by an earlier atlas.
    pub voxels_overlapping: usize,
    /// Names from a per-label table whose label never occurred.
    pub absent_names: Vec<String>,
    /// Labels with no voxel left in the output once this atlas was merged.
    /// They keep their table row.
    pub hidden_labels: BTreeSet<u32>,
}

/// Result of a merge.
#[derive(Debug, Clone)]
pub struct MergedAtlas<B: Backend> {
    pub image: Image<B, 3>,
    pub table: LabelTable,
    /// Highest label reserved by any atlas.
    pub max_label: u32,
    pub width: LabelWidth,
    pub contributions: Vec<AtlasContribution>,
}

impl<B: Backend> MergedAtlas<B> {
    /// Voxel labels in tensor order (`[Z, Y, X]`, X fastest).
    pub fn labels(&self) -> Result<Vec<u32>> {
        Ok(self.image.to_values()?.into_iter().map(|v| v as u32).collect())
    }
}

/// Incremental merge state.
///
/// Atlases can be added one at a time and dropped afterwards, so only the
/// accumulator and the atlas being merged are held in memory.
pub struct MergeAccumulator<B: Backend> {
    config: MergeConfig,
    grid: ReferenceGrid<3>,
    labels: Tensor<B, 3>,
    offset: u32,
    table: LabelTable,
    contributions: Vec<AtlasContribution>,
}

impl<B: Backend> MergeAccumulator<B> {
    /// Start with an all-background volume on `grid`.
    pub fn new(config: MergeConfig, grid: &ReferenceGrid<3>, device: &B::Device) -> Self {
        Self {
            config,
            grid: grid.clone(),
            labels: Tensor::zeros(grid.shape(), device),
            offset: 0,
            table: LabelTable::new(),
            contributions: Vec::new(),
        }
    }

    /// Merge the next atlas.
    ///
    /// Every distinct positive label of the atlas gets a table row, even one
    /// whose voxels were all claimed by earlier atlases under
    /// [`OverlapPolicy::FirstWins`]. Such labels are reported in
    /// [`AtlasContribution::hidden_labels`].
    pub fn add(&mut self, input: AtlasInput<B>) -> Result<&AtlasContribution> {
        let AtlasInput { source, image, names } = input;

        if image.shape() != self.grid.shape() {
            return Err(MergeError::shape_mismatch(source, &self.grid.shape(), &image.shape()));
        }

        // float-typed label files are truncated toward zero
        let atlas = image.into_data().int().float();
        let values = atlas
            .to_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| MergeError::tensor(format!("{:?}", e)))?;

        let mut present = BTreeSet::new();
        for &value in &values {
            if value < 0.0 {
                return Err(MergeError::InvalidLabel { atlas: source, value: value as f64 });
            }
            if value > 0.0 {
                present.insert(value as u32);
            }
        }
        let max_label = present.last().copied().unwrap_or(0);

        let merged_max = self.offset as u64 + max_label as u64;
        if merged_max > MAX_LABEL as u64 {
            return Err(MergeError::Overflow {
                atlas: source,
                max_label: merged_max,
                limit: MAX_LABEL as u64,
            });
        }

        if max_label == 0 {
            warn!("atlas {} has no foreground voxels", source);
        }

        let foreground = atlas.clone().greater_elem(0.0).float();
        let occupied = self.labels.clone().greater_elem(0.0).float();
        let overlapping = foreground.clone() * occupied;
        let writable = match self.config.overlap {
            OverlapPolicy::FirstWins => foreground - overlapping.clone(),
            OverlapPolicy::LastWins => foreground,
        };

        let voxels_written = count(&writable);
        let voxels_overlapping = count(&overlapping);

        let written = writable
            .to_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| MergeError::tensor(format!("{:?}", e)))?;
        let visible: BTreeSet<u32> = values
            .iter()
            .zip(&written)
            .filter(|(_, &mask)| mask > 0.0)
            .map(|(&value, _)| value as u32)
            .collect();
        let hidden_labels: BTreeSet<u32> = present.difference(&visible).copied().collect();

        let shifted = atlas.add_scalar(self.offset as f32);
        let keep = writable.clone().mul_scalar(-1.0).add_scalar(1.0);
        self.labels = self.labels.clone() * keep + shifted * writable;

        for &local in &present {
            let merged = self.offset + local;
            self.table.push(merged, names.name_for(local, merged))?;
        }

        let absent_names = names.absent_names(&present);
        if !absent_names.is_empty() {
            warn!("missing from atlas {}: {}", source, absent_names.join(" "));
        }
        if !hidden_labels.is_empty() {
            warn!(
                "labels of atlas {} fully covered by earlier atlases: {:?}",
                source, hidden_labels
            );
        }
        if voxels_overlapping > 0 {
            debug!(
                "atlas {} overlaps earlier atlases at {} voxels ({})",
                source, voxels_overlapping, self.config.overlap
            );
        }
        info!(
            "merged {}: {} labels, offset {}, {} voxels",
            source,
            present.len(),
            self.offset,
            voxels_written
        );

        let index = self.contributions.len();
        self.contributions.push(AtlasContribution {
            source,
            offset: self.offset,
            max_label,
            labels: present,
            voxels_written,
            voxels_overlapping,
            absent_names,
            hidden_labels,
        });
        self.offset += max_label;

        Ok(&self.contributions[index])
    }

    /// Finish the merge. Fails if no atlas was added.
    pub fn finish(self) -> Result<MergedAtlas<B>> {
        if self.contributions.is_empty() {
            return Err(MergeError::configuration("at least one atlas must be supplied"));
        }
        let image = Image::from_grid(self.labels, &self.grid)?;
        Ok(MergedAtlas {
            image,
            table: self.table,
            max_label: self.offset,
            width: LabelWidth::for_max(self.offset),
            contributions: self.contributions,
        })
    }
}

/// Merges atlases that already share the reference grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtlasMerger {
    config: MergeConfig,
}

impl AtlasMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Start an incremental merge on `grid`.
    pub fn accumulator<B: Backend>(&self, grid: &ReferenceGrid<3>, device: &B::Device) -> MergeAccumulator<B> {
        MergeAccumulator::new(self.config, grid, device)
    }

    /// Merge `atlases` in order.
    pub fn merge<B: Backend>(&self, grid: &ReferenceGrid<3>, atlases: Vec<AtlasInput<B>>) -> Result<MergedAtlas<B>> {
        let device = match atlases.first() {
            Some(first) => first.image.data().device(),
            None => return Err(MergeError::configuration("at least one atlas must be supplied")),
        };
        let mut accumulator = self.accumulator::<B>(grid, &device);
        for atlas in atlases {
            accumulator.add(atlas)?;
        }
        accumulator.finish()
    }
}

fn count<B: Backend>(mask: &Tensor<B, 3>) -> usize {
    mask.clone().int().sum().into_scalar().to_i64() as usize
}
