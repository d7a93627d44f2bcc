//! Load, resample, merge and write.

use anyhow::{Context, Result};
use atlasmerge_core::filter::resample_labels;
use atlasmerge_core::image::GRID_TOLERANCE;
use atlasmerge_core::merge::{
    network_names, resolve_name_sources, AtlasContribution, AtlasInput, LabelWidth, MergeAccumulator, NameSource,
};
use atlasmerge_io::{atlas_stem, read_grid, read_label_table, read_nifti, sidecar_table_path};
use atlasmerge_io::{commit_all, write_label_nifti, write_label_table, PendingOutput};
use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::MergeJob;

pub type CpuBackend = NdArray<f32>;

/// What a finished merge produced.
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub table: PathBuf,
    /// Rows written to the table.
    pub labels: usize,
    pub max_label: u32,
    pub width: LabelWidth,
    pub contributions: Vec<AtlasContribution>,
}

/// Run `job` on the CPU backend.
pub fn run(job: &MergeJob) -> Result<MergeSummary> {
    let device = Default::default();
    run_on::<CpuBackend>(job, &device)
}

/// Run `job` on any backend.
///
/// Atlases are read and merged one at a time. Both outputs are staged and
/// only moved into place once both have been written, so a failure at any
/// point leaves no output behind.
pub fn run_on<B: Backend>(job: &MergeJob, device: &B::Device) -> Result<MergeSummary> {
    job.validate()?;

    let grid = read_grid(&job.reference)
        .with_context(|| format!("Failed to load reference {}", job.reference.display()))?;
    info!(reference = %job.reference.display(), shape = ?grid.shape(), "reference grid");

    if job.atlases.len() == 1 {
        warn!("only one atlas supplied, the output only relabels it");
    }

    let sources = name_sources(job)?;
    let mut accumulator = MergeAccumulator::<B>::new(job.config, &grid, device);

    for (position, (path, names)) in job.atlases.iter().zip(sources).enumerate() {
        let describe = || format!("atlas {} ({})", position + 1, path.display());

        let image = read_nifti::<B, _>(path, device).with_context(describe)?;
        let image = resample_labels(image, &grid, GRID_TOLERANCE).with_context(describe)?;
        accumulator
            .add(AtlasInput { source: path.display().to_string(), image, names })
            .with_context(describe)?;
    }

    let merged = accumulator.finish()?;

    let volume = PendingOutput::new(&job.output)?;
    write_label_nifti(volume.path(), &merged.image, merged.width)?;
    let table = PendingOutput::new(&job.table)?;
    write_label_table(table.path(), &merged.table)?;

    commit_all(vec![volume, table])?;
    let output = job.output.clone();
    let table = job.table.clone();
    info!(
        output = %output.display(),
        table = %table.display(),
        labels = merged.table.len(),
        bits = merged.width.bits(),
        "wrote merged atlas"
    );

    Ok(MergeSummary {
        output,
        table,
        labels: merged.table.len(),
        max_label: merged.max_label,
        width: merged.width,
        contributions: merged.contributions,
    })
}

/// Names for each atlas: supplied prefix, else sidecar table, else file stem.
///
/// With `networks` set, prefix-named atlases after the first are given Yeo
/// network names; the first atlas is the cortical parcellation.
fn name_sources(job: &MergeJob) -> Result<Vec<NameSource>> {
    let mut sources = resolve_name_sources(job.atlases.len(), &job.names, |i| {
        NameSource::Prefix(atlas_stem(&job.atlases[i]))
    })?;

    if job.names.is_empty() && job.sidecars {
        for (source, path) in sources.iter_mut().zip(&job.atlases) {
            let sidecar = sidecar_table_path(path);
            if sidecar.is_file() {
                let names = read_label_table(&sidecar)
                    .with_context(|| format!("Failed to read label names for {}", path.display()))?;
                info!(atlas = %path.display(), table = %sidecar.display(), "using sidecar label names");
                *source = NameSource::PerLabel(names);
            }
        }
    }

    if job.networks {
        for source in sources.iter_mut().skip(1) {
            if let NameSource::Prefix(prefix) = source {
                let names = network_names(prefix);
                *source = NameSource::PerLabel(names);
            }
        }
    }

    Ok(sources)
}
