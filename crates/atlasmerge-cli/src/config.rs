use anyhow::Result;
use atlasmerge_core::merge::{MergeConfig, OverlapPolicy};
use atlasmerge_core::MergeError;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "merge-atlases")]
#[command(version)]
#[command(about = "Merge parcellation atlases onto one reference grid with non-overlapping labels")]
pub struct Cli {
    /// Atlas volumes, merged in the order given
    #[arg(short, long, num_args = 1.., required = true)]
    pub atlases: Vec<PathBuf>,

    /// Volume whose grid the merged atlas is sampled on
    #[arg(short, long)]
    pub reference: PathBuf,

    /// Output label table (index, name)
    #[arg(short, long)]
    pub tsv: PathBuf,

    /// One name per atlas, used as the label name prefix
    #[arg(short, long, num_args = 0..)]
    pub names: Vec<String>,

    /// Merged atlas volume
    #[arg(short, long, default_value = "mergedAtlas.nii.gz")]
    pub output: PathBuf,

    /// Which atlas keeps voxels claimed by more than one
    #[arg(long, value_enum, default_value_t = OverlapArg::First)]
    pub overlap: OverlapArg,

    /// Name labels 1-17 of every atlas after the first by the Yeo 17 networks
    /// (for subcortical and cerebellar atlases labelled by network)
    #[arg(long)]
    pub networks: bool,

    /// Ignore `<atlas>.tsv` label tables next to the atlases
    #[arg(long)]
    pub no_sidecars: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapArg {
    /// Earlier atlases keep their voxels
    First,
    /// Later atlases overwrite earlier ones
    Last,
}

impl From<OverlapArg> for OverlapPolicy {
    fn from(arg: OverlapArg) -> Self {
        match arg {
            OverlapArg::First => OverlapPolicy::FirstWins,
            OverlapArg::Last => OverlapPolicy::LastWins,
        }
    }
}

/// A checked merge request. Validation writes nothing.
#[derive(Debug, Clone)]
pub struct MergeJob {
    pub atlases: Vec<PathBuf>,
    pub reference: PathBuf,
    pub output: PathBuf,
    pub table: PathBuf,
    pub names: Vec<String>,
    pub config: MergeConfig,
    pub networks: bool,
    pub sidecars: bool,
}

impl MergeJob {
    /// A job with default options.
    pub fn new(atlases: Vec<PathBuf>, reference: PathBuf, output: PathBuf, table: PathBuf) -> Self {
        Self {
            atlases,
            reference,
            output,
            table,
            names: Vec::new(),
            config: MergeConfig::default(),
            networks: false,
            sidecars: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.atlases.is_empty() {
            return Err(MergeError::configuration("at least one atlas must be supplied").into());
        }
        if !self.names.is_empty() && self.names.len() != self.atlases.len() {
            return Err(MergeError::configuration(format!(
                "names count must match atlas count when names are provided ({} names, {} atlases)",
                self.names.len(),
                self.atlases.len()
            ))
            .into());
        }
        for (what, path) in [("output volume", &self.output), ("label table", &self.table)] {
            if path.is_dir() {
                return Err(MergeError::configuration(format!("{} {} is a directory", what, path.display())).into());
            }
        }
        if resolved(&self.output) == resolved(&self.table) {
            return Err(MergeError::configuration(format!(
                "output volume and label table are the same file: {}",
                self.output.display()
            ))
            .into());
        }
        let volume_name = self.output.to_string_lossy().to_lowercase();
        if !(volume_name.ends_with(".nii") || volume_name.ends_with(".nii.gz")) {
            return Err(MergeError::configuration(format!(
                "output volume {} must end in .nii or .nii.gz",
                self.output.display()
            ))
            .into());
        }
        Ok(())
    }
}

/// `path` with its directory made absolute and resolved.
fn resolved(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = std::fs::canonicalize(parent)
        .or_else(|_| std::path::absolute(parent))
        .unwrap_or_else(|_| parent.to_path_buf());
    match path.file_name() {
        Some(name) => dir.join(name),
        None => dir,
    }
}

impl Cli {
    pub fn into_job(self) -> Result<MergeJob> {
        let job = MergeJob {
            atlases: self.atlases,
            reference: self.reference,
            output: self.output,
            table: self.tsv,
            names: self.names,
            config: MergeConfig { overlap: self.overlap.into() },
            networks: self.networks,
            sidecars: !self.no_sidecars,
        };
        job.validate()?;
        Ok(job)
    }
}
