//! The `merge-atlases` command: argument handling and the merge pipeline.

pub mod config;
pub mod pipeline;

pub use config::{Cli, MergeJob, OverlapArg};
pub use pipeline::{run, run_on, MergeSummary};
