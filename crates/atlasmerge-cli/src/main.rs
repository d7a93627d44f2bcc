use anyhow::Result;
use atlasmerge_cli::{pipeline, Cli};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let job = Cli::parse().into_job()?;
    let summary = pipeline::run(&job)?;

    info!(
        "merged {} atlases into {} labels (uint{})",
        summary.contributions.len(),
        summary.labels,
        summary.width.bits()
    );
    Ok(())
}
