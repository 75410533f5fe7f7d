use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mpr_core::consts::PARALLEL_EPSILON;
use mpr_core::geometry::{reference_line_endpoints, ImagePlane};
use serde::Deserialize;

use crate::summary;

#[derive(Args)]
pub struct ReflineArgs {
    /// Plane pair file (TOML) with `source` and `target` tables
    pub file: PathBuf,

    /// Tolerance below which the planes are treated as parallel
    #[arg(long, default_value_t = PARALLEL_EPSILON)]
    pub epsilon: f64,
}

/// Source plane projected onto a `columns` x `rows` target image.
#[derive(Debug, Deserialize)]
pub struct PlanePair {
    pub source: ImagePlane,
    pub target: ImagePlane,
    pub columns: u32,
    pub rows: u32,
}

pub fn run(args: &ReflineArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read planes {}", args.file.display()))?;
    let pair: PlanePair = toml::from_str(&contents).context("Invalid plane pair")?;

    let endpoints = reference_line_endpoints(
        &pair.source,
        &pair.target,
        pair.columns,
        pair.rows,
        args.epsilon,
    );
    summary::print_reference_line(&pair, endpoints);
    Ok(())
}
