use anyhow::Result;
use clap::Args;
use mpr_core::LayoutKind;

use crate::summary;

#[derive(Args)]
pub struct LayoutsArgs {
    /// Also show where each viewport restores its image from
    #[arg(long)]
    pub priorities: bool,
}

pub fn run(args: &LayoutsArgs) -> Result<()> {
    summary::print_layout_catalog(&LayoutKind::ALL, args.priorities);
    Ok(())
}
