mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mprview", about = "Multi-viewport MPR layout simulator")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the layout catalog
    Layouts(commands::layouts::LayoutsArgs),
    /// Print or save the default viewer config
    Config(commands::config::ConfigArgs),
    /// Replay a scenario of layout switches and interactions
    Simulate(commands::simulate::SimulateArgs),
    /// Compute the reference line of one plane on another
    Refline(commands::refline::ReflineArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Layouts(args) => commands::layouts::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Refline(args) => commands::refline::run(args),
    }
}
