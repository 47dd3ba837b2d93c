mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dicom-viewport", about = "Render and measure DICOM images")]
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
    /// Show image attributes and overlay metadata of a DICOM file
    Info(commands::info::InfoArgs),
    /// Render one frame to a PNG, optionally placed on a viewing surface
    Render(commands::render::RenderArgs),
    /// Measure statistics inside a polygon given in pixel coordinates
    Roi(commands::roi::RoiArgs),
    /// Render every frame of an instance to a directory
    Export(commands::export::ExportArgs),
    /// Print or save the default viewer config as TOML
    Config(commands::config::ConfigArgs),
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
        Commands::Info(args) => commands::info::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Roi(args) => commands::roi::run(args),
        Commands::Export(args) => commands::export::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
