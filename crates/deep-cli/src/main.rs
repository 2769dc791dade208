//! deep - inspect, render, merge and generate deep images

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use deep_core::{Filter, RenderMode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "deep")]
#[command(author, version, about = "Deep image compositing CLI")]
#[command(long_about = "
Works with simple deep files (.sdf): per-pixel lists of color, alpha and
depth samples that can be merged and held out before flattening.

Examples:
  deep info scene.sdf                     # Show deep image statistics
  deep render scene.sdf -o scene.png      # Flatten to PNG
  deep merge a.sdf b.sdf -o ab.sdf --png ab.png
  deep merge bg.sdf fg.sdf -o held.sdf --subtract
  deep gen circles -o circles.sdf --png circles.png
  deep splat -o flat.png --filter \"Gaussian 3\"
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Display deep image statistics
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Flatten a deep image
    #[command(visible_alias = "r")]
    Render(RenderArgs),

    /// Merge or hold out one deep image against another
    #[command(visible_alias = "m")]
    Merge(MergeArgs),

    /// Generate a procedural test scene
    Gen(GenArgs),

    /// Splat circles into a flat image through a reconstruction filter
    Splat(SplatArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Input deep file(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RenderArgs {
    /// Input deep file
    input: PathBuf,

    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,

    /// Compositing algorithm: auto, discrete or linear
    #[arg(short, long, default_value = "auto")]
    mode: RenderMode,

    /// Print value ranges of the flattened image
    #[arg(short, long)]
    stats: bool,
}

#[derive(Args)]
struct MergeArgs {
    /// Base deep file
    a: PathBuf,

    /// Deep file merged into the base
    b: PathBuf,

    /// Output deep file
    #[arg(short, long)]
    output: PathBuf,

    /// Hold out B from A instead of adding it
    #[arg(long)]
    subtract: bool,

    /// Also flatten the result to this PNG
    #[arg(long)]
    png: Option<PathBuf>,

    /// Compositing algorithm for --png
    #[arg(short, long, default_value = "auto")]
    mode: RenderMode,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Scene {
    /// Two overlapping volumetric circles behind a white rectangle
    Circles,
    /// One red volumetric circle
    Circle,
    /// A single pixel with two translucent samples
    Pixel,
    /// A red background with a green circle held out of it
    Holdout,
}

#[derive(Args)]
struct GenArgs {
    /// Scene to generate
    #[arg(value_enum)]
    scene: Scene,

    /// Output deep file
    #[arg(short, long)]
    output: PathBuf,

    /// Width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Height in pixels
    #[arg(long, default_value = "480")]
    height: u32,

    /// Also flatten the scene to this PNG
    #[arg(long)]
    png: Option<PathBuf>,
}

#[derive(Args)]
struct SplatArgs {
    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,

    /// Reconstruction filter: Nearest, Linear or "Gaussian <width>"
    #[arg(short, long, default_value = "Nearest")]
    filter: Filter,

    /// Width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Height in pixels
    #[arg(long, default_value = "480")]
    height: u32,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Render(args) => commands::render::run(args, cli.verbose),
        Commands::Merge(args) => commands::merge::run(args, cli.verbose),
        Commands::Gen(args) => commands::generate::run(args, cli.verbose),
        Commands::Splat(args) => commands::splat::run(args, cli.verbose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::parse_from(["deep", "-vv", "render", "in.sdf", "-o", "out.png", "--mode", "linear"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.mode, RenderMode::Linear);
                assert!(!args.stats);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_parse_splat_filter() {
        let cli = Cli::parse_from(["deep", "splat", "-o", "f.png", "--filter", "Gaussian 3"]);
        match cli.command {
            Commands::Splat(args) => assert_eq!(args.filter, Filter::Gaussian { width: 3 }),
            _ => panic!("expected splat"),
        }
        assert!(Cli::try_parse_from(["deep", "splat", "-o", "f.png", "--filter", "Box"]).is_err());
    }
}
