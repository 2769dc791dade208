//! Render command

use crate::RenderArgs;
use anyhow::Result;
use deep_core::flat_stats;
use tracing::info;

pub fn run(args: RenderArgs, verbose: u8) -> Result<()> {
    let deep = super::load_deep(&args.input)?;
    let mode = args.mode.resolve(&deep);
    info!(input = %args.input.display(), %mode, "rendering");

    let flat = super::render_png(&args.output, &deep, mode)?;

    if args.stats {
        println!("{}", flat_stats(&flat));
    }
    if verbose > 0 {
        println!("Wrote {}", args.output.display());
    }
    Ok(())
}
