//! Merge command

use crate::MergeArgs;
use anyhow::{Context, Result};
use tracing::info;

pub fn run(args: MergeArgs, verbose: u8) -> Result<()> {
    let mut a = super::load_deep(&args.a)?;
    let b = super::load_deep(&args.b)?;

    if args.subtract {
        a.subtract_deep_image(&b)
            .with_context(|| format!("Cannot hold out {} from {}", args.b.display(), args.a.display()))?;
    } else {
        a.add_deep_image(&b)
            .with_context(|| format!("Cannot add {} to {}", args.b.display(), args.a.display()))?;
    }
    info!(
        samples = a.num_elements(),
        subtract = args.subtract,
        "merged"
    );

    super::save_deep(&args.output, &a)?;
    if let Some(png) = &args.png {
        super::render_png(png, &a, args.mode)?;
    }

    if verbose > 0 {
        println!("Wrote {} ({} samples)", args.output.display(), a.num_elements());
    }
    Ok(())
}
