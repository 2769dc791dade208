//! Flat splatting demo: two translucent circles accumulated through a filter.

use crate::SplatArgs;
use anyhow::{bail, Result};
use deep_core::shapes::draw_circle;
use deep_core::{flat_stats, Image, ALPHA};
use tracing::info;

pub fn run(args: SplatArgs, verbose: u8) -> Result<()> {
    if args.width == 0 || args.height == 0 {
        bail!("Invalid size {}x{}", args.width, args.height);
    }

    let mut img = Image::new(args.width, args.height, &["R", "G", "B", ALPHA], args.filter);
    draw_circle(&mut img, 0.6, 0.6, 0.2, &[0.0, 0.0, 1.0, 0.5])?;
    draw_circle(&mut img, 0.4, 0.4, 0.2, &[0.0, 1.0, 0.0, 0.25])?;
    info!(filter = %args.filter, "splatted");

    super::save_png(&args.output, &img)?;
    if verbose > 0 {
        println!("{}", flat_stats(&img));
    }
    Ok(())
}
