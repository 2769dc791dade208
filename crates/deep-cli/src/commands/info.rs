//! Deep image info command.
//!
//! Prints the statistics of each input file, as text or JSON.

use crate::InfoArgs;
use anyhow::{Context, Result};
use deep_core::{deep_stats, DeepStats};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct FileInfo<'a> {
    file: String,
    size_bytes: u64,
    channels_in_order: &'a [String],
    #[serde(flatten)]
    stats: DeepStats,
}

/// Runs the info command.
pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    for (n, path) in args.input.iter().enumerate() {
        let file_size = fs::metadata(path)
            .with_context(|| format!("Failed to stat: {}", path.display()))?
            .len();
        let image = super::load_deep(path)?;
        let stats = deep_stats(&image);
        debug!(file = %path.display(), samples = stats.num_elements, "loaded");

        if args.json {
            let info = FileInfo {
                file: path.display().to_string(),
                size_bytes: file_size,
                channels_in_order: image.channel_names_in_order(),
                stats,
            };
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            print_text(path, file_size, image.channel_names_in_order(), &stats, verbose);
        }

        if n + 1 < args.input.len() {
            println!();
        }
    }
    Ok(())
}

fn print_text(path: &Path, file_size: u64, declared: &[String], stats: &DeepStats, verbose: u8) {
    println!("{}", path.display());
    println!("  File size:  {}", super::format_size(file_size));
    if verbose > 0 {
        println!("  Declared:   {}", declared.join(" "));
    }
    for line in stats.to_string().lines() {
        println!("  {}", line);
    }
}
