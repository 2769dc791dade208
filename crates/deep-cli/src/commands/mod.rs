//! CLI command implementations

pub mod generate;
pub mod info;
pub mod merge;
pub mod render;
pub mod splat;

use anyhow::{Context, Result};
use deep_core::{DeepImage, Image, RenderMode};
use std::path::Path;

/// Load deep image from path
pub fn load_deep(path: &Path) -> Result<DeepImage> {
    deep_io::read(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save deep image to path
pub fn save_deep(path: &Path, image: &DeepImage) -> Result<()> {
    deep_io::write(path, image).with_context(|| format!("Failed to save: {}", path.display()))
}

/// Save flat image as PNG
pub fn save_png(path: &Path, image: &Image) -> Result<()> {
    deep_io::png::write_image(path, image)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Flatten and save as PNG
pub fn render_png(path: &Path, image: &DeepImage, mode: RenderMode) -> Result<Image> {
    let flat = deep_core::render(image, mode);
    save_png(path, &flat)?;
    Ok(flat)
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
