//! I/O traits for deep readers, deep writers and flat sinks.
//!
//! These traits define the interface for format-specific implementations.

use crate::IoResult;
use deep_core::{DeepImage, Image};
use std::path::Path;

/// Trait for deep image readers.
pub trait DeepReader {
    /// Reads a deep image from a file path.
    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<DeepImage>;

    /// Reads a deep image from memory.
    fn read_from_memory(&self, data: &[u8]) -> IoResult<DeepImage>;
}

/// Trait for deep image writers.
pub trait DeepWriter {
    /// Writes a deep image to a file path.
    fn write<P: AsRef<Path>>(&self, path: P, image: &DeepImage) -> IoResult<()>;

    /// Writes a deep image to memory.
    fn write_to_memory(&self, image: &DeepImage) -> IoResult<Vec<u8>>;
}

/// Destination for flat rasters.
///
/// `data` is row-major, top-to-bottom, with `channels` interleaved values
/// per pixel, exactly as stored by [`Image`].
///
/// # Example
///
/// ```rust,ignore
/// use deep_io::{FlatSink, PngSink};
///
/// PngSink::default().write_flat("out.png", 640, 480, 4, flat.as_slice())?;
/// ```
pub trait FlatSink {
    /// Writes one flat raster.
    fn write_flat<P: AsRef<Path>>(
        &self,
        path: P,
        width: u32,
        height: u32,
        channels: usize,
        data: &[f32],
    ) -> IoResult<()>;

    /// Writes an [`Image`] with its own size and channel count.
    fn write_image<P: AsRef<Path>>(&self, path: P, image: &Image) -> IoResult<()> {
        self.write_flat(path, image.width(), image.height(), image.channels(), image.as_slice())
    }
}
