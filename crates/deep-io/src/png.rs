//! PNG output for flat renders.
//!
//! [`PngSink`] encodes 1-4 channel float rasters as 8-bit PNG. Values are
//! clamped to `[0, 1]` and scaled to `0..=255`; no transfer function is
//! applied.
//!
//! # Example
//!
//! ```rust,ignore
//! use deep_io::png;
//!
//! let flat = deep_core::render(&deep, RenderMode::Auto);
//! png::write_image("out.png", &flat)?;
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use deep_core::Image;
use tracing::debug;

use crate::{FlatSink, IoError, IoResult};

/// 8-bit PNG encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngSink;

impl PngSink {
    /// Creates a new sink.
    pub fn new() -> Self {
        Self
    }

    fn encode<W: Write>(
        &self,
        writer: W,
        width: u32,
        height: u32,
        channels: usize,
        data: &[f32],
    ) -> IoResult<()> {
        let color_type = match channels {
            1 => png::ColorType::Grayscale,
            2 => png::ColorType::GrayscaleAlpha,
            3 => png::ColorType::Rgb,
            4 => png::ColorType::Rgba,
            n => return Err(IoError::encode(format!("unsupported channel count: {}", n))),
        };
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(IoError::encode(format!(
                "buffer holds {} values, {}x{}x{} needs {}",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }

        let mut encoder = png::Encoder::new(writer, width, height);
        encoder.set_color(color_type);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::default());

        let mut png_writer = encoder
            .write_header()
            .map_err(|e| IoError::encode(e.to_string()))?;

        let bytes: Vec<u8> = data.iter().map(|&v| to_u8(v)).collect();
        png_writer
            .write_image_data(&bytes)
            .map_err(|e| IoError::encode(e.to_string()))?;
        png_writer.finish().map_err(|e| IoError::encode(e.to_string()))?;
        Ok(())
    }

    /// Encodes a raster into an in-memory PNG.
    pub fn write_to_memory(&self, width: u32, height: u32, channels: usize, data: &[f32]) -> IoResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.encode(&mut buffer, width, height, channels, data)?;
        Ok(buffer)
    }
}

impl FlatSink for PngSink {
    fn write_flat<P: AsRef<Path>>(
        &self,
        path: P,
        width: u32,
        height: u32,
        channels: usize,
        data: &[f32],
    ) -> IoResult<()> {
        debug!(path = %path.as_ref().display(), width, height, channels, "writing png");
        let file = File::create(path.as_ref())?;
        self.encode(BufWriter::new(file), width, height, channels, data)
    }
}

/// Writes a flat image to a PNG file.
pub fn write_image<P: AsRef<Path>>(path: P, image: &Image) -> IoResult<()> {
    PngSink::new().write_image(path, image)
}

#[inline]
fn to_u8(v: f32) -> u8 {
    // NaN clamps to NaN and casts to 0
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use deep_core::Filter;

    fn decode(bytes: &[u8]) -> (png::OutputInfo, Vec<u8>) {
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0u8; reader.output_buffer_size().unwrap()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info, buf)
    }

    #[test]
    fn test_encode_rgba() {
        let data = [0.0, 0.5, 1.0, 1.0, 2.0, -1.0, 0.25, 0.0];
        let bytes = PngSink::new().write_to_memory(2, 1, 4, &data).unwrap();
        let (info, pixels) = decode(&bytes);
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(info.color_type, png::ColorType::Rgba);
        assert_eq!(pixels, vec![0, 128, 255, 255, 255, 0, 64, 0]);
    }

    #[test]
    fn test_rejects_bad_channel_count() {
        let err = PngSink::new().write_to_memory(1, 1, 5, &[0.0; 5]).unwrap_err();
        assert!(matches!(err, IoError::EncodeError(_)));
        let err = PngSink::new().write_to_memory(2, 2, 3, &[0.0; 3]).unwrap_err();
        assert!(matches!(err, IoError::EncodeError(_)));
    }

    #[test]
    fn test_write_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.png");
        let mut img = Image::new(4, 3, &["Y"], Filter::Nearest);
        *img.data_mut(1, 2, 0).unwrap() = 1.0;
        write_image(&path, &img).unwrap();

        let (info, pixels) = decode(&std::fs::read(&path).unwrap());
        assert_eq!(info.color_type, png::ColorType::Grayscale);
        assert_eq!(pixels[4 + 2], 255);
        assert_eq!(pixels.iter().filter(|&&p| p == 0).count(), 11);
    }
}
