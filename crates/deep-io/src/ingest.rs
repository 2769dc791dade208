//! Conversion from third-party deep shadow maps.
//!
//! Any renderer's deep shadow / deep camera map can be converted by
//! implementing [`DeepShadowSource`] over it. [`ingest`] walks every pixel
//! and produces a [`DeepImage`] with channels `R, G, B, A, Z, ZBack`.
//!
//! Sources hand out *premultiplied*, uncomposited samples (each record's own
//! color and opacity, not the running composite), front to back.
//!
//! ```text
//! source pixel (x, y)  ->  DeepImage pixel (h - y - 1, x)
//! continuous:  [s0 s1 s2]  ->  s0: Z0..Z1, s1: Z1..Z2   (s2 dropped)
//! discrete:    [s0 s1 s2]  ->  s0: Z0..Z0, s1: Z1..Z1, s2: Z2..Z2
//! ```

use deep_core::{DeepImage, ALPHA, DEPTH, DEPTH_BACK};
use tracing::{debug, info};

use crate::IoResult;

/// How depth varies between consecutive samples of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthInterp {
    /// Each sample is a surface at its own depth.
    #[default]
    Discrete,
    /// Each sample is a volume reaching back to the next sample.
    Continuous,
}

/// One uncomposited deep shadow record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSample {
    /// Premultiplied RGBA
    pub color: [f32; 4],
    /// Front depth
    pub z: f32,
}

/// Read access to a deep shadow map.
pub trait DeepShadowSource {
    /// `(width, height)` in pixels.
    fn resolution(&self) -> (u32, u32);

    /// Depth interpretation declared by the map.
    fn depth_interp(&self) -> DepthInterp;

    /// Number of records at pixel `(x, y)`.
    fn sample_count(&self, x: u32, y: u32) -> IoResult<usize>;

    /// Record `d` of pixel `(x, y)`, front to back.
    fn sample(&self, x: u32, y: u32, d: usize) -> IoResult<ShadowSample>;
}

/// Channels produced by [`ingest`], in declared order.
pub fn ingest_channels() -> [&'static str; 6] {
    ["R", "G", "B", ALPHA, DEPTH, DEPTH_BACK]
}

/// Converts a deep shadow map into a [`DeepImage`].
///
/// Color is unpremultiplied where alpha is positive. The source's first row
/// becomes the image's last row.
pub fn ingest<S: DeepShadowSource + ?Sized>(source: &S) -> IoResult<DeepImage> {
    let (width, height) = source.resolution();
    let interp = source.depth_interp();
    let mut image = DeepImage::new(width, height, &ingest_channels())?;
    info!(width, height, ?interp, "ingesting deep shadow map");

    let mut dropped = 0usize;
    for y in 0..height {
        let row = height - y - 1;
        for x in 0..width {
            let count = source.sample_count(x, y)?;
            for d in 0..count {
                let sample = source.sample(x, y, d)?;
                let z_back = match interp {
                    DepthInterp::Discrete => sample.z,
                    DepthInterp::Continuous if d + 1 < count => source.sample(x, y, d + 1)?.z,
                    DepthInterp::Continuous => {
                        dropped += 1;
                        continue;
                    }
                };

                let [r, g, b, a] = sample.color;
                let (r, g, b) = if a > 0.0 { (r / a, g / a, b / a) } else { (r, g, b) };
                image.add_pixel_sample(row, x, &[r, g, b, a, sample.z, z_back])?;
            }
        }
    }

    debug!(samples = image.num_elements(), dropped, "ingest complete");
    Ok(image)
}
