//! Whole-image render driver.
//!
//! [`render`] flattens every pixel of a [`DeepImage`] into a flat [`Image`]
//! whose channels are the deep image's channels minus `Z` and `ZBack`.
//! Rows are composited in parallel with rayon; each pixel reads only its own
//! samples, so rows are independent.
//!
//! ```rust
//! use deep_core::{render, DeepImage, RenderMode};
//!
//! let mut deep = DeepImage::new(4, 4, &["R", "G", "B", "A", "Z"]).unwrap();
//! deep.add_sample(1.0, 0.5, 0.5, &[0.0, 1.0, 0.0, 1.0]).unwrap();
//!
//! let flat = render(&deep, RenderMode::Auto);
//! assert_eq!(flat.pixel(2, 2).unwrap(), &[0.0, 1.0, 0.0, 1.0]);
//! ```

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use tracing::debug;

use crate::composite::Compositor;
use crate::{DeepImage, Error, Filter, Image};

/// Which compositor flattens each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RenderMode {
    /// Linear when the image has `ZBack`, discrete otherwise.
    #[default]
    Auto,
    /// [`DeepImage::render_pixel`]
    Discrete,
    /// [`DeepImage::render_pixel_linear`]
    Linear,
}

impl RenderMode {
    /// Picks the concrete mode for `image`.
    pub fn resolve(self, image: &DeepImage) -> RenderMode {
        match self {
            RenderMode::Auto if image.has_zback() => RenderMode::Linear,
            RenderMode::Auto => RenderMode::Discrete,
            mode => mode,
        }
    }
}

impl FromStr for RenderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(RenderMode::Auto),
            "discrete" => Ok(RenderMode::Discrete),
            "linear" => Ok(RenderMode::Linear),
            _ => Err(Error::InvalidRenderMode(s.to_string())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderMode::Auto => "auto",
            RenderMode::Discrete => "discrete",
            RenderMode::Linear => "linear",
        };
        f.write_str(name)
    }
}

/// Flattens every pixel of `image`.
///
/// The result has the deep image's size, channels in
/// [`DeepImage::channel_names_no_depth`] order and a nearest filter.
pub fn render(image: &DeepImage, mode: RenderMode) -> Image {
    let mode = mode.resolve(image);
    let names = image.channel_names_no_depth();
    let mut flat = Image::new(image.width(), image.height(), &names, Filter::Nearest);

    let nch = names.len();
    let width = image.width() as usize;
    let row_len = width * nch;
    if row_len == 0 {
        return flat;
    }

    debug!(
        width = image.width(),
        height = image.height(),
        samples = image.num_elements(),
        %mode,
        "rendering deep image"
    );

    let compositor = Compositor::new(image);
    let lists: Vec<&[u32]> = image.index_lists().collect();

    flat.as_mut_slice()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.chunks_mut(nch).enumerate() {
                let indices = lists[y * width + x];
                match mode {
                    RenderMode::Linear => compositor.linear_into(indices, out),
                    _ => compositor.discrete_into(indices, out),
                }
            }
        });

    flat
}
