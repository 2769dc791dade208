//! # deep-core
//!
//! Deep images and deep compositing.
//!
//! A *deep* image keeps every sample that landed on a pixel (color, coverage
//! and depth) instead of a single flattened value, so images can be merged
//! with correct occlusion and held out against each other after rendering.
//!
//! - [`Filter`] - reconstruction kernels for splatting point samples
//! - [`Image`] - dense flat raster, the output of rendering
//! - [`DeepImage`] - sparse per-pixel sample lists over a shared channel store
//! - [`DeepImage::render_pixel`] / [`DeepImage::render_pixel_linear`] -
//!   discrete and volumetric compositing of one pixel
//! - [`render`] - parallel whole-image flattening
//! - [`stats`] and [`shapes`] - statistics and procedural test scenes
//!
//! ## Reserved Channels
//!
//! | Name | Meaning |
//! |------|---------|
//! | [`ALPHA`] `"A"` | coverage; negative values mark cutouts |
//! | [`DEPTH`] `"Z"` | front depth, required |
//! | [`DEPTH_BACK`] `"ZBack"` | back depth of volumetric samples |
//!
//! ## Crate Structure
//!
//! ```text
//! deep-core (this crate, no I/O)
//!    ^
//!    +-- deep-io (.sdf codec, PNG sink, deep shadow ingest)
//!    +-- deep-cli
//!    +-- deep-bench
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - `Serialize` for statistics and `RenderMode`

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod composite;
pub mod deep;
pub mod error;
pub mod filter;
pub mod image;
pub mod render;
pub mod shapes;
pub mod stats;

pub use deep::{is_depth_channel, DeepImage};
pub use error::*;
pub use filter::{Filter, DEFAULT_GAUSSIAN_WIDTH};
pub use image::Image;
pub use render::{render, RenderMode};
pub use stats::{deep_stats, flat_stats, ChannelStats, DeepStats, FlatStats};

/// Alpha (coverage) channel name.
pub const ALPHA: &str = "A";

/// Front depth channel name. Every deep image has one.
pub const DEPTH: &str = "Z";

/// Back depth channel name of volumetric samples.
pub const DEPTH_BACK: &str = "ZBack";

/// Prelude module for convenient imports.
///
/// ```
/// use deep_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::render::{render, RenderMode};
    pub use crate::shapes::{draw_circle, draw_deep_circle, draw_deep_rect};
    pub use crate::stats::{deep_stats, flat_stats};
    pub use crate::{DeepImage, Filter, Image, ALPHA, DEPTH, DEPTH_BACK};
}
