//! # deep-io
//!
//! File I/O for deep images.
//!
//! - [`sdf`] - the simple deep file codec ([`SdfReader`], [`SdfWriter`])
//! - [`png`] - 8-bit PNG output for flat renders ([`PngSink`])
//! - [`ingest`] - conversion from deep shadow maps ([`DeepShadowSource`])
//!
//! # Example
//!
//! ```rust,ignore
//! use deep_core::{render, RenderMode};
//!
//! let deep = deep_io::read("scene.sdf")?;
//! let flat = render(&deep, RenderMode::Auto);
//! deep_io::png::write_image("scene.png", &flat)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `png` - PNG output (enabled by default)

#![warn(missing_docs)]

pub mod error;
pub mod ingest;
#[cfg(feature = "png")]
pub mod png;
pub mod sdf;
pub mod traits;

pub use error::{IoError, IoResult};
pub use ingest::{ingest, DeepShadowSource, DepthInterp, ShadowSample};
#[cfg(feature = "png")]
pub use png::PngSink;
pub use sdf::{read, write, SdfReader, SdfWriter, FORMAT_VERSION};
pub use traits::{DeepReader, DeepWriter, FlatSink};
