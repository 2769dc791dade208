//! Error types for deep-core operations.
//!
//! A single [`Error`] enum covers every failure the core data structures can
//! report:
//! - Construction of a [`DeepImage`](crate::DeepImage) or [`Image`](crate::Image)
//!   with an unusable channel list or size
//! - Sample appends whose value list does not fit the channel set
//! - Direct cell access outside the raster
//! - Merges between incompatible deep images
//! - Assembling a deep image from decoded parts that break its invariants
//!
//! # Usage
//!
//! ```rust
//! use deep_core::{DeepImage, Error};
//!
//! let err = DeepImage::new(4, 4, &["R", "G", "B", "A"]).unwrap_err();
//! assert!(matches!(err, Error::MissingDepthChannel));
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - derive for [`std::error::Error`] and [`std::fmt::Display`]
//!
//! # Used By
//!
//! - [`crate::deep::DeepImage`] - construction, sample appends, merges
//! - [`crate::image::Image`] - bounds-checked cell access
//! - `deep-io` - wrapped as `IoError::Core`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, mutating or reading deep and flat images.
///
/// # Categories
///
/// - **Channel set errors**: [`MissingDepthChannel`](Error::MissingDepthChannel),
///   [`DuplicateChannel`](Error::DuplicateChannel),
///   [`InvalidChannelName`](Error::InvalidChannelName),
///   [`MissingChannel`](Error::MissingChannel)
/// - **Sample errors**: [`SampleLength`](Error::SampleLength)
/// - **Bounds errors**: [`OutOfBounds`](Error::OutOfBounds),
///   [`ChannelOutOfRange`](Error::ChannelOutOfRange)
/// - **Dimension errors**: [`DimensionMismatch`](Error::DimensionMismatch),
///   [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Layout errors**: [`CorruptIndex`](Error::CorruptIndex),
///   [`ChannelLength`](Error::ChannelLength)
#[derive(Debug, Error)]
pub enum Error {
    /// The channel list passed to a deep image does not contain `Z`.
    #[error("deep image requires a depth channel \"{}\"", crate::DEPTH)]
    MissingDepthChannel,

    /// The same channel name appears twice in a channel list.
    #[error("duplicate channel name \"{0}\"")]
    DuplicateChannel(String),

    /// A channel name is empty or contains a NUL or newline byte.
    ///
    /// Those bytes delimit names in the persisted format.
    #[error("invalid channel name {0:?}")]
    InvalidChannelName(String),

    /// A channel required by the operation does not exist.
    #[error("missing channel \"{0}\"")]
    MissingChannel(String),

    /// A sample value list does not match the channel count it is written to.
    #[error("sample has {got} values, expected {expected}")]
    SampleLength {
        /// Number of values the channel set requires
        expected: usize,
        /// Number of values supplied
        got: usize,
    },

    /// Pixel coordinates are outside the raster.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was accessed
        x: u32,
        /// Y coordinate that was accessed
        y: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Channel index is outside the channel list.
    #[error("channel {channel} out of range for {channels} channels")]
    ChannelOutOfRange {
        /// Channel index that was accessed
        channel: usize,
        /// Number of channels in the image
        channels: usize,
    },

    /// Two images that must share a size do not.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First image width
        a_width: u32,
        /// First image height
        a_height: u32,
        /// Second image width
        b_width: u32,
        /// Second image height
        b_height: u32,
    },

    /// Width or height cannot be used for an image.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Why the dimensions were rejected
        reason: String,
    },

    /// A per-pixel index refers past the end of the channel store.
    #[error("pixel {pixel} references sample {index} but only {elements} exist")]
    CorruptIndex {
        /// Linear pixel index
        pixel: usize,
        /// Offending sample index
        index: u32,
        /// Number of samples in the channel store
        elements: usize,
    },

    /// A channel's sample count differs from the depth channel's.
    #[error("channel \"{name}\" holds {got} samples, expected {expected}")]
    ChannelLength {
        /// Channel name
        name: String,
        /// Sample count of the depth channel
        expected: usize,
        /// Sample count of this channel
        got: usize,
    },

    /// A textual filter description could not be parsed.
    #[error("invalid filter \"{0}\" (expected Nearest, Linear or Gaussian <width>)")]
    InvalidFilter(String),

    /// A textual render mode could not be parsed.
    #[error("invalid render mode \"{0}\" (expected auto, discrete or linear)")]
    InvalidRenderMode(String),
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::SampleLength`] error.
    #[inline]
    pub fn sample_length(expected: usize, got: usize) -> Self {
        Self::SampleLength { expected, got }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::MissingChannel`] error.
    #[inline]
    pub fn missing_channel(name: impl Into<String>) -> Self {
        Self::MissingChannel(name.into())
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. } | Self::ChannelOutOfRange { .. })
    }

    /// Returns `true` if the error means two images could not be combined.
    #[inline]
    pub fn is_merge_error(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. } | Self::MissingChannel(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(100, 50, 80, 60);
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
        assert!(msg.contains("80x60"));
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((640, 480), (320, 240));
        let msg = err.to_string();
        assert!(msg.contains("640x480"));
        assert!(msg.contains("320x240"));
        assert!(err.is_merge_error());
    }

    #[test]
    fn test_missing_depth_mentions_z() {
        assert!(Error::MissingDepthChannel.to_string().contains("\"Z\""));
    }

    #[test]
    fn test_sample_length() {
        let err = Error::sample_length(6, 4);
        assert_eq!(err.to_string(), "sample has 4 values, expected 6");
        assert!(!err.is_bounds_error());
    }
}
