//! Flat raster image with filtered sample splatting.
//!
//! [`Image`] is a dense `width x height x channels` buffer of `f32` values.
//! It is the output of [`render`](crate::render::render) and the input to
//! flat-raster sinks.
//!
//! # Memory Layout
//!
//! Pixels are stored row-major, top-to-bottom, channels interleaved:
//!
//! ```text
//! Memory: [R G B A R G B A ...]  <- Row 0
//!         [R G B A R G B A ...]  <- Row 1
//!         ...
//! ```
//!
//! # Splatting
//!
//! [`Image::add_sample`] takes a normalized `[0, 1)` position, spreads the
//! values over the pixels covered by the image's [`Filter`] and *adds* them,
//! so many sparse point samples build up a dense reconstruction:
//!
//! ```rust
//! use deep_core::{Filter, Image};
//!
//! let mut img = Image::new(8, 8, &["R", "G", "B", "A"], Filter::Nearest);
//! img.add_sample(0.5, 0.5, &[1.0, 0.0, 0.0, 1.0]).unwrap();
//! img.add_sample(0.5, 0.5, &[1.0, 0.0, 0.0, 1.0]).unwrap();
//! assert_eq!(img.data(4, 4, 0).unwrap(), 2.0);
//! ```
//!
//! # Direct Access
//!
//! [`Image::data`] / [`Image::data_mut`] are bounds checked and return
//! [`Error::OutOfBounds`] rather than clamping.

use crate::{Error, Filter, Result};

/// Dense multi-channel `f32` raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    channel_names: Vec<String>,
    data: Vec<f32>,
    filter: Filter,
}

impl Image {
    /// Creates a zero-filled image.
    pub fn new<S: AsRef<str>>(width: u32, height: u32, channel_names: &[S], filter: Filter) -> Self {
        let channel_names: Vec<String> = channel_names.iter().map(|s| s.as_ref().to_string()).collect();
        let len = width as usize * height as usize * channel_names.len();
        Self {
            width,
            height,
            channel_names,
            data: vec![0.0; len],
            filter,
        }
    }

    /// Returns the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channel_names.len()
    }

    /// Returns the channel names in storage order.
    #[inline]
    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    /// Returns the reconstruction filter used by [`add_sample`](Self::add_sample).
    #[inline]
    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Interleaved pixel buffer, pixel-major and channel-minor.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable interleaved pixel buffer.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the image and returns its interleaved buffer.
    pub fn into_raw(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    fn offset(&self, y: u32, x: u32, c: usize) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(Error::out_of_bounds(x, y, self.width, self.height));
        }
        if c >= self.channels() {
            return Err(Error::ChannelOutOfRange {
                channel: c,
                channels: self.channels(),
            });
        }
        Ok((y as usize * self.width as usize + x as usize) * self.channels() + c)
    }

    /// Reads channel `c` of pixel `(y, x)`.
    pub fn data(&self, y: u32, x: u32, c: usize) -> Result<f32> {
        let offset = self.offset(y, x, c)?;
        Ok(self.data[offset])
    }

    /// Mutable access to channel `c` of pixel `(y, x)`.
    pub fn data_mut(&mut self, y: u32, x: u32, c: usize) -> Result<&mut f32> {
        let offset = self.offset(y, x, c)?;
        Ok(&mut self.data[offset])
    }

    /// All channels of pixel `(y, x)`.
    pub fn pixel(&self, y: u32, x: u32) -> Result<&[f32]> {
        if self.channels() == 0 {
            return Ok(&[]);
        }
        let start = self.offset(y, x, 0)?;
        Ok(&self.data[start..start + self.channels()])
    }

    /// Mutable slice over all channels of pixel `(y, x)`.
    pub fn pixel_mut(&mut self, y: u32, x: u32) -> Result<&mut [f32]> {
        if self.channels() == 0 {
            return Ok(&mut []);
        }
        let start = self.offset(y, x, 0)?;
        let n = self.channels();
        Ok(&mut self.data[start..start + n])
    }

    /// Splats `values` at normalized position `(y, x)`.
    ///
    /// The position is scaled to pixel space and every pixel in the filter's
    /// footprint receives `value * weight`, added to what is already there.
    /// Positions and footprints past the raster are clamped to its edge, so
    /// no sample is lost.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SampleLength`] if `values` does not hold exactly one
    /// value per channel. The image is left unchanged.
    pub fn add_sample(&mut self, y: f32, x: f32, values: &[f32]) -> Result<()> {
        if values.len() != self.channels() {
            return Err(Error::sample_length(self.channels(), values.len()));
        }
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }

        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        let fx = self.filter.clamp_position(x * self.width as f32, self.width);
        let fy = self.filter.clamp_position(y * self.height as f32, self.height);

        // Each bound is clamped on its own, so an off-raster footprint lands on the edge.
        let x0 = self.filter.min(fx).clamp(0, max_x);
        let x1 = self.filter.max(fx).clamp(0, max_x);
        let y0 = self.filter.min(fy).clamp(0, max_y);
        let y1 = self.filter.max(fy).clamp(0, max_y);

        let nch = self.channels();
        for ry in y0..=y1 {
            for rx in x0..=x1 {
                let weight = self.filter.weight(rx, ry, fx, fy);
                let start = (ry as usize * self.width as usize + rx as usize) * nch;
                for (dst, v) in self.data[start..start + nch].iter_mut().zip(values) {
                    *dst += v * weight;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rgba(w: u32, h: u32, filter: Filter) -> Image {
        Image::new(w, h, &["R", "G", "B", "A"], filter)
    }

    #[test]
    fn test_new_is_zeroed() {
        let img = rgba(4, 3, Filter::Nearest);
        assert_eq!(img.as_slice().len(), 4 * 3 * 4);
        assert!(img.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_data_bounds_are_checked() {
        let mut img = rgba(4, 3, Filter::Nearest);
        assert!(img.data(2, 3, 3).is_ok());
        assert!(img.data(3, 0, 0).unwrap_err().is_bounds_error());
        assert!(img.data(0, 4, 0).unwrap_err().is_bounds_error());
        assert!(matches!(img.data(0, 0, 4), Err(Error::ChannelOutOfRange { .. })));

        *img.data_mut(1, 2, 1).unwrap() = 0.5;
        assert_eq!(img.data(1, 2, 1).unwrap(), 0.5);
        assert_eq!(img.pixel(1, 2).unwrap(), &[0.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_add_sample_accumulates() {
        let mut img = rgba(10, 10, Filter::Nearest);
        img.add_sample(0.32, 0.51, &[0.25, 0.5, 1.0, 1.0]).unwrap();
        img.add_sample(0.32, 0.51, &[0.25, 0.5, 1.0, 1.0]).unwrap();
        // 3.2 -> row 3, 5.1 -> column 5
        assert_eq!(img.pixel(3, 5).unwrap(), &[0.5, 1.0, 2.0, 2.0]);
        let total: f32 = img.as_slice().iter().sum();
        assert_abs_diff_eq!(total, 5.5);
    }

    #[test]
    fn test_add_sample_linear_splits_weight() {
        let mut img = Image::new(4, 1, &["Y"], Filter::Linear);
        // x = 0.3125 * 4 = 1.25 -> pixels 1 and 2
        img.add_sample(0.0, 0.3125, &[1.0]).unwrap();
        assert_abs_diff_eq!(img.data(0, 1, 0).unwrap(), 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(img.data(0, 2, 0).unwrap(), 0.25, epsilon = 1e-6);
        assert_eq!(img.data(0, 0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_add_sample_clamps_to_raster() {
        let mut img = Image::new(4, 4, &["Y"], Filter::Gaussian { width: 4 });
        img.add_sample(0.0, 0.0, &[1.0]).unwrap();
        img.add_sample(0.99, 0.99, &[1.0]).unwrap();
        assert!(img.data(0, 0, 0).unwrap() > 0.0);
        assert!(img.data(3, 3, 0).unwrap() > 0.0);

        // Far outside the raster still reaches the nearest edge.
        let mut img = Image::new(4, 4, &["Y"], Filter::Gaussian { width: 2 });
        img.add_sample(5.0, 5.0, &[1.0]).unwrap();
        assert!(img.data(3, 3, 0).unwrap() > 0.0);
    }

    #[test]
    fn test_add_sample_at_far_edge_is_kept() {
        // round(1.0 * 4) = 4 lies past the last column
        let mut img = Image::new(4, 4, &["Y"], Filter::Nearest);
        img.add_sample(1.0, 1.0, &[1.0]).unwrap();
        assert_eq!(img.data(3, 3, 0).unwrap(), 1.0);
        assert_eq!(img.as_slice().iter().sum::<f32>(), 1.0);

        img.add_sample(5.0, -2.0, &[1.0]).unwrap();
        assert_eq!(img.data(3, 0, 0).unwrap(), 1.0);

        let mut img = Image::new(4, 1, &["Y"], Filter::Linear);
        img.add_sample(0.0, 1.0, &[1.0]).unwrap();
        assert_abs_diff_eq!(img.data(0, 3, 0).unwrap(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(img.as_slice().iter().sum::<f32>(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_add_sample_rejects_wrong_length() {
        let mut img = rgba(2, 2, Filter::Nearest);
        let err = img.add_sample(0.0, 0.0, &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::SampleLength { expected: 4, got: 2 }));
        assert!(img.as_slice().iter().all(|&v| v == 0.0));
    }
}
