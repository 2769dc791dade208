//! Summary statistics for deep and flat images.
//!
//! [`deep_stats`] and [`flat_stats`] return plain data; printing is left to
//! the caller. Both types implement [`Display`](std::fmt::Display) for a
//! human-readable report and, with the `serde` feature, `Serialize` for JSON.

use std::fmt;

use crate::{DeepImage, Image};

/// Value range of one channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelStats {
    /// Channel name
    pub name: String,
    /// Smallest value, 0 for an empty channel
    pub min: f32,
    /// Largest value, 0 for an empty channel
    pub max: f32,
}

impl ChannelStats {
    fn from_values<'a>(name: &str, values: impl IntoIterator<Item = &'a f32>) -> Self {
        let (min, max) = values
            .into_iter()
            .fold(None, |acc: Option<(f32, f32)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 0.0));
        Self {
            name: name.to_string(),
            min,
            max,
        }
    }
}

/// Statistics about a deep image.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeepStats {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Value ranges in channel-store order
    pub channels: Vec<ChannelStats>,
    /// Total number of samples
    pub num_elements: usize,
    /// Largest sample count of any pixel
    pub max_elements_in_pixel: usize,
    /// Pixels without samples
    pub empty_pixels: usize,
    /// Average samples per pixel
    pub avg_samples_per_pixel: f64,
}

/// Computes statistics about a deep image.
pub fn deep_stats(image: &DeepImage) -> DeepStats {
    let channels = image
        .channel_store()
        .map(|(name, values)| ChannelStats::from_values(name, values))
        .collect();
    let empty_pixels = image.index_lists().filter(|l| l.is_empty()).count();
    let pixels = image.pixel_count().max(1);

    DeepStats {
        width: image.width(),
        height: image.height(),
        channels,
        num_elements: image.num_elements(),
        max_elements_in_pixel: image.max_elements_in_pixel(),
        empty_pixels,
        avg_samples_per_pixel: image.num_elements() as f64 / pixels as f64,
    }
}

impl fmt::Display for DeepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution: {}x{}", self.width, self.height)?;
        writeln!(f, "Channels: {}", self.channels.len())?;
        for c in &self.channels {
            writeln!(f, "  {}: min {} max {}", c.name, c.min, c.max)?;
        }
        writeln!(f, "Samples: {}", self.num_elements)?;
        writeln!(f, "Max samples per pixel: {}", self.max_elements_in_pixel)?;
        writeln!(f, "Avg samples per pixel: {:.3}", self.avg_samples_per_pixel)?;
        write!(f, "Empty pixels: {}", self.empty_pixels)
    }
}

/// Statistics about a flat image.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FlatStats {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Value ranges in channel order
    pub channels: Vec<ChannelStats>,
}

/// Computes per-channel value ranges of a flat image.
pub fn flat_stats(image: &Image) -> FlatStats {
    let nch = image.channels();
    let channels = image
        .channel_names()
        .iter()
        .enumerate()
        .map(|(c, name)| ChannelStats::from_values(name, image.as_slice().iter().skip(c).step_by(nch)))
        .collect();
    FlatStats {
        width: image.width(),
        height: image.height(),
        channels,
    }
}

impl fmt::Display for FlatStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolution: {}x{}", self.width, self.height)?;
        for c in &self.channels {
            write!(f, "\n  {}: min {} max {}", c.name, c.min, c.max)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Filter;

    #[test]
    fn test_deep_stats() {
        let mut img = DeepImage::new(2, 2, &["R", "A", "Z"]).unwrap();
        img.add_pixel_sample(0, 0, &[0.5, 1.0, 3.0]).unwrap();
        img.add_pixel_sample(0, 0, &[0.25, -1.0, 1.0]).unwrap();
        img.add_pixel_sample(1, 1, &[1.0, 0.5, 7.0]).unwrap();

        let stats = deep_stats(&img);
        assert_eq!(stats.num_elements, 3);
        assert_eq!(stats.max_elements_in_pixel, 2);
        assert_eq!(stats.empty_pixels, 2);
        assert_eq!(stats.avg_samples_per_pixel, 0.75);

        let names: Vec<_> = stats.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "R", "Z"]);
        assert_eq!(stats.channels[0].min, -1.0);
        assert_eq!(stats.channels[2].max, 7.0);

        let text = stats.to_string();
        assert!(text.contains("Resolution: 2x2"));
        assert!(text.contains("Max samples per pixel: 2"));
    }

    #[test]
    fn test_empty_deep_stats() {
        let img = DeepImage::new(3, 1, &["Z"]).unwrap();
        let stats = deep_stats(&img);
        assert_eq!(stats.empty_pixels, 3);
        assert_eq!(stats.channels[0], ChannelStats { name: "Z".into(), min: 0.0, max: 0.0 });
    }

    #[test]
    fn test_flat_stats() {
        let mut img = Image::new(2, 1, &["Y", "A"], Filter::Nearest);
        *img.data_mut(0, 1, 0).unwrap() = 4.0;
        *img.data_mut(0, 0, 1).unwrap() = -2.0;
        let stats = flat_stats(&img);
        assert_eq!(stats.channels[0].max, 4.0);
        assert_eq!(stats.channels[0].min, 0.0);
        assert_eq!(stats.channels[1].min, -2.0);
        assert!(stats.to_string().contains("Y: min 0 max 4"));
    }
}
