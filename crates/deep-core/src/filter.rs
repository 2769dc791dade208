//! Reconstruction filters for splatting point samples into a raster.
//!
//! A [`Filter`] answers two questions for a continuous sample position:
//! which discrete pixels along an axis it touches ([`Filter::min`] /
//! [`Filter::max`], an inclusive range), and how much weight a given pixel
//! receives ([`Filter::weight`]).
//!
//! | Filter | Range | Weight |
//! |--------|-------|--------|
//! | Nearest | `round(p)` | 1 |
//! | Linear | `floor(p)..=ceil(p)` | bilinear tent |
//! | Gaussian(w) | `floor(p - w/2)..=ceil(p + w/2)` | 2D gaussian, sigma = (w + 1) / 6 |
//!
//! Weights are not normalized; [`Image::add_sample`](crate::Image::add_sample)
//! accumulates them additively.
//!
//! # Parsing
//!
//! Filters parse from the textual form used on the command line:
//!
//! ```rust
//! use deep_core::Filter;
//!
//! assert_eq!("Nearest".parse::<Filter>().unwrap(), Filter::Nearest);
//! assert_eq!("gaussian 4".parse::<Filter>().unwrap(), Filter::Gaussian { width: 4 });
//! assert_eq!("Gaussian".parse::<Filter>().unwrap(), Filter::Gaussian { width: 2 });
//! ```

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Gaussian width used when the textual form omits one.
pub const DEFAULT_GAUSSIAN_WIDTH: u32 = 2;

/// Reconstruction kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Single nearest pixel, weight 1.
    #[default]
    Nearest,
    /// Bilinear tent over the two nearest pixels per axis.
    Linear,
    /// Gaussian bell spanning `width` pixels.
    Gaussian {
        /// Footprint in pixels
        width: u32,
    },
}

impl Filter {
    /// First pixel affected by a sample at continuous coordinate `p`.
    #[inline]
    pub fn min(&self, p: f32) -> i64 {
        match *self {
            Filter::Nearest => p.round() as i64,
            Filter::Linear => p.floor() as i64,
            Filter::Gaussian { width } => (p - width as f32 / 2.0).floor() as i64,
        }
    }

    /// Last pixel (inclusive) affected by a sample at continuous coordinate `p`.
    #[inline]
    pub fn max(&self, p: f32) -> i64 {
        match *self {
            Filter::Nearest => p.round() as i64,
            Filter::Linear => p.ceil() as i64,
            Filter::Gaussian { width } => (p + width as f32 / 2.0).ceil() as i64,
        }
    }

    /// Clamps continuous coordinate `p` onto an axis of `size` pixels.
    ///
    /// Linear places pixel centers on integers and Gaussian on half
    /// integers, so the usable span differs. Nearest needs no clamping here
    /// because its single pixel is clamped by the caller.
    pub fn clamp_position(&self, p: f32, size: u32) -> f32 {
        match *self {
            Filter::Nearest => p,
            Filter::Linear => p.clamp(0.0, size.saturating_sub(1) as f32),
            Filter::Gaussian { .. } => p.clamp(0.0, size as f32),
        }
    }

    /// Weight of pixel `(x, y)` for a sample at `(sx, sy)` in pixel space.
    ///
    /// Always non-negative.
    pub fn weight(&self, x: i64, y: i64, sx: f32, sy: f32) -> f32 {
        match *self {
            Filter::Nearest => 1.0,
            Filter::Linear => {
                let wx = (1.0 - (x as f32 - sx).abs()).max(0.0);
                let wy = (1.0 - (y as f32 - sy).abs()).max(0.0);
                wx * wy
            }
            Filter::Gaussian { width } => {
                let sigma = (width as f32 + 1.0) / 6.0;
                let sigma2 = sigma * sigma;
                let dx = x as f32 + 0.5 - sx;
                let dy = y as f32 + 0.5 - sy;
                (-(dx * dx + dy * dy) / (2.0 * sigma2)).exp() / (2.0 * PI * sigma2)
            }
        }
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let kind = parts.next().unwrap_or("").to_ascii_lowercase();
        let filter = match kind.as_str() {
            "nearest" => Filter::Nearest,
            "linear" => Filter::Linear,
            "gaussian" => {
                let width = match parts.next() {
                    Some(w) => w.parse().map_err(|_| Error::InvalidFilter(s.to_string()))?,
                    None => DEFAULT_GAUSSIAN_WIDTH,
                };
                Filter::Gaussian { width }
            }
            _ => return Err(Error::InvalidFilter(s.to_string())),
        };
        if parts.next().is_some() {
            return Err(Error::InvalidFilter(s.to_string()));
        }
        Ok(filter)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Nearest => write!(f, "Nearest"),
            Filter::Linear => write!(f, "Linear"),
            Filter::Gaussian { width } => write!(f, "Gaussian {}", width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_clamp_position() {
        assert_eq!(Filter::Nearest.clamp_position(9.0, 4), 9.0);
        assert_eq!(Filter::Linear.clamp_position(4.0, 4), 3.0);
        assert_eq!(Filter::Linear.clamp_position(1.25, 4), 1.25);
        assert_eq!(Filter::Gaussian { width: 2 }.clamp_position(-1.0, 4), 0.0);
        assert_eq!(Filter::Gaussian { width: 2 }.clamp_position(4.0, 4), 4.0);
    }

    #[test]
    fn test_nearest_range() {
        let f = Filter::Nearest;
        assert_eq!((f.min(3.4), f.max(3.4)), (3, 3));
        assert_eq!((f.min(3.5), f.max(3.5)), (4, 4));
        assert_eq!(f.weight(3, 3, 3.4, 9.0), 1.0);
    }

    #[test]
    fn test_linear_tent() {
        let f = Filter::Linear;
        assert_eq!((f.min(2.25), f.max(2.25)), (2, 3));
        assert_abs_diff_eq!(f.weight(2, 0, 2.25, 0.0), 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(f.weight(3, 0, 2.25, 0.0), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(f.weight(2, 1, 2.25, 0.5), 0.375, epsilon = 1e-6);
        assert_eq!(f.weight(5, 0, 2.25, 0.0), 0.0);
    }

    #[test]
    fn test_gaussian_range_and_peak() {
        let f = Filter::Gaussian { width: 2 };
        assert_eq!(f.min(10.3), 9);
        assert_eq!(f.max(10.3), 12);

        // sigma = 0.5 -> peak = 1 / (2 pi 0.25)
        let peak = f.weight(4, 4, 4.5, 4.5);
        assert_abs_diff_eq!(peak, 1.0 / (0.5 * PI), epsilon = 1e-5);
        assert!(f.weight(5, 4, 4.5, 4.5) < peak);
        assert!(f.weight(9, 9, 4.5, 4.5) >= 0.0);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Linear".parse::<Filter>().unwrap(), Filter::Linear);
        assert_eq!("NEAREST".parse::<Filter>().unwrap(), Filter::Nearest);
        assert_eq!(" Gaussian 3 ".parse::<Filter>().unwrap(), Filter::Gaussian { width: 3 });
        assert!("Box".parse::<Filter>().is_err());
        assert!("Gaussian wide".parse::<Filter>().is_err());
        assert!("Linear 2".parse::<Filter>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for f in [Filter::Nearest, Filter::Linear, Filter::Gaussian { width: 5 }] {
            assert_eq!(f.to_string().parse::<Filter>().unwrap(), f);
        }
    }
}
