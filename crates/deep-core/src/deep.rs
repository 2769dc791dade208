//! Sparse deep image storage.
//!
//! A [`DeepImage`] stores an arbitrary number of samples per pixel. Samples
//! live in a shared *channel store*: one growable `Vec<f32>` per channel name,
//! all of equal length. Each pixel owns an ordered list of indices into that
//! store, in insertion order (not depth order).
//!
//! ```text
//! channel store            per-pixel index lists
//! A : [0.5, 1.0, 0.5]      (0,0): [0, 2]
//! B : [...]                (0,1): []
//! Z : [1.0, 2.0, 4.0]      (1,0): [1]
//! ```
//!
//! # Invariants
//!
//! - Every channel in the store has the same length, [`DeepImage::num_elements`].
//! - Every index in every pixel list is `< num_elements`.
//! - The depth channel `Z` always exists.
//! - Width, height and the declared channel order never change.
//!
//! Growth is append-only: [`add_sample`](DeepImage::add_sample),
//! [`add_pixel_sample`](DeepImage::add_pixel_sample),
//! [`add_deep_image`](DeepImage::add_deep_image) and
//! [`subtract_deep_image`](DeepImage::subtract_deep_image).
//!
//! # Example
//!
//! ```rust
//! use deep_core::DeepImage;
//!
//! let mut img = DeepImage::new(2, 2, &["R", "G", "B", "A", "Z"]).unwrap();
//! img.add_sample(1.0, 0.0, 0.0, &[1.0, 0.0, 0.0, 1.0]).unwrap();
//! img.add_sample(2.0, 0.0, 0.0, &[0.0, 1.0, 0.0, 1.0]).unwrap();
//!
//! assert_eq!(img.num_elements(), 2);
//! assert_eq!(img.render_pixel(0, 0), vec![1.0, 0.0, 0.0, 1.0]);
//! ```

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::{Error, Result, ALPHA, DEPTH, DEPTH_BACK};

/// Image of per-pixel sample lists over a shared channel store.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepImage {
    width: u32,
    height: u32,
    /// Channel names in construction order
    channel_names: Vec<String>,
    /// Channel name -> samples, iterated in byte-wise name order
    store: BTreeMap<String, Vec<f32>>,
    /// Row-major per-pixel indices into `store`
    index: Vec<Vec<u32>>,
}

impl DeepImage {
    /// Creates an empty deep image.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingDepthChannel`] if `channel_names` lacks `Z`
    /// - [`Error::DuplicateChannel`] / [`Error::InvalidChannelName`] for
    ///   unusable names
    /// - [`Error::InvalidDimensions`] if width or height is zero
    pub fn new<S: AsRef<str>>(width: u32, height: u32, channel_names: &[S]) -> Result<Self> {
        let channel_names: Vec<String> = channel_names.iter().map(|s| s.as_ref().to_string()).collect();
        validate_channels(&channel_names)?;
        if width == 0 || height == 0 {
            return Err(Error::invalid_dimensions(width, height, "deep image must contain pixels"));
        }

        let store = channel_names
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "pixel count overflows"))?;
        let index = vec![Vec::new(); pixels];

        Ok(Self {
            width,
            height,
            channel_names,
            store,
            index,
        })
    }

    /// Assembles a deep image from an already populated channel store and
    /// index lists, checking every invariant.
    ///
    /// This is the entry point for decoders.
    pub fn from_parts(
        width: u32,
        height: u32,
        channel_names: Vec<String>,
        store: BTreeMap<String, Vec<f32>>,
        index: Vec<Vec<u32>>,
    ) -> Result<Self> {
        let mut image = Self::new(width, height, &channel_names)?;

        if index.len() != image.index.len() {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("{} index lists for {} pixels", index.len(), image.index.len()),
            ));
        }

        let store_names: HashSet<&str> = store.keys().map(String::as_str).collect();
        for name in &channel_names {
            if !store_names.contains(name.as_str()) {
                return Err(Error::missing_channel(name.as_str()));
            }
        }
        if let Some(extra) = store.keys().find(|k| !image.store.contains_key(k.as_str())) {
            return Err(Error::InvalidChannelName(extra.clone()));
        }

        let elements = store.get(DEPTH).map_or(0, Vec::len);
        for (name, values) in &store {
            if values.len() != elements {
                return Err(Error::ChannelLength {
                    name: name.clone(),
                    expected: elements,
                    got: values.len(),
                });
            }
        }
        for (pixel, list) in index.iter().enumerate() {
            if let Some(&bad) = list.iter().find(|&&i| i as usize >= elements) {
                return Err(Error::CorruptIndex {
                    pixel,
                    index: bad,
                    elements,
                });
            }
        }

        image.store = store;
        image.index = index;
        Ok(image)
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

    /// Returns the total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.index.len()
    }

    /// Number of channels in the channel store.
    #[inline]
    pub fn channels(&self) -> usize {
        self.store.len()
    }

    /// Number of declared channels.
    #[inline]
    pub fn channels_in_order(&self) -> usize {
        self.channel_names.len()
    }

    /// Channel names in declared (construction) order.
    #[inline]
    pub fn channel_names_in_order(&self) -> &[String] {
        &self.channel_names
    }

    /// Channel names in channel-store iteration order.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.store.keys().map(String::as_str)
    }

    /// Declared channel names without `Z` and `ZBack`.
    ///
    /// This is the channel order of rendered output.
    pub fn channel_names_no_depth(&self) -> Vec<String> {
        self.channel_names
            .iter()
            .filter(|n| !is_depth_channel(n))
            .cloned()
            .collect()
    }

    /// `true` if the image carries volumetric samples.
    #[inline]
    pub fn has_zback(&self) -> bool {
        self.store.contains_key(DEPTH_BACK)
    }

    /// `true` if the image has an alpha channel.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.store.contains_key(ALPHA)
    }

    /// Number of samples in the channel store.
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.store.get(DEPTH).map_or(0, Vec::len)
    }

    /// Largest sample list of any single pixel.
    pub fn max_elements_in_pixel(&self) -> usize {
        self.index.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Samples of one channel, or `None` if it does not exist.
    pub fn channel(&self, name: &str) -> Option<&[f32]> {
        self.store.get(name).map(Vec::as_slice)
    }

    /// Iterates the channel store in its deterministic (byte-wise name) order.
    pub fn channel_store(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.store.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Per-pixel index lists in row-major order.
    pub fn index_lists(&self) -> impl Iterator<Item = &[u32]> {
        self.index.iter().map(Vec::as_slice)
    }

    /// Sample indices of pixel `(y, x)` in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] outside the raster.
    pub fn pixel_indices(&self, y: u32, x: u32) -> Result<&[u32]> {
        if x >= self.width || y >= self.height {
            return Err(Error::out_of_bounds(x, y, self.width, self.height));
        }
        Ok(&self.index[self.linear(y, x)])
    }

    #[inline]
    fn linear(&self, y: u32, x: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Sample indices of pixel `(y, x)` with the coordinates clamped to the raster.
    pub(crate) fn clamped_indices(&self, y: u32, x: u32) -> &[u32] {
        let y = y.min(self.height - 1);
        let x = x.min(self.width - 1);
        &self.index[self.linear(y, x)]
    }

    /// Appends one sample at normalized position `(y, x)` with depth `z`.
    ///
    /// `values` holds one entry per declared channel except `Z`, in declared
    /// order. The pixel is the nearest bucket,
    /// `(clamp(floor(y * height)), clamp(floor(x * width)))`.
    /// Deep samples are never filtered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SampleLength`] on a length mismatch, leaving the
    /// image unchanged.
    pub fn add_sample(&mut self, z: f32, y: f32, x: f32, values: &[f32]) -> Result<()> {
        let expected = self.channel_names.len() - 1;
        if values.len() != expected {
            return Err(Error::sample_length(expected, values.len()));
        }

        let iy = bucket(y, self.height);
        let ix = bucket(x, self.width);

        let mut values = values.iter();
        for name in &self.channel_names {
            let value = if name == DEPTH { Some(z) } else { values.next().copied() };
            if let (Some(v), Some(channel)) = (value, self.store.get_mut(name)) {
                channel.push(v);
            }
        }
        self.push_index(iy, ix);
        Ok(())
    }

    /// Appends one fully specified sample to pixel `(y, x)`.
    ///
    /// `values` holds every declared channel, `Z` and `ZBack` included, in
    /// declared order. Coordinates past the raster are clamped to the last
    /// row/column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SampleLength`] on a length mismatch, leaving the
    /// image unchanged.
    pub fn add_pixel_sample(&mut self, y: u32, x: u32, values: &[f32]) -> Result<()> {
        if values.len() != self.channel_names.len() {
            return Err(Error::sample_length(self.channel_names.len(), values.len()));
        }
        for (name, &v) in self.channel_names.iter().zip(values) {
            if let Some(channel) = self.store.get_mut(name) {
                channel.push(v);
            }
        }
        self.push_index(y.min(self.height - 1), x.min(self.width - 1));
        Ok(())
    }

    fn push_index(&mut self, y: u32, x: u32) {
        let index = (self.num_elements() - 1) as u32;
        let pixel = self.linear(y, x);
        self.index[pixel].push(index);
    }

    /// Checks that `other` can be appended to `self`.
    fn check_compatible(&self, other: &DeepImage) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::dimension_mismatch(
                (self.width, self.height),
                (other.width, other.height),
            ));
        }
        if let Some(missing) = self.store.keys().find(|k| !other.store.contains_key(k.as_str())) {
            return Err(Error::missing_channel(missing.as_str()));
        }
        Ok(())
    }

    /// Appends `other`'s samples after this image's samples.
    ///
    /// Returns the element count before the append.
    fn append(&mut self, other: &DeepImage) -> usize {
        let base = self.num_elements();
        for (dst, src) in self.index.iter_mut().zip(&other.index) {
            dst.extend(src.iter().map(|&i| base as u32 + i));
        }
        for (name, values) in self.store.iter_mut() {
            if let Some(src) = other.store.get(name) {
                values.extend_from_slice(src);
            }
        }
        base
    }

    /// Merges every sample of `other` into this image.
    ///
    /// `other` must have the same size and at least every channel this image
    /// has. Channels only `other` has are dropped. Each pixel keeps its own
    /// samples first, followed by `other`'s in their original order.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] or [`Error::MissingChannel`]. On error
    /// `self` is unchanged.
    pub fn add_deep_image(&mut self, other: &DeepImage) -> Result<()> {
        if let Err(e) = self.check_compatible(other) {
            warn!(error = %e, "refusing to add deep image");
            return Err(e);
        }
        let base = self.append(other);
        debug!(base, added = other.num_elements(), "added deep image");
        Ok(())
    }

    /// Merges `other` as a holdout.
    ///
    /// Same as [`add_deep_image`](Self::add_deep_image), then negates the
    /// alpha of every appended sample. Negative alpha marks a cutout, which
    /// removes coverage instead of adding color when rendered.
    ///
    /// # Errors
    ///
    /// As for `add_deep_image`, plus [`Error::MissingChannel`] when this image
    /// has no alpha channel. On error `self` is unchanged.
    pub fn subtract_deep_image(&mut self, other: &DeepImage) -> Result<()> {
        let checked = if self.has_alpha() {
            self.check_compatible(other)
        } else {
            Err(Error::missing_channel(ALPHA))
        };
        if let Err(e) = checked {
            warn!(error = %e, "refusing to subtract deep image");
            return Err(e);
        }

        let base = self.append(other);
        if let Some(alpha) = self.store.get_mut(ALPHA) {
            for a in &mut alpha[base..] {
                *a = -*a;
            }
        }
        debug!(base, subtracted = other.num_elements(), "subtracted deep image");
        Ok(())
    }
}

/// `true` for the reserved depth channel names.
#[inline]
pub fn is_depth_channel(name: &str) -> bool {
    name == DEPTH || name == DEPTH_BACK
}

fn bucket(t: f32, size: u32) -> u32 {
    let max = size as i64 - 1;
    ((t * size as f32).floor() as i64).clamp(0, max) as u32
}

fn validate_channels(names: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if name.is_empty() || name.contains('\0') || name.contains('\n') {
            return Err(Error::InvalidChannelName(name.clone()));
        }
        if !seen.insert(name.as_str()) {
            return Err(Error::DuplicateChannel(name.clone()));
        }
    }
    if !seen.contains(DEPTH) {
        return Err(Error::MissingDepthChannel);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RGBAZ: [&str; 5] = ["R", "G", "B", "A", "Z"];

    #[test]
    fn test_new_requires_depth() {
        assert!(DeepImage::new(4, 4, &RGBAZ).is_ok());
        assert!(DeepImage::new(4, 4, &["Z"]).is_ok());
        assert!(matches!(
            DeepImage::new(4, 4, &["R", "G", "B", "A"]),
            Err(Error::MissingDepthChannel)
        ));
    }

    #[test]
    fn test_new_rejects_bad_names() {
        assert!(matches!(
            DeepImage::new(1, 1, &["Z", "A", "A"]),
            Err(Error::DuplicateChannel(_))
        ));
        assert!(matches!(
            DeepImage::new(1, 1, &["Z", "bad\nname"]),
            Err(Error::InvalidChannelName(_))
        ));
        assert!(matches!(DeepImage::new(1, 1, &["Z", ""]), Err(Error::InvalidChannelName(_))));
        assert!(DeepImage::new(0, 4, &["Z"]).is_err());
    }

    #[test]
    fn test_channel_orders() {
        let img = DeepImage::new(1, 1, &["R", "G", "B", "A", "Z", "ZBack"]).unwrap();
        assert_eq!(img.channels(), 6);
        assert_eq!(img.channels_in_order(), 6);
        assert_eq!(
            img.channel_names().collect::<Vec<_>>(),
            vec!["A", "B", "G", "R", "Z", "ZBack"]
        );
        assert_eq!(img.channel_names_no_depth(), vec!["R", "G", "B", "A"]);
        assert!(img.has_zback());
        assert!(img.has_alpha());
    }

    #[test]
    fn test_add_sample_counts() {
        let mut img = DeepImage::new(3, 2, &RGBAZ).unwrap();
        for k in 0..7 {
            img.add_sample(k as f32, 0.9, 0.1, &[0.1, 0.2, 0.3, 0.5]).unwrap();
        }
        assert_eq!(img.num_elements(), 7);
        for (_, values) in img.channel_store() {
            assert_eq!(values.len(), 7);
        }
        // y = 0.9 * 2 -> row 1, x = 0.1 * 3 -> column 0
        assert_eq!(img.pixel_indices(1, 0).unwrap(), &[0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(img.max_elements_in_pixel(), 7);
        assert_eq!(img.channel("Z").unwrap()[6], 6.0);
    }

    #[test]
    fn test_add_sample_maps_values_around_depth() {
        let mut img = DeepImage::new(1, 1, &["A", "Z", "ZBack"]).unwrap();
        img.add_sample(1.0, 0.0, 0.0, &[0.5, 3.0]).unwrap();
        assert_eq!(img.channel("A").unwrap(), &[0.5]);
        assert_eq!(img.channel("Z").unwrap(), &[1.0]);
        assert_eq!(img.channel("ZBack").unwrap(), &[3.0]);
    }

    #[test]
    fn test_add_sample_clamps_position() {
        let mut img = DeepImage::new(4, 4, &RGBAZ).unwrap();
        img.add_sample(1.0, -0.5, 1.5, &[0.0; 4]).unwrap();
        img.add_sample(1.0, 1.0, 0.0, &[0.0; 4]).unwrap();
        assert_eq!(img.pixel_indices(0, 3).unwrap(), &[0]);
        assert_eq!(img.pixel_indices(3, 0).unwrap(), &[1]);
        assert!(img.pixel_indices(4, 0).unwrap_err().is_bounds_error());
    }

    #[test]
    fn test_wrong_length_leaves_image_unchanged() {
        let mut img = DeepImage::new(2, 2, &RGBAZ).unwrap();
        assert!(img.add_sample(1.0, 0.0, 0.0, &[1.0, 1.0]).is_err());
        assert!(img.add_pixel_sample(0, 0, &[1.0, 1.0, 1.0, 1.0]).is_err());
        assert_eq!(img.num_elements(), 0);
        assert!(img.index_lists().all(|l| l.is_empty()));
    }

    #[test]
    fn test_add_pixel_sample() {
        let mut img = DeepImage::new(2, 2, &RGBAZ).unwrap();
        img.add_pixel_sample(1, 1, &[1.0, 0.0, 0.0, 1.0, 5.0]).unwrap();
        img.add_pixel_sample(9, 9, &[0.0, 1.0, 0.0, 1.0, 6.0]).unwrap();
        assert_eq!(img.pixel_indices(1, 1).unwrap(), &[0, 1]);
        assert_eq!(img.channel("Z").unwrap(), &[5.0, 6.0]);
    }

    #[test]
    fn test_add_deep_image_offsets_indices() {
        let mut a = DeepImage::new(2, 1, &RGBAZ).unwrap();
        a.add_pixel_sample(0, 0, &[1.0, 0.0, 0.0, 1.0, 1.0]).unwrap();
        a.add_pixel_sample(0, 1, &[1.0, 0.0, 0.0, 1.0, 1.0]).unwrap();

        let mut b = DeepImage::new(2, 1, &["R", "G", "B", "A", "Z", "extra"]).unwrap();
        b.add_pixel_sample(0, 0, &[0.0, 1.0, 0.0, 0.5, 2.0, 9.0]).unwrap();

        a.add_deep_image(&b).unwrap();
        assert_eq!(a.num_elements(), 3);
        assert_eq!(a.pixel_indices(0, 0).unwrap(), &[0, 2]);
        assert_eq!(a.pixel_indices(0, 1).unwrap(), &[1]);
        assert_eq!(a.channel("A").unwrap(), &[1.0, 1.0, 0.5]);
        assert!(a.channel("extra").is_none());
    }

    #[test]
    fn test_merge_rejects_missing_channel() {
        let mut a = DeepImage::new(2, 2, &RGBAZ).unwrap();
        a.add_pixel_sample(0, 0, &[1.0, 0.0, 0.0, 1.0, 1.0]).unwrap();
        let mut b = DeepImage::new(2, 2, &["R", "G", "A", "Z"]).unwrap();
        b.add_pixel_sample(0, 0, &[1.0, 0.0, 1.0, 1.0]).unwrap();

        let before = a.clone();
        assert!(matches!(a.add_deep_image(&b), Err(Error::MissingChannel(ref c)) if c == "B"));
        assert!(a.subtract_deep_image(&b).is_err());
        assert_eq!(a.num_elements(), 1);
        assert_eq!(a, before);
    }

    #[test]
    fn test_merge_rejects_dimension_mismatch() {
        let mut a = DeepImage::new(2, 2, &RGBAZ).unwrap();
        let b = DeepImage::new(3, 2, &RGBAZ).unwrap();
        assert!(matches!(a.add_deep_image(&b), Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_subtract_negates_appended_alpha() {
        let mut a = DeepImage::new(1, 1, &RGBAZ).unwrap();
        a.add_pixel_sample(0, 0, &[1.0, 0.0, 0.0, 0.75, 1.0]).unwrap();
        let b = a.clone();
        a.subtract_deep_image(&b).unwrap();
        assert_eq!(a.channel("A").unwrap(), &[0.75, -0.75]);
        assert_eq!(a.channel("R").unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn test_subtract_requires_alpha() {
        let mut a = DeepImage::new(1, 1, &["Y", "Z"]).unwrap();
        let b = a.clone();
        assert!(matches!(a.subtract_deep_image(&b), Err(Error::MissingChannel(ref c)) if c == "A"));
    }

    #[test]
    fn test_from_parts_validates() {
        let names = vec!["A".to_string(), "Z".to_string()];
        let mut store = BTreeMap::new();
        store.insert("A".to_string(), vec![0.5, 1.0]);
        store.insert("Z".to_string(), vec![1.0, 2.0]);

        let ok = DeepImage::from_parts(1, 1, names.clone(), store.clone(), vec![vec![1, 0]]).unwrap();
        assert_eq!(ok.pixel_indices(0, 0).unwrap(), &[1, 0]);

        let err = DeepImage::from_parts(1, 1, names.clone(), store.clone(), vec![vec![2]]);
        assert!(matches!(err, Err(Error::CorruptIndex { index: 2, .. })));

        let mut short = store.clone();
        short.insert("A".to_string(), vec![0.5]);
        let err = DeepImage::from_parts(1, 1, names.clone(), short, vec![vec![]]);
        assert!(matches!(err, Err(Error::ChannelLength { .. })));

        let err = DeepImage::from_parts(1, 1, names, store, vec![vec![], vec![]]);
        assert!(err.is_err());
    }
}
