//! Flattening one pixel's deep samples into a single color.
//!
//! Two compositors are provided:
//!
//! - **Discrete** ([`DeepImage::render_pixel`]): samples are points in depth,
//!   composited front to back with the "over" operator. `ZBack` is ignored.
//! - **Linear** ([`DeepImage::render_pixel_linear`]): samples with
//!   `ZBack > Z` are homogeneous volumes whose transmittance falls linearly
//!   across their depth extent. Overlapping volumes interleave correctly
//!   instead of being treated as stacked surfaces.
//!
//! Both honor *cutouts*: samples with negative alpha (produced by
//! [`DeepImage::subtract_deep_image`]) that remove coverage from everything
//! behind them instead of contributing color. A cutout that exactly negates
//! another sample of the pixel removes that sample instead, so adding and
//! then subtracting the same image is a no-op.
//!
//! Output channels follow [`DeepImage::channel_names_no_depth`]. Color
//! channels are unpremultiplied by the final coverage; the alpha channel
//! holds the coverage itself.
//!
//! # Algorithm (linear)
//!
//! A piecewise-linear transmittance function `T(z)` is built from knots at
//! every sample boundary. Each knot keeps the transmittance arriving from the
//! front (`high`) and, where a surface sits exactly on it, the transmittance
//! leaving behind it (`low`). A sample's share of the pixel's opacity is the
//! drop in `T` it is responsible for:
//!
//! ```text
//!   T
//! 1 |----+
//!   |    |\   surface at z0: high - low
//!   |    + \
//!   |       \___ volume z1..z2: split with any volumes overlapping it
//! 0 +--------------- z
//! ```

use tracing::trace;

use crate::{DeepImage, ALPHA, DEPTH, DEPTH_BACK};

/// Remaining transmittance below this counts as fully covered.
const OPEN_EPSILON: f32 = 1e-6;

impl DeepImage {
    /// Composites pixel `(y, x)` treating every sample as a surface.
    ///
    /// Coordinates past the raster are clamped. An empty pixel renders as
    /// zeros. Without an alpha channel, the values of the deepest sample are
    /// returned as they are.
    pub fn render_pixel(&self, y: u32, x: u32) -> Vec<f32> {
        let compositor = Compositor::new(self);
        let mut out = vec![0.0; compositor.outputs()];
        compositor.discrete_into(self.clamped_indices(y, x), &mut out);
        out
    }

    /// Composites pixel `(y, x)` treating samples with `ZBack != Z` as
    /// homogeneous volumes.
    ///
    /// Without a `ZBack` channel every sample is a surface, and without an
    /// alpha channel this falls back to [`render_pixel`](Self::render_pixel).
    pub fn render_pixel_linear(&self, y: u32, x: u32) -> Vec<f32> {
        let compositor = Compositor::new(self);
        let mut out = vec![0.0; compositor.outputs()];
        compositor.linear_into(self.clamped_indices(y, x), &mut out);
        out
    }
}

/// One output channel: its samples and whether it is the alpha channel.
struct Output<'a> {
    values: &'a [f32],
    is_alpha: bool,
}

/// Channel slices resolved once per image, reused for every pixel.
pub(crate) struct Compositor<'a> {
    outputs: Vec<Output<'a>>,
    depth: &'a [f32],
    depth_back: Option<&'a [f32]>,
    alpha: Option<&'a [f32]>,
}

impl<'a> Compositor<'a> {
    pub(crate) fn new(image: &'a DeepImage) -> Self {
        let outputs = image
            .channel_names_no_depth()
            .iter()
            .filter_map(|name| {
                image.channel(name).map(|values| Output {
                    values,
                    is_alpha: name == ALPHA,
                })
            })
            .collect();
        Self {
            outputs,
            depth: image.channel(DEPTH).unwrap_or(&[]),
            depth_back: image.channel(DEPTH_BACK),
            alpha: image.channel(ALPHA),
        }
    }

    /// Number of output values per pixel.
    pub(crate) fn outputs(&self) -> usize {
        self.outputs.len()
    }

    fn accumulate(&self, out: &mut [f32], sample: usize, weight: f32) {
        for (o, channel) in out.iter_mut().zip(&self.outputs) {
            *o += if channel.is_alpha {
                weight
            } else {
                weight * channel.values[sample]
            };
        }
    }

    fn unpremultiply(&self, out: &mut [f32], coverage: f32) {
        for (o, channel) in out.iter_mut().zip(&self.outputs) {
            if channel.is_alpha {
                continue;
            }
            *o = if coverage > 0.0 { *o / coverage } else { 0.0 };
        }
    }

    /// Front-to-back "over" compositing with cutouts.
    pub(crate) fn discrete_into(&self, indices: &[u32], out: &mut [f32]) {
        out.fill(0.0);
        if indices.is_empty() {
            return;
        }

        let Some(alpha) = self.alpha else {
            let depth = self.depth;
            if let Some(deepest) = indices
                .iter()
                .map(|&i| i as usize)
                .max_by(|&a, &b| depth[a].total_cmp(&depth[b]))
            {
                for (o, channel) in out.iter_mut().zip(&self.outputs) {
                    *o = channel.values[deepest];
                }
            }
            return;
        };

        // Stable: equal depths keep cutouts first, then insertion order.
        let mut order = self.cancel_holdout_pairs(indices, alpha);
        order.sort_by(|&a, &b| {
            self.depth[a]
                .total_cmp(&self.depth[b])
                .then_with(|| (alpha[a] >= 0.0).cmp(&(alpha[b] >= 0.0)))
        });

        let mut accum = 0.0f32;
        let mut cutout = 1.0f32;
        for i in order {
            let a = alpha[i];
            if a < 0.0 {
                cutout += a;
            } else {
                let contribution = (cutout - accum).max(0.0) * a;
                accum += contribution;
                self.accumulate(out, i, contribution);
            }
            if accum > cutout {
                break;
            }
        }

        self.unpremultiply(out, accum);
    }

    /// Volumetric compositing over a piecewise-linear transmittance function.
    pub(crate) fn linear_into(&self, indices: &[u32], out: &mut [f32]) {
        let Some(alpha) = self.alpha else {
            return self.discrete_into(indices, out);
        };
        out.fill(0.0);
        if indices.is_empty() {
            return;
        }

        let live = self.cancel_holdout_pairs(indices, alpha);
        let depth_back = self.depth_back.unwrap_or(self.depth);
        let segments: Vec<Segment> = live
            .iter()
            .copied()
            .filter(|&i| alpha[i] >= 0.0)
            .map(|i| Segment::new(i, self.depth[i], depth_back[i], alpha[i]))
            .collect();

        let mut cutouts: Vec<(f32, f32)> = live
            .iter()
            .copied()
            .filter(|&i| alpha[i] < 0.0)
            .map(|i| (self.depth[i], alpha[i]))
            .collect();
        cutouts.sort_by(|a, b| a.0.total_cmp(&b.0));

        let function = Transmittance::build(&segments);
        trace!(
            samples = segments.len(),
            cutouts = cutouts.len(),
            min_transparency = function.min_transmittance(),
            "transmittance function"
        );

        let mut order: Vec<usize> = (0..segments.len()).collect();
        order.sort_by(|&a, &b| segments[a].front.total_cmp(&segments[b].front));

        // `uncut` sums the shares before any cutout scaling, so `1 - uncut` is
        // the transmittance the unscaled share was computed against.
        let mut accum = 0.0f32;
        let mut uncut = 0.0f32;
        let mut cutout = 1.0f32;
        let mut applied = 0;
        for k in order {
            let segment = &segments[k];
            while applied < cutouts.len() && cutouts[applied].0 <= segment.front {
                cutout += cutouts[applied].1;
                applied += 1;
            }

            let raw = function.share(segment);
            let mut share = raw;
            if applied > 0 {
                let open = 1.0 - uncut;
                share = if open > OPEN_EPSILON {
                    raw * (cutout - accum).max(0.0) / open
                } else {
                    0.0
                };
            }

            uncut += raw;
            accum += share;
            self.accumulate(out, segment.index, share);
        }

        self.unpremultiply(out, accum);
    }
}

impl Compositor<'_> {
    /// Sample indices of a pixel with each cutout removed together with the
    /// sample it negates.
    ///
    /// A cutout cancels a sample with the same depth extent and channel
    /// values whose alpha it exactly negates. Subtracting an image that was
    /// added earlier therefore restores the earlier render.
    fn cancel_holdout_pairs(&self, indices: &[u32], alpha: &[f32]) -> Vec<usize> {
        let live: Vec<usize> = indices.iter().map(|&i| i as usize).collect();
        if !live.iter().any(|&i| alpha[i] < 0.0) {
            return live;
        }

        let mut cancelled = vec![false; live.len()];
        for c in 0..live.len() {
            if cancelled[c] || alpha[live[c]] >= 0.0 {
                continue;
            }
            let twin = (0..live.len())
                .find(|&p| !cancelled[p] && self.is_negation(live[p], live[c], alpha));
            if let Some(p) = twin {
                cancelled[p] = true;
                cancelled[c] = true;
            }
        }

        live.into_iter()
            .zip(cancelled)
            .filter_map(|(i, gone)| (!gone).then_some(i))
            .collect()
    }

    fn is_negation(&self, sample: usize, cutout: usize, alpha: &[f32]) -> bool {
        alpha[sample] > 0.0
            && alpha[sample] == -alpha[cutout]
            && self.depth[sample] == self.depth[cutout]
            && self.depth_back.is_none_or(|back| back[sample] == back[cutout])
            && self
                .outputs
                .iter()
                .all(|o| o.is_alpha || o.values[sample] == o.values[cutout])
    }
}

/// A non-cutout sample as seen by the transmittance function.
#[derive(Debug, Clone, Copy)]
struct Segment {
    index: usize,
    front: f32,
    back: f32,
    /// Transmittance through the whole sample, `1 - alpha`
    transmittance: f32,
}

impl Segment {
    fn new(index: usize, z: f32, z_back: f32, alpha: f32) -> Self {
        Self {
            index,
            front: z.min(z_back),
            back: z.max(z_back),
            transmittance: 1.0 - alpha,
        }
    }

    #[inline]
    fn is_volume(&self) -> bool {
        self.back != self.front
    }

    /// Fraction of light passing this sample by depth `z`.
    fn transmittance_at(&self, z: f32) -> f32 {
        if z <= self.front {
            1.0
        } else if z >= self.back {
            self.transmittance
        } else {
            1.0 - (z - self.front) * (1.0 - self.transmittance) / (self.back - self.front)
        }
    }
}

/// Breakpoint of the transmittance function.
#[derive(Debug, Clone, Copy)]
struct Knot {
    depth: f32,
    /// Transmittance arriving at this depth
    high: f32,
    /// Transmittance just behind this depth; `None` until a surface lands here
    /// unless a volume starts or ends here
    low: Option<f32>,
    /// Volumes covering the interval ending at this knot
    volumes: u32,
    /// Summed opacity of surfaces sitting on this knot
    surface_opacity: f32,
}

impl Knot {
    #[inline]
    fn low(&self) -> f32 {
        self.low.unwrap_or(self.high)
    }

    fn attenuate(&mut self, factor: f32) {
        self.high *= factor;
        self.low = self.low.map(|l| l * factor);
    }
}

/// Piecewise-linear transmittance over depth for one pixel.
#[derive(Debug)]
struct Transmittance {
    knots: Vec<Knot>,
}

impl Transmittance {
    fn build(segments: &[Segment]) -> Self {
        let mut depths: Vec<(f32, bool)> = Vec::with_capacity(segments.len() * 2);
        for s in segments {
            depths.push((s.front, s.is_volume()));
            if s.is_volume() {
                depths.push((s.back, true));
            }
        }
        depths.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut knots: Vec<Knot> = Vec::with_capacity(depths.len());
        for (depth, continuous) in depths {
            match knots.last_mut() {
                Some(last) if last.depth.total_cmp(&depth).is_eq() => {
                    if continuous {
                        last.low = Some(1.0);
                    }
                }
                _ => knots.push(Knot {
                    depth,
                    high: 1.0,
                    low: continuous.then_some(1.0),
                    volumes: 0,
                    surface_opacity: 0.0,
                }),
            }
        }

        let mut function = Self { knots };
        for s in segments {
            function.fold(s);
        }
        function
    }

    fn find(&self, depth: f32) -> usize {
        self.knots
            .binary_search_by(|k| k.depth.total_cmp(&depth))
            .unwrap_or_else(|i| i.min(self.knots.len().saturating_sub(1)))
    }

    /// Applies one sample's attenuation to every knot behind its start.
    fn fold(&mut self, segment: &Segment) {
        let start = self.find(segment.front);
        if segment.is_volume() {
            let end = self.find(segment.back);
            for (k, knot) in self.knots.iter_mut().enumerate().skip(start + 1) {
                knot.attenuate(segment.transmittance_at(knot.depth));
                if k <= end {
                    knot.volumes += 1;
                }
            }
        } else {
            let knot = &mut self.knots[start];
            knot.low = Some(knot.low() * segment.transmittance);
            knot.surface_opacity += 1.0 - segment.transmittance;
            for knot in self.knots.iter_mut().skip(start + 1) {
                knot.attenuate(segment.transmittance);
            }
        }
    }

    /// Portion of the pixel's total opacity attributable to `segment`.
    fn share(&self, segment: &Segment) -> f32 {
        let start = self.find(segment.front);
        if segment.is_volume() {
            let end = self.find(segment.back);
            (start..end)
                .map(|k| {
                    let next = &self.knots[k + 1];
                    (self.knots[k].low() - next.high) / next.volumes.max(1) as f32
                })
                .sum()
        } else {
            let knot = &self.knots[start];
            if knot.surface_opacity <= 0.0 {
                return 0.0;
            }
            let opacity = 1.0 - segment.transmittance;
            (knot.high - knot.low()) * opacity / knot.surface_opacity
        }
    }

    fn min_transmittance(&self) -> f32 {
        self.knots.iter().map(Knot::low).fold(1.0, f32::min)
    }
}
