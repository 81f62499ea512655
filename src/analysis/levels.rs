//! Channel histograms, palettes and level remapping
//!
//! A palette summarizes each channel's distribution by the channel values at
//! evenly spaced quantiles. Remapping an image from one palette to another
//! sends every value through its quantile in the source palette and back out
//! through the destination palette, which moves the image's tonal
//! distribution onto the destination's.

use crate::io::configuration::PALETTE_KNOTS;
use crate::io::error::{MosaicError, Result, computation_error, invalid_parameter};
use crate::math::interpolation::Piecewise;
use image::{GrayImage, Rgb, RgbImage};
use ndarray::{Array2, ArrayView1, Axis};

/// Number of color channels tracked
pub const CHANNELS: usize = 3;
/// Number of levels per channel
pub const LEVELS: usize = 256;

/// Per-channel pixel counts, one row per channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHistogram {
    counts: Array2<f64>,
}

impl Default for ChannelHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelHistogram {
    /// Create an empty histogram
    pub fn new() -> Self {
        Self {
            counts: Array2::zeros((CHANNELS, LEVELS)),
        }
    }

    /// Count the channel values of `image`
    ///
    /// With a mask, only pixels whose mask value is non-zero are counted.
    /// Pixels outside the mask's extent are skipped.
    pub fn from_image(image: &RgbImage, mask: Option<&GrayImage>) -> Self {
        let mut histogram = Self::new();
        for (x, y, pixel) in image.enumerate_pixels() {
            if let Some(mask) = mask {
                match mask.get_pixel_checked(x, y) {
                    Some(value) if value.0[0] > 0 => {}
                    _ => continue,
                }
            }
            for (channel, &value) in pixel.0.iter().enumerate() {
                if let Some(cell) = histogram.counts.get_mut((channel, usize::from(value))) {
                    *cell += 1.0;
                }
            }
        }
        histogram
    }

    /// Add `weight` times another histogram into this one
    pub fn accumulate(&mut self, other: &Self, weight: f64) {
        self.counts.scaled_add(weight, &other.counts);
    }

    /// Copy scaled so every non-empty channel sums to one
    pub fn normalized(&self) -> Self {
        let mut counts = self.counts.clone();
        for mut row in counts.axis_iter_mut(Axis(0)) {
            let total = row.sum();
            if total > 0.0 {
                row.mapv_inplace(|count| count / total);
            }
        }
        Self { counts }
    }

    /// Counts for one channel
    pub fn channel(&self, channel: usize) -> Option<ArrayView1<'_, f64>> {
        (channel < CHANNELS).then(|| self.counts.row(channel))
    }

    /// Count of `level` in `channel`
    pub fn count(&self, channel: usize, level: u8) -> f64 {
        self.counts
            .get((channel, usize::from(level)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Total count of one channel
    pub fn total(&self, channel: usize) -> f64 {
        self.channel(channel).map_or(0.0, |row| row.sum())
    }
}

/// Evenly spaced quantiles `0, 1/(n-1), .., 1`
pub fn quantiles(knots: usize) -> Vec<f64> {
    let last = knots.saturating_sub(1).max(1) as f64;
    (0..knots).map(|k| k as f64 / last).collect()
}

/// Channel values at evenly spaced quantiles, per channel
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    knots: [Vec<f64>; CHANNELS],
}

impl Palette {
    /// Palette whose knots spread evenly over the full range
    pub fn identity() -> Self {
        let knots = quantiles(PALETTE_KNOTS)
            .into_iter()
            .map(|q| q * 255.0)
            .collect::<Vec<_>>();
        Self {
            knots: [knots.clone(), knots.clone(), knots],
        }
    }

    /// Derive a palette from a histogram
    ///
    /// Channels with no counts fall back to the identity curve.
    pub fn from_histogram(histogram: &ChannelHistogram) -> Self {
        let identity = Self::identity();
        let knots = std::array::from_fn(|channel| {
            histogram
                .channel(channel)
                .and_then(|counts| quantile_knots(counts, PALETTE_KNOTS))
                .or_else(|| identity.knots.get(channel).cloned())
                .unwrap_or_default()
        });
        Self { knots }
    }

    /// Knot values of one channel
    pub fn knots(&self, channel: usize) -> &[f64] {
        self.knots.get(channel).map(Vec::as_slice).unwrap_or_default()
    }
}

fn quantile_knots(counts: ArrayView1<'_, f64>, knots: usize) -> Option<Vec<f64>> {
    let total = counts.sum();
    if total <= 0.0 {
        return None;
    }

    let mut running = 0.0;
    let cdf: Vec<f64> = counts
        .iter()
        .map(|&count| {
            running += count;
            running / total
        })
        .collect();
    let lowest = counts.iter().position(|&count| count > 0.0).unwrap_or(0);

    let values = quantiles(knots)
        .into_iter()
        .enumerate()
        .map(|(k, q)| {
            if k == 0 {
                lowest as f64
            } else {
                cdf.iter()
                    .position(|&c| c >= q - 1e-9)
                    .unwrap_or(LEVELS - 1) as f64
            }
        })
        .collect();
    Some(values)
}

/// Per-channel lookup tables remapping one palette onto another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelMap {
    tables: [[u8; LEVELS]; CHANNELS],
}

impl LevelMap {
    /// Build the remap taking images with palette `from` toward palette `to`
    ///
    /// # Errors
    ///
    /// Returns an error if either palette has too few knots to form a curve
    pub fn between(from: &Palette, to: &Palette) -> Result<Self> {
        let mut tables = [[0u8; LEVELS]; CHANNELS];
        for (channel, table) in tables.iter_mut().enumerate() {
            let source = from.knots(channel);
            let target = to.knots(channel);
            let qs = quantiles(source.len());

            let mut points: Vec<(f64, f64)> = Vec::with_capacity(source.len() + 2);
            if source.first().is_some_and(|&v| v > 0.0) {
                points.push((0.0, 0.0));
            }
            points.extend(source.iter().copied().zip(qs.iter().copied()));
            if source.last().is_some_and(|&v| v < 255.0) {
                points.push((255.0, 1.0));
            }

            let to_quantile = Piecewise::from_monotone(&points)
                .map_err(|e| computation_error("level map", &e))?;
            let from_quantile = Piecewise::new(quantiles(target.len()), target.to_vec())
                .map_err(|e| computation_error("level map", &e))?;

            for (level, slot) in table.iter_mut().enumerate() {
                let q = to_quantile.evaluate(level as f64);
                *slot = from_quantile.evaluate(q).round().clamp(0.0, 255.0) as u8;
            }
        }
        Ok(Self { tables })
    }

    /// Lookup table of one channel
    pub fn table(&self, channel: usize) -> Option<&[u8; LEVELS]> {
        self.tables.get(channel)
    }

    /// Remap every pixel of `image`
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let mut output = image.clone();
        for pixel in output.pixels_mut() {
            for (channel, value) in pixel.0.iter_mut().enumerate() {
                if let Some(mapped) = self
                    .tables
                    .get(channel)
                    .and_then(|table| table.get(usize::from(*value)))
                {
                    *value = *mapped;
                }
            }
        }
        output
    }
}

/// Remap `image` from palette `from` toward palette `to`
///
/// # Errors
///
/// Returns an error if the level map cannot be built
pub fn adjust_levels(image: &RgbImage, from: &Palette, to: &Palette) -> Result<RgbImage> {
    Ok(LevelMap::between(from, to)?.apply(image))
}

/// Linear blend: `amount = 0` keeps `base`, `amount = 1` gives `overlay`
///
/// # Errors
///
/// Returns an error if the images differ in size or `amount` is outside `[0, 1]`
pub fn blend(base: &RgbImage, overlay: &RgbImage, amount: f64) -> Result<RgbImage> {
    if !(0.0..=1.0).contains(&amount) {
        return Err(invalid_parameter(
            "blend amount",
            &amount,
            &"must lie between 0 and 1",
        ));
    }
    if base.dimensions() != overlay.dimensions() {
        return Err(MosaicError::InvalidSourceData {
            reason: format!(
                "cannot blend {:?} image with {:?} image",
                base.dimensions(),
                overlay.dimensions()
            ),
        });
    }

    let mut output = RgbImage::new(base.width(), base.height());
    for ((out, a), b) in output.pixels_mut().zip(base.pixels()).zip(overlay.pixels()) {
        let mixed: [u8; 3] = std::array::from_fn(|i| {
            let lo = f64::from(a.0.get(i).copied().unwrap_or(0));
            let hi = f64::from(b.0.get(i).copied().unwrap_or(0));
            amount.mul_add(hi - lo, lo).round().clamp(0.0, 255.0) as u8
        });
        *out = Rgb(mixed);
    }
    Ok(output)
}
