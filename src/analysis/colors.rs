//! Dominant-color summaries of image regions
//!
//! A region is split into four quadrants and each quadrant is reduced to a
//! single RGB color, which is then converted to CIE Lab. Quadrant order is
//! fixed (top-left, top-right, bottom-left, bottom-right) so profiles compare
//! like quadrant to like quadrant.

use crate::io::configuration::{MODE_LEVELS, QUADRANTS};
use crate::math::distance::profile_distance;
use image::{GenericImageView, Rgb, RgbImage, imageops};
use palette::{FromColor, Lab, Srgb};
use std::collections::HashMap;

/// Per-quadrant dominant colors in device and perceptual space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorProfile {
    /// Dominant sRGB color per quadrant
    pub rgb: [[u8; 3]; QUADRANTS],
    /// The same colors in CIE Lab (D65)
    pub lab: [Lab; QUADRANTS],
}

impl ColorProfile {
    /// Build a profile from four RGB colors
    pub fn from_rgb(rgb: [[u8; 3]; QUADRANTS]) -> Self {
        Self {
            rgb,
            lab: rgb.map(rgb_to_lab),
        }
    }

    /// Profile with the same color in every quadrant
    pub fn uniform(rgb: [u8; 3]) -> Self {
        Self::from_rgb([rgb; QUADRANTS])
    }

    /// Sum of per-quadrant Lab distances to another profile
    pub fn distance(&self, other: &Self) -> f64 {
        profile_distance(&self.lab, &other.lab)
    }

    /// Mean Lab lightness across quadrants
    pub fn mean_lightness(&self) -> f64 {
        self.lab.iter().map(|lab| f64::from(lab.l)).sum::<f64>() / QUADRANTS as f64
    }

    /// Mean absolute lightness difference across quadrants
    pub fn lightness_delta(&self, other: &Self) -> f64 {
        self.lab
            .iter()
            .zip(other.lab.iter())
            .map(|(a, b)| f64::from((a.l - b.l).abs()))
            .sum::<f64>()
            / QUADRANTS as f64
    }

    /// Channel-wise mean of the quadrant colors
    pub fn average_rgb(&self) -> [f64; 3] {
        let mut total = [0.0; 3];
        for color in &self.rgb {
            for (sum, &channel) in total.iter_mut().zip(color.iter()) {
                *sum += f64::from(channel);
            }
        }
        total.map(|sum| sum / QUADRANTS as f64)
    }
}

/// Convert an 8-bit sRGB triple to CIE Lab
pub fn rgb_to_lab(rgb: [u8; 3]) -> Lab {
    let [r, g, b] = rgb;
    Lab::from_color(Srgb::new(r, g, b).into_format::<f32>())
}

/// How a quadrant's pixels are reduced to one color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Channel-wise mean of all pixels
    Mean,
    /// Centroid of the most populated bin of a quantized histogram
    QuantizedMode {
        /// Quantization levels per channel
        levels: u8,
    },
}

impl Default for Reduction {
    fn default() -> Self {
        Self::QuantizedMode {
            levels: MODE_LEVELS,
        }
    }
}

impl Reduction {
    /// Reduce a set of pixels to one color; black when there are none
    pub fn reduce<I>(&self, pixels: I) -> [u8; 3]
    where
        I: IntoIterator<Item = Rgb<u8>>,
    {
        match *self {
            Self::Mean => mean_color(pixels),
            Self::QuantizedMode { levels } => mode_color(pixels, levels.max(1)),
        }
    }
}

fn mean_color(pixels: impl IntoIterator<Item = Rgb<u8>>) -> [u8; 3] {
    let mut sums = [0u64; 3];
    let mut count = 0u64;
    for pixel in pixels {
        for (sum, &channel) in sums.iter_mut().zip(pixel.0.iter()) {
            *sum += u64::from(channel);
        }
        count += 1;
    }
    if count == 0 {
        return [0, 0, 0];
    }
    sums.map(|sum| ((sum + count / 2) / count) as u8)
}

fn mode_color(pixels: impl IntoIterator<Item = Rgb<u8>>, levels: u8) -> [u8; 3] {
    let bin_width = 256 / u32::from(levels) + u32::from(256 % u32::from(levels) != 0);
    // bin -> (population, channel sums)
    let mut bins: HashMap<[u8; 3], (u64, [u64; 3])> = HashMap::new();

    for pixel in pixels {
        let bin = pixel.0.map(|c| (u32::from(c) / bin_width) as u8);
        let entry = bins.entry(bin).or_insert((0, [0; 3]));
        entry.0 += 1;
        for (sum, &channel) in entry.1.iter_mut().zip(pixel.0.iter()) {
            *sum += u64::from(channel);
        }
    }

    // Ties resolve to the lowest bin so results are reproducible
    bins.into_iter()
        .max_by(|(bin_a, (count_a, _)), (bin_b, (count_b, _))| {
            count_a.cmp(count_b).then_with(|| bin_b.cmp(bin_a))
        })
        .map_or([0, 0, 0], |(_, (count, sums))| {
            sums.map(|sum| ((sum + count / 2) / count) as u8)
        })
}

/// Quadrant boxes `(x, y, width, height)` of a `width × height` region
///
/// Odd extents let the left/top and right/bottom halves share the middle
/// row or column, so no quadrant is empty for a non-empty region.
pub fn quadrant_boxes(width: u32, height: u32) -> [(u32, u32, u32, u32); QUADRANTS] {
    let left_w = width.div_ceil(2);
    let top_h = height.div_ceil(2);
    let right_x = width / 2;
    let bottom_y = height / 2;
    let right_w = width - right_x;
    let bottom_h = height - bottom_y;
    [
        (0, 0, left_w, top_h),
        (right_x, 0, right_w, top_h),
        (0, bottom_y, left_w, bottom_h),
        (right_x, bottom_y, right_w, bottom_h),
    ]
}

/// Summarizes image regions as four-quadrant color profiles
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorAnalyzer {
    reduction: Reduction,
}

impl ColorAnalyzer {
    /// Create an analyzer with the given reduction policy
    pub const fn new(reduction: Reduction) -> Self {
        Self { reduction }
    }

    /// The reduction policy in use
    pub const fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// Compute the dominant color of each quadrant of `region`
    pub fn analyze(&self, region: &RgbImage) -> ColorProfile {
        let (width, height) = region.dimensions();
        let rgb = quadrant_boxes(width, height).map(|(x, y, w, h)| {
            let quadrant = imageops::crop_imm(region, x, y, w, h);
            self.reduction.reduce(quadrant.pixels().map(|(_, _, p)| p))
        });
        ColorProfile::from_rgb(rgb)
    }
}
