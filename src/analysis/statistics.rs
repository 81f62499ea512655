//! Pixel statistics driving subdivision and blank removal

use image::{GrayImage, Rgb, RgbImage};

/// Fully-white mask value, marking pixels inside the region of interest
pub const MASK_WHITE: u8 = 255;

/// Rec.601 luma of an RGB pixel
pub fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    let y = 0.114f64.mul_add(
        f64::from(b),
        0.299f64.mul_add(f64::from(r), 0.587 * f64::from(g)),
    );
    y.round().clamp(0.0, 255.0) as u8
}

/// Spread between the brightest and darkest luma in a region
///
/// An empty region has no spread.
pub fn dynamic_range(region: &RgbImage) -> u8 {
    let mut lowest = u8::MAX;
    let mut highest = u8::MIN;
    for pixel in region.pixels() {
        let y = luma(pixel);
        lowest = lowest.min(y);
        highest = highest.max(y);
    }
    highest.saturating_sub(lowest)
}

/// Darkest and brightest value of a single-channel image
///
/// Returns `None` for an empty image.
pub fn extrema(region: &GrayImage) -> Option<(u8, u8)> {
    region.pixels().fold(None, |acc, pixel| {
        let value = pixel.0[0];
        Some(acc.map_or((value, value), |(lo, hi): (u8, u8)| {
            (lo.min(value), hi.max(value))
        }))
    })
}

/// Check whether a mask region crosses a hard white/non-white boundary
///
/// True only if the region holds at least one pure white pixel and at least
/// one pixel below white. Uniform regions, including uniform gray, never
/// straddle.
pub fn straddles_edge(mask_region: &GrayImage) -> bool {
    let mut has_white = false;
    let mut has_other = false;
    for pixel in mask_region.pixels() {
        if pixel.0[0] == MASK_WHITE {
            has_white = true;
        } else {
            has_other = true;
        }
        if has_white && has_other {
            return true;
        }
    }
    false
}
