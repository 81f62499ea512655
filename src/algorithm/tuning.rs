//! Forward and reverse palette tuning around the matching stages
//!
//! Tuning moves the target's tonal distribution onto what the pool can
//! represent before matching. Untuning moves the assembled mosaic back toward
//! the original target's distribution.

use crate::analysis::levels::{ChannelHistogram, Palette, adjust_levels, blend};
use crate::io::error::Result;
use crate::io::image::fit_mask;
use crate::io::pool::ImagePool;
use image::{GrayImage, RgbImage};
use tracing::{info, warn};

/// Holds the original target palette for both tuning directions
#[derive(Debug, Clone)]
pub struct PaletteTuner {
    target_palette: Palette,
    mask: Option<GrayImage>,
}

impl PaletteTuner {
    /// Capture the palette of `original`, restricted to the mask if one is given
    pub fn new(original: &RgbImage, mask: Option<&GrayImage>) -> Self {
        Self {
            target_palette: Palette::from_histogram(&masked_histogram(original, mask)),
            mask: mask.cloned(),
        }
    }

    /// Palette of the original target
    pub const fn target_palette(&self) -> &Palette {
        &self.target_palette
    }

    /// Remap `original` from its own palette toward the pool's
    ///
    /// An empty pool leaves the image unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the level map cannot be built
    pub fn tune<P: ImagePool + ?Sized>(&self, original: &RgbImage, pool: &P) -> Result<RgbImage> {
        if pool.count() == 0 {
            warn!("Pool is empty, skipping tuning");
            return Ok(original.clone());
        }
        let pool_palette = Palette::from_histogram(&pool.histogram());
        let tuned = adjust_levels(original, &self.target_palette, &pool_palette)?;
        info!(candidates = pool.count(), "Tuned target toward pool palette");
        Ok(tuned)
    }

    /// Remap `mosaic` from its own palette back toward the original target's
    ///
    /// `amount` blends between the mosaic as assembled (0) and fully
    /// remapped (1).
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is outside `[0, 1]` or the level map
    /// cannot be built
    pub fn untune(&self, mosaic: &RgbImage, amount: f64) -> Result<RgbImage> {
        let mosaic_palette = Palette::from_histogram(&masked_histogram(mosaic, self.mask.as_ref()));
        let remapped = adjust_levels(mosaic, &mosaic_palette, &self.target_palette)?;
        let output = blend(mosaic, &remapped, amount)?;
        info!(amount, "Untuned mosaic toward original palette");
        Ok(output)
    }
}

fn masked_histogram(image: &RgbImage, mask: Option<&GrayImage>) -> ChannelHistogram {
    let fitted = mask.map(|m| fit_mask(m, [image.width(), image.height()]));
    ChannelHistogram::from_image(image, fitted.as_ref())
}
