//! Adaptive quadtree partitioning of the target image
//!
//! A partition starts as a flat grid of top-level cells and is refined in
//! whole generations: every tile whose luma spread exceeds the threshold, or
//! whose mask region crosses a white/non-white boundary, is replaced by its
//! four quadrants. Blank removal then discards tiles outside the mask, and the
//! survivors are quantized outward to whole pixels exactly once.

use crate::algorithm::cache::{CacheStats, Crop, CropCache};
use crate::analysis::statistics::{MASK_WHITE, dynamic_range, extrema, straddles_edge};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::image::{binarize, crop_to_fit, fit_mask};
use crate::spatial::grid::{TileKey, brick_layout, simple_layout};
use crate::spatial::tiles::Tile;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info};

/// Grid arrangement of the top-level cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Plain row-major grid
    #[default]
    Simple,
    /// Running bond: odd rows shifted by half a cell
    Brick,
}

/// Target image, optional mask and the evolving tile list
pub struct Partition {
    image: RgbImage,
    mask: Option<GrayImage>,
    tiles: Vec<Tile>,
    image_crops: CropCache<Rgb<u8>>,
    mask_crops: CropCache<Luma<u8>>,
    final_tiles: Option<Vec<Tile>>,
    rng: StdRng,
}

impl Partition {
    /// Create a partition over `image`
    ///
    /// A mask of different geometry is fitted to the image's size.
    pub fn new(image: RgbImage, mask: Option<GrayImage>, rng: StdRng) -> Self {
        let mask = mask.map(|m| fit_mask(&m, [image.width(), image.height()]));
        Self {
            image,
            mask,
            tiles: Vec::new(),
            image_crops: CropCache::new(),
            mask_crops: CropCache::new(),
            final_tiles: None,
            rng,
        }
    }

    /// The (possibly resized) target image
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// The fitted mask, if any
    pub const fn mask(&self) -> Option<&GrayImage> {
        self.mask.as_ref()
    }

    /// Working tiles before finalization
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Whether the final tile list has been fixed
    pub const fn is_finalized(&self) -> bool {
        self.final_tiles.is_some()
    }

    /// Hit/miss counts of the target-image crop cache
    pub const fn image_cache_stats(&self) -> CacheStats {
        self.image_crops.stats
    }

    /// Hit/miss counts of the mask crop cache
    pub const fn mask_cache_stats(&self) -> CacheStats {
        self.mask_crops.stats
    }

    fn ensure_mutable(&self, operation: &'static str) -> Result<()> {
        if self.is_finalized() {
            return Err(MosaicError::PartitionFinalized { operation });
        }
        Ok(())
    }

    /// Resize image and mask so each side divides evenly into `dimensions × 2^depth`
    ///
    /// With `base_width`, the image is first rescaled so each top-level cell is
    /// `base_width` pixels wide. Sides are rounded up and the excess cropped.
    /// Existing tiles are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The partition is finalized
    /// - `dimensions` contains a zero or the grid factor overflows
    /// - The image is empty
    pub fn normalize_size(
        &mut self,
        dimensions: [u32; 2],
        depth: u32,
        base_width: Option<u32>,
    ) -> Result<()> {
        self.ensure_mutable("normalize size")?;
        let [cols, rows] = validate_dimensions(dimensions)?;
        if self.image.width() == 0 || self.image.height() == 0 {
            return Err(MosaicError::InvalidSourceData {
                reason: "target image is empty".to_string(),
            });
        }

        if let Some(base) = base_width {
            if base == 0 {
                return Err(invalid_parameter("base width", &base, &"must be positive"));
            }
            let width = base.saturating_mul(cols);
            let height = (u64::from(self.image.height()) * u64::from(width)
                / u64::from(self.image.width()))
            .clamp(1, u64::from(u32::MAX)) as u32;
            self.image = crop_to_fit(&self.image, [width, height]);
        }

        let scale = 1u32
            .checked_shl(depth)
            .ok_or_else(|| invalid_parameter("depth", &depth, &"too deep"))?;
        let factor = [cols, rows].map(|n| n.checked_mul(scale));
        let [Some(fx), Some(fy)] = factor else {
            return Err(invalid_parameter(
                "dimensions",
                &format!("{cols}x{rows}"),
                &"grid factor overflows",
            ));
        };
        let size = [
            self.image.width().div_ceil(fx).saturating_mul(fx),
            self.image.height().div_ceil(fy).saturating_mul(fy),
        ];

        info!(width = size[0], height = size[1], "Resizing target for partitioning");
        self.image = crop_to_fit(&self.image, size);
        self.mask = self.mask.take().map(|m| fit_mask(&m, size));
        self.tiles.clear();
        self.image_crops.clear();
        self.mask_crops.clear();
        Ok(())
    }

    /// Threshold the mask to pure black and white, removing gray ambiguity
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is finalized
    pub fn binarize_mask(&mut self, threshold: u8) -> Result<()> {
        self.ensure_mutable("binarize mask")?;
        if let Some(mask) = self.mask.as_mut() {
            *mask = binarize(mask, threshold);
            self.mask_crops.clear();
        }
        Ok(())
    }

    /// Lay out a `cols × rows` grid of equal top-level tiles
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is finalized or `dimensions` contains a zero
    pub fn simple_partition(&mut self, dimensions: [u32; 2]) -> Result<()> {
        self.partition(dimensions, Layout::Simple)
    }

    /// Lay out a running-bond grid with half tiles closing the odd rows
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is finalized or `dimensions` contains a zero
    pub fn brick_partition(&mut self, dimensions: [u32; 2]) -> Result<()> {
        self.partition(dimensions, Layout::Brick)
    }

    /// Lay out top-level tiles with the given arrangement
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is finalized or `dimensions` contains a zero
    pub fn partition(&mut self, dimensions: [u32; 2], layout: Layout) -> Result<()> {
        self.ensure_mutable("partition")?;
        let dimensions = validate_dimensions(dimensions)?;
        let width = f64::from(self.image.width());
        let height = f64::from(self.image.height());
        let rects = match layout {
            Layout::Simple => simple_layout(width, height, dimensions),
            Layout::Brick => brick_layout(width, height, dimensions),
        };
        self.tiles = rects.into_iter().map(Tile::root).collect();
        info!(tiles = self.tiles.len(), ?layout, "Partitioned target into grid");
        Ok(())
    }

    /// Run `depth` generations of quadrant subdivision
    ///
    /// A tile splits when its luma spread exceeds `hdr_threshold` or it
    /// straddles a mask edge. Every tile of one generation is examined before
    /// any tile of the next.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is finalized
    pub fn recursive_split(&mut self, depth: u32, hdr_threshold: u8) -> Result<()> {
        self.ensure_mutable("recursive split")?;
        for generation in 0..depth {
            let current = std::mem::take(&mut self.tiles);
            let mut next = Vec::with_capacity(current.len() * 4);
            let mut split = 0usize;
            for tile in current {
                let region = self.crop(tile.key());
                if dynamic_range(&region) > hdr_threshold || self.straddles_mask_edge(&tile) {
                    next.extend(tile.subdivide());
                    split += 1;
                } else {
                    next.push(tile);
                }
            }
            self.tiles = next;
            debug!(generation, split, tiles = self.tiles.len(), "Subdivision pass");
        }
        info!(tiles = self.tiles.len(), depth, "Recursive split complete");
        Ok(())
    }

    /// Check whether `tile` crosses a white/non-white mask boundary
    ///
    /// Always false without a mask.
    pub fn straddles_mask_edge(&mut self, tile: &Tile) -> bool {
        self.crop_mask(tile.key())
            .is_some_and(|region| straddles_edge(&region))
    }

    /// Discard tiles lying outside the mask; returns the number removed
    ///
    /// Fully white tiles stay, fully black tiles go. Ambiguous tiles at least
    /// `max_size_fraction` of the image width go; smaller ones stay with
    /// probability proportional to their brightest mask value.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is finalized or the fraction is negative
    pub fn remove_blanks(&mut self, max_size_fraction: f64) -> Result<usize> {
        self.ensure_mutable("remove blanks")?;
        if !(max_size_fraction.is_finite() && max_size_fraction >= 0.0) {
            return Err(invalid_parameter(
                "blank fraction",
                &max_size_fraction,
                &"must be a non-negative number",
            ));
        }
        if self.mask.is_none() {
            return Ok(0);
        }

        let limit = max_size_fraction * f64::from(self.image.width());
        let before = self.tiles.len();
        let mut kept = Vec::with_capacity(before);
        for mut tile in std::mem::take(&mut self.tiles) {
            let brightest = self
                .crop_mask(tile.key())
                .and_then(|region| extrema(&region))
                .map(|(_, hi)| hi);
            let keep = match brightest {
                None | Some(0) => false,
                Some(MASK_WHITE) => true,
                Some(_) if tile.rect().width >= limit => false,
                Some(hi) => self.rng.random_range(0..MASK_WHITE) < hi,
            };
            if keep {
                tile.blank = Some(false);
                kept.push(tile);
            }
        }
        self.tiles = kept;

        let removed = before - self.tiles.len();
        info!(removed, remaining = self.tiles.len(), "Removed blank tiles");
        Ok(removed)
    }

    /// The memoized, outward-quantized final tile list
    ///
    /// Computed on first call; further mutation of the partition is refused.
    pub fn final_tiles(&mut self) -> &[Tile] {
        let tiles = &self.tiles;
        self.final_tiles.get_or_insert_with(|| {
            info!(tiles = tiles.len(), "Fixed final tile list");
            tiles.iter().map(Tile::quantized).collect()
        })
    }

    /// Cropped target region for `key`, shared through the cache
    pub fn crop(&mut self, key: TileKey) -> Crop<Rgb<u8>> {
        self.image_crops.get_or_crop(key, &self.image)
    }

    /// Cropped mask region for `key`, if a mask is set
    pub fn crop_mask(&mut self, key: TileKey) -> Option<Crop<Luma<u8>>> {
        let mask = self.mask.as_ref()?;
        Some(self.mask_crops.get_or_crop(key, mask))
    }

    /// Render each final tile's own crop, inset by `margin`, onto white
    pub fn preview(&mut self, margin: u32) -> RgbImage {
        let keys: Vec<TileKey> = self.final_tiles().iter().map(Tile::key).collect();
        let mut canvas = RgbImage::from_pixel(
            self.image.width(),
            self.image.height(),
            Rgb([MASK_WHITE; 3]),
        );
        for key in keys {
            let width = key.width.saturating_sub(margin.saturating_mul(2));
            let height = key.height.saturating_sub(margin.saturating_mul(2));
            if width == 0 || height == 0 {
                continue;
            }
            let region = self.crop(key);
            let shrunk = imageops::resize(&*region, width, height, FilterType::Triangle);
            imageops::overlay(
                &mut canvas,
                &shrunk,
                i64::from(key.x) + i64::from(margin),
                i64::from(key.y) + i64::from(margin),
            );
        }
        canvas
    }
}

fn validate_dimensions(dimensions: [u32; 2]) -> Result<[u32; 2]> {
    if dimensions.contains(&0) {
        return Err(invalid_parameter(
            "dimensions",
            &format!("{}x{}", dimensions[0], dimensions[1]),
            &"grid needs at least one cell per axis",
        ));
    }
    Ok(dimensions)
}
