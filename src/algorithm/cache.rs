use crate::spatial::grid::TileKey;
use image::{ImageBuffer, Pixel, imageops};
use std::collections::HashMap;
use std::sync::Arc;

/// Cropped region of an image buffer, shared between cache and callers
pub type Crop<P> = Arc<ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>>;

/// Memoization cache for cropped sub-rectangles of one source image
///
/// Keys are always integer-quantized rectangles, so two queries for the same
/// geometry return the same shared buffer.
pub struct CropCache<P: Pixel> {
    /// Tile key to cropped buffer mapping
    crops: HashMap<TileKey, Crop<P>>,

    /// Cache performance statistics
    pub stats: CacheStats,
}

/// Performance metrics for cache effectiveness
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
}

impl<P: Pixel> Default for CropCache<P> {
    fn default() -> Self {
        Self {
            crops: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<P> CropCache<P>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve the cached crop for `key` or cut it from `source`
    ///
    /// Keys reaching past the source's edges are clipped to it.
    pub fn get_or_crop(
        &mut self,
        key: TileKey,
        source: &ImageBuffer<P, Vec<P::Subpixel>>,
    ) -> Crop<P> {
        use std::collections::hash_map::Entry;

        match self.crops.entry(key) {
            Entry::Occupied(entry) => {
                self.stats.hits += 1;
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => {
                self.stats.misses += 1;
                let crop =
                    imageops::crop_imm(source, key.x, key.y, key.width, key.height).to_image();
                Arc::clone(entry.insert(Arc::new(crop)))
            }
        }
    }

    /// Number of distinct crops held
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    /// Check whether the cache holds no crops
    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// Drop all crops, keeping statistics
    pub fn clear(&mut self) {
        self.crops.clear();
    }
}
