//! Compositing matched pool images into the mosaic canvas

use crate::io::configuration::DEFAULT_BACKGROUND;
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::image::{crop_to_fit, open_thumbnail};
use crate::spatial::tiles::Tile;
use image::{Rgb, RgbImage, imageops};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How matched images are sized and placed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyOptions {
    /// Shrink each image by this much per unit of lightness mismatch
    pub pad: Option<f64>,
    /// Jitter each image by a random offset up to the margin
    pub scatter: bool,
    /// Margin in pixels; derived from the first padded tile when zero
    pub margin: u32,
    /// Divide the margin by `1 + depth` for subdivided tiles
    pub scaled_margin: bool,
    /// Canvas color behind the tiles
    pub background: [u8; 3],
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            pad: None,
            scatter: false,
            margin: 0,
            scaled_margin: false,
            background: DEFAULT_BACKGROUND,
        }
    }
}

/// Size of a padded tile: shrinks linearly with the lightness delta (0..100)
pub fn shrink_by_lightness(pad: f64, size: [u32; 2], lightness_delta: f64) -> [u32; 2] {
    let factor = pad.mul_add(-(lightness_delta / 100.0), 1.0).clamp(0.0, 1.0);
    size.map(|side| ((f64::from(side) * factor).round() as u32).max(1))
}

/// Places matched images; remembers each opened pool image for the pass
#[derive(Debug, Default)]
pub struct Assembler {
    options: AssemblyOptions,
    thumbnails: HashMap<PathBuf, Option<Arc<RgbImage>>>,
}

impl Assembler {
    /// Create an assembler
    ///
    /// # Errors
    ///
    /// Returns an error if `pad` is negative or not finite
    pub fn new(options: AssemblyOptions) -> Result<Self> {
        if let Some(pad) = options.pad.filter(|pad| !(pad.is_finite() && *pad >= 0.0)) {
            return Err(invalid_parameter(
                "pad",
                &pad,
                &"must be a non-negative number",
            ));
        }
        Ok(Self {
            options,
            thumbnails: HashMap::new(),
        })
    }

    /// Options in use
    pub const fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Number of distinct pool images opened so far
    pub fn opened(&self) -> usize {
        self.thumbnails.len()
    }

    /// Build a `size` canvas from matched tiles, visiting them in random order
    ///
    /// A tile whose image cannot be opened is logged and left as background,
    /// and no tiles at all yields a background-only canvas.
    /// `on_place` sees each tile after its image is pasted.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas is empty or any tile is unmatched
    pub fn assemble<R, F>(
        &mut self,
        size: [u32; 2],
        tiles: &[Tile],
        rng: &mut R,
        mut on_place: F,
    ) -> Result<RgbImage>
    where
        R: Rng,
        F: FnMut(&Tile),
    {
        if tiles.iter().any(|tile| tile.matched.is_none()) {
            return Err(MosaicError::StageOrder {
                stage: "assemble",
                requires: "match",
            });
        }
        let [width, height] = size;
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "canvas size",
                &format!("{width}x{height}"),
                &"must be non-empty",
            ));
        }
        if tiles.is_empty() {
            warn!(width, height, "No tiles to place, canvas left as background");
        }

        let mut canvas = RgbImage::from_pixel(width, height, Rgb(self.options.background));
        let mut order: Vec<usize> = (0..tiles.len()).collect();
        order.shuffle(rng);

        let mut margin = self.options.margin;
        let mut skipped = 0usize;
        for tile in order.into_iter().filter_map(|i| tiles.get(i)) {
            let Some(record) = tile.matched.as_ref() else {
                continue;
            };
            let key = tile.key();
            let size = match self.options.pad {
                Some(pad) => {
                    let shrunk = shrink_by_lightness(pad, key.size(), record.lightness_delta);
                    if margin == 0 {
                        margin = key
                            .width
                            .saturating_sub(shrunk[0])
                            .min(key.height.saturating_sub(shrunk[1]));
                    }
                    shrunk
                }
                None => key.size(),
            };
            let tile_margin = if self.options.scaled_margin {
                margin / (1 + tile.depth() as u32)
            } else {
                margin
            };

            let Some(source) = self.thumbnail(tile) else {
                error!(tile = ?key, path = %record.path.display(), "Match image unavailable, leaving background");
                skipped += 1;
                continue;
            };
            let [x, y] = tile.placement(size, self.options.scatter, tile_margin, rng);
            imageops::overlay(&mut canvas, &crop_to_fit(&source, size), x, y);
            on_place(tile);
        }

        info!(tiles = tiles.len(), skipped, width, height, "Assembled mosaic");
        Ok(canvas)
    }

    fn thumbnail(&mut self, tile: &Tile) -> Option<Arc<RgbImage>> {
        let record = tile.matched.as_ref()?;
        let [ancestor_w, ancestor_h] = tile.ancestor_size();
        let bounds = [
            (2.0 * ancestor_w).ceil().max(1.0) as u32,
            (2.0 * ancestor_h).ceil().max(1.0) as u32,
        ];
        self.thumbnails
            .entry(record.path.clone())
            .or_insert_with(|| match open_thumbnail(&record.path, bounds) {
                Ok(image) => Some(Arc::new(image)),
                Err(e) => {
                    error!(error = %e, "Cannot open match image");
                    None
                }
            })
            .clone()
    }
}
