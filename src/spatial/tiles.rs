//! Tiles and their quadtree ancestry
//!
//! A tile is born as a top-level grid cell and may be split into four
//! children any number of times. Each split appends the child's quadrant
//! index to its ancestry, so the tile's placement in the mosaic can be
//! rebuilt from its ancestor cell plus one halving offset per generation.

use crate::analysis::colors::ColorProfile;
use crate::io::pool::MatchRecord;
use crate::spatial::grid::{Rect, TileKey};
use rand::Rng;

/// Quadrant index pair `[x, y]`, each 0 or 1
pub type Quadrant = [u8; 2];

/// Quadrant indices in child order
pub const QUADRANT_ORDER: [Quadrant; 4] = [[0, 0], [1, 0], [0, 1], [1, 1]];

/// A rectangular region of the target image, eventually mapped to one pool image
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    rect: Rect<f64>,
    ancestor_origin: [f64; 2],
    ancestor_size: [f64; 2],
    ancestry: Vec<Quadrant>,
    /// Dominant colors, set once the tile is analyzed
    pub colors: Option<ColorProfile>,
    /// `None` until blankness is decided
    pub blank: Option<bool>,
    /// Chosen pool image, set by the matcher
    pub matched: Option<MatchRecord>,
}

impl Tile {
    /// Create a top-level tile, its own ancestor
    pub fn root(rect: Rect<f64>) -> Self {
        Self {
            rect,
            ancestor_origin: [rect.x, rect.y],
            ancestor_size: [rect.width, rect.height],
            ancestry: Vec::new(),
            colors: None,
            blank: None,
            matched: None,
        }
    }

    /// Current rectangle (fractional until quantized)
    pub const fn rect(&self) -> Rect<f64> {
        self.rect
    }

    /// Integer-quantized rectangle
    pub fn key(&self) -> TileKey {
        self.rect.quantize()
    }

    /// Quadrant path from the ancestor cell to this tile
    pub fn ancestry(&self) -> &[Quadrant] {
        &self.ancestry
    }

    /// Number of subdivisions separating this tile from its ancestor cell
    pub fn depth(&self) -> usize {
        self.ancestry.len()
    }

    /// Size of the top-level grid cell this tile descends from
    pub const fn ancestor_size(&self) -> [f64; 2] {
        self.ancestor_size
    }

    /// Origin of the top-level grid cell this tile descends from
    pub const fn ancestor_origin(&self) -> [f64; 2] {
        self.ancestor_origin
    }

    /// Split into four children of half width and half height
    ///
    /// The children exactly cover this tile and inherit its ancestor cell.
    pub fn subdivide(&self) -> [Self; 4] {
        let rects = self.rect.quadrants();
        std::array::from_fn(|i| {
            let mut ancestry = Vec::with_capacity(self.ancestry.len() + 1);
            ancestry.extend_from_slice(&self.ancestry);
            ancestry.push(QUADRANT_ORDER.get(i).copied().unwrap_or_default());
            Self {
                rect: rects.get(i).copied().unwrap_or(self.rect),
                ancestor_origin: self.ancestor_origin,
                ancestor_size: self.ancestor_size,
                ancestry,
                colors: None,
                blank: None,
                matched: None,
            }
        })
    }

    /// Copy of this tile with its rectangle rounded outward to whole pixels
    pub fn quantized(&self) -> Self {
        Self {
            rect: Rect::from(self.key()),
            ..self.clone()
        }
    }

    /// Position at which an image of `size` is pasted for this tile
    ///
    /// Sums the ancestor cell origin, one halving offset per ancestry level,
    /// and a padding term: centered when `size` differs from the tile, or a
    /// random offset in `0..=margin` on each axis when `scatter` is set.
    pub fn placement<R: Rng>(
        &self,
        size: [u32; 2],
        scatter: bool,
        margin: u32,
        rng: &mut R,
    ) -> [i64; 2] {
        let [ancestor_w, ancestor_h] = self.ancestor_size;
        let mut position = self.ancestor_origin;
        let mut scale = 1.0;
        for &[qx, qy] in &self.ancestry {
            scale /= 2.0;
            position[0] += f64::from(qx) * ancestor_w * scale;
            position[1] += f64::from(qy) * ancestor_h * scale;
        }

        let key = self.key();
        let padding = if scatter {
            [
                i64::from(rng.random_range(0..=margin)),
                i64::from(rng.random_range(0..=margin)),
            ]
        } else if size == key.size() {
            [0, 0]
        } else {
            [
                (i64::from(key.width) - i64::from(size[0])) / 2,
                (i64::from(key.height) - i64::from(size[1])) / 2,
            ]
        };

        [
            position[0].floor() as i64 + padding[0],
            position[1].floor() as i64 + padding[1],
        ]
    }
}
