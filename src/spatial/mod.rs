//! Spatial data structures: rectangles, grid layouts and quadtree tiles

/// Rectangles, outward quantization and grid layouts
pub mod grid;
/// Tiles with quadrant ancestry and placement
pub mod tiles;

pub use grid::{Rect, TileKey};
pub use tiles::Tile;
