//! Photomosaic construction: rebuild a target image from a pool of smaller images
//!
//! The target is divided into an adaptive quadtree of tiles, each tile is
//! summarized by the dominant colors of its four quadrants, and every tile is
//! matched to the pool image with the closest color profile under a penalty
//! on repeated use. Palette tuning moves the target toward what the pool can
//! represent before matching and moves the result back afterwards.

#![forbid(unsafe_code)]

/// Partitioning, matching, tuning and assembly stages
pub mod algorithm;
/// Dominant colors, pixel statistics and tonal levels
pub mod analysis;
/// Input/output operations and error handling
pub mod io;
/// Interpolation and color distance utilities
pub mod math;
/// Rectangles, grid layouts and tiles
pub mod spatial;

pub use io::error::{MosaicError, Result};
