//! Image analysis: dominant colors, pixel statistics and tonal levels

/// Quadrant dominant-color profiles in RGB and Lab
pub mod colors;
/// Channel histograms, palettes and level remapping
pub mod levels;
/// Dynamic range, extrema and mask-edge tests
pub mod statistics;
