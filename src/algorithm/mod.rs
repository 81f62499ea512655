/// Compositing matched images into the mosaic
pub mod assembly;
/// Crop memoization keyed by integer tile rectangles
pub mod cache;
/// Tile to pool-image matching with usage penalty
pub mod matcher;
/// End-to-end pipeline orchestration
pub mod mosaic;
/// Grid layout, recursive split and blank removal
pub mod partition;
/// Palette tuning and untuning
pub mod tuning;
