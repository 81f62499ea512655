//! Pipeline constants and runtime configuration defaults

// Partitioning defaults
/// Number of top-level grid cells along each axis
pub const DEFAULT_DIMENSIONS: u32 = 10;
/// Generations of recursive quadrant subdivision
pub const DEFAULT_DEPTH: u32 = 0;
/// Luma spread above which a tile is subdivided
pub const DEFAULT_HDR_THRESHOLD: u8 = 80;
/// Ambiguous mask tiles at least this fraction of the image width are dropped
pub const DEFAULT_BLANK_FRACTION: f64 = 0.1;

// Matching defaults
/// Raw-distance slack before a penalized choice is reported
pub const DEFAULT_TOLERANCE: f64 = 1.0;
/// Distance added per use beyond the free allowance
pub const DEFAULT_USAGE_PENALTY: f64 = 5.0;
/// Number of uses before the usage penalty applies
pub const DEFAULT_USAGE_IMPUNITY: u32 = 2;

// Tuning defaults
/// Fraction of the untuned result blended into the final mosaic
pub const DEFAULT_UNTUNE_BLEND: f64 = 1.0;
/// Quantile knots per channel in a palette curve
pub const PALETTE_KNOTS: usize = 16;

// Color analysis
/// Quantization levels per channel for the histogram-mode reduction
pub const MODE_LEVELS: u8 = 8;
/// Longest side of the thumbnail pool candidates are analyzed on
pub const ANALYSIS_THUMBNAIL_SIZE: u32 = 64;
/// Number of sub-quadrant samples per tile
pub const QUADRANTS: usize = 4;

// Mask handling
/// Gray level at which non-debris masks are binarized
pub const MASK_BINARIZE_THRESHOLD: u8 = 128;

// Default values for configurable parameters
/// Fixed seed for reproducible generation
pub const DEFAULT_SEED: u64 = 42;
/// Canvas color behind tiles
pub const DEFAULT_BACKGROUND: [u8; 3] = [255, 255, 255];

// Output settings
/// Suffix added to output filenames
pub const OUTPUT_SUFFIX: &str = "_mosaic";
/// Suffix added to visualization filenames
pub const VISUALIZATION_SUFFIX: &str = "_visualization";
/// Delay between GIF animation frames
pub const GIF_FRAME_DELAY_MS: u32 = 20;
/// Minimum frame delay that viewers reliably support (in milliseconds)
pub const VIEWER_MIN_FRAME_DELAY_MS: u32 = 50;
/// Upper bound on recorded events drawn into a single GIF frame
pub const MAX_FRAMES_PER_STAGE: usize = 40;
/// Longest side of a rendered visualization frame
pub const VISUALIZATION_MAX_SIDE: u32 = 512;
/// Outline color drawn around partitioned tiles in visualizations
pub const OUTLINE_COLOR: [u8; 3] = [64, 64, 64];
