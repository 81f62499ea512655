//! Tests for default parameters and their relationships

#[cfg(test)]
mod tests {
    use photomosaic::io::configuration::{
        DEFAULT_BACKGROUND, DEFAULT_BLANK_FRACTION, DEFAULT_DIMENSIONS, DEFAULT_HDR_THRESHOLD,
        DEFAULT_TOLERANCE, DEFAULT_UNTUNE_BLEND, DEFAULT_USAGE_PENALTY, GIF_FRAME_DELAY_MS,
        MASK_BINARIZE_THRESHOLD, MAX_FRAMES_PER_STAGE, MODE_LEVELS, OUTPUT_SUFFIX,
        PALETTE_KNOTS, QUADRANTS, VIEWER_MIN_FRAME_DELAY_MS, VISUALIZATION_SUFFIX,
    };

    // Tests the default grid and split threshold
    // Verified by changing constant values
    #[test]
    fn test_partition_defaults() {
        assert_eq!(DEFAULT_DIMENSIONS, 10);
        assert_eq!(DEFAULT_HDR_THRESHOLD, 80);
        assert!((0.0..=1.0).contains(&DEFAULT_BLANK_FRACTION));
        assert_eq!(MASK_BINARIZE_THRESHOLD, 128);
    }

    // Tests matching defaults are usable settings
    // Verified by making the penalty negative
    #[test]
    fn test_matching_defaults() {
        assert!(DEFAULT_TOLERANCE >= 0.0);
        assert!(DEFAULT_USAGE_PENALTY >= 0.0);
        assert!((0.0..=1.0).contains(&DEFAULT_UNTUNE_BLEND));
    }

    // Tests analysis constants
    // Verified by reducing knots below two
    #[test]
    fn test_analysis_constants() {
        assert_eq!(QUADRANTS, 4);
        assert!(PALETTE_KNOTS >= 2);
        assert!(MODE_LEVELS >= 2);
    }

    // Tests output naming and frame pacing
    // Verified by swapping the suffixes
    #[test]
    fn test_output_constants() {
        assert_eq!(OUTPUT_SUFFIX, "_mosaic");
        assert_eq!(VISUALIZATION_SUFFIX, "_visualization");
        assert_eq!(DEFAULT_BACKGROUND, [255, 255, 255]);
        assert!(GIF_FRAME_DELAY_MS < VIEWER_MIN_FRAME_DELAY_MS);
        assert!(MAX_FRAMES_PER_STAGE > 0);
    }
}
