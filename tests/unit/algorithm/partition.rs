//! Tests for grid partitioning, recursive splitting and blank removal

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use photomosaic::MosaicError;
    use photomosaic::algorithm::partition::{Layout, Partition};
    use photomosaic::spatial::grid::{Rect, TileKey};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    fn half_split(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        })
    }

    fn partition(image: RgbImage, mask: Option<GrayImage>) -> Partition {
        Partition::new(image, mask, StdRng::seed_from_u64(42))
    }

    fn keys(partition: &mut Partition) -> Vec<TileKey> {
        partition.final_tiles().iter().map(|t| t.key()).collect()
    }

    // Tests a simple partition yields equal row-major tiles
    // Verified by producing column-major order
    #[test]
    fn test_simple_partition() {
        let mut p = partition(solid(100, 100, [255, 0, 0]), None);
        p.simple_partition([2, 2]).expect("Failed to partition");

        assert_eq!(
            keys(&mut p),
            vec![
                TileKey::new(0, 0, 50, 50),
                TileKey::new(50, 0, 50, 50),
                TileKey::new(0, 50, 50, 50),
                TileKey::new(50, 50, 50, 50),
            ]
        );
        assert!(p.final_tiles().iter().all(|t| t.depth() == 0));
    }

    // Tests brick partition adds one half tile per odd row
    // Verified by skipping the trailing half tile
    #[test]
    fn test_brick_partition() {
        let mut p = partition(solid(80, 40, [0, 0, 0]), None);
        p.partition([4, 2], Layout::Brick).expect("Failed to partition");

        assert_eq!(p.tiles().len(), 9);
        let area: u32 = keys(&mut p).iter().map(TileKey::area).sum();
        assert_eq!(area, 80 * 40);
    }

    // Tests zero grid dimensions are rejected
    // Verified by accepting a zero column count
    #[test]
    fn test_zero_dimensions_rejected() {
        let mut p = partition(solid(10, 10, [0, 0, 0]), None);
        assert!(matches!(
            p.simple_partition([0, 2]),
            Err(MosaicError::InvalidParameter { .. })
        ));
    }

    // Tests uniform tiles are never split
    // Verified by using >= for the threshold comparison
    #[test]
    fn test_uniform_tiles_not_split() {
        let mut p = partition(solid(64, 64, [90, 90, 90]), None);
        p.simple_partition([2, 2]).expect("Failed to partition");
        p.recursive_split(3, 0).expect("Failed to split");

        assert_eq!(p.tiles().len(), 4);
    }

    // Tests high-contrast tiles split and their uniform children stop
    // Verified by splitting every tile regardless of range
    #[test]
    fn test_split_on_dynamic_range() {
        let mut p = partition(half_split(100, 100), None);
        p.simple_partition([1, 1]).expect("Failed to partition");
        p.recursive_split(3, 80).expect("Failed to split");

        assert_eq!(p.tiles().len(), 4);
        assert!(p.tiles().iter().all(|t| t.depth() == 1));
    }

    // Tests splitting runs exactly depth generations
    // Verified by running one extra generation
    #[test]
    fn test_split_bounded_by_depth() {
        let noisy = RgbImage::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let mut p = partition(noisy, None);
        p.simple_partition([1, 1]).expect("Failed to partition");
        p.recursive_split(2, 10).expect("Failed to split");

        assert_eq!(p.tiles().len(), 16);
        assert!(p.tiles().iter().all(|t| t.depth() == 2));
        let area: f64 = p.tiles().iter().map(|t| t.rect().area()).sum();
        assert!((area - 64.0 * 64.0).abs() < 1e-9);
    }

    // Tests the mask edge forces a split even with an unreachable threshold
    // Verified by ignoring the mask test during splitting
    #[test]
    fn test_split_on_mask_edge() {
        let mask = GrayImage::from_fn(100, 100, |x, _| Luma([if x < 50 { 255 } else { 0 }]));
        let mut p = partition(solid(100, 100, [10, 200, 30]), Some(mask));
        p.simple_partition([1, 1]).expect("Failed to partition");
        p.recursive_split(1, 255).expect("Failed to split");

        assert_eq!(p.tiles().len(), 4);
    }

    // Tests straddle checks are false without a mask
    // Verified by treating a missing mask as all white
    #[test]
    fn test_no_mask_never_straddles() {
        let mut p = partition(solid(10, 10, [0, 0, 0]), None);
        let tile = photomosaic::spatial::tiles::Tile::root(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!p.straddles_mask_edge(&tile));
        assert!(p.crop_mask(tile.key()).is_none());
    }

    // Tests blank removal keeps white tiles and drops black ones
    // Verified by inverting the brightness test
    #[test]
    fn test_remove_blanks_white_and_black() {
        let mask = GrayImage::from_fn(100, 100, |x, _| Luma([if x < 50 { 255 } else { 0 }]));
        let mut p = partition(solid(100, 100, [0, 0, 0]), Some(mask));
        p.simple_partition([2, 2]).expect("Failed to partition");

        let removed = p.remove_blanks(0.1).expect("Failed to remove blanks");
        assert_eq!(removed, 2);
        assert!(p.tiles().iter().all(|t| t.rect().x < 50.0));
        assert!(p.tiles().iter().all(|t| t.blank == Some(false)));
    }

    // Tests large ambiguous tiles are dropped
    // Verified by comparing against the image height
    #[test]
    fn test_remove_blanks_large_gray() {
        let mask = GrayImage::from_pixel(100, 100, Luma([200]));
        let mut p = partition(solid(100, 100, [0, 0, 0]), Some(mask));
        p.simple_partition([2, 2]).expect("Failed to partition");

        assert_eq!(p.remove_blanks(0.5).expect("Failed to remove blanks"), 4);
        assert!(p.tiles().is_empty());
    }

    // Tests small ambiguous tiles survive at random and reproducibly
    // Verified by seeding the second partition differently
    #[test]
    fn test_remove_blanks_small_gray_deterministic() {
        let run = || {
            let mask = GrayImage::from_pixel(100, 100, Luma([128]));
            let mut p = partition(solid(100, 100, [0, 0, 0]), Some(mask));
            p.simple_partition([10, 10]).expect("Failed to partition");
            p.remove_blanks(1.0).expect("Failed to remove blanks");
            keys(&mut p)
        };

        let first = run();
        assert!(!first.is_empty());
        assert!(first.len() < 100);
        assert_eq!(first, run());
    }

    // Tests blank removal is a no-op without a mask
    // Verified by treating a missing mask as black
    #[test]
    fn test_remove_blanks_without_mask() {
        let mut p = partition(solid(20, 20, [0, 0, 0]), None);
        p.simple_partition([2, 2]).expect("Failed to partition");
        assert_eq!(p.remove_blanks(0.1).expect("Failed to remove blanks"), 0);
        assert_eq!(p.tiles().len(), 4);
    }

    // Tests the final tile list is memoized and freezes the partition
    // Verified by recomputing the list on each call
    #[test]
    fn test_final_tiles_memoized() {
        let mut p = partition(solid(30, 30, [0, 0, 0]), None);
        p.simple_partition([3, 3]).expect("Failed to partition");

        let first = p.final_tiles().as_ptr();
        let second = p.final_tiles().as_ptr();
        assert_eq!(first, second);
        assert!(p.is_finalized());

        assert!(matches!(
            p.simple_partition([2, 2]),
            Err(MosaicError::PartitionFinalized { .. })
        ));
        assert!(matches!(
            p.recursive_split(1, 0),
            Err(MosaicError::PartitionFinalized { .. })
        ));
        assert!(matches!(
            p.remove_blanks(0.1),
            Err(MosaicError::PartitionFinalized { .. })
        ));
        assert_eq!(p.final_tiles().len(), 9);
    }

    // Tests final tiles are quantized outward
    // Verified by rounding tile origins to nearest
    #[test]
    fn test_final_tiles_cover_fractional_tiles() {
        let mut p = partition(half_split(10, 10), None);
        p.simple_partition([3, 3]).expect("Failed to partition");
        let floating: Vec<Rect<f64>> = p.tiles().iter().map(|t| t.rect()).collect();

        let finals: Vec<Rect<f64>> = p.final_tiles().iter().map(|t| t.rect()).collect();
        for (exact, rounded) in floating.iter().zip(&finals) {
            assert!(rounded.contains(exact));
            assert!((rounded.x - rounded.x.floor()).abs() < f64::EPSILON);
        }
    }

    // Tests crops of one key are shared through the cache
    // Verified by bypassing the cache in crop()
    #[test]
    fn test_partition_crop_identity() {
        let mut p = partition(solid(20, 20, [1, 2, 3]), None);
        let key = TileKey::new(5, 5, 10, 10);

        let a = p.crop(key);
        let b = p.crop(key);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(p.image_cache_stats().hits, 1);
    }

    // Tests size normalization rounds sides up to the grid factor
    // Verified by rounding down instead
    #[test]
    fn test_normalize_size_rounds_up() {
        let mask = GrayImage::from_pixel(101, 67, Luma([255]));
        let mut p = partition(solid(101, 67, [0, 0, 0]), Some(mask));
        p.normalize_size([2, 2], 1, None).expect("Failed to normalize");

        assert_eq!(p.image().dimensions(), (104, 68));
        assert_eq!(p.mask().map(GrayImage::dimensions), Some((104, 68)));
    }

    // Tests base width rescales so each cell has that width
    // Verified by scaling the height by the column count
    #[test]
    fn test_normalize_size_base_width() {
        let mut p = partition(solid(100, 50, [0, 0, 0]), None);
        p.normalize_size([2, 2], 0, Some(10)).expect("Failed to normalize");

        assert_eq!(p.image().dimensions(), (20, 10));
    }

    // Tests a mask of different geometry is fitted to the image
    // Verified by keeping the mask at its own size
    #[test]
    fn test_mask_fitted_on_construction() {
        let mask = GrayImage::from_pixel(10, 10, Luma([255]));
        let p = partition(solid(40, 30, [0, 0, 0]), Some(mask));

        assert_eq!(p.mask().map(GrayImage::dimensions), Some((40, 30)));
    }

    // Tests binarization removes gray mask levels
    // Verified by thresholding with > instead of >=
    #[test]
    fn test_binarize_mask() {
        let mask = GrayImage::from_fn(4, 1, |x, _| Luma([[0, 127, 128, 250][x as usize]]));
        let mut p = partition(solid(4, 1, [0, 0, 0]), Some(mask));
        p.binarize_mask(128).expect("Failed to binarize");

        let values: Vec<u8> = p
            .mask()
            .map(|m| m.pixels().map(|px| px.0[0]).collect())
            .unwrap_or_default();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    // Tests the preview insets each tile by the margin over white
    // Verified by drawing the preview without margins
    #[test]
    fn test_preview_margin() {
        let mut p = partition(solid(100, 100, [255, 0, 0]), None);
        p.simple_partition([2, 2]).expect("Failed to partition");

        let preview = p.preview(2);
        assert_eq!(preview.dimensions(), (100, 100));
        assert_eq!(preview.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(preview.get_pixel(50, 49).0, [255, 255, 255]);
        let center = preview.get_pixel(25, 25).0;
        assert!(center[0] >= 250 && center[1] <= 5 && center[2] <= 5);
    }
}
