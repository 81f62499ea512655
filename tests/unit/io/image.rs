//! Tests for image loading, crop-to-fit, mask binarization and saving

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};
    use photomosaic::MosaicError;
    use photomosaic::io::image::{
        binarize, crop_to_fit, fit_mask, open_mask, open_rgb, open_thumbnail, save_rgb,
    };
    use std::fs;
    use tempfile::TempDir;

    // Tests crop-to-fit produces the exact requested size
    // Verified by letterboxing instead of cropping
    #[test]
    fn test_crop_to_fit_size() {
        let image = RgbImage::from_pixel(300, 100, Rgb([10, 20, 30]));
        for size in [[50, 50], [120, 30], [7, 90], [300, 100]] {
            let fitted = crop_to_fit(&image, size);
            assert_eq!(fitted.dimensions(), (size[0], size[1]));
        }
    }

    // Tests the centered region survives the crop
    // Verified by cropping from the left edge
    #[test]
    fn test_crop_to_fit_centered() {
        let image = RgbImage::from_fn(30, 10, |x, _| {
            if (10..20).contains(&x) { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        let fitted = crop_to_fit(&image, [10, 10]);
        assert_eq!(fitted.get_pixel(5, 5).0, [255, 255, 255]);
    }

    // Tests degenerate sizes give empty buffers instead of panicking
    // Verified by dividing by the zero width
    #[test]
    fn test_crop_to_fit_degenerate() {
        let image = RgbImage::from_pixel(4, 4, Rgb([1, 1, 1]));
        assert_eq!(crop_to_fit(&image, [0, 3]).dimensions(), (0, 3));
        assert_eq!(crop_to_fit(&RgbImage::new(0, 0), [2, 2]).dimensions(), (2, 2));
    }

    // Tests fitting a mask never introduces gray levels
    // Verified by resampling the mask with a smoothing filter
    #[test]
    fn test_fit_mask_nearest() {
        let mask = GrayImage::from_fn(8, 8, |x, _| Luma([if x < 4 { 255 } else { 0 }]));
        let fitted = fit_mask(&mask, [21, 13]);

        assert_eq!(fitted.dimensions(), (21, 13));
        assert!(fitted.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    // Tests binarization threshold is inclusive
    // Verified by using a strict comparison
    #[test]
    fn test_binarize() {
        let mask = GrayImage::from_fn(3, 1, |x, _| Luma([[99, 100, 101][x as usize]]));
        let binary = binarize(&mask, 100);
        let values: Vec<u8> = binary.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 255, 255]);
    }

    // Tests saving creates parent directories and round-trips pixels
    // Verified by disabling directory creation
    #[test]
    fn test_save_and_open() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("deeper").join("out.png");
        let image = RgbImage::from_fn(5, 4, |x, y| Rgb([x as u8 * 40, y as u8 * 60, 7]));

        save_rgb(&image, &path).expect("Failed to save");
        assert!(path.exists());
        assert_eq!(open_rgb(&path).expect("Failed to reopen"), image);
    }

    // Tests masks are read as single-channel luminance
    // Verified by reading only the red channel
    #[test]
    fn test_open_mask_from_rgba() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("mask.png");
        RgbaImage::from_pixel(3, 3, image::Rgba([255, 255, 255, 255]))
            .save(&path)
            .expect("Failed to write mask");

        let mask = open_mask(&path).expect("Failed to open mask");
        assert!(mask.pixels().all(|p| p.0[0] == 255));
    }

    // Tests thumbnails respect the bounds and keep small images whole
    // Verified by always returning the full-size image
    #[test]
    fn test_open_thumbnail() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("wide.png");
        RgbImage::from_pixel(200, 100, Rgb([9, 9, 9]))
            .save(&path)
            .expect("Failed to write image");

        let small = open_thumbnail(&path, [50, 50]).expect("Failed to open thumbnail");
        assert!(small.width() <= 50 && small.height() <= 50);
        assert_eq!(small.width(), 50);

        let whole = open_thumbnail(&path, [400, 400]).expect("Failed to open thumbnail");
        assert_eq!(whole.dimensions(), (200, 100));
    }

    // Tests unreadable files report the offending path
    // Verified by mapping to a generic error
    #[test]
    fn test_open_errors() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("broken.png");
        fs::write(&path, b"not an image").expect("Failed to write file");

        match open_rgb(&path) {
            Err(MosaicError::ImageLoad { path: reported, .. }) => assert_eq!(reported, path),
            other => assert!(other.is_err(), "expected load failure"),
        }
        assert!(open_mask(&dir.path().join("missing.png")).is_err());
    }
}
