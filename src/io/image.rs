//! Raster I/O and geometry primitives: open, crop-to-fit, binarize, save

use crate::io::error::{MosaicError, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma, Pixel, RgbImage};
use std::path::Path;

/// Open an image from disk as 8-bit RGB
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded
pub fn open_rgb(path: &Path) -> Result<RgbImage> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| MosaicError::ImageLoad {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Open a mask from disk as 8-bit single channel
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded
pub fn open_mask(path: &Path) -> Result<GrayImage> {
    image::open(path)
        .map(|img| img.to_luma8())
        .map_err(|e| MosaicError::ImageLoad {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Open an image scaled down to fit within `bounds`, keeping its aspect ratio
///
/// Images already inside the bounds are returned at full size.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded
pub fn open_thumbnail(path: &Path, bounds: [u32; 2]) -> Result<RgbImage> {
    let decoded = image::open(path).map_err(|e| MosaicError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    if decoded.width() <= bounds[0] && decoded.height() <= bounds[1] {
        return Ok(decoded.to_rgb8());
    }
    Ok(decoded.thumbnail(bounds[0], bounds[1]).to_rgb8())
}

/// Scale `image` to cover `size` and crop the centered excess
pub fn crop_to_fit<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    size: [u32; 2],
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    crop_to_fit_with(image, size, FilterType::Triangle)
}

/// `crop_to_fit` with an explicit resampling filter
pub fn crop_to_fit_with<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    size: [u32; 2],
    filter: FilterType,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let (width, height) = image.dimensions();
    let [target_w, target_h] = size;

    if width == target_w && height == target_h {
        return image.clone();
    }
    if width == 0 || height == 0 || target_w == 0 || target_h == 0 {
        return ImageBuffer::new(target_w, target_h);
    }

    let scale = (f64::from(target_w) / f64::from(width))
        .max(f64::from(target_h) / f64::from(height));
    let scaled_w = ((f64::from(width) * scale).round() as u32).max(target_w);
    let scaled_h = ((f64::from(height) * scale).round() as u32).max(target_h);

    let scaled = imageops::resize(image, scaled_w, scaled_h, filter);
    let offset_x = (scaled_w - target_w) / 2;
    let offset_y = (scaled_h - target_h) / 2;
    imageops::crop_imm(&scaled, offset_x, offset_y, target_w, target_h).to_image()
}

/// Fit a mask to `size` without introducing intermediate gray levels
pub fn fit_mask(mask: &GrayImage, size: [u32; 2]) -> GrayImage {
    crop_to_fit_with(mask, size, FilterType::Nearest)
}

/// Threshold a mask to pure black and white
pub fn binarize(mask: &GrayImage, threshold: u8) -> GrayImage {
    let mut output = mask.clone();
    for pixel in output.pixels_mut() {
        *pixel = Luma([if pixel.0[0] >= threshold { 255 } else { 0 }]);
    }
    output
}

/// Save an RGB image, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written to the specified path
pub fn save_rgb(image: &RgbImage, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    image
        .save(output_path)
        .map_err(|e| MosaicError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })
}
