//! Image normalization pipeline applied to every photo upload.
//!
//! Decode, fix orientation from embedded metadata, flatten to RGB,
//! downscale to the display maximum, re-encode as JPEG. Videos never pass
//! through here; they are forwarded to the media service unchanged.

use std::fmt;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader};

/// Longer side of a stored photo never exceeds this.
pub const MAX_DIMENSION: u32 = 800;
pub const JPEG_QUALITY: u8 = 85;

pub struct NormalizedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub enum MediaError {
    Decode(ImageError),
    Encode(ImageError),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Decode(e) => write!(f, "failed to decode image: {}", e),
            MediaError::Encode(e) => write!(f, "failed to encode image: {}", e),
        }
    }
}

impl std::error::Error for MediaError {}

/// Runs the full pipeline and returns the encoded payload plus the final
/// pixel dimensions.
pub fn normalize(raw: &[u8]) -> Result<NormalizedImage, MediaError> {
    let reader = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| MediaError::Decode(ImageError::IoError(e)))?;
    let mut decoder = reader.into_decoder().map_err(MediaError::Decode)?;

    // Orientation metadata is best-effort: an unreadable tag is skipped,
    // never fatal to the upload.
    let orientation = match decoder.orientation() {
        Ok(o) => o,
        Err(e) => {
            log::warn!("Could not read image orientation metadata: {}", e);
            Orientation::NoTransforms
        }
    };

    let image = DynamicImage::from_decoder(decoder).map_err(MediaError::Decode)?;
    let image = correct_orientation(image, orientation);

    // Flatten palette/alpha modes before lossy re-encoding.
    let image = DynamicImage::ImageRgb8(image.to_rgb8());
    let image = downscale(image);

    let (width, height) = (image.width(), image.height());
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    image.write_with_encoder(encoder).map_err(MediaError::Encode)?;

    Ok(NormalizedImage {
        jpeg,
        width,
        height,
    })
}

/// Applies the three rotation codes the journal has always honored
/// (EXIF 3, 6, 8). Mirrored or absent orientations pass through untouched.
fn correct_orientation(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Rotate180 => image.rotate180(),
        Orientation::Rotate90 => image.rotate90(),
        Orientation::Rotate270 => image.rotate270(),
        _ => image,
    }
}

fn downscale(image: DynamicImage) -> DynamicImage {
    let longer = image.width().max(image.height());
    if longer <= MAX_DIMENSION {
        return image;
    }
    image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([120, 40, 200]));
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        png
    }

    #[test]
    fn small_image_keeps_its_dimensions() {
        let out = normalize(&solid(640, 480)).unwrap();
        assert_eq!((out.width, out.height), (640, 480));
    }

    #[test]
    fn wide_image_downscales_to_max_longer_side() {
        let out = normalize(&solid(1600, 1200)).unwrap();
        assert_eq!(out.width, MAX_DIMENSION);
        assert_eq!(out.height, 600);
    }

    #[test]
    fn tall_image_preserves_aspect_ratio() {
        let out = normalize(&solid(900, 1800)).unwrap();
        assert_eq!(out.height, MAX_DIMENSION);
        assert_eq!(out.width, 400);
    }

    #[test]
    fn output_is_decodable_jpeg_with_matching_dimensions() {
        let out = normalize(&solid(1000, 500)).unwrap();
        let decoded = image::load_from_memory(&out.jpeg).unwrap();
        assert_eq!(decoded.width(), out.width);
        assert_eq!(decoded.height(), out.height);
    }

    #[test]
    fn corrupt_bytes_are_a_decode_error() {
        assert!(matches!(
            normalize(b"definitely not an image"),
            Err(MediaError::Decode(_))
        ));
    }

    // A 2x1 image with distinct pixels pins down the rotation direction for
    // each honored orientation code.
    fn two_pixel() -> DynamicImage {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn orientation_three_rotates_half_turn() {
        let out = correct_orientation(two_pixel(), Orientation::Rotate180).to_rgb8();
        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn orientation_six_rotates_quarter_turn_clockwise() {
        let out = correct_orientation(two_pixel(), Orientation::Rotate90).to_rgb8();
        assert_eq!(out.dimensions(), (1, 2));
        // Red was leftmost, so after a clockwise quarter turn it is on top.
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(0, 1), &Rgb([0, 0, 255]));
    }

    #[test]
    fn orientation_eight_rotates_quarter_turn_counterclockwise() {
        let out = correct_orientation(two_pixel(), Orientation::Rotate270).to_rgb8();
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(out.get_pixel(0, 1), &Rgb([255, 0, 0]));
    }

    #[test]
    fn mirrored_orientations_are_left_alone() {
        let out = correct_orientation(two_pixel(), Orientation::FlipHorizontal).to_rgb8();
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }
}
