//! Conversion of rendered images into 1-bit bitmaps.
//!
//! The pipeline is fixed: flatten transparency onto white, convert to
//! greyscale, apply a brightness offset, ordered dither, posterize to two
//! levels and finally threshold a single luminance channel.

use image::{imageops, DynamicImage, GenericImageView, GrayImage, ImageBuffer, Rgb, RgbImage};
use log::debug;

use crate::{bitmap::Bitmap, error::Error};

/// 4x4 Bayer matrix added to each pixel before posterizing.
const DITHER_MATRIX: [u8; 16] = [1, 9, 3, 11, 13, 5, 15, 7, 4, 12, 2, 10, 16, 8, 14, 6];

const POSTERIZE_LEVELS: u32 = 2;

/// Tuning of the monochrome conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterPolicy {
    /// Luminance below this value prints black.
    pub threshold: u8,
    /// Brightness offset in `-1.0..=1.0`, `0.0` leaves the image untouched.
    pub brightness: f32,
}

impl Default for RasterPolicy {
    fn default() -> Self {
        RasterPolicy {
            threshold: 50,
            brightness: 0.0,
        }
    }
}

impl RasterPolicy {
    pub fn threshold(self, threshold: u8) -> Self {
        RasterPolicy { threshold, ..self }
    }

    pub fn brightness(self, brightness: f32) -> Self {
        RasterPolicy {
            brightness: brightness.max(-1.0).min(1.0),
            ..self
        }
    }
}

/// Convert a rendered image into a packed bitmap, one row per scanline.
pub fn rasterize(image: &DynamicImage, policy: &RasterPolicy) -> Result<Bitmap, Error> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidArgument(format!(
            "image must not be empty, got {}x{}",
            width, height
        )));
    }

    let grey = monochrome(image, policy);

    let mut bitmap = Bitmap::new(width, height);
    for (x, y, pixel) in grey.enumerate_pixels() {
        if pixel[0] < policy.threshold {
            bitmap.set_pixel(x, y, true);
        }
    }
    debug!(
        "rasterized {}x{} image into {} rows of {} bytes",
        width,
        height,
        bitmap.height(),
        bitmap.bytes_per_row()
    );
    Ok(bitmap)
}

/// Decode an encoded image (PNG, BMP) and rasterize it.
pub fn rasterize_encoded(data: &[u8], policy: &RasterPolicy) -> Result<Bitmap, Error> {
    let image = image::load_from_memory(data)
        .map_err(|err| Error::InvalidArgument(format!("not a valid raster image: {}", err)))?;
    rasterize(&image, policy)
}

fn monochrome(image: &DynamicImage, policy: &RasterPolicy) -> GrayImage {
    let rgba = image.to_rgba8();
    let opaque: RgbImage = ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let alpha = p[3] as u32;
        let flatten = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([flatten(p[0]), flatten(p[1]), flatten(p[2])])
    });

    let mut grey = imageops::grayscale(&opaque);
    for (x, y, pixel) in grey.enumerate_pixels_mut() {
        let v = brighten(pixel[0], policy.brightness);
        let v = dither(v, x, y);
        pixel[0] = posterize(v);
    }
    grey
}

fn brighten(v: u8, brightness: f32) -> u8 {
    let v = v as f32;
    let out = if brightness < 0.0 {
        v * (1.0 + brightness)
    } else {
        v + (255.0 - v) * brightness
    };
    out.round().max(0.0).min(255.0) as u8
}

fn dither(v: u8, x: u32, y: u32) -> u8 {
    let index = ((y & 3) << 2) + (x & 3);
    v.saturating_add(DITHER_MATRIX[index as usize])
}

fn posterize(v: u8) -> u8 {
    let steps = POSTERIZE_LEVELS - 1;
    let level = v as u32 * steps / 255;
    (level * 255 / steps) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba, RgbaImage};

    fn grey_image(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)])))
    }

    #[test]
    fn geometry_follows_image_size() {
        for &(w, h) in &[(1, 1), (8, 3), (9, 2), (17, 5), (64, 1)] {
            let bitmap = rasterize(&grey_image(w, h, |_, _| 255), &RasterPolicy::default())
                .unwrap();
            assert_eq!(bitmap.bytes_per_row(), ((w + 7) / 8) as usize);
            assert_eq!(bitmap.height(), h);
            assert!(bitmap.rows().iter().all(|r| r.len() == bitmap.bytes_per_row()));
        }
    }

    #[test]
    fn black_and_white_pixels_are_preserved() {
        let image = grey_image(11, 3, |x, y| if (x + y) % 3 == 0 { 0 } else { 255 });
        let bitmap = rasterize(&image, &RasterPolicy::default()).unwrap();
        for y in 0..3 {
            for x in 0..11 {
                assert_eq!(bitmap.pixel(x, y), (x + y) % 3 == 0, "pixel {},{}", x, y);
            }
        }
    }

    #[test]
    fn partial_last_byte_keeps_padding_clear() {
        let bitmap = rasterize(&grey_image(10, 1, |_, _| 0), &RasterPolicy::default()).unwrap();
        assert_eq!(bitmap.rows()[0], vec![0xFF, 0b1100_0000]);
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let rgba: RgbaImage = ImageBuffer::from_fn(8, 1, |x, _| {
            if x < 4 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        let bitmap =
            rasterize(&DynamicImage::ImageRgba8(rgba), &RasterPolicy::default()).unwrap();
        assert_eq!(bitmap.rows()[0], vec![0x0F]);
    }

    #[test]
    fn brightness_offset_moves_grey_across_the_threshold() {
        let image = grey_image(8, 8, |_, _| 200);
        let dark = rasterize(&image, &RasterPolicy::default()).unwrap();
        assert!(dark.rows().iter().all(|r| r[0] == 0xFF));

        let light = rasterize(&image, &RasterPolicy::default().brightness(1.0)).unwrap();
        assert!(light.rows().iter().all(|r| r[0] == 0x00));

        let white = grey_image(8, 8, |_, _| 255);
        let darkened = rasterize(&white, &RasterPolicy::default().brightness(-1.0)).unwrap();
        assert!(darkened.rows().iter().all(|r| r[0] == 0xFF));
    }

    #[test]
    fn brightness_is_clamped() {
        assert_eq!(RasterPolicy::default().brightness(3.0).brightness, 1.0);
        assert_eq!(RasterPolicy::default().brightness(-3.0).brightness, -1.0);
    }

    #[test]
    fn ordered_dither_spreads_near_white() {
        // 247 + dither reaches 255 only where the matrix value is at least 8
        let bitmap = rasterize(&grey_image(4, 4, |_, _| 247), &RasterPolicy::default()).unwrap();
        let black = (0..4)
            .flat_map(|y| (0..4).map(move |x| (x, y)))
            .filter(|&(x, y)| bitmap.pixel(x, y))
            .count();
        assert_eq!(black, 7);
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = DynamicImage::new_luma8(0, 4);
        assert!(matches!(
            rasterize(&image, &RasterPolicy::default()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn undecodable_buffer_is_rejected() {
        assert!(matches!(
            rasterize_encoded(b"not an image", &RasterPolicy::default()),
            Err(Error::InvalidArgument(_))
        ));
    }
}
