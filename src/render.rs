//! Text label rendering boundary.
//!
//! Font rasterization lives outside this crate. A [`TextRenderer`] turns a
//! validated [`TextRequest`] into an image the printer can rasterize.

use image::DynamicImage;

use crate::error::Error;

/// Font sizes a renderer has to support, in pixels.
pub const FONT_SIZES: [u32; 8] = [8, 10, 12, 14, 16, 32, 64, 128];

/// A single block of text to draw on a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub font_size: u32,
    pub text: String,
}

impl TextRequest {
    pub fn new(
        width: u32,
        height: u32,
        margin: u32,
        font_size: u32,
        text: impl Into<String>,
    ) -> Result<Self, Error> {
        let text = text.into();
        if width == 0 || height == 0 {
            return Err(Error::InvalidArgument(format!(
                "label size must be positive, got {}x{}",
                width, height
            )));
        }
        if !FONT_SIZES.contains(&font_size) {
            return Err(Error::InvalidArgument(format!(
                "unsupported font size {}, expected one of {:?}",
                font_size, FONT_SIZES
            )));
        }
        if text.is_empty() {
            return Err(Error::InvalidArgument("text must not be empty".to_string()));
        }
        Ok(TextRequest {
            width,
            height,
            margin,
            font_size,
            text,
        })
    }
}

/// Draws text into an image, black on white.
pub trait TextRenderer {
    fn render(&self, request: &TextRequest) -> Result<DynamicImage, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_sizes() {
        for &size in FONT_SIZES.iter() {
            assert!(TextRequest::new(400, 100, 4, size, "Hello").is_ok());
        }
    }

    #[test]
    fn rejects_bad_requests() {
        assert!(TextRequest::new(0, 100, 0, 12, "x").is_err());
        assert!(TextRequest::new(400, 0, 0, 12, "x").is_err());
        assert!(TextRequest::new(400, 100, 0, 11, "x").is_err());
        assert!(matches!(
            TextRequest::new(400, 100, 0, 12, ""),
            Err(Error::InvalidArgument(_))
        ));
    }
}
