//! JPEG and PNG encoders built on the `image` codecs

use image::{codecs, ExtendedColorType, ImageEncoder as _};

use crate::{
    encoder::{FrameEncoder, StillFormat},
    error::{EncodingError, EncodingResult},
    types::Frame,
};

fn rgb_pixels(frame: &Frame) -> EncodingResult<Vec<u8>> {
    if !frame.is_valid() {
        return Err(EncodingError::InvalidDimensions {
            width: frame.width,
            height: frame.height,
        });
    }
    Ok(frame.to_rgb_bytes())
}

/// Baseline JPEG with configurable quality
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(95)
    }
}

impl FrameEncoder for JpegEncoder {
    fn encode(&self, frame: &Frame) -> EncodingResult<Vec<u8>> {
        if self.quality == 0 || self.quality > 100 {
            return Err(EncodingError::InvalidQuality(self.quality));
        }
        let rgb = rgb_pixels(frame)?;

        let mut out = Vec::with_capacity(rgb.len() / 8);
        codecs::jpeg::JpegEncoder::new_with_quality(&mut out, self.quality).encode(
            &rgb,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(out)
    }

    fn name(&self) -> &str {
        "JPEG"
    }

    fn format(&self) -> StillFormat {
        StillFormat::Jpeg
    }
}

/// Lossless PNG
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl FrameEncoder for PngEncoder {
    fn encode(&self, frame: &Frame) -> EncodingResult<Vec<u8>> {
        let rgb = rgb_pixels(frame)?;

        let mut out = Vec::new();
        codecs::png::PngEncoder::new(&mut out).write_image(
            &rgb,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(out)
    }

    fn name(&self) -> &str {
        "PNG"
    }

    fn format(&self) -> StillFormat {
        StillFormat::Png
    }
}
