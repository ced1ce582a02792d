//! Still image encoding for snapshots

pub mod still;

pub use still::{JpegEncoder, PngEncoder};

use std::path::Path;

use crate::{error::EncodingResult, types::Frame};

/// Container format of a saved snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillFormat {
    Jpeg,
    Png,
}

impl StillFormat {
    /// Format implied by a file extension, case-insensitive
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(StillFormat::Jpeg),
            "png" => Some(StillFormat::Png),
            _ => None,
        }
    }

    /// Format implied by a path; anything unrecognised is written as JPEG
    pub fn for_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(StillFormat::Jpeg)
    }

    /// Extension appended to names that carry none
    pub fn default_extension(&self) -> &'static str {
        match self {
            StillFormat::Jpeg => "jpg",
            StillFormat::Png => "png",
        }
    }
}

/// Trait for still image encoders
pub trait FrameEncoder {
    /// Encode a BGR frame into a complete file image
    fn encode(&self, frame: &Frame) -> EncodingResult<Vec<u8>>;

    /// Get encoder name
    fn name(&self) -> &str;

    fn format(&self) -> StillFormat;
}

/// Encoder for a still format
pub fn encoder_for(format: StillFormat, jpeg_quality: u8) -> Box<dyn FrameEncoder> {
    match format {
        StillFormat::Jpeg => Box::new(JpegEncoder::new(jpeg_quality)),
        StillFormat::Png => Box::new(PngEncoder),
    }
}

/// Encoder statistics
#[derive(Debug, Clone, Default)]
pub struct EncoderStats {
    /// Total images encoded
    pub images_encoded: u64,
    /// Total raw bytes processed
    pub bytes_processed: u64,
    /// Total bytes output
    pub bytes_output: u64,
    /// Average encoding time in milliseconds
    pub average_encoding_time_ms: f64,
}

impl EncoderStats {
    /// Update statistics with a new encoding
    pub fn update(&mut self, input_size: usize, output_size: usize, time_ms: f64) {
        self.images_encoded += 1;
        self.bytes_processed += input_size as u64;
        self.bytes_output += output_size as u64;

        self.average_encoding_time_ms = (self.average_encoding_time_ms
            * (self.images_encoded - 1) as f64
            + time_ms)
            / self.images_encoded as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(StillFormat::from_extension("JPG"), Some(StillFormat::Jpeg));
        assert_eq!(StillFormat::from_extension("jpeg"), Some(StillFormat::Jpeg));
        assert_eq!(StillFormat::from_extension("Png"), Some(StillFormat::Png));
        assert_eq!(StillFormat::from_extension("bmp"), None);
    }

    #[test]
    fn test_format_for_path() {
        assert_eq!(StillFormat::for_path(Path::new("a/shot.PNG")), StillFormat::Png);
        assert_eq!(StillFormat::for_path(Path::new("shot.bmp.jpg")), StillFormat::Jpeg);
        assert_eq!(StillFormat::for_path(Path::new("noext")), StillFormat::Jpeg);
    }

    #[test]
    fn test_stats_update() {
        let mut stats = EncoderStats::default();
        stats.update(1000, 250, 2.0);
        stats.update(1000, 250, 4.0);
        assert_eq!(stats.images_encoded, 2);
        assert!((stats.average_encoding_time_ms - 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.bytes_processed, 2000);
        assert_eq!(stats.bytes_output, 500);
    }
}
