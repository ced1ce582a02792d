//! Aspect-preserving preview scaling

use image::{imageops, imageops::FilterType, RgbImage};

use crate::types::{Dimensions, Frame};

/// Fits frames into a display viewport
#[derive(Debug, Clone, Copy)]
pub struct DisplayScaler {
    min_viewport: Dimensions,
    filter: FilterType,
}

impl Default for DisplayScaler {
    fn default() -> Self {
        Self::new(Dimensions::new(640, 480))
    }
}

impl DisplayScaler {
    /// Scaler that treats any viewport as at least `min_viewport`
    pub fn new(min_viewport: Dimensions) -> Self {
        Self {
            min_viewport: Dimensions::new(min_viewport.width.max(1), min_viewport.height.max(1)),
            filter: FilterType::Triangle,
        }
    }

    /// Use a different resampling filter
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn min_viewport(&self) -> Dimensions {
        self.min_viewport
    }

    /// Viewport after applying the minimum
    pub fn effective_viewport(&self, viewport: Dimensions) -> Dimensions {
        Dimensions::new(
            viewport.width.max(self.min_viewport.width),
            viewport.height.max(self.min_viewport.height),
        )
    }

    /// Largest size with the frame's aspect ratio that fits the viewport
    ///
    /// Computes `floor(frame * min(vw / fw, vh / fh))` in exact integer
    /// arithmetic. Each side is at least 1 pixel. An empty frame fits to
    /// an empty size.
    pub fn fit(&self, frame: Dimensions, viewport: Dimensions) -> Dimensions {
        if frame.is_empty() {
            return Dimensions::new(0, 0);
        }

        let view = self.effective_viewport(viewport);
        let (fw, fh) = (frame.width as u64, frame.height as u64);
        let (vw, vh) = (view.width as u64, view.height as u64);

        // Compare vw/fw with vh/fh without dividing
        let (w, h) = if vw * fh <= vh * fw {
            (vw, fh * vw / fw)
        } else {
            (fw * vh / fh, vh)
        };

        Dimensions::new(
            (w as u32).clamp(1, view.width),
            (h as u32).clamp(1, view.height),
        )
    }

    /// Resize a frame to its fitted size
    ///
    /// Returns `None` for frames whose buffer does not match their size.
    pub fn scale_frame(&self, frame: &Frame, viewport: Dimensions) -> Option<Frame> {
        let target = self.fit(frame.dimensions(), viewport);
        let resized = self.resize(frame, target)?;
        let scaled = Frame::new(target.width, target.height, resized.into_raw());
        Some(scaled.with_sequence(frame.sequence))
    }

    /// Resize and convert to RGB for display toolkits
    pub fn preview_rgb(&self, frame: &Frame, viewport: Dimensions) -> Option<RgbImage> {
        let target = self.fit(frame.dimensions(), viewport);
        let mut image = self.resize(frame, target)?;
        for px in image.pixels_mut() {
            px.0.swap(0, 2);
        }
        Some(image)
    }

    // Channel order does not matter to the filter, so BGR goes through as-is
    fn resize(&self, frame: &Frame, target: Dimensions) -> Option<RgbImage> {
        if !frame.is_valid() {
            return None;
        }
        let source = RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec())?;
        if target == frame.dimensions() {
            return Some(source);
        }
        Some(imageops::resize(&source, target.width, target.height, self.filter))
    }
}
