//! Traits for screen capture functionality

use crate::error::{CaptureError, CaptureResult};
use crate::types::{Frame, PixelFormat, RawImage, Rectangle, WindowHandle};

/// Platform screen grabber used by region sources
pub trait ScreenCapture: Send {
    /// Bounds of the capturable screen area in global coordinates
    fn screen_bounds(&self) -> CaptureResult<Rectangle>;

    /// Capture a specific region of the screen
    fn capture_region(&self, region: Rectangle) -> CaptureResult<RawImage>;

    /// Capture the whole screen
    fn capture_screen(&self) -> CaptureResult<RawImage> {
        let bounds = self.screen_bounds()?;
        self.capture_region(bounds)
    }

    /// Capture one window
    ///
    /// Grabbers that cannot isolate a window copy the screen pixels under its
    /// last known bounds instead.
    fn capture_window(&self, _handle: WindowHandle, bounds: Rectangle) -> CaptureResult<RawImage> {
        let screen = self.screen_bounds()?;
        let visible = bounds.intersection(&screen).ok_or_else(|| {
            CaptureError::OutOfBounds(format!("{:?} lies outside {:?}", bounds, screen))
        })?;
        self.capture_region(visible)
    }

    /// Get the implementation name
    fn implementation_name(&self) -> String;
}

/// Normalises platform pixel layouts into canonical BGR8 frames
pub trait PixelFormatConverter {
    /// Convert a raw capture, honouring its stride
    fn to_bgr(&self, image: &RawImage) -> CaptureResult<Vec<u8>>;
}

/// Default implementation for pixel format conversion
pub struct DefaultPixelConverter;

impl PixelFormatConverter for DefaultPixelConverter {
    fn to_bgr(&self, image: &RawImage) -> CaptureResult<Vec<u8>> {
        if !image.is_valid() {
            return Err(CaptureError::CaptureFailed(format!(
                "Raw image of {} bytes does not cover {}x{} {} (stride {})",
                image.data.len(),
                image.width,
                image.height,
                image.format,
                image.stride
            )));
        }

        let bpp = image.format.bytes_per_pixel();
        let row_bytes = image.width as usize * bpp;
        let mut out = Vec::with_capacity(image.width as usize * image.height as usize * 3);

        for y in 0..image.height as usize {
            let row = &image.data[y * image.stride..y * image.stride + row_bytes];
            match (bpp, image.format.is_rgb_order()) {
                (3, false) => out.extend_from_slice(row),
                (_, false) => {
                    for px in row.chunks_exact(bpp) {
                        out.extend_from_slice(&px[..3]);
                    }
                }
                (_, true) => {
                    for px in row.chunks_exact(bpp) {
                        out.extend_from_slice(&[px[2], px[1], px[0]]);
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Convert a platform capture into a canonical frame
pub fn raw_to_frame(image: &RawImage) -> CaptureResult<Frame> {
    let bgr = DefaultPixelConverter.to_bgr(image)?;
    Ok(Frame::new(image.width, image.height, bgr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_with_padding_drops_alpha_and_padding() {
        // 2x2 BGRA with 4 bytes of row padding
        let data = vec![
            1, 2, 3, 255, 4, 5, 6, 255, 0, 0, 0, 0, //
            7, 8, 9, 255, 10, 11, 12, 255, 0, 0, 0, 0,
        ];
        let image = RawImage::with_stride(data, 2, 2, PixelFormat::BGRA8, 12);
        let frame = raw_to_frame(&image).unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.data.as_ref(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_rgba_is_reordered() {
        let image = RawImage::new(vec![10, 20, 30, 255], 1, 1, PixelFormat::RGBA8);
        let frame = raw_to_frame(&image).unwrap();
        assert_eq!(frame.data.as_ref(), &[30, 20, 10]);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let image = RawImage::new(vec![0; 8], 2, 2, PixelFormat::BGR8);
        assert!(raw_to_frame(&image).is_err());
    }
}
