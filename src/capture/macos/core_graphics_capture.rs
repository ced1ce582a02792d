//! CoreGraphics-based screen capture for macOS

use crate::{
    error::{CaptureError, CaptureResult},
    types::{PixelFormat, RawImage, Rectangle, WindowHandle},
};

use core_graphics::{
    display::{
        kCGWindowImageBoundsIgnoreFraming, kCGWindowListOptionIncludingWindow, CGDisplay,
    },
    geometry::{CGPoint, CGRect, CGSize},
    image::CGImage,
};

/// CoreGraphics capture implementation
pub struct CoreGraphicsCapture;

impl CoreGraphicsCapture {
    /// Create a new CoreGraphics capturer
    pub fn new() -> CaptureResult<Self> {
        Ok(Self)
    }

    /// Bounds of the main display in points
    pub fn main_display_bounds(&self) -> Rectangle {
        let bounds = CGDisplay::main().bounds();
        Rectangle::new(
            bounds.origin.x as i32,
            bounds.origin.y as i32,
            bounds.size.width as u32,
            bounds.size.height as u32,
        )
    }

    /// Capture a region of the main display
    pub fn capture_region(&self, region: Rectangle) -> CaptureResult<RawImage> {
        let image = CGDisplay::main()
            .image_for_rect(to_cg_rect(region))
            .ok_or_else(|| {
                CaptureError::CaptureFailed("CGDisplayCreateImageForRect failed".to_string())
            })?;

        Self::copy_image(&image)
    }

    /// Capture a single window's own pixels, unobscured by overlapping windows
    pub fn capture_window(&self, handle: WindowHandle, bounds: Rectangle) -> CaptureResult<RawImage> {
        let image = CGDisplay::screenshot(
            to_cg_rect(bounds),
            kCGWindowListOptionIncludingWindow,
            handle.0 as u32,
            kCGWindowImageBoundsIgnoreFraming,
        )
        .ok_or_else(|| {
            CaptureError::CaptureFailed(format!("CGWindowListCreateImage failed for {}", handle))
        })?;

        Self::copy_image(&image)
    }

    fn copy_image(image: &CGImage) -> CaptureResult<RawImage> {
        let width = image.width() as u32;
        let height = image.height() as u32;
        let bytes_per_row = image.bytes_per_row();
        let bits_per_pixel = image.bits_per_pixel();
        let bits_per_component = image.bits_per_component();

        if bits_per_pixel != 32 || bits_per_component != 8 {
            return Err(CaptureError::CaptureFailed(format!(
                "Unsupported pixel format: {}bpp, {}bpc",
                bits_per_pixel, bits_per_component
            )));
        }

        // Screen images are 32-bit little-endian, alpha first: B, G, R, A in memory
        let data = image.data();
        Ok(RawImage::with_stride(
            data.bytes().to_vec(),
            width,
            height,
            PixelFormat::BGRA8,
            bytes_per_row,
        ))
    }
}

fn to_cg_rect(region: Rectangle) -> CGRect {
    CGRect::new(
        &CGPoint::new(region.x as f64, region.y as f64),
        &CGSize::new(region.width as f64, region.height as f64),
    )
}
