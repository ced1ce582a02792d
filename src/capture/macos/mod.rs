//! macOS screen capture implementation

mod core_graphics_capture;

use crate::{
    capture::traits::ScreenCapture,
    error::CaptureResult,
    types::{RawImage, Rectangle, WindowHandle},
};

/// macOS screen capture implementation
pub struct MacOSCapture {
    core_graphics: core_graphics_capture::CoreGraphicsCapture,
}

impl MacOSCapture {
    /// Create a new macOS capturer
    pub fn new() -> CaptureResult<Box<dyn ScreenCapture>> {
        Ok(Box::new(Self {
            core_graphics: core_graphics_capture::CoreGraphicsCapture::new()?,
        }))
    }
}

impl ScreenCapture for MacOSCapture {
    fn screen_bounds(&self) -> CaptureResult<Rectangle> {
        Ok(self.core_graphics.main_display_bounds())
    }

    fn capture_region(&self, region: Rectangle) -> CaptureResult<RawImage> {
        self.core_graphics.capture_region(region)
    }

    fn capture_window(&self, handle: WindowHandle, bounds: Rectangle) -> CaptureResult<RawImage> {
        self.core_graphics.capture_window(handle, bounds)
    }

    fn implementation_name(&self) -> String {
        "macOS CoreGraphics".to_string()
    }
}
