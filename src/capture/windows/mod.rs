//! Windows screen capture implementation

mod gdi;

use crate::{
    capture::traits::ScreenCapture,
    error::CaptureResult,
    types::{RawImage, Rectangle},
};

/// Windows screen capture implementation
pub struct WindowsCapture {
    gdi_capturer: gdi::GdiCapture,
}

impl WindowsCapture {
    /// Create a new Windows capturer
    pub fn new() -> CaptureResult<Box<dyn ScreenCapture>> {
        Ok(Box::new(Self {
            gdi_capturer: gdi::GdiCapture::new()?,
        }))
    }
}

impl ScreenCapture for WindowsCapture {
    fn screen_bounds(&self) -> CaptureResult<Rectangle> {
        Ok(self.gdi_capturer.virtual_screen_bounds())
    }

    fn capture_region(&self, region: Rectangle) -> CaptureResult<RawImage> {
        log::trace!("GDI capture_region {:?}", region);
        self.gdi_capturer.capture_region(region)
    }

    fn implementation_name(&self) -> String {
        "Windows GDI".to_string()
    }
}
