//! Linux screen capture implementation

mod x11_capture;

pub use x11_capture::X11Capture;

use crate::{
    capture::traits::ScreenCapture,
    error::{CaptureError, CaptureResult},
    types::{RawImage, Rectangle},
};

/// Linux screen capture implementation
pub struct LinuxCapture {
    x11: X11Capture,
}

impl LinuxCapture {
    /// Create a new Linux capturer
    pub fn new() -> CaptureResult<Box<dyn ScreenCapture>> {
        // XWayland sessions also export DISPLAY
        if std::env::var_os("DISPLAY").is_none() {
            return Err(CaptureError::PlatformError(
                "No X11 display found (DISPLAY is not set)".to_string(),
            ));
        }

        Ok(Box::new(Self {
            x11: X11Capture::new()?,
        }))
    }
}

impl ScreenCapture for LinuxCapture {
    fn screen_bounds(&self) -> CaptureResult<Rectangle> {
        Ok(self.x11.screen_bounds())
    }

    fn capture_region(&self, region: Rectangle) -> CaptureResult<RawImage> {
        self.x11.capture_region(region)
    }

    fn implementation_name(&self) -> String {
        "Linux X11".to_string()
    }
}
