//! Screen capture backends used by region sources

pub mod traits;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "linux")]
pub mod linux;

pub use traits::{raw_to_frame, DefaultPixelConverter, PixelFormatConverter, ScreenCapture};

use crate::error::CaptureResult;

/// Platform-specific capturer factory
pub struct Capturer;

impl Capturer {
    /// Create a new platform-specific capturer
    pub fn new() -> CaptureResult<Box<dyn ScreenCapture>> {
        #[cfg(target_os = "windows")]
        {
            windows::WindowsCapture::new()
        }

        #[cfg(target_os = "macos")]
        {
            macos::MacOSCapture::new()
        }

        #[cfg(target_os = "linux")]
        {
            linux::LinuxCapture::new()
        }

        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            Err(crate::error::CaptureError::PlatformError(
                "Unsupported platform".to_string(),
            ))
        }
    }
}
