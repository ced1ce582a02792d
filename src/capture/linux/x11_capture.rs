//! X11-based screen capture for Linux

use crate::{
    error::{CaptureError, CaptureResult},
    types::{PixelFormat, RawImage, Rectangle},
};

use x11rb::{
    connection::Connection,
    protocol::xproto::{self, ImageFormat, ImageOrder},
    rust_connection::RustConnection,
};

/// X11 capture implementation
pub struct X11Capture {
    connection: RustConnection,
    screen_num: usize,
    root_window: xproto::Window,
}

impl X11Capture {
    /// Create a new X11 capturer
    pub fn new() -> CaptureResult<Self> {
        let (connection, screen_num) = RustConnection::connect(None).map_err(|e| {
            CaptureError::PlatformError(format!("Failed to connect to X11: {}", e))
        })?;

        let root_window = connection.setup().roots[screen_num].root;

        Ok(Self {
            connection,
            screen_num,
            root_window,
        })
    }

    /// Root window extent
    pub fn screen_bounds(&self) -> Rectangle {
        let screen = &self.connection.setup().roots[self.screen_num];
        Rectangle::new(
            0,
            0,
            screen.width_in_pixels as u32,
            screen.height_in_pixels as u32,
        )
    }

    /// Capture a specific region of the root window
    pub fn capture_region(&self, region: Rectangle) -> CaptureResult<RawImage> {
        let region = region
            .intersection(&self.screen_bounds())
            .ok_or_else(|| CaptureError::OutOfBounds(format!("{:?} is off-screen", region)))?;

        let image_reply = xproto::get_image(
            &self.connection,
            ImageFormat::Z_PIXMAP,
            self.root_window,
            region.x as i16,
            region.y as i16,
            region.width as u16,
            region.height as u16,
            !0, // All planes
        )
        .map_err(|e| CaptureError::CaptureFailed(format!("X11 GetImage error: {}", e)))?
        .reply()
        .map_err(|e| CaptureError::CaptureFailed(format!("X11 GetImage reply error: {}", e)))?;

        let setup = self.connection.setup();
        let screen = &setup.roots[self.screen_num];
        let visual = screen
            .allowed_depths
            .iter()
            .flat_map(|depth| &depth.visuals)
            .find(|v| v.visual_id == screen.root_visual)
            .ok_or_else(|| CaptureError::CaptureFailed("Visual not found".to_string()))?;

        let pixmap_format = setup
            .pixmap_formats
            .iter()
            .find(|f| f.depth == image_reply.depth)
            .ok_or_else(|| {
                CaptureError::CaptureFailed(format!(
                    "No pixmap format for depth {}",
                    image_reply.depth
                ))
            })?;

        // Z_PIXMAP rows are padded to the scanline unit
        let bits_per_pixel = pixmap_format.bits_per_pixel as usize;
        let pad = pixmap_format.scanline_pad.max(8) as usize;
        let stride = (region.width as usize * bits_per_pixel).div_ceil(pad) * pad / 8;

        let blue_first = setup.image_byte_order == ImageOrder::LSB_FIRST
            && visual.blue_mask < visual.red_mask;
        let format = match (bits_per_pixel, blue_first) {
            (32, true) => PixelFormat::BGRA8,
            (32, false) => PixelFormat::RGBA8,
            (24, true) => PixelFormat::BGR8,
            (24, false) => PixelFormat::RGB8,
            (bpp, _) => {
                return Err(CaptureError::CaptureFailed(format!(
                    "Unsupported bits per pixel: {}",
                    bpp
                )))
            }
        };

        log::trace!(
            "X11 captured {}x{} at ({}, {}) as {}",
            region.width,
            region.height,
            region.x,
            region.y,
            format
        );

        Ok(RawImage::with_stride(
            image_reply.data,
            region.width,
            region.height,
            format,
            stride,
        ))
    }
}
