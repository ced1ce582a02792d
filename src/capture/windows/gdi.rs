//! Windows GDI-based screen capture implementation

use crate::{
    error::{CaptureError, CaptureResult},
    types::{PixelFormat, RawImage, Rectangle},
};

use windows::Win32::{
    Foundation::HWND,
    Graphics::Gdi::*,
    UI::WindowsAndMessaging::*,
};

/// GDI-based screen capture
pub struct GdiCapture;

impl GdiCapture {
    /// Create a new GDI capturer
    pub fn new() -> CaptureResult<Self> {
        Ok(Self)
    }

    /// Get virtual screen bounds (all monitors)
    pub fn virtual_screen_bounds(&self) -> Rectangle {
        unsafe {
            let x = GetSystemMetrics(SM_XVIRTUALSCREEN);
            let y = GetSystemMetrics(SM_YVIRTUALSCREEN);
            let width = GetSystemMetrics(SM_CXVIRTUALSCREEN);
            let height = GetSystemMetrics(SM_CYVIRTUALSCREEN);

            Rectangle::new(x, y, width.max(0) as u32, height.max(0) as u32)
        }
    }

    /// Capture a specific region of the virtual desktop
    pub fn capture_region(&self, region: Rectangle) -> CaptureResult<RawImage> {
        if region.is_empty() {
            return Err(CaptureError::OutOfBounds(format!("{:?} is empty", region)));
        }

        unsafe {
            // GetDC(NULL) spans every monitor; negative origins are valid
            let desktop_dc = GetDC(HWND(std::ptr::null_mut()));
            if desktop_dc.is_invalid() {
                return Err(CaptureError::CaptureFailed(
                    "Failed to get screen DC for virtual desktop".to_string(),
                ));
            }

            let mem_dc = CreateCompatibleDC(desktop_dc);
            if mem_dc.is_invalid() {
                ReleaseDC(HWND(std::ptr::null_mut()), desktop_dc);
                return Err(CaptureError::CaptureFailed(
                    "Failed to create compatible DC".to_string(),
                ));
            }

            let hbitmap = CreateCompatibleBitmap(desktop_dc, region.width as i32, region.height as i32);
            if hbitmap.is_invalid() {
                let _ = DeleteDC(mem_dc);
                ReleaseDC(HWND(std::ptr::null_mut()), desktop_dc);
                return Err(CaptureError::CaptureFailed(
                    "Failed to create compatible bitmap".to_string(),
                ));
            }

            let old_bitmap = SelectObject(mem_dc, hbitmap);

            let blit = BitBlt(
                mem_dc,
                0,
                0,
                region.width as i32,
                region.height as i32,
                desktop_dc,
                region.x,
                region.y,
                SRCCOPY,
            );

            let mut bmp_info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: region.width as i32,
                    biHeight: -(region.height as i32), // Negative for top-down bitmap
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut buffer = vec![0u8; region.width as usize * region.height as usize * 4];
            let scan_lines = if blit.is_ok() {
                GetDIBits(
                    mem_dc,
                    hbitmap,
                    0,
                    region.height,
                    Some(buffer.as_mut_ptr() as *mut _),
                    &mut bmp_info,
                    DIB_RGB_COLORS,
                )
            } else {
                0
            };

            SelectObject(mem_dc, old_bitmap);
            let _ = DeleteObject(hbitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND(std::ptr::null_mut()), desktop_dc);

            blit?;
            if scan_lines == 0 || scan_lines == -1 {
                return Err(CaptureError::CaptureFailed(
                    "Failed to get bitmap bits".to_string(),
                ));
            }

            Ok(RawImage::new(
                buffer,
                region.width,
                region.height,
                PixelFormat::BGRA8,
            ))
        }
    }
}
