//! Window enumeration using the Win32 API

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowLongW, GetWindowRect, GetWindowTextLengthW, GetWindowTextW, IsIconic,
    IsWindowVisible, GWL_EXSTYLE, WS_EX_TOOLWINDOW,
};

use super::WindowInventory;
use crate::error::{CaptureError, InventoryError};
use crate::types::{Rectangle, WindowEntry, WindowHandle};

pub struct Win32Inventory;

impl WindowInventory for Win32Inventory {
    fn enumerate(&self) -> Result<Vec<WindowEntry>, InventoryError> {
        let mut entries: Vec<WindowEntry> = Vec::new();

        unsafe {
            EnumWindows(
                Some(enum_window_callback),
                LPARAM(&mut entries as *mut Vec<WindowEntry> as isize),
            )
            .map_err(CaptureError::from)?;
        }

        Ok(entries)
    }

    fn name(&self) -> &'static str {
        "win32"
    }
}

unsafe extern "system" fn enum_window_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let entries = &mut *(lparam.0 as *mut Vec<WindowEntry>);

    if !IsWindowVisible(hwnd).as_bool() || IsIconic(hwnd).as_bool() {
        return BOOL(1);
    }

    let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE);
    if (ex_style as u32 & WS_EX_TOOLWINDOW.0) != 0 {
        return BOOL(1);
    }

    let title_len = GetWindowTextLengthW(hwnd);
    if title_len == 0 {
        return BOOL(1);
    }

    let mut title_buf: Vec<u16> = vec![0; (title_len + 1) as usize];
    let title_read = GetWindowTextW(hwnd, &mut title_buf);
    if title_read == 0 {
        return BOOL(1);
    }
    let title = OsString::from_wide(&title_buf[..title_read as usize])
        .to_string_lossy()
        .to_string();
    if title.trim().is_empty() {
        return BOOL(1);
    }

    let mut rect = RECT::default();
    let bounds = if GetWindowRect(hwnd, &mut rect).is_ok() {
        Some(Rectangle::new(
            rect.left,
            rect.top,
            (rect.right - rect.left).max(0) as u32,
            (rect.bottom - rect.top).max(0) as u32,
        ))
    } else {
        None
    };

    entries.push(WindowEntry::window(
        title,
        WindowHandle(hwnd.0 as usize as u64),
        bounds,
    ));

    BOOL(1) // Continue enumeration
}
