//! macOS window enumeration through the CoreGraphics window list

use core_foundation::base::TCFType;
use core_foundation::dictionary::CFDictionaryRef;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::display::{
    kCGWindowListExcludeDesktopElements, kCGWindowListOptionOnScreenOnly, CGDisplay,
};

use super::WindowInventory;
use crate::error::InventoryError;
use crate::types::{Rectangle, WindowEntry, WindowHandle};

extern "C" {
    fn CFArrayGetValueAtIndex(
        theArray: core_foundation::array::CFArrayRef,
        idx: isize,
    ) -> *const std::ffi::c_void;
}

pub struct QuartzInventory;

impl WindowInventory for QuartzInventory {
    fn enumerate(&self) -> Result<Vec<WindowEntry>, InventoryError> {
        let info_array = CGDisplay::window_list_info(
            kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements,
            None,
        )
        .ok_or_else(|| InventoryError::Failed("CGWindowListCopyWindowInfo returned null".into()))?;

        let mut entries = Vec::new();
        for idx in 0..info_array.len() {
            let dict = unsafe {
                let ptr = CFArrayGetValueAtIndex(info_array.as_concrete_TypeRef(), idx);
                if ptr.is_null() {
                    continue;
                }
                ptr as CFDictionaryRef
            };

            // Layer 0 holds ordinary application windows
            if get_number(dict, "kCGWindowLayer").unwrap_or(0.0) as i64 != 0 {
                continue;
            }

            let name = match get_string(dict, "kCGWindowName") {
                Some(name) if !name.trim().is_empty() => name,
                _ => continue,
            };
            let owner = get_string(dict, "kCGWindowOwnerName").unwrap_or_default();
            let number = match get_number(dict, "kCGWindowNumber") {
                Some(n) => n as u64,
                None => continue,
            };

            let bounds = get_value(dict, "kCGWindowBounds").map(|value| {
                let bounds = value as CFDictionaryRef;
                Rectangle::new(
                    get_number(bounds, "X").unwrap_or(0.0) as i32,
                    get_number(bounds, "Y").unwrap_or(0.0) as i32,
                    get_number(bounds, "Width").unwrap_or(0.0) as u32,
                    get_number(bounds, "Height").unwrap_or(0.0) as u32,
                )
            });

            entries.push(WindowEntry::window(
                format!("{} - {}", owner, name),
                WindowHandle(number),
                bounds,
            ));
        }

        Ok(entries)
    }

    fn name(&self) -> &'static str {
        "quartz"
    }
}

fn get_value(dict: CFDictionaryRef, key: &str) -> Option<*const std::ffi::c_void> {
    let cf_key = CFString::new(key);
    unsafe {
        let mut value: *const std::ffi::c_void = std::ptr::null();
        if core_foundation::dictionary::CFDictionaryGetValueIfPresent(
            dict,
            cf_key.as_concrete_TypeRef() as *const _,
            &mut value,
        ) == 0
            || value.is_null()
        {
            return None;
        }
        Some(value)
    }
}

fn get_number(dict: CFDictionaryRef, key: &str) -> Option<f64> {
    let value = get_value(dict, key)?;
    let number = unsafe { CFNumber::wrap_under_get_rule(value as _) };
    number.to_f64()
}

fn get_string(dict: CFDictionaryRef, key: &str) -> Option<String> {
    let value = get_value(dict, key)?;
    let string = unsafe { CFString::wrap_under_get_rule(value as _) };
    Some(string.to_string())
}
