//! Window enumeration through the EWMH client list on X11

use x11rb::{
    connection::Connection,
    protocol::xproto::{self, AtomEnum, ConnectionExt as _, MapState},
    rust_connection::RustConnection,
};

use super::WindowInventory;
use crate::error::InventoryError;
use crate::types::{Rectangle, WindowEntry, WindowHandle};

pub struct X11Inventory;

impl WindowInventory for X11Inventory {
    fn enumerate(&self) -> Result<Vec<WindowEntry>, InventoryError> {
        if std::env::var_os("DISPLAY").is_none() {
            return Err(InventoryError::Unsupported("DISPLAY is not set".to_string()));
        }

        let (conn, screen_num) = RustConnection::connect(None)
            .map_err(|e| InventoryError::Unsupported(format!("X11 connect failed: {}", e)))?;
        let root = conn.setup().roots[screen_num].root;

        let client_list = intern(&conn, b"_NET_CLIENT_LIST")?;
        let wm_name = intern(&conn, b"_NET_WM_NAME")?;
        let utf8_string = intern(&conn, b"UTF8_STRING")?;

        let reply = conn
            .get_property(false, root, client_list, AtomEnum::WINDOW, 0, u32::MAX)
            .map_err(failed)?
            .reply()
            .map_err(failed)?;

        let windows: Vec<xproto::Window> = match reply.value32() {
            Some(ids) => ids.collect(),
            None => {
                return Err(InventoryError::Unsupported(
                    "window manager does not publish _NET_CLIENT_LIST".to_string(),
                ))
            }
        };

        let mut entries = Vec::with_capacity(windows.len());
        for window in windows {
            // Windows can vanish between listing and querying; skip those
            let viewable = conn
                .get_window_attributes(window)
                .ok()
                .and_then(|cookie| cookie.reply().ok())
                .map(|attrs| attrs.map_state == MapState::VIEWABLE)
                .unwrap_or(false);
            if !viewable {
                continue;
            }

            let title = match window_title(&conn, window, wm_name, utf8_string) {
                Some(title) if !title.trim().is_empty() => title,
                _ => continue,
            };

            entries.push(WindowEntry::window(
                title,
                WindowHandle(window as u64),
                window_bounds(&conn, window, root),
            ));
        }

        Ok(entries)
    }

    fn name(&self) -> &'static str {
        "x11"
    }
}

fn failed(e: impl std::fmt::Display) -> InventoryError {
    InventoryError::Failed(format!("X11 request failed: {}", e))
}

fn intern(conn: &RustConnection, name: &[u8]) -> Result<xproto::Atom, InventoryError> {
    Ok(conn
        .intern_atom(false, name)
        .map_err(failed)?
        .reply()
        .map_err(failed)?
        .atom)
}

fn window_title(
    conn: &RustConnection,
    window: xproto::Window,
    wm_name: xproto::Atom,
    utf8_string: xproto::Atom,
) -> Option<String> {
    let read = |property: xproto::Atom, type_: xproto::Atom| {
        conn.get_property(false, window, property, type_, 0, 1024)
            .ok()?
            .reply()
            .ok()
            .filter(|reply| !reply.value.is_empty())
            .map(|reply| String::from_utf8_lossy(&reply.value).into_owned())
    };

    read(wm_name, utf8_string)
        .or_else(|| read(AtomEnum::WM_NAME.into(), AtomEnum::STRING.into()))
}

fn window_bounds(
    conn: &RustConnection,
    window: xproto::Window,
    root: xproto::Window,
) -> Option<Rectangle> {
    let geometry = conn.get_geometry(window).ok()?.reply().ok()?;
    let origin = conn
        .translate_coordinates(window, root, 0, 0)
        .ok()?
        .reply()
        .ok()?;

    Some(Rectangle::new(
        origin.dst_x as i32,
        origin.dst_y as i32,
        geometry.width as u32,
        geometry.height as u32,
    ))
}
