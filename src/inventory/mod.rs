//! Enumeration of capturable on-screen regions
//!
//! Each platform provides a [`WindowInventory`]; hosts without an
//! enumeration backend get [`FullScreenInventory`]. A refresh always yields
//! a whole new [`WindowList`], and selections are re-resolved by title
//! against the newest list.

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
mod linux;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::InventoryError;
use crate::types::WindowEntry;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Source of capturable windows
pub trait WindowInventory: Send + Sync {
    /// Query the platform for visible, titled windows
    fn enumerate(&self) -> Result<Vec<WindowEntry>, InventoryError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Take a fresh snapshot, falling back to the whole screen when the
    /// backend is unusable
    fn refresh(&self) -> WindowList {
        match self.enumerate() {
            Ok(entries) => {
                log::debug!("{} listed {} window(s)", self.name(), entries.len());
                WindowList::new(entries)
            }
            Err(e) => {
                log::info!("{}: {}; offering full screen only", self.name(), e);
                WindowList::new(vec![WindowEntry::full_screen()])
            }
        }
    }
}

/// Inventory for hosts that cannot enumerate windows
#[derive(Debug, Default)]
pub struct FullScreenInventory;

impl WindowInventory for FullScreenInventory {
    fn enumerate(&self) -> Result<Vec<WindowEntry>, InventoryError> {
        Err(InventoryError::Unsupported(
            "no window enumeration backend for this platform".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "full-screen"
    }
}

/// Inventory backend for the current platform
pub fn platform_inventory() -> Box<dyn WindowInventory> {
    #[cfg(target_os = "windows")]
    {
        Box::new(windows::Win32Inventory)
    }

    #[cfg(target_os = "macos")]
    {
        Box::new(macos::QuartzInventory)
    }

    #[cfg(target_os = "linux")]
    {
        Box::new(linux::X11Inventory)
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        Box::new(FullScreenInventory)
    }
}

/// One refresh worth of window entries
#[derive(Debug, Clone)]
pub struct WindowList {
    generation: u64,
    entries: Vec<WindowEntry>,
}

impl WindowList {
    /// Wrap freshly enumerated entries, disambiguating repeated titles
    pub fn new(entries: Vec<WindowEntry>) -> Self {
        let mut seen = HashSet::with_capacity(entries.len());
        let entries = entries
            .into_iter()
            .map(|mut entry| {
                if !seen.insert(entry.title.clone()) {
                    let base = entry.title.clone();
                    let mut n = 2;
                    while !seen.insert(format!("{} ({})", base, n)) {
                        n += 1;
                    }
                    entry.title = format!("{} ({})", base, n);
                }
                entry
            })
            .collect();

        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            entries,
        }
    }

    /// List that has never been refreshed
    pub fn empty() -> Self {
        Self {
            generation: 0,
            entries: Vec::new(),
        }
    }

    /// Refresh counter; later refreshes have larger values
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entries(&self) -> &[WindowEntry] {
        &self.entries
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.title.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&WindowEntry> {
        self.entries.first()
    }

    /// Entry with exactly this title
    pub fn resolve(&self, title: &str) -> Option<&WindowEntry> {
        self.entries.iter().find(|e| e.title == title)
    }
}
