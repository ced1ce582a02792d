//! Live frame acquisition from cameras, network streams and screen regions
//!
//! A [`SessionController`] runs one acquisition session at a time. The
//! source is opened and polled on a dedicated worker thread, which keeps only
//! the freshest frame in a shared slot. The controller scales that frame for
//! preview and freezes it into snapshots saved as JPEG or PNG.
//!
//! # Example
//!
//! ```no_run
//! use framesnap::{Dimensions, SessionConfig, SessionController, SessionEvent, SourceDescriptor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = SessionController::new(SessionConfig::default())?;
//! session.select_source(SourceDescriptor::Device { index: 0 })?;
//! session.start_session()?;
//!
//! loop {
//!     for event in session.poll_events() {
//!         if let SessionEvent::Stopped(reason) = event {
//!             println!("stopped: {:?}", reason);
//!             return Ok(());
//!         }
//!     }
//!     if let Some(preview) = session.preview(Dimensions::new(800, 600)) {
//!         // hand `preview` to the display
//!         # let _ = preview;
//!         session.request_capture()?;
//!         let path = session.request_save("", None)?;
//!         println!("saved {}", path.display());
//!         session.stop_session()?;
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(16));
//! }
//! # }
//! ```

#![allow(missing_docs)]

pub mod capture;
pub mod encoder;
pub mod error;
pub mod inventory;
pub mod pipeline;
pub mod scaler;
pub mod session;
pub mod snapshot;
pub mod source;
pub mod types;

// Re-export main types
pub use capture::{Capturer, ScreenCapture};
pub use encoder::{FrameEncoder, StillFormat};
pub use error::{
    CaptureError, EncodingError, InventoryError, OpenError, PullError, SaveError, SessionError,
    SessionResult,
};
pub use inventory::{platform_inventory, FullScreenInventory, WindowInventory, WindowList};
pub use pipeline::{AcquisitionWorker, FrameSlot, SessionEvent, StopReason, WorkerState};
pub use scaler::DisplayScaler;
pub use session::{Selection, SessionController, SessionState};
pub use snapshot::SnapshotStore;
pub use source::{probe_devices, FrameSource, PlatformOpener, SourceOpener};
pub use types::{
    DeviceHints, DeviceInfo, Dimensions, Frame, Rectangle, RegionTarget, SessionConfig,
    SessionConfigBuilder, SnapshotRequest, SourceDescriptor, SourceKind, WindowEntry,
    WindowHandle,
};

/// Library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get library capabilities
pub fn capabilities() -> String {
    let mut caps = Vec::new();

    // Platform
    #[cfg(target_os = "windows")]
    caps.push("Windows");
    #[cfg(target_os = "macos")]
    caps.push("macOS");
    #[cfg(target_os = "linux")]
    caps.push("Linux");

    #[cfg(feature = "camera")]
    caps.push("Camera");

    if ffmpeg_sidecar::command::ffmpeg_is_installed() {
        caps.push("Stream");
    }

    caps.push("Region");
    caps.push("JPEG");
    caps.push("PNG");

    caps.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let version = version();
        assert!(!version.is_empty());
    }

    #[test]
    fn test_capabilities() {
        let caps = capabilities();
        assert!(caps.contains("Region"));
        assert!(caps.contains("PNG"));
    }

    #[test]
    fn test_config_creation() {
        let config = SessionConfig::default();
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.min_viewport, Dimensions::new(640, 480));
    }
}
