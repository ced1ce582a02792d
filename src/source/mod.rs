//! Frame sources: cameras, network streams and screen regions
//!
//! Sources are opened on the acquisition thread through a [`SourceOpener`]
//! and never leave it, so backends that are not `Send` (camera handles)
//! can be used directly.

pub mod device;
pub mod region;
pub mod stream;

pub use device::{probe_devices, DeviceSource};
pub use region::RegionSource;
pub use stream::StreamSource;

use crate::capture::Capturer;
use crate::error::{OpenError, OpenResult, PullResult};
use crate::types::{DeviceHints, Frame, SourceDescriptor, SourceKind};

/// An open producer of frames
pub trait FrameSource {
    /// Produce the next frame, blocking until one is available
    fn pull(&mut self) -> PullResult<Frame>;

    /// Release the underlying device, process or grabber
    ///
    /// Called exactly once by the worker; implementations must tolerate
    /// being dropped afterwards.
    fn close(&mut self);

    fn kind(&self) -> SourceKind;

    /// The descriptor this source was opened from
    fn descriptor(&self) -> &SourceDescriptor;
}

/// Opens sources for descriptors
///
/// The opener is shared with the worker thread, the source it returns is
/// not.
pub trait SourceOpener: Send + Sync {
    fn open(&self, descriptor: &SourceDescriptor) -> OpenResult<Box<dyn FrameSource>>;
}

/// Opener backed by the real camera, stream and screen backends
#[derive(Debug, Clone, Default)]
pub struct PlatformOpener {
    hints: DeviceHints,
}

impl PlatformOpener {
    pub fn new(hints: DeviceHints) -> Self {
        Self { hints }
    }
}

impl SourceOpener for PlatformOpener {
    fn open(&self, descriptor: &SourceDescriptor) -> OpenResult<Box<dyn FrameSource>> {
        log::debug!("Opening {}", descriptor);
        match descriptor {
            SourceDescriptor::Device { index } => {
                Ok(Box::new(DeviceSource::open(*index, self.hints)?))
            }
            SourceDescriptor::Stream { url } => Ok(Box::new(StreamSource::open(url)?)),
            SourceDescriptor::Region { target, bounds } => {
                let grabber = Capturer::new().map_err(|e| OpenError::Unavailable {
                    descriptor: descriptor.clone(),
                    message: e.to_string(),
                })?;
                Ok(Box::new(RegionSource::open(*target, *bounds, grabber)?))
            }
        }
    }
}
