//! Screen and window capture source

use crate::capture::{raw_to_frame, ScreenCapture};
use crate::error::{OpenError, OpenResult, PullError, PullResult};
use crate::source::FrameSource;
use crate::types::{Frame, Rectangle, RegionTarget, SourceDescriptor, SourceKind};

/// Region of the screen captured on every pull
pub struct RegionSource {
    descriptor: SourceDescriptor,
    target: RegionTarget,
    bounds: Option<Rectangle>,
    grabber: Option<Box<dyn ScreenCapture>>,
}

impl RegionSource {
    /// Bind a grabber to a target resolved from the window inventory
    pub fn open(
        target: RegionTarget,
        bounds: Option<Rectangle>,
        grabber: Box<dyn ScreenCapture>,
    ) -> OpenResult<Self> {
        let descriptor = SourceDescriptor::Region { target, bounds };

        if let Some(rect) = bounds {
            if rect.is_empty() {
                return Err(OpenError::NoTarget(format!(
                    "{} has zero-area bounds {:?}",
                    descriptor, rect
                )));
            }
        }

        let screen = grabber.screen_bounds().map_err(|e| OpenError::Unavailable {
            descriptor: descriptor.clone(),
            message: e.to_string(),
        })?;

        log::info!(
            "Capturing {} with {} (screen {}x{})",
            descriptor,
            grabber.implementation_name(),
            screen.width,
            screen.height
        );

        Ok(Self {
            descriptor,
            target,
            bounds,
            grabber: Some(grabber),
        })
    }
}

impl FrameSource for RegionSource {
    fn pull(&mut self) -> PullResult<Frame> {
        let grabber = self
            .grabber
            .as_ref()
            .ok_or_else(|| PullError::Fatal("region grabber is closed".to_string()))?;

        let raw = match (self.target, self.bounds) {
            (RegionTarget::Window(handle), Some(bounds)) => grabber.capture_window(handle, bounds)?,
            _ => grabber.capture_screen()?,
        };

        Ok(raw_to_frame(&raw)?)
    }

    fn close(&mut self) {
        if self.grabber.take().is_some() {
            log::debug!("Released grabber for {}", self.descriptor);
        }
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Region
    }

    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }
}
