//! Local camera source

use crate::error::{OpenError, OpenResult, PullError, PullResult};
use crate::source::FrameSource;
use crate::types::{DeviceHints, DeviceInfo, Frame, SourceDescriptor, SourceKind};

#[cfg(feature = "camera")]
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
    Camera,
};

/// Camera addressed by index
///
/// The camera handle is not `Send`; a `DeviceSource` lives and dies on the
/// thread that opened it.
pub struct DeviceSource {
    descriptor: SourceDescriptor,
    #[cfg(feature = "camera")]
    camera: Option<Camera>,
    pending: Option<Frame>,
}

impl DeviceSource {
    /// Open the camera and read one frame to prove it works
    #[cfg(feature = "camera")]
    pub fn open(index: u32, hints: DeviceHints) -> OpenResult<Self> {
        let descriptor = SourceDescriptor::Device { index };
        let unavailable = |message: String| OpenError::Unavailable {
            descriptor: descriptor.clone(),
            message,
        };

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(hints.width, hints.height),
                FrameFormat::MJPEG,
                hints.fps,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| unavailable(format!("failed to open camera: {}", e)))?;
        camera
            .open_stream()
            .map_err(|e| unavailable(format!("failed to start stream: {}", e)))?;

        let format = camera.camera_format();
        log::info!(
            "Camera {} streaming at {}x{} @ {}fps (requested {}x{} @ {}fps)",
            index,
            format.resolution().width_x,
            format.resolution().height_y,
            format.frame_rate(),
            hints.width,
            hints.height,
            hints.fps
        );

        let mut source = Self {
            descriptor: descriptor.clone(),
            camera: Some(camera),
            pending: None,
        };

        match source.read() {
            Ok(frame) => {
                source.pending = Some(frame);
                Ok(source)
            }
            Err(e) => {
                source.close();
                Err(unavailable(format!("first read failed: {}", e)))
            }
        }
    }

    #[cfg(not(feature = "camera"))]
    pub fn open(index: u32, _hints: DeviceHints) -> OpenResult<Self> {
        Err(OpenError::Unavailable {
            descriptor: SourceDescriptor::Device { index },
            message: "built without camera support".to_string(),
        })
    }

    #[cfg(feature = "camera")]
    fn read(&mut self) -> PullResult<Frame> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| PullError::Fatal("camera is closed".to_string()))?;

        let buffer = camera
            .frame()
            .map_err(|e| PullError::Fatal(format!("camera read failed: {}", e)))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| PullError::Transient(format!("frame decode failed: {}", e)))?;

        let (width, height) = (decoded.width(), decoded.height());
        Ok(Frame::from_rgb(width, height, decoded.into_raw()))
    }

    #[cfg(not(feature = "camera"))]
    fn read(&mut self) -> PullResult<Frame> {
        Err(PullError::Fatal("built without camera support".to_string()))
    }

    #[cfg(feature = "camera")]
    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop {}: {}", self.descriptor, e);
            }
        }
    }

    #[cfg(not(feature = "camera"))]
    fn release(&mut self) {}
}

impl FrameSource for DeviceSource {
    fn pull(&mut self) -> PullResult<Frame> {
        match self.pending.take() {
            Some(frame) => Ok(frame),
            None => self.read(),
        }
    }

    fn close(&mut self) {
        self.pending = None;
        self.release();
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Device
    }

    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }
}

/// List attached cameras
///
/// Returns an empty list when no camera backend is usable.
#[cfg(feature = "camera")]
pub fn probe_devices() -> Vec<DeviceInfo> {
    let Some(backend) = nokhwa::native_api_backend() else {
        log::info!("No camera backend available");
        return Vec::new();
    };

    match nokhwa::query(backend) {
        Ok(cameras) => cameras
            .into_iter()
            .filter_map(|info| match info.index() {
                CameraIndex::Index(i) => Some(DeviceInfo {
                    index: *i,
                    name: info.human_name(),
                }),
                CameraIndex::String(_) => None,
            })
            .collect(),
        Err(e) => {
            log::warn!("Failed to query cameras: {}", e);
            Vec::new()
        }
    }
}

#[cfg(not(feature = "camera"))]
pub fn probe_devices() -> Vec<DeviceInfo> {
    Vec::new()
}
