//! Core types for frame acquisition, window selection and snapshots

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rectangle in global screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Overlap of two rectangles, `None` when they do not touch
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let left = self.x.max(other.x) as i64;
        let top = self.y.max(other.y) as i64;
        let right = (self.x as i64 + self.width as i64).min(other.x as i64 + other.width as i64);
        let bottom =
            (self.y as i64 + self.height as i64).min(other.y as i64 + other.height as i64);

        if right <= left || bottom <= top {
            return None;
        }

        Some(Rectangle {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

/// Pixel layout of raw platform captures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Red, Green, Blue, Alpha (8 bits per channel)
    RGBA8,
    /// Blue, Green, Red, Alpha or padding (8 bits per channel)
    BGRA8,
    /// Red, Green, Blue (8 bits per channel)
    RGB8,
    /// Blue, Green, Red (8 bits per channel)
    BGR8,
}

impl PixelFormat {
    /// Get the number of bytes per pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::RGBA8 | PixelFormat::BGRA8 => 4,
            PixelFormat::RGB8 | PixelFormat::BGR8 => 3,
        }
    }

    /// Whether red is stored before blue
    pub fn is_rgb_order(&self) -> bool {
        matches!(self, PixelFormat::RGBA8 | PixelFormat::RGB8)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::RGBA8 => write!(f, "RGBA8"),
            PixelFormat::BGRA8 => write!(f, "BGRA8"),
            PixelFormat::RGB8 => write!(f, "RGB8"),
            PixelFormat::BGR8 => write!(f, "BGR8"),
        }
    }
}

/// Pixels as handed back by a platform grabber, before normalisation
#[derive(Debug, Clone)]
pub struct RawImage {
    /// Pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Pixel format
    pub format: PixelFormat,
    /// Stride (bytes per row, may include padding)
    pub stride: usize,
}

impl RawImage {
    /// Create a new tightly packed RawImage
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = (width as usize) * format.bytes_per_pixel();
        Self {
            data,
            width,
            height,
            format,
            stride,
        }
    }

    /// Create a new RawImage with custom stride
    pub fn with_stride(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            stride,
        }
    }

    /// Check if the image data covers every row
    pub fn is_valid(&self) -> bool {
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        if self.height == 0 || self.width == 0 || self.stride < row_bytes {
            return false;
        }
        let expected_size = self.stride * (self.height as usize - 1) + row_bytes;
        self.data.len() >= expected_size
    }
}

/// One decoded image in canonical BGR8 order
///
/// The pixel buffer is immutable and reference counted, so cloning a frame
/// is cheap and a clone can never observe a later overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Tightly packed BGR8 rows
    pub data: Bytes,
    /// Publish order within a session, 0 before publishing
    pub sequence: u64,
}

impl Frame {
    /// Bytes per pixel of the canonical layout
    pub const CHANNELS: usize = 3;

    /// Wrap tightly packed BGR8 pixels
    pub fn new(width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            sequence: 0,
        }
    }

    /// Build a frame from RGB8 pixels
    pub fn from_rgb(width: u32, height: u32, mut rgb: Vec<u8>) -> Self {
        for px in rgb.chunks_exact_mut(Self::CHANNELS) {
            px.swap(0, 2);
        }
        Self::new(width, height, rgb)
    }

    /// Frame filled with one BGR colour
    pub fn solid(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let data: Vec<u8> = bgr
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * Self::CHANNELS)
            .collect();
        Self::new(width, height, data)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * Self::CHANNELS
    }

    /// Check that the buffer matches the dimensions
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == self.stride() * self.height as usize
    }

    /// Get a BGR pixel at the given coordinates
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * Self::CHANNELS;
        self.data.get(offset..offset + Self::CHANNELS)
    }

    /// Copy of the pixels in RGB8 order
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut rgb = self.data.to_vec();
        for px in rgb.chunks_exact_mut(Self::CHANNELS) {
            px.swap(0, 2);
        }
        rgb
    }

    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Category of a source, used to pick the poll cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Device,
    Stream,
    Region,
}

/// Opaque platform window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// What a region source captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionTarget {
    FullScreen,
    Window(WindowHandle),
}

/// Which source a session captures from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceDescriptor {
    /// Indexed local camera
    Device { index: u32 },
    /// Network video addressed by URL
    Stream { url: String },
    /// Screen or window region
    Region {
        target: RegionTarget,
        bounds: Option<Rectangle>,
    },
}

impl SourceDescriptor {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceDescriptor::Device { .. } => SourceKind::Device,
            SourceDescriptor::Stream { .. } => SourceKind::Stream,
            SourceDescriptor::Region { .. } => SourceKind::Region,
        }
    }

    /// Region descriptor for a window inventory entry
    pub fn from_window(entry: &WindowEntry) -> Self {
        SourceDescriptor::Region {
            target: entry.target,
            bounds: entry.bounds,
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::Device { index } => write!(f, "camera {}", index),
            SourceDescriptor::Stream { url } => write!(f, "stream {}", url),
            SourceDescriptor::Region {
                target: RegionTarget::FullScreen,
                ..
            } => write!(f, "full screen"),
            SourceDescriptor::Region {
                target: RegionTarget::Window(handle),
                ..
            } => write!(f, "window {}", handle),
        }
    }
}

/// One capturable on-screen region from an inventory refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEntry {
    /// Display title, unique within one refresh
    pub title: String,
    pub target: RegionTarget,
    pub bounds: Option<Rectangle>,
}

impl WindowEntry {
    pub const FULL_SCREEN_TITLE: &'static str = "Full Screen";

    pub fn window(title: impl Into<String>, handle: WindowHandle, bounds: Option<Rectangle>) -> Self {
        Self {
            title: title.into(),
            target: RegionTarget::Window(handle),
            bounds,
        }
    }

    /// Synthetic entry covering the whole screen
    pub fn full_screen() -> Self {
        Self {
            title: Self::FULL_SCREEN_TITLE.to_string(),
            target: RegionTarget::FullScreen,
            bounds: None,
        }
    }
}

/// A camera found by device probing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub index: u32,
    pub name: String,
}

/// Capture format requested from camera devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHints {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for DeviceHints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Format requested from camera devices
    pub device_hints: DeviceHints,
    /// Minimum time between pulls for device and stream sources
    pub device_poll_floor: Duration,
    /// Minimum time between pulls for region sources
    pub region_poll_floor: Duration,
    /// Smallest viewport the preview scaler will fit into
    pub min_viewport: Dimensions,
    /// Directory snapshots are written to
    pub output_dir: PathBuf,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_hints: DeviceHints::default(),
            device_poll_floor: Duration::from_millis(16),
            region_poll_floor: Duration::from_millis(100),
            min_viewport: Dimensions::new(640, 480),
            output_dir: PathBuf::from("Captured_Images"),
            jpeg_quality: 95,
        }
    }
}

impl SessionConfig {
    /// Poll floor for a source category
    pub fn poll_floor(&self, kind: SourceKind) -> Duration {
        match kind {
            SourceKind::Device | SourceKind::Stream => self.device_poll_floor,
            SourceKind::Region => self.region_poll_floor,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(format!("JPEG quality must be 1-100, got {}", self.jpeg_quality));
        }
        if self.min_viewport.is_empty() {
            return Err(format!("Minimum viewport must be non-empty, got {}", self.min_viewport));
        }
        let hints = &self.device_hints;
        if hints.width == 0 || hints.height == 0 || hints.fps == 0 {
            return Err(format!(
                "Device hints must be non-zero, got {}x{} @ {}fps",
                hints.width, hints.height, hints.fps
            ));
        }
        Ok(())
    }
}

/// Builder for session configuration
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Set requested camera resolution and frame rate
    pub fn device_hints(mut self, width: u32, height: u32, fps: u32) -> Self {
        self.config.device_hints = DeviceHints { width, height, fps };
        self
    }

    pub fn device_poll_floor(mut self, floor: Duration) -> Self {
        self.config.device_poll_floor = floor;
        self
    }

    pub fn region_poll_floor(mut self, floor: Duration) -> Self {
        self.config.region_poll_floor = floor;
        self
    }

    pub fn min_viewport(mut self, width: u32, height: u32) -> Self {
        self.config.min_viewport = Dimensions::new(width, height);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<SessionConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A frozen frame waiting to be saved
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub frame: Frame,
    pub target_name: Option<String>,
}
