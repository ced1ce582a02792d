//! Error types for the framesnap library

use std::path::PathBuf;

use thiserror::Error;

use crate::types::SourceDescriptor;

/// Failure to open a frame source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpenError {
    /// Device or stream could not be opened, or its first read failed
    #[error("Source unavailable ({descriptor}): {message}")]
    Unavailable {
        descriptor: SourceDescriptor,
        message: String,
    },

    /// No capturable region target exists
    #[error("No capture target: {0}")]
    NoTarget(String),
}

/// Failure to pull a frame from an open source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PullError {
    /// The read failed but the source may still be usable
    #[error("Transient read failure: {0}")]
    Transient(String),

    /// The source has ended or is broken
    #[error("Source ended: {0}")]
    Fatal(String),
}

/// Failure to persist a snapshot
#[derive(Error, Debug)]
pub enum SaveError {
    /// Writing the file failed (permissions, missing directory, disk full)
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The frame could not be encoded
    #[error("Failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Save was requested with no pending snapshot
    #[error("No frame has been captured")]
    NothingCaptured,
}

/// Window enumeration is not possible on this host
#[derive(Error, Debug)]
pub enum InventoryError {
    /// No enumeration backend for this platform or session
    #[error("Window enumeration unsupported: {0}")]
    Unsupported(String),

    /// The backend exists but the query failed
    #[error("Window enumeration failed: {0}")]
    Failed(String),
}

/// Failure to encode a frame into a still image
#[derive(Error, Debug)]
pub enum EncodingError {
    /// Frame dimensions or buffer size are unusable
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Quality outside 1-100
    #[error("Invalid JPEG quality: {0}")]
    InvalidQuality(u8),

    /// The codec rejected the image
    #[error("Codec error: {0}")]
    Codec(#[from] image::ImageError),
}

/// Errors from the platform screen grabbers
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Capture operation failed
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// Platform-specific error
    #[error("Platform error: {0}")]
    PlatformError(String),

    /// Requested region does not intersect the screen
    #[error("Region out of bounds: {0}")]
    OutOfBounds(String),

    /// Windows-specific error
    #[cfg(windows)]
    #[error("Windows error: {0}")]
    WindowsError(#[from] windows::core::Error),
}

/// Errors from controller operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// Start was requested with nothing selected
    #[error("No source selected")]
    NoSourceSelected,

    /// The operation needs the current session to be stopped first
    #[error("A session is already active")]
    SessionActive,

    /// The operation needs a live session
    #[error("No active session")]
    NoActiveSession,

    /// Capture was requested before any frame arrived
    #[error("No frame available to capture")]
    NoFrameAvailable,

    /// Title does not match any entry of the latest window refresh
    #[error("Unknown window: {0}")]
    UnknownWindow(String),

    /// The source could not be resolved before starting
    #[error(transparent)]
    Open(#[from] OpenError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The worker thread could not be started
    #[error("Failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for source opening
pub type OpenResult<T> = Result<T, OpenError>;

/// Result type for frame pulls
pub type PullResult<T> = Result<T, PullError>;

/// Result type for snapshot saves
pub type SaveResult<T> = Result<T, SaveError>;

/// Result type for still image encoding
pub type EncodingResult<T> = Result<T, EncodingError>;

/// Result type for platform capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Result type for controller operations
pub type SessionResult<T> = Result<T, SessionError>;

impl PullError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PullError::Transient(_))
    }
}

impl From<CaptureError> for PullError {
    fn from(err: CaptureError) -> Self {
        PullError::Transient(err.to_string())
    }
}

impl From<CaptureError> for InventoryError {
    fn from(err: CaptureError) -> Self {
        InventoryError::Failed(err.to_string())
    }
}
