//! Network video source decoded by an ffmpeg child process

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::{ffmpeg_is_installed, FfmpegCommand};
use ffmpeg_sidecar::event::OutputVideoFrame;

use crate::error::{OpenError, OpenResult, PullError, PullResult};
use crate::source::FrameSource;
use crate::types::{Frame, SourceDescriptor, SourceKind};

type FrameIter = Box<dyn Iterator<Item = OutputVideoFrame>>;

/// Stream addressed by URL (RTSP, HTTP, file paths ffmpeg understands)
pub struct StreamSource {
    descriptor: SourceDescriptor,
    child: Option<FfmpegChild>,
    frames: Option<FrameIter>,
    pending: Option<Frame>,
}

impl StreamSource {
    /// Start decoding and wait for the first frame
    pub fn open(url: &str) -> OpenResult<Self> {
        let descriptor = SourceDescriptor::Stream {
            url: url.to_string(),
        };
        let unavailable = |message: String| OpenError::Unavailable {
            descriptor: descriptor.clone(),
            message,
        };

        if url.trim().is_empty() {
            return Err(unavailable("empty stream URL".to_string()));
        }
        if !ffmpeg_is_installed() {
            return Err(unavailable("ffmpeg executable not found".to_string()));
        }

        let mut child = FfmpegCommand::new()
            .hide_banner()
            // Keep decoder-side buffering to a minimum so frames stay fresh
            .args(["-fflags", "nobuffer", "-flags", "low_delay"])
            .input(url)
            .rawvideo()
            .spawn()
            .map_err(|e| unavailable(format!("failed to spawn ffmpeg: {}", e)))?;

        let frames = match child.iter() {
            Ok(iter) => Box::new(iter.filter_frames()) as FrameIter,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(unavailable(format!("failed to read ffmpeg output: {}", e)));
            }
        };

        let mut source = Self {
            descriptor: descriptor.clone(),
            child: Some(child),
            frames: Some(frames),
            pending: None,
        };

        match source.read() {
            Ok(frame) => {
                log::info!("Stream {} decoding at {}x{}", url, frame.width, frame.height);
                source.pending = Some(frame);
                Ok(source)
            }
            Err(e) => {
                source.close();
                Err(unavailable(format!("first read failed: {}", e)))
            }
        }
    }

    fn read(&mut self) -> PullResult<Frame> {
        let frames = self
            .frames
            .as_mut()
            .ok_or_else(|| PullError::Fatal("stream is closed".to_string()))?;

        let frame = frames
            .next()
            .ok_or_else(|| PullError::Fatal("stream ended".to_string()))?;

        let expected = frame.width as usize * frame.height as usize * Frame::CHANNELS;
        if frame.data.len() != expected {
            return Err(PullError::Transient(format!(
                "frame of {} bytes does not match {}x{} rgb24",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }

        Ok(Frame::from_rgb(frame.width, frame.height, frame.data))
    }
}

impl FrameSource for StreamSource {
    fn pull(&mut self) -> PullResult<Frame> {
        match self.pending.take() {
            Some(frame) => Ok(frame),
            None => self.read(),
        }
    }

    fn close(&mut self) {
        self.pending = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                log::debug!("ffmpeg for {} already exited: {}", self.descriptor, e);
            }
            if let Err(e) = child.wait() {
                log::warn!("Failed to reap ffmpeg for {}: {}", self.descriptor, e);
            }
        }
        // Dropping the iterator after the child is gone lets its reader threads finish
        self.frames = None;
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Stream
    }

    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }
}
