//! Background acquisition thread
//!
//! One worker owns one source for the lifetime of a session. It opens the
//! source on its own thread, publishes every pulled frame into the shared
//! [`FrameSlot`] and reports progress through a callback. The first failed
//! pull ends the session.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::{
    error::{OpenError, PullError, PullResult, SessionResult},
    pipeline::FrameSlot,
    source::{FrameSource, SourceOpener},
    types::{Frame, SourceDescriptor},
};

/// Notification from the acquisition thread
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The source opened and delivered its first frame
    Connected(SourceDescriptor),
    /// A new frame was published
    Frame(Frame),
    /// The session ended; always the last event of a session
    Stopped(StopReason),
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    Requested,
    OpenFailed(OpenError),
    PullFailed(PullError),
}

/// Worker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Opening,
    Polling,
    Stopped,
}

/// Acquisition statistics
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    pub frames_published: u64,
    pub total_pull_time: Duration,
    pub last_pull_time: Duration,
}

impl WorkerStats {
    pub fn avg_pull_time(&self) -> Duration {
        if self.frames_published == 0 {
            return Duration::ZERO;
        }
        self.total_pull_time / self.frames_published.min(u32::MAX as u64) as u32
    }
}

struct Shared {
    stop: AtomicBool,
    state: Mutex<WorkerState>,
    stats: Mutex<WorkerStats>,
}

impl Shared {
    fn set_state(&self, state: WorkerState) {
        *self.state.lock() = state;
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

/// Closes the source exactly once, on every exit path
struct SourceGuard {
    source: Box<dyn FrameSource>,
    closed: bool,
}

impl SourceGuard {
    fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source,
            closed: false,
        }
    }

    fn pull(&mut self) -> PullResult<Frame> {
        self.source.pull()
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.source.close();
            log::debug!("Closed {}", self.source.descriptor());
        }
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.close();
    }
}

/// Handle to a running acquisition thread
pub struct AcquisitionWorker {
    descriptor: SourceDescriptor,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl AcquisitionWorker {
    /// Start a worker for `descriptor`
    ///
    /// The callback runs on the worker thread, so it should only hand the
    /// event off (for example into a channel).
    pub fn spawn<F>(
        descriptor: SourceDescriptor,
        opener: Arc<dyn SourceOpener>,
        poll_floor: Duration,
        slot: Arc<FrameSlot>,
        callback: F,
    ) -> SessionResult<Self>
    where
        F: FnMut(SessionEvent) + Send + 'static,
    {
        let shared = Arc::new(Shared {
            stop: AtomicBool::new(false),
            state: Mutex::new(WorkerState::Idle),
            stats: Mutex::new(WorkerStats::default()),
        });

        let handle = {
            let descriptor = descriptor.clone();
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("framesnap-acquire".to_string())
                .spawn(move || {
                    run(descriptor, opener, poll_floor, slot, shared, callback);
                })?
        };

        Ok(Self {
            descriptor,
            shared,
            handle: Some(handle),
        })
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> WorkerState {
        *self.shared.state.lock()
    }

    pub fn stats(&self) -> WorkerStats {
        self.shared.stats.lock().clone()
    }

    /// Whether the thread has run to completion
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Ask the worker to stop without waiting for it
    pub fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
        if let Some(handle) = &self.handle {
            handle.thread().unpark();
        }
    }

    /// Stop the worker and wait for it to release its source
    ///
    /// Blocks for at most one in-flight pull once the source is open. An
    /// open that never returns blocks this call too.
    pub fn stop(&mut self) {
        self.request_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Acquisition thread for {} panicked", self.descriptor);
                self.shared.set_state(WorkerState::Stopped);
            }
        }
    }
}

impl Drop for AcquisitionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<F>(
    descriptor: SourceDescriptor,
    opener: Arc<dyn SourceOpener>,
    poll_floor: Duration,
    slot: Arc<FrameSlot>,
    shared: Arc<Shared>,
    mut callback: F,
) where
    F: FnMut(SessionEvent),
{
    shared.set_state(WorkerState::Opening);

    if shared.stop_requested() {
        shared.set_state(WorkerState::Stopped);
        callback(SessionEvent::Stopped(StopReason::Requested));
        return;
    }

    let source = match opener.open(&descriptor) {
        Ok(source) => source,
        Err(e) => {
            log::warn!("Failed to open {}: {}", descriptor, e);
            shared.set_state(WorkerState::Stopped);
            callback(SessionEvent::Stopped(StopReason::OpenFailed(e)));
            return;
        }
    };

    let mut source = SourceGuard::new(source);
    log::info!("Connected to {}", descriptor);
    shared.set_state(WorkerState::Polling);
    callback(SessionEvent::Connected(descriptor.clone()));

    let reason = loop {
        if shared.stop_requested() {
            break StopReason::Requested;
        }

        let started = Instant::now();
        match source.pull() {
            Ok(frame) => {
                let pull_time = started.elapsed();
                let frame = slot.publish(frame);
                {
                    let mut stats = shared.stats.lock();
                    stats.frames_published += 1;
                    stats.total_pull_time += pull_time;
                    stats.last_pull_time = pull_time;
                }
                log::trace!(
                    "Published frame {} ({}x{}) from {}",
                    frame.sequence,
                    frame.width,
                    frame.height,
                    descriptor
                );
                callback(SessionEvent::Frame(frame));
            }
            Err(e) => {
                log::warn!("Pull from {} failed: {}", descriptor, e);
                break StopReason::PullFailed(e);
            }
        }

        // Floor between iteration starts; park so a stop request cuts it short
        let deadline = started + poll_floor;
        loop {
            if shared.stop_requested() {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    };

    source.close();
    shared.set_state(WorkerState::Stopped);
    log::info!("Acquisition from {} stopped: {:?}", descriptor, reason);
    callback(SessionEvent::Stopped(reason));
}
