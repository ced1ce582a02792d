//! Session controller: source selection, lifecycle and snapshot glue
//!
//! The controller is driven from one thread (typically a UI loop). Worker
//! events are queued on a channel and applied when [`SessionController::poll_events`]
//! is called. Frame events are coalesced: at most the newest one waits to be
//! polled, since the pixels themselves are read from the frame slot.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use image::RgbImage;

use crate::{
    error::{OpenError, SaveError, SaveResult, SessionError, SessionResult},
    inventory::{platform_inventory, WindowInventory, WindowList},
    pipeline::{AcquisitionWorker, FrameSlot, SessionEvent, WorkerStats},
    scaler::DisplayScaler,
    snapshot::SnapshotStore,
    source::{self, PlatformOpener, SourceOpener},
    types::{
        DeviceInfo, Dimensions, Frame, RegionTarget, SessionConfig, SnapshotRequest,
        SourceDescriptor, SourceKind, WindowHandle,
    },
};

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Live,
    Stopped,
}

/// What the next session will capture from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A fixed device, stream or region
    Source(SourceDescriptor),
    /// A window bound by title, re-resolved on every refresh
    Window(String),
}

/// Drives one acquisition session at a time
pub struct SessionController {
    config: SessionConfig,
    opener: Arc<dyn SourceOpener>,
    inventory: Box<dyn WindowInventory>,
    windows: WindowList,
    selection: Option<Selection>,
    worker: Option<AcquisitionWorker>,
    state: SessionState,
    slot: Arc<FrameSlot>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    frames_tx: Sender<SessionEvent>,
    frames_rx: Receiver<SessionEvent>,
    scaler: DisplayScaler,
    store: SnapshotStore,
    pending: Option<SnapshotRequest>,
}

impl SessionController {
    /// Controller backed by the platform camera, stream and screen backends
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        let opener = Arc::new(PlatformOpener::new(config.device_hints));
        Self::with_backends(config, opener, platform_inventory())
    }

    /// Controller with caller-supplied backends
    pub fn with_backends(
        config: SessionConfig,
        opener: Arc<dyn SourceOpener>,
        inventory: Box<dyn WindowInventory>,
    ) -> SessionResult<Self> {
        config
            .validate()
            .map_err(SessionError::InvalidConfiguration)?;

        let (events_tx, events_rx) = unbounded();
        let (frames_tx, frames_rx) = bounded(1);
        Ok(Self {
            scaler: DisplayScaler::new(config.min_viewport),
            store: SnapshotStore::new(config.output_dir.clone(), config.jpeg_quality),
            config,
            opener,
            inventory,
            windows: WindowList::empty(),
            selection: None,
            worker: None,
            state: SessionState::Idle,
            slot: Arc::new(FrameSlot::new()),
            events_tx,
            events_rx,
            frames_tx,
            frames_rx,
            pending: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a worker is opening or polling
    pub fn is_live(&self) -> bool {
        matches!(self.state, SessionState::Connecting | SessionState::Live)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Choose a device, stream or fixed region for the next session
    pub fn select_source(&mut self, descriptor: SourceDescriptor) -> SessionResult<()> {
        self.ensure_not_live()?;
        log::debug!("Selected {}", descriptor);
        self.selection = Some(Selection::Source(descriptor));
        Ok(())
    }

    /// Re-enumerate windows and re-bind a window selection by title
    pub fn refresh_windows(&mut self) -> &WindowList {
        self.windows = self.inventory.refresh();

        if let Some(Selection::Window(title)) = &self.selection {
            if self.windows.resolve(title).is_none() {
                let fallback = self.windows.first().map(|entry| entry.title.clone());
                log::debug!("Window {:?} is gone; now {:?}", title, fallback);
                self.selection = fallback.map(Selection::Window);
            }
        }

        &self.windows
    }

    /// Windows from the latest refresh
    pub fn windows(&self) -> &WindowList {
        &self.windows
    }

    /// Bind the next session to a window from the latest refresh
    pub fn select_window(&mut self, title: &str) -> SessionResult<()> {
        self.ensure_not_live()?;
        if self.windows.resolve(title).is_none() {
            return Err(SessionError::UnknownWindow(title.to_string()));
        }
        self.selection = Some(Selection::Window(title.to_string()));
        Ok(())
    }

    /// Cameras currently attached
    pub fn probe_devices(&self) -> Vec<DeviceInfo> {
        source::probe_devices()
    }

    /// Start acquiring from the current selection
    ///
    /// Returns once the worker thread is running; the outcome of opening
    /// the source arrives later as a `Connected` or `Stopped` event.
    pub fn start_session(&mut self) -> SessionResult<()> {
        self.ensure_not_live()?;
        let descriptor = self.resolve_selection()?;

        self.reap_worker();
        self.events_rx.try_iter().for_each(drop);
        self.frames_rx.try_iter().for_each(drop);
        self.slot.clear();

        let events = self.events_tx.clone();
        let frames_tx = self.frames_tx.clone();
        let frames_rx = self.frames_rx.clone();
        let worker = AcquisitionWorker::spawn(
            descriptor.clone(),
            Arc::clone(&self.opener),
            self.config.poll_floor(descriptor.kind()),
            Arc::clone(&self.slot),
            move |event| match event {
                SessionEvent::Frame(_) => {
                    // Replace an unpolled frame event with the newer one
                    if frames_tx.is_full() {
                        let _ = frames_rx.try_recv();
                    }
                    let _ = frames_tx.try_send(event);
                }
                _ => {
                    let _ = events.send(event);
                }
            },
        )?;

        log::info!("Session started for {}", descriptor);
        self.worker = Some(worker);
        self.state = SessionState::Connecting;
        Ok(())
    }

    /// Stop the session and wait for the worker to release its source
    ///
    /// A frame event still queued is discarded; the final `Stopped` event
    /// stays queued for `poll_events`.
    pub fn stop_session(&mut self) -> SessionResult<()> {
        let mut worker = self.worker.take().ok_or(SessionError::NoActiveSession)?;
        worker.stop();
        self.frames_rx.try_iter().for_each(drop);

        self.state = SessionState::Stopped;
        log::info!("Session for {} stopped", worker.descriptor());
        Ok(())
    }

    /// Drain queued worker events, updating the session state
    ///
    /// Returns at most one `Frame` event, ordered after `Connected` and
    /// before `Stopped`.
    pub fn poll_events(&mut self) -> Vec<SessionEvent> {
        // A queued frame implies its Connected event is already queued too
        let mut frame = self.frames_rx.try_recv().ok();
        let mut events: Vec<_> = self.events_rx.try_iter().collect();

        let stopped_at = events
            .iter()
            .position(|e| matches!(e, SessionEvent::Stopped(_)));
        if stopped_at.is_some() {
            // Frames sent before the stop must not surface after it
            if let Ok(newer) = self.frames_rx.try_recv() {
                frame = Some(newer);
            }
        }
        if let Some(frame) = frame {
            events.insert(stopped_at.unwrap_or(events.len()), frame);
        }

        for event in &events {
            match event {
                SessionEvent::Connected(_) => {
                    if self.state == SessionState::Connecting {
                        self.state = SessionState::Live;
                    }
                }
                SessionEvent::Stopped(reason) => {
                    log::debug!("Worker reported stop: {:?}", reason);
                    self.reap_worker();
                    self.state = SessionState::Stopped;
                }
                SessionEvent::Frame(_) => {}
            }
        }
        events
    }

    /// Newest published frame at full resolution
    pub fn latest_frame(&self) -> Option<Frame> {
        self.slot.latest()
    }

    /// Newest frame fitted to `viewport`, in BGR order
    pub fn preview(&self, viewport: Dimensions) -> Option<Frame> {
        let frame = self.slot.latest()?;
        self.scaler.scale_frame(&frame, viewport)
    }

    /// Newest frame fitted to `viewport`, in RGB order
    pub fn preview_rgb(&self, viewport: Dimensions) -> Option<RgbImage> {
        let frame = self.slot.latest()?;
        self.scaler.preview_rgb(&frame, viewport)
    }

    /// Freeze the newest frame of the live session as the pending snapshot
    pub fn request_capture(&mut self) -> SessionResult<Frame> {
        if !self.is_live() {
            return Err(SessionError::NoActiveSession);
        }
        let frame = self.slot.latest().ok_or(SessionError::NoFrameAvailable)?;
        log::debug!("Captured frame {} ({}x{})", frame.sequence, frame.width, frame.height);
        self.pending = Some(SnapshotRequest {
            frame: frame.clone(),
            target_name: None,
        });
        Ok(frame)
    }

    pub fn pending_snapshot(&self) -> Option<&SnapshotRequest> {
        self.pending.as_ref()
    }

    /// Save the pending snapshot into `dir`, or the output directory
    ///
    /// The snapshot stays pending when saving fails, so it can be retried
    /// under another name.
    pub fn request_save(&mut self, name: &str, dir: Option<&Path>) -> SaveResult<PathBuf> {
        let pending = self.pending.as_mut().ok_or(SaveError::NothingCaptured)?;
        pending.target_name = Some(name.to_string());

        let result = match dir {
            Some(dir) => self.store.save_in(&pending.frame, name, dir),
            None => self.store.save(&pending.frame, name),
        };

        if result.is_ok() {
            self.pending = None;
        }
        result
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.store.set_output_dir(dir);
    }

    pub fn output_dir(&self) -> &Path {
        self.store.output_dir()
    }

    pub fn snapshot_store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn worker_stats(&self) -> Option<WorkerStats> {
        self.worker.as_ref().map(|w| w.stats())
    }

    fn ensure_not_live(&self) -> SessionResult<()> {
        if self.is_live() {
            return Err(SessionError::SessionActive);
        }
        Ok(())
    }

    fn resolve_selection(&self) -> SessionResult<SourceDescriptor> {
        let selection = self.selection.as_ref().ok_or(SessionError::NoSourceSelected)?;
        let is_region = match selection {
            Selection::Source(descriptor) => descriptor.kind() == SourceKind::Region,
            Selection::Window(_) => true,
        };
        // Region capture needs a refresh that found something
        if is_region && self.windows.is_empty() {
            return Err(OpenError::NoTarget("no capturable windows listed".to_string()).into());
        }

        match selection {
            Selection::Source(SourceDescriptor::Region {
                target: RegionTarget::Window(handle),
                ..
            }) if !self.lists_window(*handle) => Err(OpenError::NoTarget(format!(
                "window {} is not in the latest refresh",
                handle
            ))
            .into()),
            Selection::Source(descriptor) => Ok(descriptor.clone()),
            Selection::Window(title) => self
                .windows
                .resolve(title)
                .map(SourceDescriptor::from_window)
                .ok_or_else(|| SessionError::UnknownWindow(title.clone())),
        }
    }

    fn lists_window(&self, handle: WindowHandle) -> bool {
        self.windows
            .entries()
            .iter()
            .any(|e| e.target == RegionTarget::Window(handle))
    }

    fn reap_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
    }
}
