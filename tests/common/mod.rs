//! Scripted sources and inventories shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use framesnap::*;
use parking_lot::Mutex;

/// How an opened source behaves
#[derive(Debug, Clone)]
pub enum Script {
    /// `open` fails as an unavailable device
    FailOpen(String),
    /// `pull` yields `limit` frames (forever if `None`), then `fail_with`
    Frames {
        limit: Option<usize>,
        width: u32,
        height: u32,
        pull_delay: Duration,
        fail_with: PullError,
    },
}

/// Opener that counts opens and closes
pub struct ScriptedOpener {
    script: Script,
    pub opens: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub last_descriptor: Mutex<Option<SourceDescriptor>>,
}

impl ScriptedOpener {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            last_descriptor: Mutex::new(None),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Self::new(Script::FailOpen("device busy".to_string()))
    }

    pub fn endless() -> Arc<Self> {
        Self::new(Script::Frames {
            limit: None,
            width: 64,
            height: 48,
            pull_delay: Duration::ZERO,
            fail_with: PullError::Fatal("unreachable".to_string()),
        })
    }

    pub fn limited(limit: usize, fail_with: PullError) -> Arc<Self> {
        Self::new(Script::Frames {
            limit: Some(limit),
            width: 64,
            height: 48,
            pull_delay: Duration::ZERO,
            fail_with,
        })
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn last_descriptor(&self) -> Option<SourceDescriptor> {
        self.last_descriptor.lock().clone()
    }
}

impl SourceOpener for ScriptedOpener {
    fn open(&self, descriptor: &SourceDescriptor) -> Result<Box<dyn FrameSource>, OpenError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.last_descriptor.lock() = Some(descriptor.clone());

        match &self.script {
            Script::FailOpen(message) => Err(OpenError::Unavailable {
                descriptor: descriptor.clone(),
                message: message.clone(),
            }),
            Script::Frames {
                limit,
                width,
                height,
                pull_delay,
                fail_with,
            } => Ok(Box::new(ScriptedSource {
                descriptor: descriptor.clone(),
                remaining: *limit,
                width: *width,
                height: *height,
                pull_delay: *pull_delay,
                fail_with: fail_with.clone(),
                produced: 0,
                closes: Arc::clone(&self.closes),
            })),
        }
    }
}

pub struct ScriptedSource {
    descriptor: SourceDescriptor,
    remaining: Option<usize>,
    width: u32,
    height: u32,
    pull_delay: Duration,
    fail_with: PullError,
    produced: u64,
    closes: Arc<AtomicUsize>,
}

impl FrameSource for ScriptedSource {
    fn pull(&mut self) -> Result<Frame, PullError> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(self.fail_with.clone());
            }
            *remaining -= 1;
        }
        if !self.pull_delay.is_zero() {
            thread::sleep(self.pull_delay);
        }
        self.produced += 1;
        let shade = (self.produced % 256) as u8;
        Ok(Frame::solid(self.width, self.height, [shade, shade, shade]))
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn kind(&self) -> SourceKind {
        self.descriptor.kind()
    }

    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }
}

/// Inventory whose listing can be changed between refreshes
#[derive(Clone, Default)]
pub struct ScriptedInventory {
    entries: Arc<Mutex<Option<Vec<WindowEntry>>>>,
}

impl ScriptedInventory {
    pub fn listing(entries: Vec<WindowEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Some(entries))),
        }
    }

    /// Inventory that reports enumeration as unsupported
    pub fn unsupported() -> Self {
        Self::default()
    }

    pub fn set(&self, entries: Vec<WindowEntry>) {
        *self.entries.lock() = Some(entries);
    }
}

impl WindowInventory for ScriptedInventory {
    fn enumerate(&self) -> Result<Vec<WindowEntry>, InventoryError> {
        self.entries
            .lock()
            .clone()
            .ok_or_else(|| InventoryError::Unsupported("scripted".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn window(title: &str, id: u64) -> WindowEntry {
    WindowEntry::window(title, WindowHandle(id), Some(Rectangle::new(10, 20, 300, 200)))
}

/// Poll `check` until it returns true or `timeout` passes
pub fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    check()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
