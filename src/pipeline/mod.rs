//! Acquisition pipeline: one worker thread feeding a latest-frame slot

pub mod slot;
pub mod worker;

pub use slot::FrameSlot;
pub use worker::{AcquisitionWorker, SessionEvent, StopReason, WorkerState, WorkerStats};
