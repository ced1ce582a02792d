//! Single-slot latest-frame buffer shared between the worker and readers

use parking_lot::Mutex;

use crate::types::Frame;

#[derive(Debug, Default)]
struct SlotState {
    last_sequence: u64,
    frame: Option<Frame>,
}

/// Holds only the most recently published frame
///
/// Publishing overwrites; there is no queue. Frames carry reference-counted
/// pixel buffers, so a reader's copy is just a handle clone and stays intact
/// when the writer moves on.
#[derive(Debug, Default)]
pub struct FrameSlot {
    inner: Mutex<SlotState>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a frame, stamping it with the next sequence number
    pub fn publish(&self, frame: Frame) -> Frame {
        let mut state = self.inner.lock();
        state.last_sequence += 1;
        let frame = frame.with_sequence(state.last_sequence);
        state.frame = Some(frame.clone());
        frame
    }

    /// Copy of the newest frame, if any
    pub fn latest(&self) -> Option<Frame> {
        self.inner.lock().frame.clone()
    }

    /// Sequence of the newest frame ever published, 0 if none
    pub fn last_sequence(&self) -> u64 {
        self.inner.lock().last_sequence
    }

    /// Drop the stored frame; sequence numbers keep increasing
    pub fn clear(&self) {
        self.inner.lock().frame = None;
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().frame.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_publish_overwrites() {
        let slot = FrameSlot::new();
        assert!(slot.latest().is_none());

        slot.publish(Frame::solid(2, 2, [1, 1, 1]));
        slot.publish(Frame::solid(2, 2, [2, 2, 2]));

        let latest = slot.latest().unwrap();
        assert_eq!(latest.sequence, 2);
        assert_eq!(latest.get_pixel(0, 0), Some(&[2u8, 2, 2][..]));
    }

    #[test]
    fn test_reader_copy_survives_overwrite() {
        let slot = FrameSlot::new();
        slot.publish(Frame::solid(2, 2, [9, 9, 9]));
        let held = slot.latest().unwrap();

        slot.publish(Frame::solid(4, 4, [0, 0, 0]));
        assert_eq!((held.width, held.height), (2, 2));
        assert!(held.data.iter().all(|&b| b == 9));
    }

    #[test]
    fn test_clear_keeps_sequence() {
        let slot = FrameSlot::new();
        slot.publish(Frame::solid(1, 1, [0, 0, 0]));
        slot.clear();
        assert!(slot.is_empty());
        assert_eq!(slot.publish(Frame::solid(1, 1, [0, 0, 0])).sequence, 2);
    }

    #[test]
    fn test_concurrent_readers_see_whole_frames() {
        let slot = Arc::new(FrameSlot::new());
        let writer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for i in 0..200u32 {
                    let v = (i % 256) as u8;
                    slot.publish(Frame::solid(8 + i % 3, 8, [v, v, v]));
                }
            })
        };

        let mut last = 0;
        while !writer.is_finished() {
            if let Some(frame) = slot.latest() {
                assert!(frame.is_valid());
                let first = frame.data[0];
                assert!(frame.data.iter().all(|&b| b == first));
                assert!(frame.sequence >= last);
                last = frame.sequence;
            }
        }
        writer.join().unwrap();
        assert_eq!(slot.last_sequence(), 200);
    }
}
