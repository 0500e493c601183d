//! Capacity-1 handoff between a frame producer and the monitor loop.
//!
//! The producer side overwrites the slot on every publish, so a slow consumer
//! only ever sees the newest frame; stale frames are dropped, never queued.

use anyhow::Result;
use tokio::sync::watch;

use super::source::FrameSource;
use super::Frame;

pub struct FramePublisher {
    tx: watch::Sender<Option<Frame>>,
}

impl FramePublisher {
    /// Replace whatever frame is currently in the slot.
    pub fn publish(&self, frame: Frame) {
        let _ = self.tx.send(Some(frame));
    }
}

pub struct FrameSlot {
    rx: watch::Receiver<Option<Frame>>,
}

impl FrameSource for FrameSlot {
    fn latest_frame(&mut self) -> Result<Option<Frame>> {
        match self.rx.has_changed() {
            Ok(true) => Ok(self.rx.borrow_and_update().clone()),
            Ok(false) => Ok(None),
            // Publisher gone; the stream has ended.
            Err(_) => Ok(None),
        }
    }
}

/// Create a connected publisher/slot pair.
pub fn frame_slot() -> (FramePublisher, FrameSlot) {
    let (tx, rx) = watch::channel(None);
    (FramePublisher { tx }, FrameSlot { rx })
}
