pub mod buffer;
pub mod metrics;
pub mod source;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::DynamicImage;

pub use buffer::{frame_slot, FramePublisher, FrameSlot};
pub use source::{FrameSource, SpoolDirSource};

/// One decoded camera frame.
///
/// The pixels sit behind an `Arc` so the frame can move through the
/// latest-frame slot and into blocking metric workers without copying.
#[derive(Debug, Clone)]
pub struct Frame {
    pub timestamp: DateTime<Utc>,
    pub image: Arc<DynamicImage>,
}

impl Frame {
    pub fn new(timestamp: DateTime<Utc>, image: DynamicImage) -> Self {
        Self {
            timestamp,
            image: Arc::new(image),
        }
    }
}
