//! Per-frame observation data model.
//!
//! One `FrameObservation` is produced for every processed frame, whether it
//! came from the live monitor loop or from a replayed JSONL stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single detection reported by the external detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// Detector confidence in 0..1.
    pub confidence: f64,
    /// Bounding box as [x, y, width, height] in pixels, when the detector
    /// provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox: None,
        }
    }
}

/// Scalar quality metrics for one frame.
///
/// `sharpness` is the Laplacian variance of the grayscale frame, `motion` the
/// perceptual-hash distance to the previous frame, and `foreground` the
/// grayscale standard deviation (an empty fridge shelf scores low).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameQuality {
    pub sharpness: f64,
    pub motion: f64,
    pub foreground: f64,
}

/// Everything the gates get to see about one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameObservation {
    pub timestamp: DateTime<Utc>,
    /// Zero or more detections; an empty list means "nothing seen this frame".
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<FrameQuality>,
}

impl FrameObservation {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            detections: Vec::new(),
            quality: None,
        }
    }

    pub fn with_detections(mut self, detections: Vec<Detection>) -> Self {
        self.detections = detections;
        self
    }

    pub fn with_quality(mut self, quality: FrameQuality) -> Self {
        self.quality = Some(quality);
        self
    }
}
