//! Detection seam.
//!
//! The actual models (YOLO for shelf items, whatever decodes barcodes) run
//! outside this crate. The monitor loop talks to them through these traits
//! and keeps only detections that pass the food-label allowlist.

use anyhow::Result;

use crate::frame::Frame;
use crate::gate::Detection;

/// Maps a frame to zero or more labelled detections.
pub trait Detector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Invoked when the capture gate fires; returns a decoded barcode, if any.
pub trait Recognizer: Send {
    fn recognize(&mut self, frame: &Frame) -> Result<Option<String>>;
}

/// COCO classes that are food or drink related. Without this filter the
/// detector happily labels the fridge itself as a refrigerator.
pub const FOOD_LABELS: &[&str] = &[
    "bottle",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
];

/// Allowlist filter applied to raw detector output.
#[derive(Debug, Clone)]
pub struct LabelFilter {
    allowed: Vec<String>,
}

impl LabelFilter {
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn food() -> Self {
        Self::new(FOOD_LABELS.iter().copied())
    }

    pub fn allows(&self, label: &str) -> bool {
        self.allowed.iter().any(|allowed| allowed == label)
    }

    pub fn retain(&self, detections: Vec<Detection>) -> Vec<Detection> {
        detections
            .into_iter()
            .filter(|d| self.allows(&d.label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_drops_non_food_labels() {
        let filter = LabelFilter::food();
        let detections = vec![
            Detection::new("apple", 0.8),
            Detection::new("refrigerator", 0.95),
            Detection::new("person", 0.7),
            Detection::new("pizza", 0.4),
        ];

        let kept = filter.retain(detections);
        let labels: Vec<&str> = kept.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["apple", "pizza"]);
    }
}
