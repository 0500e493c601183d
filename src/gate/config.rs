use serde::{Deserialize, Serialize};

/// Thresholds for the continuous-condition capture gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureGateConfig {
    /// Minimum grayscale std-dev before a frame counts as "not background"
    pub min_foreground: f64,

    /// Minimum Laplacian variance before a frame counts as "in focus"
    pub min_sharpness: f64,

    /// Maximum phash distance to the previous frame for "not moving"
    pub max_motion: f64,

    /// How long all three conditions must hold before firing
    pub hold_secs: f64,

    /// Refractory period after a fire during which conditions are ignored
    pub cooldown_secs: f64,
}

impl Default for CaptureGateConfig {
    fn default() -> Self {
        Self {
            min_foreground: 18.0,
            min_sharpness: 120.0,
            max_motion: 10.0,
            hold_secs: 1.2,
            cooldown_secs: 10.0,
        }
    }
}

/// Thresholds for the discrete-label hysteresis gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryGateConfig {
    /// History window capacity in frames
    pub window: usize,

    /// Frames a label must appear in before it can become active
    pub min_repeats: usize,

    /// Detections below this confidence are discarded on ingestion
    pub low_confidence: f64,

    /// A label must reach this confidence at least once to become active
    pub high_confidence: f64,
}

impl Default for InventoryGateConfig {
    fn default() -> Self {
        Self {
            window: 8,
            min_repeats: 3,
            low_confidence: 0.20,
            high_confidence: 0.35,
        }
    }
}

/// Thresholds for the door-open motion machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorGateConfig {
    /// Motion level that counts as the door being opened
    pub motion_high: f64,

    /// How long motion must stay below `motion_high / 2` before the scene
    /// counts as settled
    pub settle_secs: f64,
}

impl Default for DoorGateConfig {
    fn default() -> Self {
        Self {
            motion_high: 28.0,
            settle_secs: 3.0,
        }
    }
}
