//! Discrete-label hysteresis gate.
//!
//! Debounces the raw detection stream into a stable inventory: quick flickers
//! never add an item, and an item is only dropped once it has vanished from
//! the entire history window. Entry and exit use different criteria (repeat
//! count plus a high-confidence crossing to get in, total absence to get
//! out), which is what keeps the active set from oscillating frame to frame.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::config::InventoryGateConfig;
use super::observation::FrameObservation;

/// One retained detection inside the history window.
#[derive(Debug, Clone)]
struct WindowEntry {
    label: String,
    confidence: f64,
}

/// Labels that entered or left the active set on one `observe` call.
///
/// Both lists are unordered; callers must treat them as sets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InventoryDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl InventoryDelta {
    pub fn is_change(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

pub struct InventoryGate {
    config: InventoryGateConfig,
    /// Last N frames' retained detections, oldest first.
    window: VecDeque<Vec<WindowEntry>>,
    active: HashSet<String>,
}

impl InventoryGate {
    pub fn new(config: InventoryGateConfig) -> Self {
        let capacity = config.window.max(1);
        Self {
            config: InventoryGateConfig {
                window: capacity,
                ..config
            },
            window: VecDeque::with_capacity(capacity + 1),
            active: HashSet::new(),
        }
    }

    pub fn config(&self) -> &InventoryGateConfig {
        &self.config
    }

    /// Labels currently considered present in the fridge.
    pub fn active(&self) -> &HashSet<String> {
        &self.active
    }

    pub fn is_active(&self, label: &str) -> bool {
        self.active.contains(label)
    }

    /// Feed one frame observation and apply promotions and evictions.
    pub fn observe(&mut self, observation: &FrameObservation) -> InventoryDelta {
        let retained: Vec<WindowEntry> = observation
            .detections
            .iter()
            .filter(|d| d.confidence >= self.config.low_confidence)
            .map(|d| WindowEntry {
                label: d.label.clone(),
                confidence: d.confidence,
            })
            .collect();

        self.window.push_back(retained);
        while self.window.len() > self.config.window {
            self.window.pop_front();
        }

        // Occurrence count is per frame containing the label; several boxes of
        // the same label in one frame count once toward the repeat threshold.
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        let mut peak_confidence: HashMap<&str, f64> = HashMap::new();
        for frame in &self.window {
            let mut seen_this_frame: HashSet<&str> = HashSet::new();
            for entry in frame {
                if seen_this_frame.insert(&entry.label) {
                    *occurrences.entry(&entry.label).or_insert(0) += 1;
                }
                let peak = peak_confidence.entry(&entry.label).or_insert(0.0);
                if entry.confidence > *peak {
                    *peak = entry.confidence;
                }
            }
        }

        let mut added = Vec::new();
        for (label, count) in &occurrences {
            if self.active.contains(*label) {
                continue;
            }
            let crossed_high = peak_confidence
                .get(label)
                .is_some_and(|peak| *peak >= self.config.high_confidence);
            if *count >= self.config.min_repeats && crossed_high {
                added.push(label.to_string());
            }
        }

        // Eviction waits for a window with zero occurrences; one stray frame
        // keeps a vanished item alive for up to `window` more frames.
        let mut removed = Vec::new();
        for label in &self.active {
            if !occurrences.contains_key(label.as_str()) {
                removed.push(label.clone());
            }
        }

        for label in &added {
            self.active.insert(label.clone());
        }
        for label in &removed {
            self.active.remove(label);
        }

        InventoryDelta { added, removed }
    }
}
