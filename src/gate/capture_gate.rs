//! Continuous-condition capture gate.
//!
//! Watches the scalar quality metrics of the frame stream and fires once the
//! scene has been still, in focus, and non-empty for long enough. Used to
//! decide when a barcode or item is actually being shown to the camera rather
//! than waved past it.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::config::CaptureGateConfig;
use super::observation::FrameObservation;

/// Display state of the capture gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CapturePhase {
    /// Waiting for the trigger conditions to hold
    Passive,
    /// Conditions hold, accumulating time toward the required duration
    Holding,
    /// The fire transition; reported for exactly one observation
    Capturing,
    /// Refractory period after a fire
    Cooldown,
}

impl CapturePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapturePhase::Passive => "passive",
            CapturePhase::Holding => "holding",
            CapturePhase::Capturing => "capturing",
            CapturePhase::Cooldown => "cooldown",
        }
    }
}

/// Outcome of one `observe` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDecision {
    /// True exactly once per qualifying hold; invoke the recognizer now.
    pub fire: bool,
    pub phase: CapturePhase,
}

/// State machine: PASSIVE -> HOLDING -> CAPTURING -> COOLDOWN -> PASSIVE.
///
/// All state lives on the instance; independent gates can run side by side
/// and tests drive them with synthetic timestamps.
#[derive(Debug)]
pub struct CaptureGate {
    config: CaptureGateConfig,
    hold_started_at: Option<DateTime<Utc>>,
    cooldown_until: Option<DateTime<Utc>>,
}

impl CaptureGate {
    pub fn new(config: CaptureGateConfig) -> Self {
        Self {
            config,
            hold_started_at: None,
            cooldown_until: None,
        }
    }

    pub fn config(&self) -> &CaptureGateConfig {
        &self.config
    }

    /// Feed one frame observation. Called once per processed frame.
    pub fn observe(&mut self, observation: &FrameObservation) -> CaptureDecision {
        let now = observation.timestamp;

        if let Some(until) = self.cooldown_until {
            if now < until {
                return CaptureDecision {
                    fire: false,
                    phase: CapturePhase::Cooldown,
                };
            }
            self.cooldown_until = None;
        }

        if !self.conditions_hold(observation) {
            // No partial credit: any broken condition clears the hold timer.
            self.hold_started_at = None;
            return CaptureDecision {
                fire: false,
                phase: CapturePhase::Passive,
            };
        }

        let started = *self.hold_started_at.get_or_insert(now);
        if now - started >= secs_to_duration(self.config.hold_secs) {
            self.hold_started_at = None;
            self.cooldown_until = Some(now + secs_to_duration(self.config.cooldown_secs));
            return CaptureDecision {
                fire: true,
                phase: CapturePhase::Capturing,
            };
        }

        CaptureDecision {
            fire: false,
            phase: CapturePhase::Holding,
        }
    }

    /// A frame with no quality metrics never qualifies.
    fn conditions_hold(&self, observation: &FrameObservation) -> bool {
        let Some(quality) = &observation.quality else {
            return false;
        };

        quality.foreground >= self.config.min_foreground
            && quality.sharpness >= self.config.min_sharpness
            && quality.motion <= self.config.max_motion
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::milliseconds((secs * 1000.0).round() as i64)
}
