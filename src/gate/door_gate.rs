//! Door-open motion machine.
//!
//! A cheap two-state companion to the capture gate: a motion spike means the
//! door was opened and someone is rearranging the shelf; once the scene has
//! settled the gate fires a single inventory capture for that door event.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::config::DoorGateConfig;
use super::observation::FrameObservation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DoorPhase {
    Passive,
    Motion,
}

impl DoorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoorPhase::Passive => "passive",
            DoorPhase::Motion => "motion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorDecision {
    /// True exactly once per door-open event, on the settle transition.
    pub capture: bool,
    pub phase: DoorPhase,
}

pub struct DoorGate {
    config: DoorGateConfig,
    phase: DoorPhase,
    /// Start of the current sustained below-half-threshold stretch.
    settled_since: Option<DateTime<Utc>>,
}

impl DoorGate {
    pub fn new(config: DoorGateConfig) -> Self {
        Self {
            config,
            phase: DoorPhase::Passive,
            settled_since: None,
        }
    }

    pub fn phase(&self) -> DoorPhase {
        self.phase
    }

    /// Feed one frame observation. Frames without quality metrics are treated
    /// as motionless.
    pub fn observe(&mut self, observation: &FrameObservation) -> DoorDecision {
        let motion = observation.quality.map(|q| q.motion).unwrap_or(0.0);
        let now = observation.timestamp;

        match self.phase {
            DoorPhase::Passive => {
                if motion > self.config.motion_high {
                    self.phase = DoorPhase::Motion;
                    self.settled_since = None;
                }
                DoorDecision {
                    capture: false,
                    phase: self.phase,
                }
            }
            DoorPhase::Motion => {
                // Release uses half the trigger threshold so borderline motion
                // cannot flip the machine back and forth.
                if motion < self.config.motion_high / 2.0 {
                    let since = *self.settled_since.get_or_insert(now);
                    let settle = Duration::milliseconds((self.config.settle_secs * 1000.0) as i64);
                    if now - since >= settle {
                        self.phase = DoorPhase::Passive;
                        self.settled_since = None;
                        return DoorDecision {
                            capture: true,
                            phase: DoorPhase::Passive,
                        };
                    }
                } else {
                    self.settled_since = None;
                }
                DoorDecision {
                    capture: false,
                    phase: DoorPhase::Motion,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::observation::{FrameObservation, FrameQuality};
    use chrono::TimeZone;

    fn obs(offset_ms: i64, motion: f64) -> FrameObservation {
        let base = Utc.with_ymd_and_hms(2026, 1, 18, 4, 8, 0).unwrap();
        FrameObservation::new(base + Duration::milliseconds(offset_ms)).with_quality(
            FrameQuality {
                sharpness: 100.0,
                motion,
                foreground: 30.0,
            },
        )
    }

    fn gate() -> DoorGate {
        DoorGate::new(DoorGateConfig {
            motion_high: 28.0,
            settle_secs: 3.0,
        })
    }

    #[test]
    fn one_capture_per_door_event() {
        let mut gate = gate();

        // Door opens: spike above the trigger threshold.
        assert_eq!(gate.observe(&obs(0, 40.0)).phase, DoorPhase::Motion);

        // Rummaging keeps motion moderate; still no capture.
        assert!(!gate.observe(&obs(1000, 20.0)).capture);

        // Scene drops below half threshold (14.0) and stays there.
        let mut captures = 0;
        for i in 0..8 {
            let decision = gate.observe(&obs(2000 + i * 1000, 3.0));
            if decision.capture {
                captures += 1;
            }
        }
        assert_eq!(captures, 1);
        assert_eq!(gate.phase(), DoorPhase::Passive);
    }

    #[test]
    fn moderate_motion_restarts_settle_clock() {
        let mut gate = gate();

        gate.observe(&obs(0, 50.0));
        gate.observe(&obs(500, 5.0));
        gate.observe(&obs(2500, 5.0));
        // A hand back in the frame at 3s; the settle stretch restarts.
        assert!(!gate.observe(&obs(3000, 20.0)).capture);
        assert!(!gate.observe(&obs(3500, 5.0)).capture);
        assert!(!gate.observe(&obs(5500, 5.0)).capture);
        // 3s after the restart it fires.
        assert!(gate.observe(&obs(6500, 5.0)).capture);
    }

    #[test]
    fn quiet_stream_never_fires() {
        let mut gate = gate();
        for i in 0..20 {
            let decision = gate.observe(&obs(i * 500, 2.0));
            assert!(!decision.capture);
            assert_eq!(decision.phase, DoorPhase::Passive);
        }
    }
}
