use anyhow::{Context, Result};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::{CaptureEvent, CaptureKind, Database, InventoryChange, InventoryEvent};
use crate::detect::{Detector, LabelFilter, Recognizer};
use crate::frame::{metrics, Frame, FrameSource};
use crate::gate::{CaptureGate, DoorGate, FrameObservation, InventoryGate};
use crate::lookup::{display_result, normalize_code, ProductLookup};
use crate::settings::GateSettings;

// Set to false to silence per-tick logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const TICK_INTERVAL_MS: u64 = 400;
const TICK_TIMEOUT_SECS: u64 = 5;

/// No-barcode sentinel, logged when the capture gate fires but the recognizer
/// comes up empty.
const NO_CODE_OUTCOME: &str = "No barcode detected. Check lighting and focus!";

/// External collaborators wired into one monitor session.
pub struct MonitorDeps {
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn Detector>,
    pub recognizer: Box<dyn Recognizer>,
    pub lookup: Box<dyn ProductLookup>,
    pub filter: LabelFilter,
}

/// Everything the loop mutates between ticks. One instance per session; the
/// gates are deliberately not shared with anything else.
struct LoopState {
    capture: CaptureGate,
    inventory: InventoryGate,
    door: DoorGate,
    last_phash: Option<String>,
}

impl LoopState {
    fn new(settings: &GateSettings) -> Self {
        Self {
            capture: CaptureGate::new(settings.capture.clone()),
            inventory: InventoryGate::new(settings.inventory.clone()),
            door: DoorGate::new(settings.door.clone()),
            last_phash: None,
        }
    }
}

pub async fn monitor_loop(
    session_id: String,
    db: Database,
    settings: GateSettings,
    mut deps: MonitorDeps,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut state = LoopState::new(&settings);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fut = process_tick(&session_id, &db, &mut deps, &mut state);
                match tokio::time::timeout(Duration::from_secs(TICK_TIMEOUT_SECS), fut).await {
                    Ok(Ok(())) => {},
                    Ok(Err(err)) => log_warn!("tick failed for session {}: {err:?}", session_id),
                    Err(_) => log_warn!("tick timeout (> {}s) session {}", TICK_TIMEOUT_SECS, session_id),
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("monitor loop shutting down");
                break;
            }
        }
    }
}

/// One pass of the pipeline: latest frame, metrics, detector, gates, event
/// log. Detector and lookup failures are absorbed here; only infrastructure
/// failures (metrics worker, database) bubble up to the per-tick handler.
async fn process_tick(
    session_id: &str,
    db: &Database,
    deps: &mut MonitorDeps,
    state: &mut LoopState,
) -> Result<()> {
    let Some(frame) = deps.source.latest_frame()? else {
        // Nothing new from the relay; skip this tick.
        return Ok(());
    };

    let (quality, phash) = tokio::task::spawn_blocking({
        let image = frame.image.clone();
        let previous = state.last_phash.take();
        move || metrics::measure(&image, previous.as_deref())
    })
    .await
    .context("frame metrics worker join failed")?;
    state.last_phash = Some(phash);

    let detections = match deps.detector.detect(&frame) {
        Ok(raw) => deps.filter.retain(raw),
        Err(err) => {
            log_warn!("detector failed, treating frame as empty: {err:?}");
            Vec::new()
        }
    };

    let observation = FrameObservation::new(frame.timestamp)
        .with_detections(detections)
        .with_quality(quality);

    let delta = state.inventory.observe(&observation);
    for label in &delta.added {
        log_info!("confirmed in fridge: {label}");
        record_inventory_event(db, session_id, &observation, InventoryChange::Added, label).await?;
    }
    for label in &delta.removed {
        log_info!("gone from fridge: {label}");
        record_inventory_event(db, session_id, &observation, InventoryChange::Removed, label)
            .await?;
    }

    let capture = state.capture.observe(&observation);
    if capture.fire {
        log_info!("capture gate fired (session {session_id})");
        run_recognition(session_id, db, deps, &frame).await?;
    }

    let door = state.door.observe(&observation);
    if door.capture {
        let mut present: Vec<&str> = state.inventory.active().iter().map(|s| s.as_str()).collect();
        present.sort_unstable();
        let outcome = if present.is_empty() {
            "In Fridge: nothing confirmed".to_string()
        } else {
            format!("In Fridge: {}", present.join(", "))
        };
        log_info!("door settled, {outcome}");
        db.insert_capture_event(&CaptureEvent {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            timestamp: observation.timestamp,
            kind: CaptureKind::DoorSettle,
            code: None,
            outcome,
        })
        .await?;
    }

    Ok(())
}

async fn run_recognition(
    session_id: &str,
    db: &Database,
    deps: &mut MonitorDeps,
    frame: &Frame,
) -> Result<()> {
    let code = match deps.recognizer.recognize(frame) {
        Ok(code) => code.map(|raw| normalize_code(&raw)),
        Err(err) => {
            log_warn!("recognizer failed: {err:?}");
            None
        }
    };

    let outcome = match &code {
        Some(code) => {
            let result = deps.lookup.lookup(code);
            if let Err(err) = &result {
                log_warn!("product lookup failed for {code}: {err:?}");
            }
            display_result(&result)
        }
        None => NO_CODE_OUTCOME.to_string(),
    };

    log_info!("capture outcome: {outcome}");
    db.insert_capture_event(&CaptureEvent {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        timestamp: frame.timestamp,
        kind: CaptureKind::Barcode,
        code,
        outcome,
    })
    .await?;

    Ok(())
}

async fn record_inventory_event(
    db: &Database,
    session_id: &str,
    observation: &FrameObservation,
    change: InventoryChange,
    label: &str,
) -> Result<()> {
    db.insert_inventory_event(&InventoryEvent {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        timestamp: observation.timestamp,
        change,
        label: label.to_string(),
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MonitorSession, SessionStatus};
    use crate::gate::{CaptureGateConfig, Detection};
    use crate::lookup::{LookupOutcome, Product};
    use anyhow::anyhow;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use image::{DynamicImage, GrayImage, Luma};
    use std::collections::VecDeque;

    fn checkerboard_frame(at: DateTime<Utc>) -> Frame {
        let img = GrayImage::from_fn(32, 32, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        Frame::new(at, DynamicImage::ImageLuma8(img))
    }

    struct ScriptedSource {
        frames: VecDeque<Frame>,
    }

    impl FrameSource for ScriptedSource {
        fn latest_frame(&mut self) -> Result<Option<Frame>> {
            Ok(self.frames.pop_front())
        }
    }

    struct ScriptedDetector {
        per_frame: VecDeque<Result<Vec<Detection>>>,
    }

    impl Detector for ScriptedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
            self.per_frame.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct FixedRecognizer(Option<String>);

    impl Recognizer for FixedRecognizer {
        fn recognize(&mut self, _frame: &Frame) -> Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    struct FixedLookup(Option<Product>);

    impl ProductLookup for FixedLookup {
        fn lookup(&self, _code: &str) -> Result<LookupOutcome> {
            match &self.0 {
                Some(product) => Ok(LookupOutcome::Found(product.clone())),
                None => Err(anyhow!("network down")),
            }
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 18, 4, 8, 0).unwrap()
    }

    async fn session_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.sqlite3")).unwrap();
        db.insert_session(&MonitorSession {
            id: "s1".into(),
            started_at: base_time(),
            stopped_at: None,
            status: SessionStatus::Running,
        })
        .await
        .unwrap();
        (dir, db)
    }

    fn deps(detections: Vec<Result<Vec<Detection>>>) -> MonitorDeps {
        let frames: VecDeque<Frame> = (0..detections.len() as i64)
            .map(|i| checkerboard_frame(base_time() + ChronoDuration::milliseconds(i * 400)))
            .collect();
        MonitorDeps {
            source: Box::new(ScriptedSource { frames }),
            detector: Box::new(ScriptedDetector {
                per_frame: detections.into_iter().collect(),
            }),
            recognizer: Box::new(FixedRecognizer(Some("060410020197".into()))),
            lookup: Box::new(FixedLookup(Some(Product {
                name: "Soo Jerky".into(),
                brand: "Soo".into(),
                quantity: None,
            }))),
            filter: LabelFilter::food(),
        }
    }

    fn test_settings() -> GateSettings {
        GateSettings {
            capture: CaptureGateConfig {
                // Identical checkerboard frames are sharp, busy, and still;
                // fire on the second qualifying frame.
                hold_secs: 0.4,
                cooldown_secs: 60.0,
                ..CaptureGateConfig::default()
            },
            ..GateSettings::default()
        }
    }

    #[tokio::test]
    async fn pipeline_confirms_items_and_logs_capture() {
        let (_dir, db) = session_db().await;

        let apple = || Ok(vec![Detection::new("apple", 0.6)]);
        let mut deps = deps(vec![apple(), apple(), apple(), apple(), apple()]);
        let mut state = LoopState::new(&test_settings());

        for _ in 0..5 {
            process_tick("s1", &db, &mut deps, &mut state).await.unwrap();
        }

        // Three sightings promote the apple.
        let events = db.get_inventory_events_for_session("s1").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label, "apple");
        assert_eq!(events[0].change, InventoryChange::Added);

        // The capture gate fired once (cooldown covers the rest) and the
        // lookup outcome was recorded.
        let captures = db.get_capture_events_for_session("s1").await.unwrap();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].kind, CaptureKind::Barcode);
        assert_eq!(captures[0].outcome, "Found it! Soo Jerky by Soo");
    }

    #[tokio::test]
    async fn detector_failure_does_not_stop_the_loop() {
        let (_dir, db) = session_db().await;

        let mut deps = deps(vec![
            Err(anyhow!("model not loaded")),
            Ok(vec![Detection::new("banana", 0.9)]),
        ]);
        let mut state = LoopState::new(&test_settings());

        process_tick("s1", &db, &mut deps, &mut state).await.unwrap();
        process_tick("s1", &db, &mut deps, &mut state).await.unwrap();

        // The failed frame counted as empty; the banana has one sighting and
        // is not yet confirmed.
        let events = db.get_inventory_events_for_session("s1").await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_maps_to_sentinel_outcome() {
        let (_dir, db) = session_db().await;

        let mut deps = deps(vec![Ok(Vec::new()), Ok(Vec::new()), Ok(Vec::new())]);
        deps.lookup = Box::new(FixedLookup(None));
        let mut state = LoopState::new(&test_settings());

        for _ in 0..3 {
            process_tick("s1", &db, &mut deps, &mut state).await.unwrap();
        }

        let captures = db.get_capture_events_for_session("s1").await.unwrap();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].outcome, "Connection error to the product database.");
    }

    #[tokio::test]
    async fn empty_source_skips_ticks() {
        let (_dir, db) = session_db().await;

        let mut deps = deps(Vec::new());
        let mut state = LoopState::new(&test_settings());
        process_tick("s1", &db, &mut deps, &mut state).await.unwrap();

        assert!(db.get_inventory_events_for_session("s1").await.unwrap().is_empty());
        assert!(db.get_capture_events_for_session("s1").await.unwrap().is_empty());
    }
}
