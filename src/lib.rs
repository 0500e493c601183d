//! Fridge camera monitor with detection stability gating.
//!
//! A relay drops frames from the fridge cam; this crate decides which of the
//! resulting detections to believe. The gates in [`gate`] do the actual
//! debouncing (hold/cooldown capture gating, windowed label hysteresis, a
//! door-open motion machine); [`monitor`] runs the per-tick pipeline that
//! feeds them and writes confirmed events to the SQLite log in [`db`].
//! Cameras, detection models, and the grocery catalog stay outside the crate
//! behind the traits in [`frame`], [`detect`], and [`lookup`].

pub mod db;
pub mod detect;
pub mod frame;
pub mod gate;
pub mod lookup;
pub mod monitor;
pub mod settings;
pub mod utils;

pub use db::Database;
pub use gate::{
    CaptureDecision, CaptureGate, CapturePhase, DoorDecision, DoorGate, DoorPhase, Detection,
    FrameObservation, FrameQuality, InventoryDelta, InventoryGate,
};
pub use monitor::{MonitorController, MonitorDeps};
pub use settings::{GateSettings, SettingsStore};
