pub mod capture_gate;
pub mod config;
pub mod door_gate;
pub mod inventory_gate;
pub mod observation;

pub use capture_gate::{CaptureDecision, CaptureGate, CapturePhase};
pub use config::{CaptureGateConfig, DoorGateConfig, InventoryGateConfig};
pub use door_gate::{DoorDecision, DoorGate, DoorPhase};
pub use inventory_gate::{InventoryDelta, InventoryGate};
pub use observation::{Detection, FrameObservation, FrameQuality};
