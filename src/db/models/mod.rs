//! Persistence models for the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Running,
    Completed,
    /// The process died while the session was still running; marked on the
    /// next startup.
    Interrupted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "Running",
            SessionStatus::Completed => "Completed",
            SessionStatus::Interrupted => "Interrupted",
        }
    }
}

/// One run of the monitor loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryChange {
    Added,
    Removed,
}

impl InventoryChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryChange::Added => "Added",
            InventoryChange::Removed => "Removed",
        }
    }
}

/// A confirmed inventory transition; only the gates write these, so the table
/// records stable changes, not per-frame detector chatter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEvent {
    pub id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub change: InventoryChange,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    /// Capture gate fired and the recognizer ran
    Barcode,
    /// Door gate fired after the scene settled
    DoorSettle,
}

impl CaptureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureKind::Barcode => "Barcode",
            CaptureKind::DoorSettle => "DoorSettle",
        }
    }
}

/// One fired capture with whatever the recognizer and lookup produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: CaptureKind,
    pub code: Option<String>,
    /// Human-readable result line, including the sentinel strings for
    /// lookup misses and failures.
    pub outcome: String,
}
