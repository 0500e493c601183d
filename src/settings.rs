use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::gate::{CaptureGateConfig, DoorGateConfig, InventoryGateConfig};

/// Tunable gate thresholds, persisted as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    pub capture: CaptureGateConfig,
    pub inventory: InventoryGateConfig,
    pub door: DoorGateConfig,
}

/// JSON-file-backed settings with an in-memory cache.
///
/// A missing or unreadable file silently falls back to defaults; tuning the
/// rig must never brick it.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<GateSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            GateSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn gates(&self) -> GateSettings {
        self.data.read().unwrap().clone()
    }

    pub fn update_gates(&self, settings: GateSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            *guard = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &GateSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: GateSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let gates = store.gates();
        assert_eq!(gates.inventory.window, 8);
        assert_eq!(gates.inventory.min_repeats, 3);
    }

    #[test]
    fn updates_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        let mut gates = store.gates();
        gates.capture.cooldown_secs = 42.0;
        store.update_gates(gates).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.gates().capture.cooldown_secs, 42.0);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.gates().door.settle_secs, 3.0);
    }
}
