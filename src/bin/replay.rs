//! Replay a recorded observation stream through the stability gates.
//!
//! Usage: `replay <observations.jsonl> [settings.json]`
//!
//! Each input line is one JSON `FrameObservation`. Prints every gate
//! transition so threshold tuning can be done against recorded footage
//! instead of standing in front of the fridge.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::warn;

use fridgewatch::gate::{CaptureGate, DoorGate, FrameObservation, InventoryGate};
use fridgewatch::settings::SettingsStore;
use fridgewatch::GateSettings;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        bail!("usage: replay <observations.jsonl> [settings.json]");
    };
    let settings = match args.next() {
        Some(path) => SettingsStore::new(PathBuf::from(path))?.gates(),
        None => GateSettings::default(),
    };

    let file = File::open(&input).with_context(|| format!("failed to open {input}"))?;
    let reader = BufReader::new(file);

    let mut capture = CaptureGate::new(settings.capture);
    let mut inventory = InventoryGate::new(settings.inventory);
    let mut door = DoorGate::new(settings.door);

    let mut frames = 0usize;
    let mut fires = 0usize;
    let mut last_phase = None;
    let mut last_door_phase = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let observation: FrameObservation = match serde_json::from_str(&line) {
            Ok(observation) => observation,
            Err(err) => {
                warn!("skipping line {}: {err}", line_no + 1);
                continue;
            }
        };
        frames += 1;

        let decision = capture.observe(&observation);
        if last_phase != Some(decision.phase) {
            println!("{}  capture gate -> {}", observation.timestamp, decision.phase.as_str());
            last_phase = Some(decision.phase);
        }
        if decision.fire {
            fires += 1;
            println!("{}  CAPTURE fired", observation.timestamp);
        }

        let delta = inventory.observe(&observation);
        for label in &delta.added {
            println!("{}  + {label}", observation.timestamp);
        }
        for label in &delta.removed {
            println!("{}  - {label}", observation.timestamp);
        }

        let door_decision = door.observe(&observation);
        if last_door_phase != Some(door_decision.phase) {
            println!("{}  door gate -> {}", observation.timestamp, door_decision.phase.as_str());
            last_door_phase = Some(door_decision.phase);
        }
        if door_decision.capture {
            println!("{}  DOOR settled", observation.timestamp);
        }
    }

    let mut present: Vec<&str> = inventory.active().iter().map(|s| s.as_str()).collect();
    present.sort_unstable();

    println!();
    println!("{frames} frames, {fires} capture fires");
    if present.is_empty() {
        println!("final inventory: empty");
    } else {
        println!("final inventory: {}", present.join(", "));
    }

    Ok(())
}
