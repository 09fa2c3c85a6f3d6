//! The shared device registry.
//!
//! The [`DeviceRegistry`] is the controller's in-memory database of every
//! phone discovered at startup.  Each entry pairs the immutable
//! [`Device`] record with its mutable [`DeviceStatus`].
//!
//! # Sharing model
//!
//! The registry is stored behind a `tokio::sync::Mutex` in the controller
//! so it can be shared between the per-device monitor tasks (writers),
//! the dashboard status query (reader), and the manual-tap path (writer
//! to any entry).  Keys are fixed after discovery: no entries are added
//! or removed while the monitors run.
//!
//! # HashMap choice
//!
//! A `HashMap<String, DeviceEntry>` keyed by adb serial gives O(1) lookup
//! per tap.  Iteration order is not guaranteed, which is fine — the
//! dashboard sorts the snapshot by device index before displaying it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::device::{Device, DeviceStatus, Phase};

/// One registry entry: the fixed device record plus its live status.
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub device: Device,
    pub status: DeviceStatus,
}

/// Read-only snapshot of one device for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceReport {
    pub serial: String,
    pub label: String,
    pub index: usize,
    pub window_port: u16,
    pub control_port: u16,
    pub phase: Phase,
    pub last_tap: Option<(i32, i32)>,
}

/// In-memory registry of all managed devices.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    entries: HashMap<String, DeviceEntry>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device with a fresh `Idle` status.
    ///
    /// Called only during discovery, before any monitor starts.
    pub fn insert(&mut self, device: Device) {
        self.entries.insert(
            device.serial.clone(),
            DeviceEntry {
                device,
                status: DeviceStatus::default(),
            },
        );
    }

    /// Returns whether a device with this serial is registered.
    pub fn contains(&self, serial: &str) -> bool {
        self.entries.contains_key(serial)
    }

    /// Returns the entry for a specific device.
    pub fn get(&self, serial: &str) -> Option<&DeviceEntry> {
        self.entries.get(serial)
    }

    /// Replaces the phase for a device.  Unknown serials are a no-op.
    pub fn set_phase(&mut self, serial: &str, phase: Phase) {
        if let Some(entry) = self.entries.get_mut(serial) {
            entry.status = DeviceStatus {
                phase,
                last_tap: entry.status.last_tap,
            };
        }
    }

    /// Records an accepted tap: phase becomes `Clicked` and the tap
    /// coordinate is remembered.  Unknown serials are a no-op.
    pub fn record_tap(&mut self, serial: &str, x: i32, y: i32) {
        if let Some(entry) = self.entries.get_mut(serial) {
            entry.status = DeviceStatus {
                phase: Phase::Clicked,
                last_tap: Some((x, y)),
            };
        }
    }

    /// Returns a snapshot of every device, sorted by discovery index.
    pub fn snapshot(&self) -> Vec<DeviceReport> {
        let mut reports: Vec<DeviceReport> = self
            .entries
            .values()
            .map(|entry| DeviceReport {
                serial: entry.device.serial.clone(),
                label: entry.device.label.clone(),
                index: entry.device.index,
                window_port: entry.device.window_port,
                control_port: entry.device.control_port,
                phase: entry.status.phase,
                last_tap: entry.status.last_tap,
            })
            .collect();
        reports.sort_by_key(|r| r.index);
        reports
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
