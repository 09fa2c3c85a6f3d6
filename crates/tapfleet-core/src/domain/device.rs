//! Device records and per-device status.
//!
//! A [`Device`] describes one managed phone.  It is built exactly once by
//! discovery at startup and never changes afterwards — there is no
//! hot-unplug handling, so a device that disappears mid-run simply keeps
//! failing its captures.
//!
//! [`DeviceStatus`] is the mutable state attached to a device.  Every
//! update replaces the whole record, so readers may observe any complete
//! intermediate value but never a half-written one.

use serde::{Deserialize, Serialize};

/// Default base port for the scrcpy mirroring windows.
pub const DEFAULT_WINDOW_PORT_BASE: u16 = 5555;

/// Default base port for the per-device control channel.
pub const DEFAULT_CONTROL_PORT_BASE: u16 = 27183;

/// Coarse per-device status label shown on the dashboard.
///
/// This enum drives the colour coding in the dashboard UI:
/// - Green  = `Clicked` (a tap was delivered)
/// - Orange = `BlindClicking` (visual detection unavailable; tapping known spots)
/// - Grey   = `Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Monitoring is running but nothing has been tapped yet.
    Idle,
    /// The last tap command was accepted by the device.
    Clicked,
    /// Capture or detection failed; the fallback coordinate list is being tapped.
    BlindClicking,
}

/// Identity of one managed phone.
///
/// Created by discovery; immutable for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Stable adb serial string — the registry key.
    pub serial: String,
    /// Sequential index assigned in discovery enumeration order.
    pub index: usize,
    /// Human-readable label derived from the index (`driver-1`, `driver-2`, ...).
    pub label: String,
    /// Port assigned to this device's scrcpy mirroring window.
    pub window_port: u16,
    /// Port assigned to this device's control channel.
    pub control_port: u16,
}

impl Device {
    /// Builds a device record with deterministic port assignments.
    ///
    /// Ports are `base + index` in two distinct port spaces, so any two
    /// devices with different indices get non-overlapping assignments in
    /// both spaces, and re-running discovery over the same device list
    /// reproduces the same ports.
    pub fn assign(serial: impl Into<String>, index: usize, ports: &PortPlan) -> Self {
        Self {
            serial: serial.into(),
            index,
            label: format!("driver-{}", index + 1),
            window_port: ports.window_base + index as u16,
            control_port: ports.control_base + index as u16,
        }
    }
}

/// The two base ports that discovery derives per-device ports from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPlan {
    pub window_base: u16,
    pub control_base: u16,
}

impl Default for PortPlan {
    fn default() -> Self {
        Self {
            window_base: DEFAULT_WINDOW_PORT_BASE,
            control_base: DEFAULT_CONTROL_PORT_BASE,
        }
    }
}

/// Mutable runtime state attached to a [`Device`].
///
/// Owned by the device's monitor loop for writes; the manual-tap path may
/// also write to it.  That overlap is a benign last-writer-wins race:
/// each update replaces the record wholesale and a stale value is
/// acceptable to lose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Current phase label.
    pub phase: Phase,
    /// Screen coordinate of the most recent accepted tap, if any.
    pub last_tap: Option<(i32, i32)>,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            last_tap: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_derives_ports_from_base_plus_index() {
        let ports = PortPlan::default();
        let device = Device::assign("R3CN30XXXX", 2, &ports);
        assert_eq!(device.window_port, DEFAULT_WINDOW_PORT_BASE + 2);
        assert_eq!(device.control_port, DEFAULT_CONTROL_PORT_BASE + 2);
    }

    #[test]
    fn test_assign_is_deterministic_and_non_overlapping() {
        let ports = PortPlan::default();
        let devices: Vec<Device> = (0..3)
            .map(|i| Device::assign(format!("serial-{i}"), i, &ports))
            .collect();

        // Deterministic: same inputs reproduce the same assignment.
        let again = Device::assign("serial-1", 1, &ports);
        assert_eq!(devices[1], again);

        // Non-overlapping within each port space.
        for a in 0..3 {
            for b in (a + 1)..3 {
                assert_ne!(devices[a].window_port, devices[b].window_port);
                assert_ne!(devices[a].control_port, devices[b].control_port);
            }
        }
    }

    #[test]
    fn test_label_is_one_based() {
        let device = Device::assign("abc", 0, &PortPlan::default());
        assert_eq!(device.label, "driver-1");
    }

    #[test]
    fn test_status_defaults_to_idle_with_no_tap() {
        let status = DeviceStatus::default();
        assert_eq!(status.phase, Phase::Idle);
        assert!(status.last_tap.is_none());
    }
}
