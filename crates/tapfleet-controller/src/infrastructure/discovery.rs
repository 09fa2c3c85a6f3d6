//! Device discovery: enumerate attached phones and build their records.
//!
//! Runs exactly once at startup.  `adb devices` lists every attached
//! device; each one in `device` state (authorized, online) gets a
//! sequential index, a derived label, and deterministic port assignments
//! in the two port spaces (mirroring window, control channel).  The
//! registry is never mutated again after this pass — there is no
//! hot-unplug handling.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use tapfleet_core::domain::device::{Device, PortPlan};

use super::adb::{AdbError, AdbShell};

/// Deadline for the one-shot `adb devices` enumeration.
const SCAN_DEADLINE: Duration = Duration::from_secs(10);

/// Error type for the discovery pass.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The adb invocation itself failed.
    #[error("device enumeration failed: {0}")]
    Adb(#[from] AdbError),
    /// adb produced bytes that are not UTF-8.
    #[error("device list was not valid UTF-8")]
    BadEncoding,
}

/// Enumerates attached devices and assigns their records.
///
/// # Errors
///
/// Returns [`DiscoveryError`] only if `adb devices` itself cannot run;
/// an empty device list is a valid (if useless) result and is left to
/// the caller to complain about.
pub async fn scan_devices(shell: &AdbShell, ports: &PortPlan) -> Result<Vec<Device>, DiscoveryError> {
    let raw = shell.host_command(&["devices"], SCAN_DEADLINE).await?;
    let text = std::str::from_utf8(&raw).map_err(|_| DiscoveryError::BadEncoding)?;

    let devices = parse_device_list(text, ports);
    info!(count = devices.len(), "device discovery complete");
    Ok(devices)
}

/// Parses `adb devices` output into device records.
///
/// The output looks like:
///
/// ```text
/// List of devices attached
/// R3CN30XXXX	device
/// emulator-5554	offline
/// 192.168.0.7:5555	unauthorized
/// ```
///
/// Only lines in `device` state count; offline and unauthorized entries
/// are logged and skipped, and do not consume an index.
fn parse_device_list(text: &str, ports: &PortPlan) -> Vec<Device> {
    let mut devices = Vec::new();
    for line in text.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(serial), Some(state)) = (fields.next(), fields.next()) else {
            continue;
        };
        if state != "device" {
            warn!(serial, state, "skipping device not in usable state");
            continue;
        }
        devices.push(Device::assign(serial, devices.len(), ports));
    }
    devices
}

// ── Tests ─────────────────────────────────────────────────────────────────────
