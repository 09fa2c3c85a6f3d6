//! scrcpy mirroring launcher.
//!
//! One scrcpy process per device gives the operator a live view of every
//! phone next to the dashboard.  This is a thin process wrapper: tapfleet
//! never reads frames from these windows (capture goes through adb
//! screencap), so a dead mirror degrades the operator view and nothing
//! else.
//!
//! `--render-driver software` is load-bearing: the software-rendered
//! display path is what gets FLAG_SECURE app surfaces onto the mirror at
//! all.  The resolution/bitrate/fps caps keep N simultaneous mirrors
//! within USB and GPU budget.

use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::info;

use tapfleet_core::domain::device::Device;

use super::storage::config::MirrorConfig;

/// Error type for mirror process launches.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("failed to spawn {program} for {serial}: {source}")]
    Spawn {
        program: String,
        serial: String,
        #[source]
        source: std::io::Error,
    },
}

/// Launches one mirroring window for a device.
///
/// The returned [`Child`] must be kept alive for the lifetime of the run;
/// dropping it kills the window (`kill_on_drop`).
pub fn start_mirror(device: &Device, cfg: &MirrorConfig) -> Result<Child, MirrorError> {
    // Three windows per screen row, tiled left to right.
    let window_x = (device.index % 3) as u32 * cfg.window_width;

    let child = Command::new(&cfg.scrcpy_path)
        .arg("-s")
        .arg(&device.serial)
        .arg("--window-title")
        .arg(&device.label)
        .arg("--window-x")
        .arg(window_x.to_string())
        .arg("--window-y")
        .arg("0")
        .arg("--window-width")
        .arg(cfg.window_width.to_string())
        .arg("--window-height")
        .arg(cfg.window_height.to_string())
        .arg("--max-size")
        .arg(cfg.max_size.to_string())
        .arg("--bit-rate")
        .arg(&cfg.bit_rate)
        .arg("--max-fps")
        .arg(cfg.max_fps.to_string())
        .arg("--no-audio")
        .arg("--stay-awake")
        .arg("--turn-screen-off")
        .arg("--render-driver")
        .arg("software")
        .arg("--port")
        .arg(device.window_port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| MirrorError::Spawn {
            program: cfg.scrcpy_path.clone(),
            serial: device.serial.clone(),
            source,
        })?;

    info!(
        serial = %device.serial,
        label = %device.label,
        port = device.window_port,
        "mirror window started"
    );
    Ok(child)
}
