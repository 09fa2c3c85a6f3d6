//! Frame acquisition over adb.
//!
//! Primary strategy: `adb exec-out screencap -p` returns the current
//! display as a PNG, which is decoded in-memory with the `image` crate
//! and repacked into an RGB [`Frame`].  Any failure — timeout, non-zero
//! exit, empty payload, decode error — is logged here with the device
//! serial and folded to `None`; the monitor's fallback path takes over.
//!
//! Secondary strategy: a short scrcpy `--record` run under a 1-second
//! hard timeout.  On devices where screencap yields an empty payload
//! (FLAG_SECURE surfaces), the recording pipeline is the only capture
//! path scrcpy itself can drive.  The recorded clip is not decoded, so
//! the probe currently always yields `None`; screencap remains the only
//! decode path.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use tapfleet_core::vision::frame::Frame;

use crate::application::monitor_device::FrameSource;

use super::AdbShell;

/// Hard cap on the best-effort recording probe.
const RECORD_PROBE_DEADLINE: Duration = Duration::from_secs(1);

/// Captures still frames from a device via adb screencap.
pub struct AdbFrameSource {
    shell: AdbShell,
    scrcpy_path: String,
    capture_deadline: Duration,
}

impl AdbFrameSource {
    pub fn new(shell: AdbShell, scrcpy_path: impl Into<String>, capture_deadline: Duration) -> Self {
        Self {
            shell,
            scrcpy_path: scrcpy_path.into(),
            capture_deadline,
        }
    }

    /// Primary capture path: screencap PNG → RGB frame.
    async fn screencap(&self, serial: &str) -> Option<Frame> {
        let png = match self
            .shell
            .exec_out(serial, &["screencap", "-p"], self.capture_deadline)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(serial, error = %e, "screencap failed");
                return None;
            }
        };

        if png.is_empty() {
            debug!(serial, "screencap returned empty payload");
            return None;
        }

        let decoded = match image::load_from_memory(&png) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                debug!(serial, error = %e, "screencap PNG decode failed");
                return None;
            }
        };

        let (width, height) = decoded.dimensions();
        match Frame::from_rgb8(width, height, decoded.into_raw()) {
            Ok(frame) => Some(frame),
            Err(e) => {
                debug!(serial, error = %e, "decoded image rejected");
                None
            }
        }
    }

    /// Secondary best-effort probe: drive scrcpy's recording pipeline for
    /// up to one second.  The clip lands in the temp directory and is not
    /// decoded.
    async fn record_probe(&self, serial: &str) -> Option<Frame> {
        let record_target = std::env::temp_dir().join(format!("tapfleet-probe-{serial}.mp4"));
        let mut cmd = Command::new(&self.scrcpy_path);
        cmd.arg("-s")
            .arg(serial)
            .arg("--no-playback")
            .arg(format!("--record={}", record_target.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match cmd.spawn() {
            Ok(mut child) => {
                // The probe is expected to hit the deadline; a kill here
                // is the normal outcome, not an error.
                if timeout(RECORD_PROBE_DEADLINE, child.wait()).await.is_err() {
                    let _ = child.kill().await;
                }
            }
            Err(e) => {
                debug!(serial, error = %e, "record probe spawn failed");
            }
        }
        let _ = std::fs::remove_file(&record_target);
        None
    }
}

#[async_trait]
impl FrameSource for AdbFrameSource {
    async fn capture(&self, serial: &str) -> Option<Frame> {
        if let Some(frame) = self.screencap(serial).await {
            return Some(frame);
        }
        self.record_probe(serial).await
    }
}
