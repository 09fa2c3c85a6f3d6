//! The ordered tap-delivery methods.
//!
//! Three [`TapMethod`] implementations, tried by the dispatcher in this
//! order:
//!
//! 1. [`InputTapMethod`] — `input tap x y`, the standard path.
//! 2. [`TouchscreenTapMethod`] — `input touchscreen tap x y`, for vendor
//!    builds that only honour an explicit input source.
//! 3. [`SendEventMethod`] — raw kernel event injection via `sendevent`,
//!    the last resort on devices whose `input` tool is restricted.
//!
//! Each method is one adb shell round-trip.  None of them verifies that
//! the tap registered in the target UI.

use std::time::Duration;

use async_trait::async_trait;

use crate::application::dispatch_tap::{DispatchError, TapMethod};

use super::{AdbError, AdbShell};

/// Deadline for a single tap round-trip.
const TAP_DEADLINE: Duration = Duration::from_secs(3);

fn to_dispatch_error(e: AdbError) -> DispatchError {
    match e {
        AdbError::Spawn { .. } | AdbError::Timeout(_) => DispatchError::Transport(e.to_string()),
        AdbError::NonZeroExit { .. } => DispatchError::Rejected(e.to_string()),
    }
}

/// `input tap x y` — the standard tap command.
pub struct InputTapMethod {
    shell: AdbShell,
}

impl InputTapMethod {
    pub fn new(shell: AdbShell) -> Self {
        Self { shell }
    }
}

#[async_trait]
impl TapMethod for InputTapMethod {
    fn name(&self) -> &str {
        "input-tap"
    }

    async fn deliver(&self, serial: &str, x: i32, y: i32) -> Result<(), DispatchError> {
        self.shell
            .shell(serial, &format!("input tap {x} {y}"), TAP_DEADLINE)
            .await
            .map_err(to_dispatch_error)
    }
}

/// `input touchscreen tap x y` — tap with an explicit input source.
pub struct TouchscreenTapMethod {
    shell: AdbShell,
}

impl TouchscreenTapMethod {
    pub fn new(shell: AdbShell) -> Self {
        Self { shell }
    }
}

#[async_trait]
impl TapMethod for TouchscreenTapMethod {
    fn name(&self) -> &str {
        "touchscreen-tap"
    }

    async fn deliver(&self, serial: &str, x: i32, y: i32) -> Result<(), DispatchError> {
        self.shell
            .shell(serial, &format!("input touchscreen tap {x} {y}"), TAP_DEADLINE)
            .await
            .map_err(to_dispatch_error)
    }
}

/// Raw low-level event injection: absolute X, absolute Y, then a sync
/// report, written straight to the touch event device.
pub struct SendEventMethod {
    shell: AdbShell,
    /// Kernel input device node, e.g. `/dev/input/event2`.  Which node is
    /// the touchscreen varies per device model.
    event_device: String,
}

impl SendEventMethod {
    pub fn new(shell: AdbShell, event_device: impl Into<String>) -> Self {
        Self {
            shell,
            event_device: event_device.into(),
        }
    }

    fn command(&self, x: i32, y: i32) -> String {
        // EV_ABS(3)/ABS_MT_POSITION_X(53), ABS_MT_POSITION_Y(54), then
        // EV_SYN(0)/SYN_REPORT(0).
        format!(
            "sendevent {dev} 3 53 {x} && sendevent {dev} 3 54 {y} && sendevent {dev} 0 0 0",
            dev = self.event_device
        )
    }
}

#[async_trait]
impl TapMethod for SendEventMethod {
    fn name(&self) -> &str {
        "sendevent"
    }

    async fn deliver(&self, serial: &str, x: i32, y: i32) -> Result<(), DispatchError> {
        self.shell
            .shell(serial, &self.command(x, y), TAP_DEADLINE)
            .await
            .map_err(to_dispatch_error)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
