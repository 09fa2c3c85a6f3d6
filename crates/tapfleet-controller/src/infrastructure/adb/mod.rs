//! adb subprocess plumbing.
//!
//! Everything the controller does to a phone goes through the `adb`
//! binary: still-image capture (`exec-out screencap -p`), tap injection
//! (`shell input tap ...`), and discovery (`adb devices`).  [`AdbShell`]
//! is the one place that spawns those processes, so timeouts and
//! exit-status checking are handled uniformly.
//!
//! # Why shell out instead of speaking the adb wire protocol?
//!
//! The adb server multiplexes device access for every tool on the host
//! (scrcpy included).  Going through the CLI keeps tapfleet a well-behaved
//! peer of those tools and avoids reimplementing the transport handshake.

pub mod frame_source;
pub mod tap_methods;

use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

pub use frame_source::AdbFrameSource;
pub use tap_methods::{InputTapMethod, SendEventMethod, TouchscreenTapMethod};

/// Error type for adb subprocess invocations.
#[derive(Debug, Error)]
pub enum AdbError {
    /// The adb binary could not be spawned.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The command ran but exited non-zero.
    #[error("adb exited with {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },
    /// The command did not finish within the allotted time.
    #[error("adb command timed out after {0:?}")]
    Timeout(Duration),
}

/// Spawns adb commands against a specific device.
#[derive(Debug, Clone)]
pub struct AdbShell {
    adb_path: String,
}

impl AdbShell {
    pub fn new(adb_path: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }

    /// Runs `adb -s <serial> exec-out <args...>` and returns raw stdout
    /// bytes.  `exec-out` skips the pty layer, so binary payloads (PNG
    /// screencaps) arrive unmangled.
    pub async fn exec_out(
        &self,
        serial: &str,
        args: &[&str],
        deadline: Duration,
    ) -> Result<Vec<u8>, AdbError> {
        let mut cmd = Command::new(&self.adb_path);
        cmd.arg("-s").arg(serial).arg("exec-out").args(args);
        self.run(cmd, deadline).await
    }

    /// Runs `adb -s <serial> shell <command>` and discards stdout.
    pub async fn shell(
        &self,
        serial: &str,
        command: &str,
        deadline: Duration,
    ) -> Result<(), AdbError> {
        let mut cmd = Command::new(&self.adb_path);
        cmd.arg("-s").arg(serial).arg("shell").arg(command);
        self.run(cmd, deadline).await.map(|_| ())
    }

    /// Runs `adb <args...>` without a device selector (e.g. `devices`).
    pub async fn host_command(
        &self,
        args: &[&str],
        deadline: Duration,
    ) -> Result<Vec<u8>, AdbError> {
        let mut cmd = Command::new(&self.adb_path);
        cmd.args(args);
        self.run(cmd, deadline).await
    }

    async fn run(&self, mut cmd: Command, deadline: Duration) -> Result<Vec<u8>, AdbError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(deadline, async {
            cmd.output().await.map_err(|source| AdbError::Spawn {
                program: self.adb_path.clone(),
                source,
            })
        })
        .await
        .map_err(|_| AdbError::Timeout(deadline))??;

        if !output.status.success() {
            return Err(AdbError::NonZeroExit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}
