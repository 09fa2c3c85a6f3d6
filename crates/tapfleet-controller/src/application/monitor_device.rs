//! DeviceMonitor: the per-device capture → detect → tap loop.
//!
//! One monitor runs per registered device, forever.  Each iteration:
//!
//! 1. Ask the [`FrameSource`] for a still frame.
//! 2. If a frame arrived, run the detector.  On a hit, dispatch one tap
//!    and sleep the cooldown interval — a UI transition is usually in
//!    flight after a tap, and re-tapping the same element across
//!    consecutive frames only causes mis-clicks.
//! 3. If no frame arrived *or* nothing was detected, switch the device's
//!    phase to `blind_clicking` and tap every entry of the fallback
//!    coordinate list in order, pausing briefly between entries.  The
//!    two causes are deliberately not distinguished: both mean "vision
//!    is not telling us where the button is right now".
//! 4. Sleep the base poll interval before the next iteration.
//!
//! Nothing in an iteration can take the loop down.  Capture failures are
//! folded to `None` by the frame source (and logged there), dispatch
//! exhaustion is a `false` return, and the loop simply continues at its
//! polling cadence.  The only exit is the shared shutdown flag, checked
//! at every iteration boundary and between fallback taps.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use tapfleet_core::domain::device::Phase;
use tapfleet_core::vision::frame::Frame;
use tapfleet_core::{ButtonDetector, DeviceRegistry};

use super::dispatch_tap::TapDispatcher;

/// Acquires a single still image from a named device.
///
/// Every call performs a fresh acquisition — no caching, no internal
/// retries; retry policy is the monitor's polling cadence.  Failures are
/// logged by the implementation and folded to `None`.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self, serial: &str) -> Option<Frame>;
}

/// Timing knobs for one monitor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorTiming {
    /// Sleep at the end of every iteration, bounding the polling rate.
    pub poll_interval: Duration,
    /// Extra sleep after a detected-and-dispatched tap.
    pub tap_cooldown: Duration,
    /// Pause between consecutive blind-clicking taps.
    pub blind_click_pause: Duration,
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            tap_cooldown: Duration::from_millis(2000),
            blind_click_pause: Duration::from_millis(300),
        }
    }
}

/// What one iteration did — returned by [`DeviceMonitor::run_once`] so
/// the loop (and the tests) can pick the right sleep afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// The element was detected and a tap dispatched.
    Tapped,
    /// Vision was unavailable or inconclusive; the fallback list was walked.
    BlindClicked,
}

/// Orchestrates one device: the capture → detect → dispatch loop.
pub struct DeviceMonitor {
    serial: String,
    source: Arc<dyn FrameSource>,
    detector: ButtonDetector,
    dispatcher: Arc<TapDispatcher>,
    registry: Arc<Mutex<DeviceRegistry>>,
    /// Pre-known button positions tapped when detection is unavailable.
    blind_positions: Vec<(i32, i32)>,
    timing: MonitorTiming,
    running: Arc<AtomicBool>,
}

impl DeviceMonitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        serial: impl Into<String>,
        source: Arc<dyn FrameSource>,
        detector: ButtonDetector,
        dispatcher: Arc<TapDispatcher>,
        registry: Arc<Mutex<DeviceRegistry>>,
        blind_positions: Vec<(i32, i32)>,
        timing: MonitorTiming,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            serial: serial.into(),
            source,
            detector,
            dispatcher,
            registry,
            blind_positions,
            timing,
            running,
        }
    }

    /// Runs the monitor until the shutdown flag clears.
    pub async fn run(&self) {
        info!(serial = %self.serial, "monitor started");
        while self.running.load(Ordering::Relaxed) {
            let outcome = self.run_once().await;
            if outcome == IterationOutcome::Tapped {
                tokio::time::sleep(self.timing.tap_cooldown).await;
            }
            tokio::time::sleep(self.timing.poll_interval).await;
        }
        info!(serial = %self.serial, "monitor stopped");
    }

    /// Executes exactly one iteration of the loop (without the trailing
    /// poll-interval sleep).  Public so tests can step the monitor.
    pub async fn run_once(&self) -> IterationOutcome {
        if let Some(frame) = self.source.capture(&self.serial).await {
            if let Some((x, y)) = self.detector.detect(&frame) {
                self.dispatcher.tap(&self.serial, x, y).await;
                return IterationOutcome::Tapped;
            }
            debug!(serial = %self.serial, "frame captured but no element found");
        }

        // Capture failed outright, or a valid frame held no qualifying
        // region — either way, vision cannot place the button.
        self.blind_click_pass().await;
        IterationOutcome::BlindClicked
    }

    /// Taps every pre-known position once, in list order.
    async fn blind_click_pass(&self) {
        self.registry
            .lock()
            .await
            .set_phase(&self.serial, Phase::BlindClicking);
        debug!(serial = %self.serial, "blind-clicking fallback engaged");

        for &(x, y) in &self.blind_positions {
            if !self.running.load(Ordering::Relaxed) {
                return;
            }
            self.dispatcher.tap(&self.serial, x, y).await;
            tokio::time::sleep(self.timing.blind_click_pause).await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
