//! Integration tests for the monitoring pipeline.
//!
//! These tests exercise the application layer of tapfleet-controller
//! end-to-end: `DeviceMonitor` + `ButtonDetector` + `TapDispatcher` over
//! mock infrastructure, including the ordered-fallback interplay between
//! a flaky tap method and the blind-clicking pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tapfleet_core::domain::device::{Device, Phase, PortPlan};
use tapfleet_core::vision::frame::Frame;
use tapfleet_core::{ButtonDetector, DeviceRegistry, HsvBand};

use tapfleet_controller::application::dispatch_tap::{DispatchError, TapDispatcher, TapMethod};
use tapfleet_controller::application::monitor_device::{
    DeviceMonitor, FrameSource, IterationOutcome, MonitorTiming,
};

const TARGET: [u8; 3] = [0xFE, 0xE5, 0x00];

// ── Mock infrastructure ───────────────────────────────────────────────────────

/// Frame source that pops frames off a script, then keeps failing.
struct ScriptedSource {
    frames: StdMutex<Vec<Option<Frame>>>,
}

#[async_trait]
impl FrameSource for ScriptedSource {
    async fn capture(&self, _serial: &str) -> Option<Frame> {
        let mut frames = self.frames.lock().unwrap();
        if frames.is_empty() {
            None
        } else {
            frames.remove(0)
        }
    }
}

/// Tap method that can be scripted to fail and records every attempt.
struct FlakyMethod {
    name: &'static str,
    succeed: bool,
    attempts: StdMutex<Vec<(i32, i32)>>,
}

impl FlakyMethod {
    fn new(name: &'static str, succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            succeed,
            attempts: StdMutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TapMethod for FlakyMethod {
    fn name(&self) -> &str {
        self.name
    }

    async fn deliver(&self, _serial: &str, x: i32, y: i32) -> Result<(), DispatchError> {
        self.attempts.lock().unwrap().push((x, y));
        if self.succeed {
            Ok(())
        } else {
            Err(DispatchError::Rejected("scripted".to_string()))
        }
    }
}

fn instant_timing() -> MonitorTiming {
    MonitorTiming {
        poll_interval: Duration::from_millis(0),
        tap_cooldown: Duration::from_millis(0),
        blind_click_pause: Duration::from_millis(0),
    }
}

fn frame_with_button_at(cx: u32, cy: u32) -> Frame {
    let mut frame = Frame::solid(1080, 1920, [30, 30, 30]);
    frame.fill_rect(cx - 100, cy - 100, 200, 200, TARGET);
    frame
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_detect_then_blind_click_across_iterations() {
    // Iteration 1: a frame with the button → one tap at its center.
    // Iteration 2: capture fails → blind-clicking over the fallback list.
    let registry = {
        let mut r = DeviceRegistry::new();
        r.insert(Device::assign("serial-a", 0, &PortPlan::default()));
        Arc::new(Mutex::new(r))
    };
    let method = FlakyMethod::new("only", true);
    let dispatcher = Arc::new(TapDispatcher::new(
        vec![method.clone() as Arc<dyn TapMethod>],
        Arc::clone(&registry),
    ));
    let source = Arc::new(ScriptedSource {
        frames: StdMutex::new(vec![Some(frame_with_button_at(540, 800)), None]),
    });
    let blind = vec![(540, 1800), (540, 1600)];
    let monitor = DeviceMonitor::new(
        "serial-a",
        source,
        ButtonDetector::new(HsvBand::default()),
        dispatcher,
        Arc::clone(&registry),
        blind,
        instant_timing(),
        Arc::new(AtomicBool::new(true)),
    );

    // First iteration: detection hit.
    assert_eq!(monitor.run_once().await, IterationOutcome::Tapped);
    {
        let reg = registry.lock().await;
        let status = reg.get("serial-a").unwrap().status;
        assert_eq!(status.phase, Phase::Clicked);
        assert_eq!(status.last_tap, Some((540, 800)));
    }

    // Second iteration: capture failure, fallback pass.
    assert_eq!(monitor.run_once().await, IterationOutcome::BlindClicked);
    let attempts = method.attempts.lock().unwrap().clone();
    assert_eq!(attempts, vec![(540, 800), (540, 1800), (540, 1600)]);

    // Blind taps succeeded, so the last one re-set the phase to Clicked.
    let reg = registry.lock().await;
    assert_eq!(
        reg.get("serial-a").unwrap().status.last_tap,
        Some((540, 1600))
    );
}

#[tokio::test]
async fn test_method_fallback_during_blind_clicking() {
    // First method always fails, second always succeeds: every blind tap
    // should try both, in order, and still land.
    let registry = {
        let mut r = DeviceRegistry::new();
        r.insert(Device::assign("serial-a", 0, &PortPlan::default()));
        Arc::new(Mutex::new(r))
    };
    let broken = FlakyMethod::new("broken", false);
    let working = FlakyMethod::new("working", true);
    let dispatcher = Arc::new(TapDispatcher::new(
        vec![
            broken.clone() as Arc<dyn TapMethod>,
            working.clone() as Arc<dyn TapMethod>,
        ],
        Arc::clone(&registry),
    ));
    let source = Arc::new(ScriptedSource {
        frames: StdMutex::new(vec![None]),
    });
    let monitor = DeviceMonitor::new(
        "serial-a",
        source,
        ButtonDetector::new(HsvBand::default()),
        dispatcher,
        Arc::clone(&registry),
        vec![(100, 200), (300, 400)],
        instant_timing(),
        Arc::new(AtomicBool::new(true)),
    );

    assert_eq!(monitor.run_once().await, IterationOutcome::BlindClicked);

    // Both methods were attempted for each fallback position.
    assert_eq!(
        broken.attempts.lock().unwrap().clone(),
        vec![(100, 200), (300, 400)]
    );
    assert_eq!(
        working.attempts.lock().unwrap().clone(),
        vec![(100, 200), (300, 400)]
    );

    let reg = registry.lock().await;
    assert_eq!(reg.get("serial-a").unwrap().status.phase, Phase::Clicked);
}

#[tokio::test]
async fn test_total_dispatch_failure_keeps_blind_clicking_phase() {
    // When every tap method fails, no status update happens after the
    // phase flip — the dashboard keeps showing blind_clicking.
    let registry = {
        let mut r = DeviceRegistry::new();
        r.insert(Device::assign("serial-a", 0, &PortPlan::default()));
        Arc::new(Mutex::new(r))
    };
    let broken = FlakyMethod::new("broken", false);
    let dispatcher = Arc::new(TapDispatcher::new(
        vec![broken.clone() as Arc<dyn TapMethod>],
        Arc::clone(&registry),
    ));
    let source = Arc::new(ScriptedSource {
        frames: StdMutex::new(vec![None]),
    });
    let monitor = DeviceMonitor::new(
        "serial-a",
        source,
        ButtonDetector::new(HsvBand::default()),
        dispatcher,
        Arc::clone(&registry),
        vec![(100, 200)],
        instant_timing(),
        Arc::new(AtomicBool::new(true)),
    );

    monitor.run_once().await;

    let reg = registry.lock().await;
    let status = reg.get("serial-a").unwrap().status;
    assert_eq!(status.phase, Phase::BlindClicking);
    assert_eq!(status.last_tap, None);
}

#[tokio::test]
async fn test_run_exits_when_flag_cleared() {
    // A monitor whose flag starts false must return promptly from run().
    let registry = {
        let mut r = DeviceRegistry::new();
        r.insert(Device::assign("serial-a", 0, &PortPlan::default()));
        Arc::new(Mutex::new(r))
    };
    let method = FlakyMethod::new("only", true);
    let dispatcher = Arc::new(TapDispatcher::new(
        vec![method as Arc<dyn TapMethod>],
        Arc::clone(&registry),
    ));
    let source = Arc::new(ScriptedSource {
        frames: StdMutex::new(Vec::new()),
    });
    let monitor = DeviceMonitor::new(
        "serial-a",
        source,
        ButtonDetector::new(HsvBand::default()),
        dispatcher,
        Arc::clone(&registry),
        Vec::new(),
        instant_timing(),
        Arc::new(AtomicBool::new(false)),
    );

    tokio::time::timeout(Duration::from_secs(1), monitor.run())
        .await
        .expect("run() must return once the flag is down");
}

#[tokio::test]
async fn test_spawned_monitor_task_drains_after_flag_clears() {
    // Mirrors the shutdown path in main: the monitor runs as a spawned
    // task, the Ctrl-C handler clears the shared flag, and joining the
    // task must complete instead of leaving it to be killed mid-pass.
    let registry = {
        let mut r = DeviceRegistry::new();
        r.insert(Device::assign("serial-a", 0, &PortPlan::default()));
        Arc::new(Mutex::new(r))
    };
    let method = FlakyMethod::new("only", true);
    let dispatcher = Arc::new(TapDispatcher::new(
        vec![method as Arc<dyn TapMethod>],
        Arc::clone(&registry),
    ));
    let source = Arc::new(ScriptedSource {
        frames: StdMutex::new(Vec::new()),
    });
    let running = Arc::new(AtomicBool::new(true));
    let timing = MonitorTiming {
        poll_interval: Duration::from_millis(10),
        ..instant_timing()
    };
    let monitor = DeviceMonitor::new(
        "serial-a",
        source,
        ButtonDetector::new(HsvBand::default()),
        dispatcher,
        Arc::clone(&registry),
        vec![(540, 1800)],
        timing,
        Arc::clone(&running),
    );

    let task = tokio::spawn(async move {
        monitor.run().await;
    });

    // Let a few iterations go by before asking for shutdown.
    tokio::time::sleep(Duration::from_millis(50)).await;
    running.store(false, Ordering::Relaxed);

    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("spawned monitor must drain once the flag is down")
        .expect("monitor task must not panic");
}
