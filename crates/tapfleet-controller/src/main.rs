//! tapfleet controller — entry point.
//!
//! Wires together all infrastructure services and starts the Tokio async
//! runtime.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_or_init()          -- TOML file, defaults written on first run
//!  └─ scan_devices()          -- adb enumeration, registry population
//!  └─ start services
//!       ├─ scrcpy mirrors     (one child process per device, optional)
//!       ├─ DeviceMonitor      (one Tokio task per device, runs forever)
//!       └─ dashboard server   (WebSocket accept loop)
//! ```
//!
//! # Usage
//!
//! ```text
//! tapfleet-controller [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Config file path [default: tapfleet.toml]
//!   --bind <ADDR>     Dashboard bind address (overrides config)
//!   --adb-path <PATH> adb binary (overrides config)
//!   --skip-mirror     Do not launch scrcpy mirror windows
//! ```
//!
//! Environment variables `TAPFLEET_CONFIG`, `TAPFLEET_BIND`, and
//! `TAPFLEET_ADB` provide the same overrides; CLI args win when both are
//! present.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use anyhow::Context;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tapfleet_core::{ButtonDetector, DeviceRegistry};

use tapfleet_controller::application::dispatch_tap::{TapDispatcher, TapMethod};
use tapfleet_controller::application::monitor_device::DeviceMonitor;
use tapfleet_controller::application::status_api::StatusApi;
use tapfleet_controller::infrastructure::adb::{
    AdbFrameSource, AdbShell, InputTapMethod, SendEventMethod, TouchscreenTapMethod,
};
use tapfleet_controller::infrastructure::dashboard::run_dashboard;
use tapfleet_controller::infrastructure::discovery::scan_devices;
use tapfleet_controller::infrastructure::mirror::start_mirror;
use tapfleet_controller::infrastructure::storage::config::load_or_init;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Multi-device tap controller.
///
/// Discovers attached phones over adb, mirrors each one with scrcpy, and
/// runs one monitoring loop per device that detects the target UI element
/// on screen and taps it.
#[derive(Debug, Parser)]
#[command(
    name = "tapfleet-controller",
    about = "Drives a fleet of phones: detect the target button on each screen and tap it",
    version
)]
struct Cli {
    /// Config file path.
    #[arg(long, env = "TAPFLEET_CONFIG", default_value = "tapfleet.toml")]
    config: PathBuf,

    /// Dashboard bind address (overrides the config file).
    #[arg(long, env = "TAPFLEET_BIND")]
    bind: Option<SocketAddr>,

    /// adb binary path (overrides the config file).
    #[arg(long, env = "TAPFLEET_ADB")]
    adb_path: Option<String>,

    /// Do not launch scrcpy mirror windows.
    #[arg(long)]
    skip_mirror: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The first run writes a default config file next to the binary so
    // the operator has something concrete to edit.
    let mut config = load_or_init(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Initialise structured logging.  The configured level applies
    // unless `RUST_LOG` is set, which always wins.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.controller.log_level)),
        )
        .init();

    info!("tapfleet controller starting");
    if let Some(adb_path) = cli.adb_path {
        config.network.adb_path = adb_path;
    }
    let dashboard_addr: SocketAddr = match cli.bind {
        Some(addr) => addr,
        None => config
            .network
            .dashboard_bind
            .parse()
            .context("invalid dashboard_bind in config")?,
    };

    // Shutdown flag shared across all background services.
    let running = Arc::new(AtomicBool::new(true));

    // ── Discovery ─────────────────────────────────────────────────────────────
    let shell = AdbShell::new(config.network.adb_path.clone());
    let devices = scan_devices(&shell, &config.port_plan())
        .await
        .context("device discovery failed")?;
    if devices.is_empty() {
        warn!("no devices attached; the dashboard will show an empty fleet");
    }

    let mut registry = DeviceRegistry::new();
    for device in &devices {
        info!(
            serial = %device.serial,
            label = %device.label,
            window_port = device.window_port,
            control_port = device.control_port,
            "device registered"
        );
        registry.insert(device.clone());
    }
    let registry = Arc::new(Mutex::new(registry));

    // ── Mirrors ───────────────────────────────────────────────────────────────
    // Children are held for the lifetime of the run; kill_on_drop reaps
    // them at shutdown.
    let mut mirrors = Vec::new();
    if !cli.skip_mirror {
        for device in &devices {
            match start_mirror(device, &config.mirror) {
                Ok(child) => mirrors.push(child),
                Err(e) => error!(serial = %device.serial, "mirror launch failed: {e}"),
            }
            // Give each scrcpy instance a moment to claim its port before
            // the next one starts.
            tokio::time::sleep(config.launch_stagger()).await;
        }
    }

    // ── Tap dispatcher ────────────────────────────────────────────────────────
    let methods: Vec<Arc<dyn TapMethod>> = vec![
        Arc::new(InputTapMethod::new(shell.clone())),
        Arc::new(TouchscreenTapMethod::new(shell.clone())),
        Arc::new(SendEventMethod::new(
            shell.clone(),
            config.network.touch_event_device.clone(),
        )),
    ];
    let dispatcher = Arc::new(TapDispatcher::new(methods, Arc::clone(&registry)));

    // ── Device monitors ───────────────────────────────────────────────────────
    let detector = ButtonDetector::new(config.hsv_band());
    let frame_source = Arc::new(AdbFrameSource::new(
        shell.clone(),
        config.mirror.scrcpy_path.clone(),
        config.capture_deadline(),
    ));

    let mut monitor_tasks = Vec::with_capacity(devices.len());
    for device in &devices {
        let monitor = DeviceMonitor::new(
            device.serial.clone(),
            frame_source.clone(),
            detector,
            Arc::clone(&dispatcher),
            Arc::clone(&registry),
            config.controller.blind_positions.clone(),
            config.monitor_timing(),
            Arc::clone(&running),
        );
        monitor_tasks.push(tokio::spawn(async move {
            monitor.run().await;
        }));
    }

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!(
        devices = devices.len(),
        dashboard = %dashboard_addr,
        "tapfleet controller ready.  Press Ctrl-C to exit."
    );

    // ── Dashboard server (runs on the main task until shutdown) ───────────────
    let api = StatusApi::new(Arc::clone(&registry), Arc::clone(&dispatcher));
    run_dashboard(dashboard_addr, api, Arc::clone(&running)).await?;

    // The dashboard only returns once the flag is down; let every
    // monitor finish its in-flight iteration before tearing down the
    // mirror children.
    for task in monitor_tasks {
        if let Err(e) = task.await {
            error!("monitor task panicked: {e}");
        }
    }

    drop(mirrors);
    info!("tapfleet controller stopped");
    Ok(())
}
