//! TOML-based configuration for the controller.
//!
//! Every knob the fleet operator may need to turn lives in one file:
//!
//! ```toml
//! [controller]
//! poll_interval_ms = 1000
//! tap_cooldown_ms = 2000
//! blind_click_pause_ms = 300
//! blind_positions = [[540, 1800], [540, 1600], [720, 1800], [360, 1800]]
//!
//! [detection]
//! hue_min = 20
//! hue_max = 30
//! min_area = 5000
//!
//! [network]
//! adb_path = "adb"
//! dashboard_bind = "0.0.0.0:5000"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return
//! value of `some_fn()` when the field is absent from the TOML file.
//! This lets the controller run correctly with no config file at all
//! (first run) and keeps older config files working when newer fields
//! are added.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tapfleet_core::domain::device::{
    PortPlan, DEFAULT_CONTROL_PORT_BASE, DEFAULT_WINDOW_PORT_BASE,
};
use tapfleet_core::HsvBand;

use crate::application::monitor_device::MonitorTiming;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level controller configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
}

/// Monitor-loop cadence and the blind-clicking coordinate list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfig {
    /// Sleep at the end of every monitor iteration, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Extra sleep after a detected-and-dispatched tap, in milliseconds.
    #[serde(default = "default_tap_cooldown_ms")]
    pub tap_cooldown_ms: u64,
    /// Pause between consecutive blind-clicking taps, in milliseconds.
    #[serde(default = "default_blind_click_pause_ms")]
    pub blind_click_pause_ms: u64,
    /// Pre-known button positions tapped when detection is unavailable,
    /// in on-device pixels, walked in list order.
    #[serde(default = "default_blind_positions")]
    pub blind_positions: Vec<(i32, i32)>,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// Used as the `EnvFilter` fallback; a set `RUST_LOG` environment
    /// variable always takes precedence over this field.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// The HSV band and area threshold the detector is calibrated to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    /// Inclusive hue range, OpenCV half-degrees (0–179).
    #[serde(default = "default_hue_min")]
    pub hue_min: u8,
    #[serde(default = "default_hue_max")]
    pub hue_max: u8,
    /// Minimum saturation (0–255).
    #[serde(default = "default_sat_min")]
    pub sat_min: u8,
    /// Minimum value/brightness (0–255).
    #[serde(default = "default_val_min")]
    pub val_min: u8,
    /// Regions with at most this many pixels are noise.
    #[serde(default = "default_min_area")]
    pub min_area: usize,
}

/// Host-side paths, ports, and the dashboard bind address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Path to the adb binary.
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    /// Address the dashboard WebSocket server binds to.  `0.0.0.0`
    /// accepts connections from any interface.
    #[serde(default = "default_dashboard_bind")]
    pub dashboard_bind: String,
    /// Base port for per-device mirroring windows (`base + index`).
    #[serde(default = "default_window_port_base")]
    pub window_port_base: u16,
    /// Base port for per-device control channels (`base + index`).
    #[serde(default = "default_control_port_base")]
    pub control_port_base: u16,
    /// Deadline for one screencap round-trip, in milliseconds.
    #[serde(default = "default_capture_deadline_ms")]
    pub capture_deadline_ms: u64,
    /// Kernel input node used by the sendevent fallback.
    #[serde(default = "default_touch_event_device")]
    pub touch_event_device: String,
}

/// scrcpy mirroring caps and window geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MirrorConfig {
    /// Path to the scrcpy binary.
    #[serde(default = "default_scrcpy_path")]
    pub scrcpy_path: String,
    /// Resolution cap (longest side, pixels).
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    /// Bitrate cap, scrcpy syntax (e.g. `"2M"`).
    #[serde(default = "default_bit_rate")]
    pub bit_rate: String,
    /// Frame-rate cap.
    #[serde(default = "default_max_fps")]
    pub max_fps: u32,
    /// Mirror window geometry on the controller host.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Pause between consecutive scrcpy launches, in milliseconds, so
    /// adb is not hammered by every device at once.
    #[serde(default = "default_launch_stagger_ms")]
    pub launch_stagger_ms: u64,
}

// ── Default value functions ───────────────────────────────────────────────────

fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_tap_cooldown_ms() -> u64 {
    2000
}
fn default_blind_click_pause_ms() -> u64 {
    300
}
fn default_blind_positions() -> Vec<(i32, i32)> {
    vec![(540, 1800), (540, 1600), (720, 1800), (360, 1800)]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_hue_min() -> u8 {
    20
}
fn default_hue_max() -> u8 {
    30
}
fn default_sat_min() -> u8 {
    100
}
fn default_val_min() -> u8 {
    100
}
fn default_min_area() -> usize {
    5000
}
fn default_adb_path() -> String {
    "adb".to_string()
}
fn default_dashboard_bind() -> String {
    "0.0.0.0:5000".to_string()
}
fn default_window_port_base() -> u16 {
    DEFAULT_WINDOW_PORT_BASE
}
fn default_control_port_base() -> u16 {
    DEFAULT_CONTROL_PORT_BASE
}
fn default_capture_deadline_ms() -> u64 {
    5000
}
fn default_touch_event_device() -> String {
    "/dev/input/event2".to_string()
}
fn default_scrcpy_path() -> String {
    "scrcpy".to_string()
}
fn default_max_size() -> u32 {
    720
}
fn default_bit_rate() -> String {
    "2M".to_string()
}
fn default_max_fps() -> u32 {
    15
}
fn default_window_width() -> u32 {
    360
}
fn default_window_height() -> u32 {
    800
}
fn default_launch_stagger_ms() -> u64 {
    2000
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            tap_cooldown_ms: default_tap_cooldown_ms(),
            blind_click_pause_ms: default_blind_click_pause_ms(),
            blind_positions: default_blind_positions(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            hue_min: default_hue_min(),
            hue_max: default_hue_max(),
            sat_min: default_sat_min(),
            val_min: default_val_min(),
            min_area: default_min_area(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            dashboard_bind: default_dashboard_bind(),
            window_port_base: default_window_port_base(),
            control_port_base: default_control_port_base(),
            capture_deadline_ms: default_capture_deadline_ms(),
            touch_event_device: default_touch_event_device(),
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            scrcpy_path: default_scrcpy_path(),
            max_size: default_max_size(),
            bit_rate: default_bit_rate(),
            max_fps: default_max_fps(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            launch_stagger_ms: default_launch_stagger_ms(),
        }
    }
}

// ── Derived views ─────────────────────────────────────────────────────────────

impl AppConfig {
    /// The monitor timing this config describes.
    pub fn monitor_timing(&self) -> MonitorTiming {
        MonitorTiming {
            poll_interval: Duration::from_millis(self.controller.poll_interval_ms),
            tap_cooldown: Duration::from_millis(self.controller.tap_cooldown_ms),
            blind_click_pause: Duration::from_millis(self.controller.blind_click_pause_ms),
        }
    }

    /// The detector band this config describes.
    pub fn hsv_band(&self) -> HsvBand {
        HsvBand {
            h_min: self.detection.hue_min,
            h_max: self.detection.hue_max,
            s_min: self.detection.sat_min,
            v_min: self.detection.val_min,
            min_area: self.detection.min_area,
        }
    }

    /// The port bases discovery derives per-device ports from.
    pub fn port_plan(&self) -> PortPlan {
        PortPlan {
            window_base: self.network.window_port_base,
            control_base: self.network.control_port_base,
        }
    }

    pub fn capture_deadline(&self) -> Duration {
        Duration::from_millis(self.network.capture_deadline_ms)
    }

    pub fn launch_stagger(&self) -> Duration {
        Duration::from_millis(self.mirror.launch_stagger_ms)
    }
}

// ── Load / save ───────────────────────────────────────────────────────────────

/// Loads the config from `path`, or returns defaults if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`ConfigError`] on unreadable files or invalid TOML — a
/// *present but broken* config file is an operator error worth stopping
/// for, unlike an absent one.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads the config from `path`, writing a file with the defaults there
/// first if none exists yet — so that after the first run the operator
/// always has a concrete file to edit.
pub fn load_or_init(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig::default();
        save_config(path, &config)?;
        return Ok(config);
    }
    load_config(path)
}

/// Writes the config to `path` as TOML.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(config)?;
    std::fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
