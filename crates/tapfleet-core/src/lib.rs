//! # tapfleet-core
//!
//! Shared library for tapfleet containing the domain entities, the
//! color-band element detector, and the JSON message types for the
//! dashboard protocol.
//!
//! This crate is used by the controller binary and by its tests.
//! It has zero dependencies on OS APIs, subprocesses, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! tapfleet drives several Android phones from one controller host.  Each
//! phone's screen is captured over adb, scanned for one specific yellow
//! UI element, and tapped at the element's location when it appears.  A
//! browser dashboard shows per-device status and can trigger manual taps.
//!
//! This crate (`tapfleet-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure business logic with no OS dependencies: the
//!   `Device` record, its mutable `DeviceStatus`, and the shared
//!   `DeviceRegistry` that every monitor loop and the dashboard read.
//!
//! - **`vision`** – The detection pipeline: an owned RGB `Frame` buffer,
//!   RGB→HSV conversion, and the `ButtonDetector` that isolates the
//!   target element by hue/saturation/value band and connected-region
//!   area.
//!
//! - **`protocol`** – The JSON messages exchanged with the browser
//!   dashboard over WebSocket (status query, manual tap).

// Declare the three top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/vision/mod.rs).
pub mod domain;
pub mod protocol;
pub mod vision;

// Re-export the most-used types at the crate root so callers can write
// `tapfleet_core::DeviceRegistry` instead of the full module path.
pub use domain::device::{Device, DeviceStatus, Phase};
pub use domain::registry::{DeviceRegistry, DeviceReport};
pub use protocol::messages::{DashboardReply, DashboardRequest};
pub use vision::detect::{ButtonDetector, HsvBand};
pub use vision::frame::{Frame, FrameError};
