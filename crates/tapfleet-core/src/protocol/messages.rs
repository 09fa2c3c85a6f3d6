//! JSON message types for the browser-facing dashboard protocol.
//!
//! The dashboard is a plain web page that connects to the controller over
//! WebSocket and exchanges JSON text frames.  Two message enums cover the
//! two directions:
//!
//! ```text
//! Browser → Controller: JSON text frame → DashboardRequest
//! Controller → Browser: DashboardReply  → JSON text frame
//! ```
//!
//! # JSON discriminant
//!
//! Every message is a JSON object with a `"type"` field that identifies
//! the variant; all other fields are flattened into the same object:
//!
//! ```json
//! {"type":"ManualTap","serial":"R3CN30XXXX","x":540,"y":1800}
//! ```
//!
//! Serde's `#[serde(tag = "type")]` attribute handles this automatically.
//!
//! # Why two enums?
//!
//! The browser only ever *asks* (status, manual tap) and the controller
//! only ever *answers*.  Two distinct enums make it a compile-time error
//! to send a reply where a request belongs, and vice versa.

use serde::{Deserialize, Serialize};

use crate::domain::registry::DeviceReport;

// ── Browser → Controller messages ─────────────────────────────────────────────

/// All messages a dashboard client can send to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DashboardRequest {
    /// Asks for the current state of every registered device.
    Status,

    /// Requests a tap on one device at an explicit coordinate, bypassing
    /// visual detection entirely.
    ManualTap {
        /// adb serial of the target device.
        serial: String,
        x: i32,
        y: i32,
    },
}

// ── Controller → Browser messages ─────────────────────────────────────────────

/// All messages the controller can send back to a dashboard client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DashboardReply {
    /// Snapshot of every registered device, sorted by discovery index.
    StatusReport { devices: Vec<DeviceReport> },

    /// Outcome of a [`DashboardRequest::ManualTap`].
    ///
    /// `accepted` means "a tap command was accepted by the device", not
    /// that the tap had any effect on the target UI.  An unregistered
    /// serial always yields `accepted: false`.
    TapResult {
        serial: String,
        accepted: bool,
    },

    /// The request could not be parsed.
    Error { message: String },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
