//! TapDispatcher: ordered-fallback tap delivery.
//!
//! Phones differ in which input path actually works: newer Android builds
//! accept `input tap`, some vendor builds only honour the `touchscreen`
//! source, and a few locked-down devices need raw `sendevent` injection.
//! The dispatcher holds an ordered list of [`TapMethod`] strategies and
//! walks it until one accepts the command.
//!
//! "Accepts" means exactly that: each method is fire-and-forget, with no
//! verification that the tap registered in the target UI.  Success is
//! "command accepted", never "click had effect".
//!
//! On the first accepted method the device's status is updated exactly
//! once (phase `Clicked`, last tap coordinate) and no further method is
//! tried.  If every method errors, the status is left untouched and the
//! failure is reported only as a `false` return — degraded operation
//! surfaces to observers through the `blind_clicking` phase, not through
//! an error state.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use tapfleet_core::DeviceRegistry;

/// Error type for a single tap-delivery attempt.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The underlying command could not be spawned or communicated with.
    #[error("transport error: {0}")]
    Transport(String),
    /// The command ran but signalled failure.
    #[error("command rejected: {0}")]
    Rejected(String),
}

/// One way of delivering a tap event to a device.
///
/// Infrastructure implementations shell out over adb; test
/// implementations record calls.
#[async_trait]
pub trait TapMethod: Send + Sync {
    /// Short name used in logs (`input-tap`, `touchscreen-tap`, `sendevent`).
    fn name(&self) -> &str;

    /// Attempts to deliver one tap at `(x, y)` on the given device.
    async fn deliver(&self, serial: &str, x: i32, y: i32) -> Result<(), DispatchError>;
}

/// Ordered-fallback tap dispatcher shared by all monitors and the
/// dashboard's manual-tap path.
pub struct TapDispatcher {
    methods: Vec<Arc<dyn TapMethod>>,
    registry: Arc<Mutex<DeviceRegistry>>,
}

impl TapDispatcher {
    pub fn new(methods: Vec<Arc<dyn TapMethod>>, registry: Arc<Mutex<DeviceRegistry>>) -> Self {
        Self { methods, registry }
    }

    /// Attempts to tap `(x, y)` on the device with this serial.
    ///
    /// Returns `true` if some method accepted the command.  Unregistered
    /// serials fail immediately: no method is invoked and the registry is
    /// not modified.
    pub async fn tap(&self, serial: &str, x: i32, y: i32) -> bool {
        if !self.registry.lock().await.contains(serial) {
            warn!(serial, "tap requested for unregistered device");
            return false;
        }

        for method in &self.methods {
            match method.deliver(serial, x, y).await {
                Ok(()) => {
                    self.registry.lock().await.record_tap(serial, x, y);
                    info!(serial, x, y, method = method.name(), "tap accepted");
                    return true;
                }
                Err(e) => {
                    debug!(serial, method = method.name(), error = %e, "tap method failed");
                }
            }
        }

        warn!(serial, x, y, "all tap methods exhausted");
        false
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
