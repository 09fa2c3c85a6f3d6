//! Request handling for the dashboard protocol.
//!
//! The WebSocket server in the infrastructure layer does the socket work;
//! this module decides what each [`DashboardRequest`] means.  Keeping the
//! decision logic here means it can be tested without opening a socket,
//! the same way the monitors are tested without adb.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use tapfleet_core::{DashboardReply, DashboardRequest, DeviceRegistry};

use super::dispatch_tap::TapDispatcher;

/// Shared state handed to every dashboard session.
#[derive(Clone)]
pub struct StatusApi {
    registry: Arc<Mutex<DeviceRegistry>>,
    dispatcher: Arc<TapDispatcher>,
}

impl StatusApi {
    pub fn new(registry: Arc<Mutex<DeviceRegistry>>, dispatcher: Arc<TapDispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    /// Answers one dashboard request.
    ///
    /// `Status` is a pure registry read.  `ManualTap` invokes the
    /// dispatcher directly, bypassing detection; for an unregistered
    /// serial the dispatcher refuses without touching the registry, so
    /// the reply is simply `accepted: false`.
    pub async fn handle(&self, request: DashboardRequest) -> DashboardReply {
        match request {
            DashboardRequest::Status => DashboardReply::StatusReport {
                devices: self.registry.lock().await.snapshot(),
            },
            DashboardRequest::ManualTap { serial, x, y } => {
                info!(%serial, x, y, "manual tap requested");
                let accepted = self.dispatcher.tap(&serial, x, y).await;
                DashboardReply::TapResult { serial, accepted }
            }
        }
    }

    /// Parses a raw JSON text frame and answers it.  Malformed input gets
    /// a structured `Error` reply rather than dropping the session.
    pub async fn handle_text(&self, text: &str) -> DashboardReply {
        match serde_json::from_str::<DashboardRequest>(text) {
            Ok(request) => self.handle(request).await,
            Err(e) => DashboardReply::Error {
                message: format!("bad request: {e}"),
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use tapfleet_core::domain::device::{Device, Phase, PortPlan};

    use crate::application::dispatch_tap::{DispatchError, TapMethod};
    use async_trait::async_trait;

    struct AlwaysAccepts;

    #[async_trait]
    impl TapMethod for AlwaysAccepts {
        fn name(&self) -> &str {
            "always"
        }

        async fn deliver(&self, _serial: &str, _x: i32, _y: i32) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    fn make_api() -> (StatusApi, Arc<Mutex<DeviceRegistry>>) {
        let mut registry = DeviceRegistry::new();
        registry.insert(Device::assign("serial-a", 0, &PortPlan::default()));
        registry.insert(Device::assign("serial-b", 1, &PortPlan::default()));
        let registry = Arc::new(Mutex::new(registry));
        let dispatcher = Arc::new(TapDispatcher::new(
            vec![Arc::new(AlwaysAccepts) as Arc<dyn TapMethod>],
            Arc::clone(&registry),
        ));
        (
            StatusApi::new(Arc::clone(&registry), dispatcher),
            registry,
        )
    }

    #[tokio::test]
    async fn test_status_returns_every_device_in_index_order() {
        let (api, _registry) = make_api();

        let reply = api.handle(DashboardRequest::Status).await;

        match reply {
            DashboardReply::StatusReport { devices } => {
                assert_eq!(devices.len(), 2);
                assert_eq!(devices[0].label, "driver-1");
                assert_eq!(devices[1].label, "driver-2");
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_manual_tap_updates_status_and_reports_accepted() {
        let (api, registry) = make_api();

        let reply = api
            .handle(DashboardRequest::ManualTap {
                serial: "serial-a".to_string(),
                x: 300,
                y: 400,
            })
            .await;

        assert_eq!(
            reply,
            DashboardReply::TapResult {
                serial: "serial-a".to_string(),
                accepted: true,
            }
        );
        let reg = registry.lock().await;
        let status = reg.get("serial-a").unwrap().status;
        assert_eq!(status.phase, Phase::Clicked);
        assert_eq!(status.last_tap, Some((300, 400)));
    }

    #[tokio::test]
    async fn test_manual_tap_for_unknown_serial_is_rejected() {
        let (api, registry) = make_api();

        let reply = api
            .handle(DashboardRequest::ManualTap {
                serial: "nope".to_string(),
                x: 1,
                y: 2,
            })
            .await;

        assert_eq!(
            reply,
            DashboardReply::TapResult {
                serial: "nope".to_string(),
                accepted: false,
            }
        );
        // Registry untouched.
        let reg = registry.lock().await;
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("serial-a").unwrap().status.phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_malformed_json_gets_error_reply() {
        let (api, _registry) = make_api();

        let reply = api.handle_text("{not json").await;

        assert!(matches!(reply, DashboardReply::Error { .. }));
    }
}
