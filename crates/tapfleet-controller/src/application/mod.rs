//! Application layer use cases for the controller.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules, here in `tapfleet-core`) and the infrastructure
//! (subprocesses, sockets, files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a goal (e.g., "capture a
//!   frame, find the button, tap it").
//! - **Depend on abstractions** (the `FrameSource` and `TapMethod`
//!   traits) rather than concrete implementations, so adb can be swapped
//!   for mocks in tests without changing this code.
//! - **Contain no subprocess calls, no network I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`monitor_device`** – The per-device monitoring loop: capture →
//!   detect → tap, with blind-clicking fallback.  This is the heart of
//!   the controller — one instance runs per device, forever.
//!
//! - **`dispatch_tap`** – Ordered-fallback tap delivery and the registry
//!   side effects of a successful tap.
//!
//! - **`status_api`** – Pure request handling for the dashboard protocol.

pub mod dispatch_tap;
pub mod monitor_device;
pub mod status_api;
