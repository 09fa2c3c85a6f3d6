//! tapfleet-controller library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # Layer rules
//!
//! - `application` depends on `tapfleet-core` and traits only — no adb,
//!   no sockets, no file system.  Everything in it is unit-testable with
//!   recording mocks.
//! - `infrastructure` contains the OS-facing adapters (adb subprocesses,
//!   scrcpy, config files, the WebSocket dashboard) and may depend on
//!   `application`, never the other way around.

pub mod application;
pub mod infrastructure;
