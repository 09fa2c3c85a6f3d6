//! Infrastructure layer for the controller.
//!
//! Contains the OS-facing adapters: adb subprocess plumbing, device
//! discovery, the scrcpy mirroring launcher, TOML config storage, and the
//! WebSocket dashboard server.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `tapfleet_core`, but MUST NOT be imported by the application or domain
//! layers.

pub mod adb;
pub mod dashboard;
pub mod discovery;
pub mod mirror;
pub mod storage;
