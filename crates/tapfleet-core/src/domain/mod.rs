//! Domain entities for tapfleet.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: the device fleet model and the shared registry.  Code
//! here can be compiled and tested on any platform without adb, scrcpy,
//! or a network being present.
//!
//! Outer layers (the controller's application and infrastructure code)
//! depend on this module; it never depends on them.

pub mod device;
pub mod registry;
