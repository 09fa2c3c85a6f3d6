//! File-system storage for the controller.

pub mod config;
