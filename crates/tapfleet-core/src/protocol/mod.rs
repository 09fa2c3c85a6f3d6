//! The JSON dashboard protocol.

pub mod messages;

pub use messages::{DashboardReply, DashboardRequest};
