//! HTTP surface of the stream search addon.

pub mod api;
pub mod metrics;
pub mod state;
