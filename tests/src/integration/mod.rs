//! Cross-crate flows against a running gateway.

pub mod harness;

mod realtime;
mod rest_flows;
